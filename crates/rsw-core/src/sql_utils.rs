//! SQL identifier quoting, literal escaping, and credential redaction.
//!
//! Every statement sent to the warehouse is assembled from these helpers, and
//! every statement that reaches a log line or an error message passes through
//! [`redact_credentials`] first.

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder substituted for secret values in redacted statements.
pub const REDACTED: &str = "***";

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use rsw_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Quote a value as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

static INLINE_CREDENTIALS_RE: OnceLock<Regex> = OnceLock::new();
static KEYWORD_CREDENTIALS_RE: OnceLock<Regex> = OnceLock::new();

/// `aws_access_key_id=...;aws_secret_access_key=...;token=...` inside a
/// `CREDENTIALS '...'` string. Values are escaped literals, so a doubled
/// quote belongs to the value.
fn inline_credentials_regex() -> &'static Regex {
    INLINE_CREDENTIALS_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(aws_access_key_id|aws_secret_access_key|token)=(?:[^;'\s]|'')*")
            .expect("valid regex")
    })
}

/// `ACCESS_KEY_ID '...' SECRET_ACCESS_KEY '...' SESSION_TOKEN '...'` clauses.
fn keyword_credentials_regex() -> &'static Regex {
    KEYWORD_CREDENTIALS_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(access_key_id|secret_access_key|session_token)\s+'(?:[^']|'')*'")
            .expect("valid regex")
    })
}

/// Replace every embedded object-storage credential in `sql` with [`REDACTED`].
///
/// Statements without credentials are returned unchanged.
///
/// # Examples
/// ```
/// use rsw_core::sql_utils::redact_credentials;
/// let sql = "COPY \"t\" FROM 's3://b/k' CREDENTIALS \
///            'aws_access_key_id=AKIA;aws_secret_access_key=s3cr3t;token=tok' GZIP;";
/// let redacted = redact_credentials(sql);
/// assert!(!redacted.contains("AKIA"));
/// assert!(!redacted.contains("s3cr3t"));
/// assert!(redacted.contains("aws_access_key_id=***"));
/// ```
pub fn redact_credentials(sql: &str) -> String {
    let pass = inline_credentials_regex().replace_all(sql, format!("${{1}}={REDACTED}").as_str());
    keyword_credentials_regex()
        .replace_all(&pass, format!("${{1}} '{REDACTED}'").as_str())
        .into_owned()
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
