//! Table load specifications and column definitions.

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::{default_true, deserialize_non_empty, deserialize_size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Warehouse types accepted in a column definition (compared lower-cased).
pub const ALLOWED_TYPES: &[&str] = &[
    "int",
    "int2",
    "int4",
    "int8",
    "smallint",
    "integer",
    "bigint",
    "decimal",
    "real",
    "double precision",
    "numeric",
    "float",
    "float4",
    "float8",
    "boolean",
    "char",
    "character",
    "nchar",
    "bpchar",
    "varchar",
    "character varying",
    "nvarchar",
    "text",
    "date",
    "timestamp",
    "timestamp without timezone",
    "timestamp without time zone",
];

/// Sentinel type that excludes a column from DDL and from the load.
pub const IGNORE_TYPE: &str = "ignore";

/// Column type: either an allow-listed warehouse type or the `ignore` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    /// Column is left out of the table and of every generated statement
    Ignore,
    /// Allow-listed warehouse type, stored lower-cased
    Sql(String),
}

impl ColumnType {
    /// Parse a configured type name, rejecting anything outside the allow-list.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let normalized = name.trim().to_lowercase();
        if normalized == IGNORE_TYPE {
            return Ok(ColumnType::Ignore);
        }
        if ALLOWED_TYPES.contains(&normalized.as_str()) {
            Ok(ColumnType::Sql(normalized))
        } else {
            Err(CoreError::UnsupportedType {
                type_name: name.to_string(),
            })
        }
    }

    /// Whether the column is excluded from DDL and load statements.
    pub fn is_ignored(&self) -> bool {
        matches!(self, ColumnType::Ignore)
    }

    /// Free-text types, on which the warehouse rejects a DEFAULT clause.
    pub fn is_free_text(&self) -> bool {
        matches!(self, ColumnType::Sql(t) if t == "text")
    }

    /// Type name as it appears in DDL (upper-cased).
    pub fn ddl_name(&self) -> String {
        match self {
            ColumnType::Ignore => IGNORE_TYPE.to_uppercase(),
            ColumnType::Sql(t) => t.to_uppercase(),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ColumnType::parse(&value)
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        match value {
            ColumnType::Ignore => IGNORE_TYPE.to_string(),
            ColumnType::Sql(t) => t,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Ignore => f.write_str(IGNORE_TYPE),
            ColumnType::Sql(t) => f.write_str(t),
        }
    }
}

/// One column of a table load specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name in the exported CSV
    pub name: String,

    /// Column name in the warehouse table
    pub db_name: String,

    /// Warehouse type or `ignore`
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Optional size / precision, e.g. `255` or `10,2`
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<String>,

    /// Whether NULL values are allowed
    #[serde(default)]
    pub nullable: bool,

    /// Optional default literal (an empty string means no default)
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub default: Option<String>,
}

impl ColumnDefinition {
    /// Build a nullable column with no size or default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            column_type,
            size: None,
            nullable: true,
            default: None,
        }
    }

    /// Set the size / precision.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the default literal.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether the column takes part in DDL and load statements.
    pub fn is_loaded(&self) -> bool {
        !self.column_type.is_ignored()
    }
}

/// Everything needed to load one exported table into the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLoadSpec {
    /// Logical id of the exported table (names the manifest file)
    pub table_id: String,

    /// Target table name in the warehouse
    pub db_name: String,

    /// Whether the table takes part in the run
    #[serde(default = "default_true")]
    pub export: bool,

    /// Merge into the target instead of replacing it
    #[serde(default)]
    pub incremental: bool,

    /// Target-side key columns used by the merge
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Ordered column definitions
    #[serde(default)]
    pub items: Vec<ColumnDefinition>,
}

impl TableLoadSpec {
    /// Columns that appear in DDL and load statements, in configured order.
    pub fn loaded_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.items.iter().filter(|c| c.is_loaded())
    }

    /// Export-side names of the loaded columns, in configured order.
    pub fn loaded_column_names(&self) -> Vec<&str> {
        self.loaded_columns().map(|c| c.name.as_str()).collect()
    }

    /// True when no column survives the `ignore` filter.
    pub fn has_no_loaded_columns(&self) -> bool {
        self.loaded_columns().next().is_none()
    }

    /// Copy of this spec pointing at a different warehouse table.
    pub fn retarget(&self, db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            ..self.clone()
        }
    }

    /// Validate identifiers that the serde layer cannot check on its own.
    pub fn validate(&self) -> CoreResult<()> {
        if self.table_id.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Table id cannot be empty".to_string(),
            });
        }
        if self.db_name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: format!("Table '{}' has an empty dbName", self.table_id),
            });
        }
        if let Some(col) = self.items.iter().find(|c| c.db_name.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Column '{}' of table '{}' has an empty dbName",
                    col.name, self.table_id
                ),
            });
        }
        if self.incremental && self.primary_key.is_empty() {
            log::warn!(
                "Table '{}' is incremental without a primary key; rows will be appended without de-duplication",
                self.table_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
