//! Configuration types and parsing for `config.json`

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::deserialize_port;
use crate::sql_utils::REDACTED;
use crate::table::TableLoadSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default Redshift port
pub const DEFAULT_PORT: u16 = 5439;

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Operation requested by the orchestrating supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Load every exported table (default)
    #[default]
    Run,
    /// Open a connection and run a trivial query
    TestConnection,
    /// Describe the tables of the configured schema
    GetTablesInfo,
}

impl Action {
    /// Wire name of the action as it appears in `config.json`
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Run => "run",
            Action::TestConnection => "testConnection",
            Action::GetTablesInfo => "getTablesInfo",
        }
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(Action::Run),
            "testConnection" => Ok(Action::TestConnection),
            "getTablesInfo" => Ok(Action::GetTablesInfo),
            other => Err(CoreError::UnknownAction {
                action: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warehouse connection parameters.
///
/// Required fields are optional at the serde level so that an absent value is
/// reported as `Parameter <name> is missing.` by [`ConnectionParams::validate`]
/// before any connection attempt, rather than as a generic parse error.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConnectionParams")]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// `db` block as written in `config.json`; the encrypted `#password` field
/// wins over a plain `password`.
#[derive(Deserialize)]
struct RawConnectionParams {
    #[serde(default)]
    host: Option<String>,

    #[serde(default, deserialize_with = "deserialize_port")]
    port: Option<u16>,

    #[serde(default)]
    database: Option<String>,

    #[serde(default)]
    schema: Option<String>,

    #[serde(default)]
    user: Option<String>,

    #[serde(default)]
    password: Option<String>,

    #[serde(default, rename = "#password")]
    encrypted_password: Option<String>,
}

impl From<RawConnectionParams> for ConnectionParams {
    fn from(raw: RawConnectionParams) -> Self {
        Self {
            host: raw.host,
            port: raw.port,
            database: raw.database,
            schema: raw.schema,
            user: raw.user,
            password: raw.encrypted_password.or(raw.password),
        }
    }
}

impl ConnectionParams {
    /// Check that every required parameter is present and non-empty.
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("host", &self.host),
            ("database", &self.database),
            ("user", &self.user),
            ("password", &self.password),
            ("schema", &self.schema),
        ];
        for (name, value) in required {
            if value.as_deref().map_or(true, str::is_empty) {
                return Err(CoreError::MissingParameter {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Port, falling back to the Redshift default.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Schema name, or an empty string when unset.
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port_or_default())
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// One entry of the storage input mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTable {
    /// Table id the entry maps
    pub source: String,

    /// Columns exported for the table, in CSV order
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Tables the supervisor staged for this run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputMapping {
    #[serde(default)]
    pub tables: Vec<InputTable>,
}

impl InputMapping {
    /// Verify that `spec` is present in the mapping with the same column order.
    ///
    /// An empty mapping (e.g. for connection checks) accepts every table.
    pub fn check_table(&self, spec: &TableLoadSpec) -> CoreResult<()> {
        if self.tables.is_empty() {
            return Ok(());
        }
        let entry = self
            .tables
            .iter()
            .find(|t| t.source == spec.table_id)
            .ok_or_else(|| CoreError::MissingInputMapping {
                table_id: spec.table_id.clone(),
            })?;

        if !entry.columns.is_empty() && entry.columns != spec.loaded_column_names() {
            return Err(CoreError::ColumnMismatch {
                table_id: spec.table_id.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    storage: Option<RawStorage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStorage {
    #[serde(default)]
    input: InputMapping,
}

/// Fully parsed and validated application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Requested action
    pub action: Action,

    /// Directory holding `config.json` and the table manifests
    pub data_dir: PathBuf,

    /// Warehouse connection parameters (validated lazily, before connecting)
    pub db: ConnectionParams,

    /// Table load specifications, in configured order
    pub tables: Vec<TableLoadSpec>,

    /// Storage input mapping
    pub input_mapping: InputMapping,
}

impl AppConfig {
    /// Load `config.json` from a data directory
    pub fn load_from_dir(data_dir: &Path) -> CoreResult<Self> {
        let content = Self::read_raw(data_dir)?;
        Self::from_json(&content, data_dir)
    }

    /// Read `config.json` from a data directory without parsing it
    pub fn read_raw(data_dir: &Path) -> CoreResult<String> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Action name exactly as requested, before validation.
    ///
    /// Lets the caller choose its output mode even when the rest of the
    /// configuration is invalid. `None` when the JSON is unreadable or the
    /// field is absent.
    pub fn requested_action(content: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(content).ok()?;
        value
            .get("action")
            .and_then(|a| a.as_str())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
    }

    /// Parse configuration JSON; `data_dir` anchors the manifest lookup.
    pub fn from_json(content: &str, data_dir: &Path) -> CoreResult<Self> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;

        let action = match raw.action.as_deref() {
            None | Some("") => Action::Run,
            Some(name) => name.parse()?,
        };

        let parameters = match raw.parameters {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            _ => {
                return Err(CoreError::ConfigInvalid {
                    message: "'parameters' must be an object".to_string(),
                })
            }
        };

        let db = match parameters.get("db") {
            Some(value) => ConnectionParams::deserialize(value).map_err(|e| {
                CoreError::ConfigParseError {
                    message: format!("parameters.db: {e}"),
                }
            })?,
            None => ConnectionParams::default(),
        };

        let tables = Self::parse_tables(&parameters, action)?;
        for table in &tables {
            table.validate()?;
        }

        Ok(Self {
            action,
            data_dir: data_dir.to_path_buf(),
            db,
            tables,
            input_mapping: raw.storage.unwrap_or_default().input,
        })
    }

    /// Multi-table configs carry `tables`; a config row is itself one table.
    fn parse_tables(
        parameters: &serde_json::Map<String, serde_json::Value>,
        action: Action,
    ) -> CoreResult<Vec<TableLoadSpec>> {
        if let Some(tables) = parameters.get("tables") {
            return Vec::<TableLoadSpec>::deserialize(tables).map_err(|e| {
                CoreError::ConfigParseError {
                    message: format!("parameters.tables: {e}"),
                }
            });
        }

        if action != Action::Run || !parameters.contains_key("tableId") {
            return Ok(Vec::new());
        }

        let row = TableLoadSpec::deserialize(serde_json::Value::Object(parameters.clone()))
            .map_err(|e| CoreError::ConfigParseError {
                message: format!("parameters: {e}"),
            })?;
        Ok(vec![row])
    }

    /// Tables that take part in the run, in configured order.
    pub fn exported_tables(&self) -> impl Iterator<Item = &TableLoadSpec> {
        self.tables.iter().filter(|t| t.export)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
