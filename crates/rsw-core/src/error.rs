//! Error types for rsw-core

use thiserror::Error;

/// Configuration and data-model errors.
///
/// Every variant is user-caused: fixing the configuration (or the upstream
/// export) fixes the error, retrying does not.
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Required connection parameter absent
    #[error("Parameter {name} is missing.")]
    MissingParameter { name: String },

    /// C005: Action name outside the supported set
    #[error("Action '{action}' does not exist.")]
    UnknownAction { action: String },

    /// C006: Column type outside the allow-list
    #[error("[C006] Unsupported column type '{type_name}'")]
    UnsupportedType { type_name: String },

    /// C007: Export columns differ from the configured column order
    #[error(
        "Columns in configuration of table \"{table_id}\" does not match with input mapping. \
         Edit and re-save the configuration to fix the problem."
    )]
    ColumnMismatch { table_id: String },

    /// C008: Table selected for the run is absent from the input mapping
    #[error(
        "Table \"{table_id}\" is missing from input mapping. \
         Reloading the page and re-saving configuration may fix the problem."
    )]
    MissingInputMapping { table_id: String },

    /// C009: Manifest file not found for a table
    #[error("[C009] Manifest for table '{table_id}' not found: {path}")]
    ManifestNotFound { table_id: String, path: String },

    /// C010: Manifest file could not be parsed
    #[error("[C010] Failed to parse manifest for table '{table_id}': {message}")]
    ManifestParseError { table_id: String, message: String },

    /// C011: IO error with file path context
    #[error("[C011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C012: No data directory given on the command line
    #[error("Data folder not set.")]
    DataDirNotSet,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
