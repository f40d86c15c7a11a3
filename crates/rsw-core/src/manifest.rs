//! Export manifests: where an exported table lives and how to read it.
//!
//! The exporter writes one `<tableId>.csv.manifest` file per table into
//! `<dataDir>/in/tables/`. A sliced export additionally stores a
//! manifest-of-parts object next to the data parts in object storage.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::REDACTED;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix the exporter appends to the object key of a sliced export.
pub const SLICED_MANIFEST_SUFFIX: &str = "manifest";

/// Manifest describing one exported table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Exported column names, in CSV order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Object-storage location of the data
    #[serde(rename = "s3")]
    pub storage: StorageLocator,
}

/// Object-storage location and access credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageLocator {
    /// Whether the export was split into parts indexed by a manifest-of-parts
    #[serde(rename = "isSliced", default)]
    pub is_sliced: bool,

    /// Bucket region
    pub region: String,

    /// Bucket name
    pub bucket: String,

    /// Object key (of the data file, or of the manifest-of-parts when sliced)
    pub key: String,

    /// Short-lived credentials granting read access
    pub credentials: Credentials,
}

impl StorageLocator {
    /// Object key to read: sliced keys always end with the manifest suffix.
    pub fn object_key(&self) -> String {
        if self.is_sliced && !self.key.ends_with(SLICED_MANIFEST_SUFFIX) {
            format!("{}{}", self.key, SLICED_MANIFEST_SUFFIX)
        } else {
            self.key.clone()
        }
    }

    /// `bucket/key` path as used in `s3://` URLs.
    pub fn object_path(&self) -> String {
        format!("{}/{}", self.bucket, self.object_key())
    }

    /// Full `s3://bucket/key` URL.
    pub fn url(&self) -> String {
        format!("s3://{}", self.object_path())
    }
}

/// Short-lived object-storage credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &REDACTED)
            .field("secret_access_key", &REDACTED)
            .field("session_token", &REDACTED)
            .finish()
    }
}

/// Manifest-of-parts object stored next to a sliced export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartsManifest {
    #[serde(default)]
    pub entries: Vec<PartEntry>,
}

/// One data part of a sliced export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub url: String,
    #[serde(default)]
    pub mandatory: bool,
}

impl PartsManifest {
    /// Parse the JSON body of a manifest-of-parts object.
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// True when the export produced no data parts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Manifest {
    /// Path of the manifest file for `table_id` inside a data directory.
    pub fn path_for(data_dir: &Path, table_id: &str) -> PathBuf {
        data_dir
            .join("in")
            .join("tables")
            .join(format!("{table_id}.csv.manifest"))
    }

    /// Load and parse the manifest of `table_id` from a data directory.
    pub fn load(data_dir: &Path, table_id: &str) -> CoreResult<Self> {
        let path = Self::path_for(data_dir, table_id);
        if !path.exists() {
            return Err(CoreError::ManifestNotFound {
                table_id: table_id.to_string(),
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| CoreError::ManifestParseError {
            table_id: table_id.to_string(),
            message: e.to_string(),
        })
    }

    /// Ensure the exported columns match `expected` exactly, order included.
    pub fn check_columns(&self, table_id: &str, expected: &[&str]) -> CoreResult<()> {
        let matches = self.columns.len() == expected.len()
            && self.columns.iter().zip(expected).all(|(a, b)| a == b);
        if matches {
            Ok(())
        } else {
            Err(CoreError::ColumnMismatch {
                table_id: table_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;
