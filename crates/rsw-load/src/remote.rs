//! Object-storage access for sliced exports
//!
//! A sliced export is indexed by a manifest-of-parts object next to the data
//! parts. The bulk loader reads it before issuing `COPY ... MANIFEST` so an
//! export with no parts can be skipped.

use crate::error::{LoadError, LoadResult};
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectStorePath;
use object_store::ObjectStore;
use rsw_core::{PartsManifest, StorageLocator};
use std::sync::Arc;

/// Reads manifest-of-parts objects.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Fetch and parse the parts manifest `locator` points at.
    async fn fetch_parts_manifest(&self, locator: &StorageLocator) -> LoadResult<PartsManifest>;
}

/// S3 access using the short-lived credentials carried by each locator.
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Remote;

impl S3Remote {
    fn store_for(locator: &StorageLocator) -> LoadResult<AmazonS3> {
        let credentials = &locator.credentials;
        let mut builder = AmazonS3Builder::new()
            .with_region(&locator.region)
            .with_bucket_name(&locator.bucket)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key);
        if !credentials.session_token.is_empty() {
            builder = builder.with_token(&credentials.session_token);
        }
        builder.build().map_err(|e| LoadError::RemoteManifest {
            url: locator.url(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RemoteStorage for S3Remote {
    async fn fetch_parts_manifest(&self, locator: &StorageLocator) -> LoadResult<PartsManifest> {
        let store = Self::store_for(locator)?;
        read_parts_manifest(&store, locator).await
    }
}

/// Any `ObjectStore` rooted at the bucket (object keys are used as-is).
///
/// Lets the loader run against `InMemory` or a local file system.
#[derive(Debug, Clone)]
pub struct ObjectStoreRemote {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreRemote {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RemoteStorage for ObjectStoreRemote {
    async fn fetch_parts_manifest(&self, locator: &StorageLocator) -> LoadResult<PartsManifest> {
        read_parts_manifest(self.store.as_ref(), locator).await
    }
}

async fn read_parts_manifest(
    store: &dyn ObjectStore,
    locator: &StorageLocator,
) -> LoadResult<PartsManifest> {
    let url = locator.url();
    let failed = |message: String| LoadError::RemoteManifest {
        url: url.clone(),
        message,
    };

    log::debug!("Downloading parts manifest '{}'", url);
    let path = ObjectStorePath::from(locator.object_key());
    let bytes = store
        .get(&path)
        .await
        .map_err(|e| failed(e.to_string()))?
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?;

    PartsManifest::from_slice(&bytes).map_err(|e| failed(e.to_string()))
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;
