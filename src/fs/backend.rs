use anyhow::Result;
use async_trait::async_trait;

use crate::fs::types::{ObjectMetadata, RemoteObject};

/// Object store the deployer talks to.
///
/// Handles are passed explicitly (`Arc<dyn ObjectStore>`) so tests can swap
/// in [`MemoryStore`](crate::fs::MemoryStore).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in the bucket with its fingerprint
    async fn list(&self) -> Result<Vec<RemoteObject>>;

    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: Vec<u8>, metadata: &ObjectMetadata) -> Result<()>;

    /// Delete the object at `key`
    async fn delete(&self, key: &str) -> Result<()>;

    /// Bucket name, for banners and display
    fn bucket(&self) -> &str;

    /// Display form of a key
    fn display_path(&self, key: &str) -> String {
        format!("{}/{}", self.bucket(), key)
    }
}
