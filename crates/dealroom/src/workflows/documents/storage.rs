use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle returned by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(pub String);

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File-blob storage port. Receives and returns ciphertext only.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, BlobStoreError>;
    fn get(&self, reference: &StorageRef) -> Result<Vec<u8>, BlobStoreError>;
    /// Remove the blob stored under `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob {0} not found")]
    Missing(String),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}
