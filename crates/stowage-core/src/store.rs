use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::types::{ObjectKey, StoredObject};

/// Remote object storage capability.
///
/// Implementations carry only fixed configuration and must be safe to share
/// between concurrent workflows.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the store cannot be reached or
    /// rejects the request.
    async fn put(&self, key: &ObjectKey, body: Bytes, content_type: &str)
    -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no object exists under `key`.
    async fn get(&self, key: &ObjectKey) -> Result<StoredObject, StoreError>;

    /// # Errors
    ///
    /// Backends that distinguish missing objects return
    /// [`StoreError::NotFound`]; others treat the delete as successful.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;
}
