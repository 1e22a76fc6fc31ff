use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::store::ObjectStore;
use crate::types::{ObjectKey, StoredObject};

/// In-process [`ObjectStore`] backed by a map.
///
/// Deleting a missing key reports [`StoreError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectKey, StoredObject>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of every stored key.
    #[must_use]
    pub fn keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<ObjectKey> = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub(crate) fn insert_raw(&self, key: &ObjectKey, object: StoredObject) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), object);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.insert_raw(
            key,
            StoredObject {
                body,
                content_type: Some(content_type.to_string()),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<StoredObject, StoreError> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }
}
