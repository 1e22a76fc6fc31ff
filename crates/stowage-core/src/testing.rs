use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::store::ObjectStore;
use crate::types::{ObjectKey, StoredObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { key: ObjectKey, content_type: String },
    Get(ObjectKey),
    Delete(ObjectKey),
}

#[derive(Debug)]
struct InjectedFailure(&'static str);

impl fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected {} failure", self.0)
    }
}

impl std::error::Error for InjectedFailure {}

/// [`ObjectStore`] double that records every call and fails on request.
///
/// Calls are recorded before the failure check, so a failed call still
/// counts as a remote call.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    failing_puts: Mutex<HashSet<ObjectKey>>,
    failing_deletes: Mutex<HashSet<ObjectKey>>,
    fail_all_puts: AtomicBool,
    fail_all_deletes: AtomicBool,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_put_for(self, key: &ObjectKey) -> Self {
        self.failing_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        self
    }

    #[must_use]
    pub fn failing_delete_for(self, key: &ObjectKey) -> Self {
        self.failing_deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        self
    }

    #[must_use]
    pub fn failing_all_puts(self) -> Self {
        self.fail_all_puts.store(true, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn failing_all_deletes(self) -> Self {
        self.fail_all_deletes.store(true, Ordering::SeqCst);
        self
    }

    /// Seed an object without recording a call.
    pub fn seed(&self, key: &ObjectKey, body: &'static [u8], content_type: Option<&str>) {
        self.inner.insert_raw(
            key,
            StoredObject {
                body: Bytes::from_static(body),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn deleted_keys(&self) -> Vec<ObjectKey> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Delete(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deleted_keys().len()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.inner.contains(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<ObjectKey> {
        self.inner.keys()
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn should_fail(
        all: &AtomicBool,
        keys: &Mutex<HashSet<ObjectKey>>,
        key: &ObjectKey,
    ) -> bool {
        all.load(Ordering::SeqCst)
            || keys
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(key)
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Put {
            key: key.clone(),
            content_type: content_type.to_string(),
        });
        if Self::should_fail(&self.fail_all_puts, &self.failing_puts, key) {
            return Err(StoreError::transport("put", key, InjectedFailure("put")));
        }
        self.inner.put(key, body, content_type).await
    }

    async fn get(&self, key: &ObjectKey) -> Result<StoredObject, StoreError> {
        self.record(StoreCall::Get(key.clone()));
        self.inner.get(key).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(key.clone()));
        if Self::should_fail(&self.fail_all_deletes, &self.failing_deletes, key) {
            return Err(StoreError::transport(
                "delete",
                key,
                InjectedFailure("delete"),
            ));
        }
        self.inner.delete(key).await
    }
}
