use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

/// Serializes registration critical sections across tasks.
///
/// Construct one per process and share it with every registration path.
#[derive(Debug, Default)]
pub struct RegistrationCoordinator {
    lock: Mutex<()>,
}

/// Held for the duration of one registration.
#[derive(Debug)]
#[must_use = "the registration lock is released when the guard is dropped"]
pub struct RegistrationGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl RegistrationCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other registration is in progress.
    pub async fn acquire(&self) -> RegistrationGuard<'_> {
        RegistrationGuard {
            _guard: self.lock.lock().await,
        }
    }

    /// `None` if another registration holds the lock.
    pub fn try_acquire(&self) -> Option<RegistrationGuard<'_>> {
        self.lock
            .try_lock()
            .ok()
            .map(|guard| RegistrationGuard { _guard: guard })
    }
}

/// Latest token-issue epoch per subject.
///
/// Tokens issued before a subject's latest epoch are superseded, for
/// example after a password reset.
#[derive(Debug, Default)]
pub struct TokenEpochStore {
    epochs: RwLock<HashMap<String, u64>>,
}

impl TokenEpochStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new epoch for `subject`. Epochs never move backwards.
    ///
    /// Returns the epoch in effect after the call.
    pub fn record(&self, subject: &str, epoch: u64) -> u64 {
        let mut epochs = self
            .epochs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let current = epochs.entry(subject.to_string()).or_insert(epoch);
        *current = (*current).max(epoch);
        *current
    }

    #[must_use]
    pub fn latest(&self, subject: &str) -> Option<u64> {
        self.epochs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .copied()
    }

    /// Whether a token issued at `issued_at` predates the latest epoch.
    #[must_use]
    pub fn is_superseded(&self, subject: &str, issued_at: u64) -> bool {
        self.latest(subject).is_some_and(|latest| issued_at < latest)
    }

    pub fn forget(&self, subject: &str) -> Option<u64> {
        self.epochs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject)
    }
}
