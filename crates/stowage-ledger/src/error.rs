use std::fmt;

use stowage_core::{ActionKind, ObjectKey, StoreError};
use thiserror::Error;

/// Why a single compensating delete did not succeed.
#[derive(Debug, Error)]
pub enum CompensationCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("compensation task did not run to completion")]
    Aborted(#[source] tokio::task::JoinError),
}

/// Error from a failed compensation operation.
#[derive(Debug, Error)]
#[error("compensation failed for {kind} of '{key}'")]
pub struct CompensationError {
    /// Key whose compensating delete failed.
    pub key: ObjectKey,
    /// Kind of the action that was being undone.
    pub kind: ActionKind,
    /// The underlying error.
    #[source]
    pub cause: CompensationCause,
}

/// Every compensation failure from one rollback, as a single diagnostic.
#[derive(Debug)]
pub struct CompensationFailures {
    errors: Vec<CompensationError>,
}

impl CompensationFailures {
    pub(crate) fn new(errors: Vec<CompensationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[CompensationError] {
        &self.errors
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&ObjectKey> {
        self.errors.iter().map(|error| &error.key).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for CompensationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} compensation(s) failed:", self.errors.len())?;
        for error in &self.errors {
            write!(f, " [{}: {}]", error.key, error.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompensationFailures {}
