use thiserror::Error;

use crate::types::ObjectKey;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A rejected object key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("object key is empty")]
    Empty,

    #[error("object key '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("object key '{0}' starts with '/'")]
    LeadingSlash(String),

    #[error("file name '{0}' contains '/'")]
    NameContainsSeparator(String),
}

/// Failure reported by an [`ObjectStore`](crate::ObjectStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed for object '{key}'")]
    Transport {
        operation: &'static str,
        key: ObjectKey,
        #[source]
        source: BoxError,
    },

    #[error("object '{key}' not found")]
    NotFound { key: ObjectKey },
}

impl StoreError {
    pub fn transport(
        operation: &'static str,
        key: &ObjectKey,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            operation,
            key: key.clone(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn key(&self) -> &ObjectKey {
        match self {
            Self::Transport { key, .. } | Self::NotFound { key } => key,
        }
    }
}
