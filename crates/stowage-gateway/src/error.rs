use stowage_core::{KeyError, ObjectKey, StoreError};
use stowage_ledger::LedgerState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("media type '{detected}' is not allowed (expected one of: {})", .allowed.join(", "))]
    InvalidMediaType {
        detected: String,
        allowed: Vec<String>,
    },

    #[error("invalid object key")]
    InvalidKey(#[from] KeyError),

    #[error("object '{key}' not found")]
    NotFound { key: ObjectKey },

    #[error("object store request failed")]
    Transport(#[source] StoreError),

    #[error("storage scope is no longer active ({state:?})")]
    ScopeClosed { state: LedgerState },

    #[error("missing configuration value '{name}'")]
    MissingSetting { name: &'static str },

    #[error("failed to parse store configuration")]
    ConfigParse(#[from] toml::de::Error),
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { key } => Self::NotFound { key },
            other @ StoreError::Transport { .. } => Self::Transport(other),
        }
    }
}

impl GatewayError {
    /// Whether the error was raised before any remote call was made.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMediaType { .. } | Self::InvalidKey(_) | Self::ScopeClosed { .. }
        )
    }
}
