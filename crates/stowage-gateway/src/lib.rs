//! Storage gateway for stowage.
//!
//! The [`Gateway`] validates and uploads media, fetches objects with a
//! servable content type, and translates public links back to keys. A
//! [`Scope`] opened from the gateway records each upload and replace so
//! the workflow can commit or roll back its storage side effects.
//!
//! ```no_run
//! # use stowage_gateway::{Gateway, GatewayError};
//! # async fn save_profile(_key: &stowage_core::ObjectKey) -> Result<(), ()> { Ok(()) }
//! # async fn run(gateway: Gateway, png: bytes::Bytes) -> Result<(), GatewayError> {
//! let mut scope = gateway.begin();
//! let key = scope.put("avatar.png", png, "users/42", &["image/png"]).await?;
//! match save_profile(&key).await {
//!     Ok(()) => scope.commit(),
//!     Err(()) => {
//!         let report = scope.rollback().await;
//!         tracing::warn!(summary = %report.summary(), "profile save failed");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod content_type;
mod error;
mod gateway;
mod link;
pub mod providers;
mod scope;
mod sniff;

pub use config::{
    Credentials, DEFAULT_LEGACY_HOST, DEFAULT_MIGRATION_HOST, ENV_ACCESS_KEY, ENV_BUCKET,
    ENV_ENDPOINT, ENV_LEGACY_HOST, ENV_MIGRATION_HOST, ENV_REGION, ENV_SECRET_KEY, StoreConfig,
};
pub use content_type::{FALLBACK_CONTENT_TYPE, resolve_content_type};
pub use error::GatewayError;
pub use gateway::{FetchedObject, Gateway};
pub use link::LinkTranslator;
pub use scope::Scope;
pub use sniff::{MagicSniffer, MediaSniffer, OCTET_STREAM, SNIFF_LEN, TEXT_PLAIN_UTF8};
pub use stowage_ledger::{CompensationReport, CompensationStatus, LedgerState};
