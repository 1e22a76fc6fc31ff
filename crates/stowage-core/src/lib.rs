//! Core types for stowage: object keys, ledger actions, and the remote
//! object store capability that the gateway wraps.

pub mod error;
mod memory;
mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use error::{BoxError, KeyError, StoreError};
pub use memory::MemoryStore;
pub use store::ObjectStore;
pub use types::*;
