//! Ledger and compensation for storage side effects.
//!
//! A [`Ledger`] accumulates the storage mutations one workflow performs. On
//! commit the history is discarded; on rollback the [`Compensator`] undoes
//! every upload and update concurrently, collecting failures into a
//! [`CompensationReport`] instead of raising them.

mod compensator;
mod error;
mod ledger;
mod report;

pub use compensator::Compensator;
pub use error::{CompensationCause, CompensationError, CompensationFailures};
pub use ledger::{Ledger, LedgerState};
pub use report::{CompensationRecord, CompensationReport, CompensationStatus};
