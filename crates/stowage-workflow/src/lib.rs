//! Workflow helpers that tie a database unit of work to a storage scope.
//!
//! [`run_in_scope`] commits storage side effects only when the database
//! commits, and compensates them otherwise. The coordination components
//! replace process-wide globals with values owned by the application.

mod coordination;
mod error;
mod runner;
mod unit_of_work;

pub use coordination::{RegistrationCoordinator, RegistrationGuard, TokenEpochStore};
pub use error::WorkflowError;
pub use runner::run_in_scope;
pub use unit_of_work::{TransactionSource, UnitOfWork, UnitOfWorkError};
