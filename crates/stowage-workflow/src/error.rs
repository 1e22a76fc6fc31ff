use stowage_ledger::CompensationReport;
use thiserror::Error;

/// Failure of a workflow run by [`run_in_scope`](crate::run_in_scope).
///
/// `E` is the workflow's own error; `D` is the database error. The
/// compensation report describes the storage rollback that followed.
#[derive(Debug, Error)]
pub enum WorkflowError<E, D> {
    #[error("failed to begin unit of work")]
    Begin(#[source] D),

    #[error("workflow failed; storage rolled back")]
    Work {
        #[source]
        source: E,
        compensation: CompensationReport,
    },

    #[error("failed to commit unit of work; storage rolled back")]
    Commit {
        #[source]
        source: D,
        compensation: CompensationReport,
    },
}

impl<E, D> WorkflowError<E, D> {
    /// Storage compensation performed before the error was returned.
    #[must_use]
    pub fn compensation(&self) -> Option<&CompensationReport> {
        match self {
            Self::Begin(_) => None,
            Self::Work { compensation, .. } | Self::Commit { compensation, .. } => {
                Some(compensation)
            }
        }
    }
}
