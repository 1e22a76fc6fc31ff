use futures::future::BoxFuture;
use stowage_gateway::{Gateway, Scope};
use tracing::{debug, warn};

use crate::error::WorkflowError;
use crate::unit_of_work::{TransactionSource, UnitOfWork, UnitOfWorkError};

/// Run `work` inside a database unit of work and a storage scope.
///
/// - work and database commit succeed: the scope commits and the value is
///   returned.
/// - work succeeds but the database commit fails: the scope rolls back and
///   [`WorkflowError::Commit`] is returned.
/// - work fails: the database rolls back (a failure there is only logged),
///   the scope rolls back, and [`WorkflowError::Work`] is returned.
///
/// If the returned future is dropped mid-run the scope compensates in the
/// background and the unit of work is released by its own drop.
///
/// # Errors
///
/// See the cases above, plus [`WorkflowError::Begin`] when the unit of
/// work cannot be opened. No storage call is made in that case.
pub async fn run_in_scope<'g, S, T, E, F>(
    gateway: &'g Gateway,
    source: &S,
    work: F,
) -> Result<T, WorkflowError<E, UnitOfWorkError<S>>>
where
    S: TransactionSource,
    F: for<'a> FnOnce(&'a mut Scope<'g>, &'a mut S::Transaction) -> BoxFuture<'a, Result<T, E>>,
{
    let mut transaction = source.begin().await.map_err(WorkflowError::Begin)?;
    let mut scope = gateway.begin();

    match work(&mut scope, &mut transaction).await {
        Ok(value) => match transaction.commit().await {
            Ok(()) => {
                let actions = scope.len();
                scope.commit();
                debug!(actions, "workflow committed");
                Ok(value)
            }
            Err(source) => {
                let compensation = scope.rollback().await;
                warn!(summary = %compensation.summary(), "database commit failed; storage rolled back");
                Err(WorkflowError::Commit {
                    source,
                    compensation,
                })
            }
        },
        Err(source) => {
            if let Err(error) = transaction.rollback().await {
                warn!(%error, "database rollback failed");
            }
            let compensation = scope.rollback().await;
            debug!(summary = %compensation.summary(), "workflow failed; storage rolled back");
            Err(WorkflowError::Work {
                source,
                compensation,
            })
        }
    }
}
