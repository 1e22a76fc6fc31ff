use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, BoxFuture, FutureExt};
use stowage_core::{Action, ObjectKey, ObjectStore, StoreError};
use tokio::runtime::Handle;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::error::{CompensationCause, CompensationError};
use crate::report::{CompensationRecord, CompensationReport, CompensationStatus};

type Outcome = (Result<(), StoreError>, Instant);

struct Pending {
    action: Action,
    dispatched_at: Instant,
    delete: Option<BoxFuture<'static, Result<Outcome, JoinError>>>,
}

/// Undoes recorded storage mutations, best-effort and concurrently.
///
/// Each compensable action gets its own task issuing a delete of its key.
/// On a tokio runtime the tasks are detached from the caller: once
/// dispatched they run to completion even if the future returned by
/// [`Compensator::compensate`] is dropped. On any other executor the
/// deletes run concurrently inside that future instead.
#[derive(Clone)]
pub struct Compensator {
    store: Arc<dyn ObjectStore>,
}

impl Compensator {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Compensate `actions`, which must already be in newest-first order.
    ///
    /// Deletes are dispatched in list order; no completion order is implied.
    /// Never fails: every outcome, including failures, ends up in the
    /// returned report, and failures are logged as one aggregated error.
    pub async fn compensate(&self, actions: Vec<Action>) -> CompensationReport {
        if actions.is_empty() {
            return CompensationReport::empty();
        }

        let runtime = Handle::try_current().ok();
        let (entries, deletes): (Vec<_>, Vec<_>) = actions
            .into_iter()
            .map(|action| self.dispatch(action, runtime.as_ref()))
            .map(|pending| ((pending.action, pending.dispatched_at), pending.delete))
            .unzip();

        let outcomes = future::join_all(deletes.into_iter().map(|delete| async move {
            match delete {
                Some(delete) => Some(delete.await),
                None => None,
            }
        }))
        .await;

        let mut records = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();

        for ((action, dispatched_at), outcome) in entries.into_iter().zip(outcomes) {
            let Some(outcome) = outcome else {
                records.push(CompensationRecord {
                    action,
                    status: CompensationStatus::Skipped,
                    dispatched_at,
                    completed_at: None,
                });
                continue;
            };

            let (status, completed_at) = match outcome {
                Ok((Ok(()), finished)) => (CompensationStatus::Compensated, finished),
                Ok((Err(err), finished)) if err.is_not_found() => {
                    debug!(key = %action.key, "object already absent during compensation");
                    (CompensationStatus::AlreadyAbsent, finished)
                }
                Ok((Err(err), finished)) => {
                    warn!(key = %action.key, kind = %action.kind, error = %err, "compensating delete failed");
                    errors.push(CompensationError {
                        key: action.key.clone(),
                        kind: action.kind,
                        cause: CompensationCause::Store(err),
                    });
                    (CompensationStatus::Failed, finished)
                }
                Err(join_error) => {
                    warn!(key = %action.key, kind = %action.kind, error = %join_error, "compensation task aborted");
                    errors.push(CompensationError {
                        key: action.key.clone(),
                        kind: action.kind,
                        cause: CompensationCause::Aborted(join_error),
                    });
                    (CompensationStatus::Failed, Instant::now())
                }
            };
            records.push(CompensationRecord {
                action,
                status,
                dispatched_at,
                completed_at: Some(completed_at),
            });
        }

        let report = CompensationReport::new(records, errors);
        if let Some(failures) = report.failures() {
            error!(failures = %failures, "rollback left objects behind");
        } else {
            debug!(deletes = report.delete_calls(), "rollback compensated all actions");
        }
        report
    }

    fn dispatch(&self, action: Action, runtime: Option<&Handle>) -> Pending {
        let dispatched_at = Instant::now();
        if !action.kind.is_compensable() {
            debug!(key = %action.key, kind = %action.kind, "no compensation for action");
            return Pending {
                action,
                dispatched_at,
                delete: None,
            };
        }

        debug!(key = %action.key, kind = %action.kind, "dispatching compensating delete");
        let delete = timed_delete(Arc::clone(&self.store), action.key.clone());
        let delete = match runtime {
            Some(runtime) => runtime.spawn(delete).boxed(),
            None => delete.map(Ok).boxed(),
        };
        Pending {
            action,
            dispatched_at,
            delete: Some(delete),
        }
    }
}

async fn timed_delete(store: Arc<dyn ObjectStore>, key: ObjectKey) -> Outcome {
    let result = store.delete(&key).await;
    (result, Instant::now())
}

#[cfg(test)]
mod tests {
    use stowage_core::ObjectKey;
    use stowage_core::testing::RecordingStore;

    use super::*;

    fn key(raw: &str) -> ObjectKey {
        ObjectKey::parse(raw).expect("valid key")
    }

    #[test]
    fn compensates_without_a_tokio_runtime() {
        let (a, b) = (key("a/1"), key("a/2"));
        let store = Arc::new(RecordingStore::new().failing_delete_for(&b));
        store.seed(&a, b"1", None);
        let compensator = Compensator::new(store.clone());

        let report = futures::executor::block_on(compensator.compensate(vec![
            Action::upload(b.clone()),
            Action::delete(key("a/9")),
            Action::upload(a.clone()),
        ]));

        assert_eq!(store.delete_count(), 2);
        assert!(!store.contains(&a));
        assert_eq!(report.failed_keys(), vec![&b]);
        let statuses: Vec<CompensationStatus> =
            report.records().iter().map(|record| record.status).collect();
        assert_eq!(
            statuses,
            vec![
                CompensationStatus::Failed,
                CompensationStatus::Skipped,
                CompensationStatus::Compensated,
            ]
        );
    }

    #[tokio::test]
    async fn empty_action_list_makes_no_calls() {
        let store = Arc::new(RecordingStore::new());
        let compensator = Compensator::new(store.clone());

        let report = compensator.compensate(Vec::new()).await;

        assert!(report.is_clean());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn delete_actions_are_skipped_without_remote_calls() {
        let store = Arc::new(RecordingStore::new());
        let compensator = Compensator::new(store.clone());

        let report = compensator
            .compensate(vec![Action::delete(key("a/1")), Action::delete(key("a/2"))])
            .await;

        assert_eq!(store.call_count(), 0);
        assert_eq!(report.delete_calls(), 0);
        assert!(
            report
                .records()
                .iter()
                .all(|record| record.status == CompensationStatus::Skipped)
        );
    }

    #[tokio::test]
    async fn missing_object_counts_as_already_undone() {
        let store = Arc::new(RecordingStore::new());
        let compensator = Compensator::new(store.clone());

        let report = compensator
            .compensate(vec![Action::upload(key("a/never-written"))])
            .await;

        assert!(report.is_clean());
        assert_eq!(report.records()[0].status, CompensationStatus::AlreadyAbsent);
        assert_eq!(store.delete_count(), 1);
    }

    #[tokio::test]
    async fn records_follow_dispatch_order() {
        let store = Arc::new(RecordingStore::new());
        store.seed(&key("a/1"), b"1", None);
        store.seed(&key("a/3"), b"3", None);
        let compensator = Compensator::new(store.clone());

        let report = compensator
            .compensate(vec![
                Action::update(key("a/3")),
                Action::delete(key("a/2")),
                Action::upload(key("a/1")),
            ])
            .await;

        let keys: Vec<&str> = report
            .records()
            .iter()
            .map(|record| record.action.key.as_str())
            .collect();
        assert_eq!(keys, vec!["a/3", "a/2", "a/1"]);
        assert!(store.keys().is_empty());
    }
}
