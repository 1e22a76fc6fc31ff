use std::time::Instant;

use stowage_core::{Action, ObjectKey};

use crate::error::{CompensationError, CompensationFailures};

/// Outcome of compensating one recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompensationStatus {
    /// The compensating delete succeeded.
    Compensated,
    /// The object was already gone; treated as undone.
    AlreadyAbsent,
    /// The action has no compensation; no call was made.
    Skipped,
    /// The compensating delete failed.
    Failed,
}

impl CompensationStatus {
    /// Whether this outcome issued a remote delete.
    #[must_use]
    pub const fn issued_delete(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Record of one action's compensation.
#[derive(Debug, Clone)]
pub struct CompensationRecord {
    /// The action being undone.
    pub action: Action,
    /// Final status.
    pub status: CompensationStatus,
    /// When the compensation was dispatched.
    pub dispatched_at: Instant,
    /// When the compensation finished. `None` for skipped actions.
    pub completed_at: Option<Instant>,
}

/// Result of one rollback, listed in dispatch (newest-first) order.
#[derive(Debug, Default)]
pub struct CompensationReport {
    records: Vec<CompensationRecord>,
    failures: Option<CompensationFailures>,
}

impl CompensationReport {
    /// A report for a rollback that had nothing to do.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(records: Vec<CompensationRecord>, errors: Vec<CompensationError>) -> Self {
        Self {
            records,
            failures: CompensationFailures::new(errors),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[CompensationRecord] {
        &self.records
    }

    /// Number of remote deletes this rollback issued.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status.issued_delete())
            .count()
    }

    /// Aggregated diagnostic, if any compensation failed.
    #[must_use]
    pub fn failures(&self) -> Option<&CompensationFailures> {
        self.failures.as_ref()
    }

    #[must_use]
    pub fn into_failures(self) -> Option<CompensationFailures> {
        self.failures
    }

    #[must_use]
    pub fn failed_keys(&self) -> Vec<&ObjectKey> {
        self.records
            .iter()
            .filter(|record| record.status == CompensationStatus::Failed)
            .map(|record| &record.action.key)
            .collect()
    }

    /// Whether every compensable action was undone.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_none()
    }

    /// One line per action for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                CompensationStatus::Compensated => "↩",
                CompensationStatus::AlreadyAbsent => "∅",
                CompensationStatus::Skipped => "-",
                CompensationStatus::Failed => "⚠",
            };
            lines.push(format!("{status} {}", record.action));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::{ActionKind, StoreError};

    use super::*;
    use crate::error::CompensationCause;

    fn key(raw: &str) -> ObjectKey {
        ObjectKey::parse(raw).expect("valid key")
    }

    fn record(action: Action, status: CompensationStatus) -> CompensationRecord {
        CompensationRecord {
            action,
            status,
            dispatched_at: Instant::now(),
            completed_at: Some(Instant::now()),
        }
    }

    #[test]
    fn empty_report_is_clean() {
        let report = CompensationReport::empty();
        assert!(report.is_clean());
        assert_eq!(report.delete_calls(), 0);
        assert!(report.summary().is_empty());
    }

    #[test]
    fn skipped_actions_do_not_count_as_delete_calls() {
        let report = CompensationReport::new(
            vec![
                record(Action::upload(key("a/1")), CompensationStatus::Compensated),
                record(Action::delete(key("a/2")), CompensationStatus::Skipped),
                record(Action::update(key("a/3")), CompensationStatus::AlreadyAbsent),
            ],
            Vec::new(),
        );

        assert_eq!(report.delete_calls(), 2);
        assert!(report.is_clean());
    }

    #[test]
    fn failures_name_failed_keys() {
        let failed = key("a/2");
        let report = CompensationReport::new(
            vec![
                record(Action::upload(key("a/1")), CompensationStatus::Compensated),
                record(Action::upload(failed.clone()), CompensationStatus::Failed),
            ],
            vec![CompensationError {
                key: failed.clone(),
                kind: ActionKind::Upload,
                cause: CompensationCause::Store(StoreError::transport(
                    "delete",
                    &failed,
                    "connection reset",
                )),
            }],
        );

        assert!(!report.is_clean());
        assert_eq!(report.failed_keys(), vec![&failed]);

        let failures = report.failures().expect("failures present");
        assert_eq!(failures.keys(), vec![&failed]);
        assert!(failures.to_string().starts_with("1 compensation(s) failed:"));
        assert!(failures.to_string().contains("a/2"));
    }

    #[test]
    fn summary_marks_each_status() {
        let report = CompensationReport::new(
            vec![
                record(Action::upload(key("a/1")), CompensationStatus::Compensated),
                record(Action::update(key("a/2")), CompensationStatus::AlreadyAbsent),
                record(Action::delete(key("a/3")), CompensationStatus::Skipped),
                record(Action::upload(key("a/4")), CompensationStatus::Failed),
            ],
            Vec::new(),
        );

        let summary = report.summary();
        assert!(summary.contains("↩ upload a/1"));
        assert!(summary.contains("∅ update a/2"));
        assert!(summary.contains("- delete a/3"));
        assert!(summary.contains("⚠ upload a/4"));
    }
}
