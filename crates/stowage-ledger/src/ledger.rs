use stowage_core::Action;
use tracing::debug;

/// Lifecycle state of a [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerState {
    /// Accepting new actions.
    Active,
    /// Committed; recorded actions were discarded.
    Committed,
    /// Rolled back; recorded actions were handed to compensation.
    RolledBack,
}

/// Ordered record of the storage mutations performed by one workflow.
///
/// A ledger only grows while it is active. Commit and rollback are both
/// terminal: once either has happened, further records are ignored and
/// repeating commit or rollback does nothing.
#[derive(Debug)]
pub struct Ledger {
    actions: Vec<Action>,
    state: LedgerState,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Open a fresh, empty, active ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            state: LedgerState::Active,
        }
    }

    /// Append `action` if the ledger is still active.
    ///
    /// Returns whether the action was recorded.
    pub fn record_if_active(&mut self, action: Action) -> bool {
        if self.state != LedgerState::Active {
            debug!(action = %action, state = ?self.state, "ignoring action on inert ledger");
            return false;
        }
        debug!(action = %action, position = self.actions.len(), "recorded storage action");
        self.actions.push(action);
        true
    }

    /// Discard every recorded action and make the ledger inert.
    pub fn commit(&mut self) {
        if self.state != LedgerState::Active {
            return;
        }
        debug!(discarded = self.actions.len(), "ledger committed");
        self.actions.clear();
        self.state = LedgerState::Committed;
    }

    /// Take the recorded actions newest-first and make the ledger inert.
    ///
    /// Returns an empty list if the ledger was already committed or rolled
    /// back.
    pub fn drain_for_rollback(&mut self) -> Vec<Action> {
        if self.state != LedgerState::Active {
            return Vec::new();
        }
        self.state = LedgerState::RolledBack;
        let mut actions = std::mem::take(&mut self.actions);
        actions.reverse();
        actions
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> LedgerState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LedgerState::Active
    }

    /// Whether any recorded action would need a compensating delete.
    #[must_use]
    pub fn has_compensable_actions(&self) -> bool {
        self.actions.iter().any(|action| action.kind.is_compensable())
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::ObjectKey;

    use super::*;

    fn key(raw: &str) -> ObjectKey {
        ObjectKey::parse(raw).expect("valid key")
    }

    #[test]
    fn new_ledger_is_active_and_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_active());
        assert!(ledger.is_empty());
    }

    #[test]
    fn record_appends_in_order_while_active() {
        let mut ledger = Ledger::new();
        assert!(ledger.record_if_active(Action::upload(key("a/1"))));
        assert!(ledger.record_if_active(Action::update(key("a/2"))));

        assert_eq!(
            ledger.actions(),
            &[Action::upload(key("a/1")), Action::update(key("a/2"))]
        );
    }

    #[test]
    fn commit_discards_actions_and_stops_recording() {
        let mut ledger = Ledger::new();
        ledger.record_if_active(Action::upload(key("a/1")));
        ledger.commit();

        assert_eq!(ledger.state(), LedgerState::Committed);
        assert!(ledger.is_empty());
        assert!(!ledger.record_if_active(Action::upload(key("a/2"))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn drain_returns_newest_first() {
        let mut ledger = Ledger::new();
        ledger.record_if_active(Action::upload(key("a/1")));
        ledger.record_if_active(Action::delete(key("a/2")));
        ledger.record_if_active(Action::update(key("a/3")));

        let drained = ledger.drain_for_rollback();

        assert_eq!(
            drained,
            vec![
                Action::update(key("a/3")),
                Action::delete(key("a/2")),
                Action::upload(key("a/1")),
            ]
        );
        assert_eq!(ledger.state(), LedgerState::RolledBack);
        assert!(ledger.is_empty());
    }

    #[test]
    fn drain_after_commit_or_rollback_is_empty() {
        let mut committed = Ledger::new();
        committed.record_if_active(Action::upload(key("a/1")));
        committed.commit();
        assert!(committed.drain_for_rollback().is_empty());
        assert_eq!(committed.state(), LedgerState::Committed);

        let mut rolled_back = Ledger::new();
        rolled_back.record_if_active(Action::upload(key("a/1")));
        assert_eq!(rolled_back.drain_for_rollback().len(), 1);
        assert!(rolled_back.drain_for_rollback().is_empty());
        rolled_back.commit();
        assert_eq!(rolled_back.state(), LedgerState::RolledBack);
    }

    #[test]
    fn delete_only_ledger_has_nothing_to_compensate() {
        let mut ledger = Ledger::new();
        ledger.record_if_active(Action::delete(key("a/1")));
        assert!(!ledger.has_compensable_actions());

        ledger.record_if_active(Action::upload(key("a/2")));
        assert!(ledger.has_compensable_actions());
    }
}
