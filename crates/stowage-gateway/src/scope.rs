use std::sync::Arc;

use bytes::Bytes;
use stowage_core::{Action, ObjectKey};
use stowage_ledger::{CompensationReport, Compensator, Ledger, LedgerState};
use tracing::{debug, error, warn};

use crate::error::GatewayError;
use crate::gateway::{FetchedObject, Gateway};

/// One workflow's reversible storage session.
///
/// Every successful [`Scope::put`] and [`Scope::replace`] is recorded
/// before the call returns. [`Scope::commit`] discards the record;
/// [`Scope::rollback`] deletes every uploaded or replaced object. Both are
/// terminal and repeating either does nothing.
///
/// A scope is owned by exactly one workflow and is not shared.
pub struct Scope<'g> {
    gateway: &'g Gateway,
    ledger: Ledger,
}

impl<'g> Scope<'g> {
    pub(crate) fn new(gateway: &'g Gateway) -> Self {
        debug!("storage scope opened");
        Self {
            gateway,
            ledger: Ledger::new(),
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &'g Gateway {
        self.gateway
    }

    /// Upload and record an `Upload` action.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::put`], plus [`GatewayError::ScopeClosed`] once the
    /// scope was committed or rolled back. Nothing is recorded on error.
    pub async fn put(
        &mut self,
        name: &str,
        content: Bytes,
        folder: &str,
        allowed: &[&str],
    ) -> Result<ObjectKey, GatewayError> {
        self.ensure_active()?;
        self.gateway
            .put_recorded(name, content, folder, allowed, Some(&mut self.ledger))
            .await
    }

    /// Overwrite and record an `Update` action.
    ///
    /// # Errors
    ///
    /// Same as [`Scope::put`].
    pub async fn replace(
        &mut self,
        key: &ObjectKey,
        content: Bytes,
        allowed: &[&str],
    ) -> Result<ObjectKey, GatewayError> {
        self.ensure_active()?;
        self.gateway
            .replace_recorded(key, content, allowed, Some(&mut self.ledger))
            .await
    }

    /// Delete without recording anything; deletes cannot be undone.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::delete`].
    pub async fn delete(&mut self, key: &ObjectKey) -> Result<(), GatewayError> {
        self.gateway.delete(key).await
    }

    /// # Errors
    ///
    /// Same as [`Gateway::fetch`].
    pub async fn fetch(&self, key: &ObjectKey) -> Result<FetchedObject, GatewayError> {
        self.gateway.fetch(key).await
    }

    /// # Errors
    ///
    /// Same as [`Gateway::translate`].
    pub fn translate(&self, link: &str) -> Result<ObjectKey, GatewayError> {
        self.gateway.translate(link)
    }

    /// Keep every recorded mutation.
    pub fn commit(&mut self) {
        self.ledger.commit();
    }

    /// Undo every recorded upload and update.
    ///
    /// Always completes; failures are logged and reported, never returned
    /// as errors.
    pub async fn rollback(&mut self) -> CompensationReport {
        let actions = self.ledger.drain_for_rollback();
        if actions.is_empty() {
            return CompensationReport::empty();
        }
        debug!(actions = actions.len(), "rolling back storage scope");
        self.compensator().compensate(actions).await
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        self.ledger.actions()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ledger.is_active()
    }

    #[must_use]
    pub fn state(&self) -> LedgerState {
        self.ledger.state()
    }

    fn ensure_active(&self) -> Result<(), GatewayError> {
        if self.ledger.is_active() {
            Ok(())
        } else {
            Err(GatewayError::ScopeClosed {
                state: self.ledger.state(),
            })
        }
    }

    fn compensator(&self) -> Compensator {
        Compensator::new(Arc::clone(self.gateway.store()))
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if !self.ledger.is_active() || !self.ledger.has_compensable_actions() {
            return;
        }
        let actions = self.ledger.drain_for_rollback();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            warn!(
                actions = actions.len(),
                "storage scope dropped without commit or rollback; compensating in background"
            );
            let compensator = self.compensator();
            handle.spawn(async move {
                compensator.compensate(actions).await;
            });
        } else {
            let keys: Vec<String> = actions
                .iter()
                .filter(|action| action.kind.is_compensable())
                .map(|action| action.key.to_string())
                .collect();
            error!(
                ?keys,
                "storage scope dropped outside a runtime; objects were not compensated"
            );
        }
    }
}
