//! Deletion of remote objects without a local counterpart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DeployError, RemoteOperation};
use crate::fs::backend::ObjectStore;
use crate::fs::types::RemoteObject;
use crate::sync::report::{ActiveSet, DeleteReport, EventCallback, ItemFailure, SyncDecision, SyncEvent};

pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store, cancel: None }
    }

    /// Stop between deletions once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Delete every listed key that is not in `active`.
    ///
    /// Each key is handled on its own: a failed delete is recorded and the
    /// remaining keys are still attempted. With `simulate`, deletions are
    /// only reported.
    pub async fn reconcile(
        &self,
        listing: &[RemoteObject],
        active: &ActiveSet,
        simulate: bool,
        events: Option<&EventCallback>,
    ) -> Result<DeleteReport, DeployError> {
        let mut report = DeleteReport {
            simulate,
            ..Default::default()
        };

        for object in listing.iter().filter(|o| !active.contains(&o.key)) {
            if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(DeployError::Cancelled);
            }

            if !simulate {
                if let Err(e) = self.store.delete(&object.key).await {
                    let error = DeployError::remote(RemoteOperation::Delete, &object.key, &e);
                    tracing::warn!("{}", error);
                    let failure = ItemFailure::new(&object.key, &error);
                    if let Some(callback) = events {
                        callback(SyncEvent::Failure(&failure));
                    }
                    report.failures.push(failure);
                    continue;
                }
            }

            tracing::debug!(key = %object.key, simulate, "deleted");
            let decision = SyncDecision::Deleted {
                key: object.key.clone(),
            };
            if let Some(callback) = events {
                callback(SyncEvent::Decision(&decision));
            }
            report.deleted.push(object.key.clone());
        }

        Ok(report)
    }
}
