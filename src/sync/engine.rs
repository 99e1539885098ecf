//! Sync engine for one-way deployment of a directory tree to a bucket.
//!
//! A pass enumerates the root, drops candidates matching the skip pattern,
//! resolves gzip twins, compares fingerprints against a single listing
//! snapshot, uploads what changed and optionally reconciles. Everything runs
//! one candidate at a time; no two remote calls overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{EffectiveConfig, ErrorPolicy};
use crate::error::{DeployError, RemoteOperation};
use crate::fs::backend::ObjectStore;
use crate::fs::local::LocalTree;
use crate::fs::types::RemoteObject;
use crate::sync::oracle::{fingerprint, RemoteIndex};
use crate::sync::path::KeyBuilder;
use crate::sync::planner::{compile_pattern, UploadPlanner};
use crate::sync::reconcile::Reconciler;
use crate::sync::report::{
    ActiveSet, DeleteReport, EventCallback, ItemFailure, SyncDecision, SyncEvent, SyncReport,
};
use crate::sync::twin::TwinResolver;

/// Per-pass state shared by every candidate.
struct Pass<'a> {
    keys: KeyBuilder,
    planner: UploadPlanner,
    index: RemoteIndex,
    resolver: TwinResolver,
    simulate: bool,
    report: &'a mut SyncReport,
}

pub struct SyncEngine {
    store: Arc<dyn ObjectStore>,
    config: EffectiveConfig,
    tree: LocalTree,
    events: Option<EventCallback>,
    cancel: Arc<AtomicBool>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn ObjectStore>, config: EffectiveConfig) -> Self {
        Self {
            store,
            config,
            tree: LocalTree::default(),
            events: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receive every decision and failure as it happens.
    pub fn with_event_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(SyncEvent<'_>) + Send + Sync + 'static,
    {
        self.events = Some(Box::new(callback));
        self
    }

    /// Flag checked between candidates; setting it stops the pass.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run one sync pass.
    ///
    /// With `simulate`, nothing is written to or deleted from the store, but
    /// every decision is computed and reported exactly as in a real run.
    pub async fn sync(&self, simulate: bool) -> Result<SyncReport, DeployError> {
        tracing::info!(
            bucket = %self.config.bucket,
            root = %self.config.root.display(),
            simulate,
            "starting sync pass"
        );

        let keys = KeyBuilder::new(&self.config.root, &self.config.remote_prefix)?;
        let planner = UploadPlanner::new(&self.config)?;
        let skip = self
            .config
            .skip_pattern
            .as_deref()
            .map(|pattern| compile_pattern("skip_regex", pattern))
            .transpose()?;

        let candidates: Vec<String> = self
            .tree
            .enumerate(&self.config.root)?
            .into_iter()
            .map(|file| file.relative_path)
            .filter(|path| !skip.as_ref().is_some_and(|re| re.is_match(path)))
            .collect();

        let listing = self.list().await?;

        let mut report = SyncReport {
            simulate,
            ..Default::default()
        };
        let mut pass = Pass {
            keys,
            planner,
            index: RemoteIndex::from_listing(&listing),
            resolver: TwinResolver::new(&candidates, self.config.extras.replace_with_gzip),
            simulate,
            report: &mut report,
        };

        for candidate in &candidates {
            self.check_cancelled()?;

            match self.process(candidate, &mut pass).await {
                Ok(Some(decision)) => {
                    tracing::debug!(key = decision.key(), upload = decision.is_upload(), "decided");
                    self.emit(SyncEvent::Decision(&decision));
                    pass.report.decisions.push(decision);
                }
                Ok(None) => {}
                Err(error) => self.record_failure(pass.report, candidate, error)?,
            }
        }

        if self.config.extras.delete_old_files {
            let deletions = self
                .reconciler()
                .reconcile(&listing, &report.active, simulate, self.events.as_ref())
                .await?;
            report.decisions.extend(
                deletions
                    .deleted
                    .into_iter()
                    .map(|key| SyncDecision::Deleted { key }),
            );
            report.failures.extend(deletions.failures);
        }

        tracing::info!(
            uploaded = report.uploaded(),
            skipped = report.skipped(),
            deleted = report.deleted(),
            failed = report.failures.len(),
            "sync pass finished"
        );

        Ok(report)
    }

    /// Delete (or, with `simulate`, report) every object in the bucket.
    pub async fn empty(&self, simulate: bool) -> Result<DeleteReport, DeployError> {
        tracing::info!(bucket = %self.config.bucket, simulate, "emptying bucket");
        let listing = self.list().await?;
        self.reconciler()
            .reconcile(&listing, &ActiveSet::new(), simulate, self.events.as_ref())
            .await
    }

    /// Decide and, unless simulating, transfer one candidate.
    async fn process(
        &self,
        candidate: &str,
        pass: &mut Pass<'_>,
    ) -> Result<Option<SyncDecision>, DeployError> {
        let Some(resolved) = pass.resolver.resolve(candidate, &pass.keys) else {
            return Ok(None);
        };

        // The key has a local counterpart from here on, even if reading or
        // uploading fails
        if !pass.report.active.insert(resolved.key.clone()) {
            tracing::warn!(key = %resolved.key, "key produced by more than one candidate");
            return Ok(None);
        }

        let source = resolved.source()?;
        let data = tokio::fs::read(&source)
            .await
            .map_err(|e| DeployError::from_io_error(e, "reading", &source))?;

        if pass.index.is_current(&resolved.key, &fingerprint(&data)) {
            return Ok(Some(SyncDecision::Skip { key: resolved.key }));
        }

        let metadata = pass.planner.plan(&resolved.key, &source);
        let size = data.len() as u64;

        if !pass.simulate {
            self.store
                .put(&resolved.key, data, &metadata)
                .await
                .map_err(|e| DeployError::remote(RemoteOperation::Put, &resolved.key, &e))?;
        }
        pass.report.bytes_uploaded += size;

        Ok(Some(SyncDecision::Upload {
            source,
            key: resolved.key,
            metadata,
        }))
    }

    async fn list(&self) -> Result<Vec<RemoteObject>, DeployError> {
        self.store
            .list()
            .await
            .map_err(|e| DeployError::remote(RemoteOperation::List, &self.config.bucket, &e))
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.store.clone()).with_cancel(self.cancel.clone())
    }

    fn record_failure(
        &self,
        report: &mut SyncReport,
        candidate: &str,
        error: DeployError,
    ) -> Result<(), DeployError> {
        tracing::warn!("{}", error);
        let failure = ItemFailure::new(candidate, &error);
        self.emit(SyncEvent::Failure(&failure));
        report.failures.push(failure);

        if error.is_fatal() || self.config.on_error == ErrorPolicy::Abort {
            return Err(error);
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), DeployError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(DeployError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, event: SyncEvent<'_>) {
        if let Some(callback) = &self.events {
            callback(event);
        }
    }
}
