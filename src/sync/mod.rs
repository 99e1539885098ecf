//! Synchronization and reconciliation
//!
//! Decides, for every local candidate, whether to upload, skip or replace it
//! with its gzip twin, and which remote objects to prune afterwards.

pub mod engine;
pub mod exclude;
pub mod oracle;
pub mod path;
pub mod planner;
pub mod reconcile;
pub mod report;
pub mod twin;

pub use engine::SyncEngine;
pub use exclude::ExcludePatterns;
pub use oracle::{fingerprint, RemoteIndex};
pub use path::KeyBuilder;
pub use planner::{MetadataRule, RuleEffect, RuleSubject, UploadPlanner};
pub use reconcile::Reconciler;
pub use report::{ActiveSet, DeleteReport, ItemFailure, SyncDecision, SyncEvent, SyncReport};
pub use twin::{ResolvedFile, TwinPair, TwinResolver};
