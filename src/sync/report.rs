//! Decisions, events and reports produced by a pass.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::error::DeployError;
use crate::fs::types::ObjectMetadata;

/// Outcome for one candidate or one remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SyncDecision {
    Upload {
        source: PathBuf,
        key: String,
        metadata: ObjectMetadata,
    },
    Skip {
        key: String,
    },
    Deleted {
        key: String,
    },
}

impl SyncDecision {
    pub fn key(&self) -> &str {
        match self {
            Self::Upload { key, .. } => key,
            Self::Skip { key } => key,
            Self::Deleted { key } => key,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload { .. })
    }
}

/// Report line: `Uploaded\t<key> (<extra info>)`, `Skipped\t<key>`, `Deleted\t<key>`.
impl fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload { key, metadata, .. } => {
                write!(f, "Uploaded\t{}", key)?;
                let info = metadata.extra_info();
                if !info.is_empty() {
                    write!(f, " ({})", info.join(", "))?;
                }
                Ok(())
            }
            Self::Skip { key } => write!(f, "Skipped\t{}", key),
            Self::Deleted { key } => write!(f, "Deleted\t{}", key),
        }
    }
}

/// A per-item error that did not stop the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Relative path or remote key the failure concerns.
    pub subject: String,
    pub message: String,
}

impl ItemFailure {
    pub fn new(subject: &str, error: &DeployError) -> Self {
        Self {
            subject: subject.to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed\t{}: {}", self.subject, self.message)
    }
}

/// Emitted as soon as a decision or failure happens.
#[derive(Debug, Clone, Copy)]
pub enum SyncEvent<'a> {
    Decision(&'a SyncDecision),
    Failure(&'a ItemFailure),
}

/// Type alias for event callback function
pub type EventCallback = Box<dyn Fn(SyncEvent<'_>) + Send + Sync>;

/// Keys confirmed by the current pass; the reconciliation baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveSet(BTreeSet<String>);

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of reconciliation or of emptying a bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteReport {
    /// Keys deleted (or that would be, when simulating), in listing order.
    pub deleted: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub simulate: bool,
}

impl DeleteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a sync pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Every decision, in the order it was made.
    pub decisions: Vec<SyncDecision>,
    pub failures: Vec<ItemFailure>,
    pub active: ActiveSet,
    pub bytes_uploaded: u64,
    pub simulate: bool,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.count(|d| matches!(d, SyncDecision::Upload { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|d| matches!(d, SyncDecision::Skip { .. }))
    }

    pub fn deleted(&self) -> usize {
        self.count(|d| matches!(d, SyncDecision::Deleted { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The decision lines exactly as printed during the pass.
    pub fn lines(&self) -> Vec<String> {
        self.decisions.iter().map(ToString::to_string).collect()
    }

    fn count(&self, predicate: impl Fn(&SyncDecision) -> bool) -> usize {
        self.decisions.iter().filter(|d| predicate(d)).count()
    }
}
