//! Name-based exclusion for directory enumeration.
//!
//! Entries are matched by file name only, so an excluded directory is pruned
//! together with everything below it.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Entries never enumerated: version-control metadata.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git"];

/// Glob set matched against entry names.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    glob_set: GlobSet,
}

impl ExcludePatterns {
    /// Create with the default exclude patterns.
    pub fn with_defaults() -> Self {
        let mut builder = GlobSetBuilder::new();

        for pattern in DEFAULT_EXCLUDES {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }

        Self {
            glob_set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    /// Check if an entry name should be skipped.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.glob_set.is_match(name)
    }
}
