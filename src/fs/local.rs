use jwalk::{Parallelism, WalkDir};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::DeployError;
use crate::sync::exclude::ExcludePatterns;
use crate::sync::path::to_slash;

/// A file found by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// `/`-separated path relative to the deploy root.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl LocalFile {
    /// Size on disk, read on demand.
    pub fn size(&self) -> io::Result<u64> {
        fs::metadata(&self.absolute_path).map(|m| m.len())
    }
}

/// Recursive enumerator for the deploy root.
pub struct LocalTree {
    excludes: ExcludePatterns,
}

impl Default for LocalTree {
    fn default() -> Self {
        Self::new(ExcludePatterns::with_defaults())
    }
}

impl LocalTree {
    pub fn new(excludes: ExcludePatterns) -> Self {
        Self { excludes }
    }

    /// Collect every regular file under `root`, sorted by relative path.
    pub fn enumerate(&self, root: &Path) -> Result<Vec<LocalFile>, DeployError> {
        if !root.is_dir() {
            return Err(DeployError::Path {
                path: root.to_path_buf(),
            });
        }

        let excludes = self.excludes.clone();
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(entry) => !excludes.is_excluded(&entry.file_name().to_string_lossy()),
                    Err(_) => true,
                });
            });

        let mut files = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error walking {}: {}", root.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            // Follows symlinks so linked files are deployed like regular ones
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = match path.strip_prefix(root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            // Keys are UTF-8; a lossy name would point at a file that does not exist
            if relative.to_str().is_none() {
                tracing::warn!("Skipping non UTF-8 path {}", path.display());
                continue;
            }
            let relative = to_slash(relative);

            files.push(LocalFile {
                relative_path: relative,
                absolute_path: path,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}
