// Path normalization between the local tree and bucket keys
// Keys are always '/'-separated with no leading or trailing separator

use std::path::{Component, Path, PathBuf};

use crate::error::DeployError;

/// Join local paths and build remote keys for one deploy root.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    root: PathBuf,
    prefix: String,
}

impl KeyBuilder {
    pub fn new(root: &Path, prefix: &str) -> Result<Self, DeployError> {
        if root.as_os_str().is_empty() {
            return Err(DeployError::Path {
                path: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
        })
    }

    /// Remote key for a path relative to the root.
    pub fn remote_key(&self, relative: &str) -> String {
        let joined = collapse_separators(&format!("{}/{}", self.prefix, relative));
        let trimmed = joined.strip_prefix('/').unwrap_or(&joined);
        trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
    }

    /// Absolute location of a relative path.
    pub fn local_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }
}

/// Replace every run of '/' with a single '/'.
pub fn collapse_separators(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        result.push(c);
    }
    result
}

/// Render a relative path with '/' separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
