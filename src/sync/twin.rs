//! Plain/gzip twin resolution for `replace_with_gzip`.
//!
//! When both `f` and `f.gz` are candidates, only one of them is deployed, under
//! the plain key `f`: the gzip file if it is strictly smaller, otherwise the
//! plain one. Pairs are computed up front from the full candidate list, so the
//! pair is found whichever member is visited first.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DeployError;
use crate::sync::path::KeyBuilder;

const GZIP_SUFFIX: &str = ".gz";

/// A plain file and its gzip counterpart, both present in the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinPair {
    pub plain: String,
    pub compressed: String,
}

/// What to transfer for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Logical relative path (never carries the gzip suffix for a twin).
    pub relative: String,
    /// Remote key.
    pub key: String,
    source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Single(PathBuf),
    Twin { plain: PathBuf, compressed: PathBuf },
}

impl ResolvedFile {
    /// Physical file whose bytes are uploaded.
    ///
    /// For a twin this compares sizes on disk, so it can fail after the key
    /// is already known.
    pub fn source(&self) -> Result<PathBuf, DeployError> {
        match &self.source {
            Source::Single(path) => Ok(path.clone()),
            Source::Twin { plain, compressed } => {
                if file_size(compressed)? < file_size(plain)? {
                    Ok(compressed.clone())
                } else {
                    Ok(plain.clone())
                }
            }
        }
    }
}

/// Strip a trailing `.gz` (any case); requires a non-empty stem.
pub fn strip_gzip_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(GZIP_SUFFIX.len())?;
    if split == 0 {
        return None;
    }
    let suffix = name.get(split..)?;
    if suffix.eq_ignore_ascii_case(GZIP_SUFFIX) {
        name.get(..split)
    } else {
        None
    }
}

pub struct TwinResolver {
    enabled: bool,
    pairs: HashMap<String, TwinPair>,
    resolved: HashSet<String>,
}

impl TwinResolver {
    /// Build the resolver from every candidate of the pass, in enumeration order.
    pub fn new<S: AsRef<str>>(candidates: &[S], enabled: bool) -> Self {
        let mut pairs = HashMap::new();

        if enabled {
            let names: HashSet<&str> = candidates.iter().map(|c| c.as_ref()).collect();
            for candidate in candidates {
                let candidate = candidate.as_ref();
                let Some(plain) = strip_gzip_suffix(candidate) else {
                    continue;
                };
                // First gzip variant wins if several casings exist
                if !names.contains(plain) || pairs.contains_key(plain) {
                    continue;
                }
                let pair = TwinPair {
                    plain: plain.to_string(),
                    compressed: candidate.to_string(),
                };
                pairs.insert(pair.plain.clone(), pair.clone());
                pairs.insert(pair.compressed.clone(), pair);
            }
        }

        Self {
            enabled,
            pairs,
            resolved: HashSet::new(),
        }
    }

    /// The pair `name` belongs to, if any.
    pub fn twin_of(&self, name: &str) -> Option<&TwinPair> {
        self.pairs.get(name)
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len() / 2
    }

    /// Resolve one candidate.
    ///
    /// Returns `None` when the candidate was already covered by its twin.
    pub fn resolve(&mut self, candidate: &str, keys: &KeyBuilder) -> Option<ResolvedFile> {
        if self.resolved.contains(candidate) {
            return None;
        }

        let pair = if self.enabled {
            self.twin_of(candidate).cloned()
        } else {
            None
        };
        let Some(pair) = pair else {
            self.resolved.insert(candidate.to_string());
            return Some(ResolvedFile {
                relative: candidate.to_string(),
                key: keys.remote_key(candidate),
                source: Source::Single(keys.local_path(candidate)),
            });
        };

        self.resolved.insert(pair.plain.clone());
        self.resolved.insert(pair.compressed.clone());

        Some(ResolvedFile {
            key: keys.remote_key(&pair.plain),
            source: Source::Twin {
                plain: keys.local_path(&pair.plain),
                compressed: keys.local_path(&pair.compressed),
            },
            relative: pair.plain,
        })
    }
}

fn file_size(path: &Path) -> Result<u64, DeployError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| DeployError::from_io_error(e, "reading size of", path))
}
