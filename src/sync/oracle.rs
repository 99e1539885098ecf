//! Remote existence checks.
//!
//! Decides skip-or-upload from a single listing snapshot taken at the start
//! of a pass. Fingerprints are hex MD5, which is what S3 reports as the ETag
//! of a single-part upload. Multipart ETags (`<md5>-<parts>`) never match, so
//! such objects are simply re-uploaded; equality is best-effort change
//! detection, not a guarantee.

use md5::{Digest, Md5};
use std::collections::HashMap;

use crate::fs::types::RemoteObject;

/// Content fingerprint comparable to a single-part S3 ETag.
pub fn fingerprint(data: &[u8]) -> String {
    bytes_to_hex(&Md5::digest(data))
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Key → fingerprint lookup over one listing.
#[derive(Debug, Clone, Default)]
pub struct RemoteIndex {
    fingerprints: HashMap<String, String>,
}

impl RemoteIndex {
    pub fn from_listing(listing: &[RemoteObject]) -> Self {
        let fingerprints = listing
            .iter()
            .map(|object| {
                (
                    object.key.clone(),
                    object.fingerprint.trim_matches('"').to_ascii_lowercase(),
                )
            })
            .collect();
        Self { fingerprints }
    }

    /// True when `key` exists remotely with exactly this content.
    pub fn is_current(&self, key: &str, fingerprint: &str) -> bool {
        self.fingerprints
            .get(key)
            .is_some_and(|remote| remote.eq_ignore_ascii_case(fingerprint))
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}
