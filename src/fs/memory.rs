//! In-process object store.
//!
//! Keeps objects in a sorted map, fingerprints them the way S3 does for
//! single-part uploads (hex MD5), and records every call so callers can
//! assert on what reached the store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::fs::backend::ObjectStore;
use crate::fs::types::{ObjectMetadata, RemoteObject};
use crate::sync::oracle::fingerprint;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub fingerprint: String,
    pub metadata: ObjectMetadata,
}

/// A call that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Put { key: String },
    Delete { key: String },
}

#[derive(Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: Mutex<Vec<StoreCall>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }

    /// Seed an object without recording a call.
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                fingerprint: fingerprint(data),
                metadata: ObjectMetadata::default(),
            },
        );
    }

    /// Make every put/delete of `key` fail.
    pub fn fail_on(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of put/delete calls seen so far.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c, StoreCall::List))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self, operation: &str, key: &str) -> Result<()> {
        if self.failing_keys.lock().unwrap().contains(key) {
            bail!("simulated {} failure for {}", operation, key);
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        self.record(StoreCall::List);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, object)| RemoteObject::new(key.as_str(), object.fingerprint.as_str()))
            .collect())
    }

    async fn put(&self, key: &str, data: Vec<u8>, metadata: &ObjectMetadata) -> Result<()> {
        self.record(StoreCall::Put {
            key: key.to_string(),
        });
        self.check_failure("put", key)?;

        let object = StoredObject {
            fingerprint: fingerprint(&data),
            data,
            metadata: metadata.clone(),
        };
        self.objects.lock().unwrap().insert(key.to_string(), object);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.record(StoreCall::Delete {
            key: key.to_string(),
        });
        self.check_failure("delete", key)?;

        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
