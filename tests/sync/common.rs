#![allow(dead_code)]

// Shared fixture: a temporary deploy root and an in-memory bucket

use s3deploy::config::EffectiveConfig;
use s3deploy::fs::MemoryStore;
use s3deploy::sync::SyncEngine;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BUCKET: &str = "test-bucket";

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            store: Arc::new(MemoryStore::new(BUCKET)),
        }
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
        path
    }

    pub fn write_sized(&self, name: &str, len: usize) -> PathBuf {
        self.write(name, &vec![b'a'; len])
    }

    pub fn config(&self) -> EffectiveConfig {
        EffectiveConfig::new(self.dir.path(), BUCKET)
    }

    pub fn engine(&self, config: EffectiveConfig) -> SyncEngine {
        SyncEngine::new(self.store.clone(), config)
    }

    /// Engine whose printed lines are captured in order.
    pub fn recording_engine(&self, config: EffectiveConfig) -> (SyncEngine, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let engine = self.engine(config).with_event_callback(move |event| {
            sink.lock().unwrap().push(match event {
                s3deploy::sync::SyncEvent::Decision(decision) => decision.to_string(),
                s3deploy::sync::SyncEvent::Failure(failure) => failure.to_string(),
            });
        });
        (engine, lines)
    }
}
