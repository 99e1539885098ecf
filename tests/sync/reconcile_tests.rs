// Tests for delete_old_files pruning after a sync pass

use super::common::Fixture;
use s3deploy::fs::{MemoryStore, ObjectMetadata, ObjectStore, RemoteObject, StoreCall};
use s3deploy::sync::SyncEngine;
use std::path::PathBuf;
use std::sync::Arc;

/// Removes a local file when the bucket is listed, i.e. after enumeration.
struct RemoveOnList {
    inner: Arc<MemoryStore>,
    doomed: PathBuf,
}

#[async_trait::async_trait]
impl ObjectStore for RemoveOnList {
    async fn list(&self) -> anyhow::Result<Vec<RemoteObject>> {
        std::fs::remove_file(&self.doomed)?;
        self.inner.list().await
    }

    async fn put(&self, key: &str, data: Vec<u8>, metadata: &ObjectMetadata) -> anyhow::Result<()> {
        self.inner.put(key, data, metadata).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.inner.delete(key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }
}

#[tokio::test]
async fn test_prunes_only_keys_without_local_counterpart() {
    let fixture = Fixture::new();
    fixture.write("a", b"a");
    fixture.write("b", b"b");
    for key in ["a", "b", "c"] {
        fixture.store.insert(key, key.as_bytes());
    }
    let mut config = fixture.config();
    config.extras.delete_old_files = true;

    let report = fixture.engine(config).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Skipped\ta", "Skipped\tb", "Deleted\tc"]);
    assert_eq!(report.deleted(), 1);
    assert_eq!(fixture.store.keys(), vec!["a", "b"]);
    assert_eq!(
        fixture.store.calls(),
        vec![StoreCall::List, StoreCall::Delete { key: "c".to_string() }]
    );
}

#[tokio::test]
async fn test_nothing_pruned_when_disabled() {
    let fixture = Fixture::new();
    fixture.write("a", b"a");
    fixture.store.insert("a", b"a");
    fixture.store.insert("c", b"c");

    let report = fixture.engine(fixture.config()).sync(false).await.unwrap();

    assert_eq!(report.deleted(), 0);
    assert_eq!(fixture.store.keys(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_skipped_local_files_are_pruned_remotely() {
    let fixture = Fixture::new();
    fixture.write("index.html", b"home");
    fixture.write("secret.env", b"TOKEN=1");
    fixture.store.insert("secret.env", b"TOKEN=1");
    let mut config = fixture.config();
    config.skip_pattern = Some(r"\.env$".to_string());
    config.extras.delete_old_files = true;

    let report = fixture.engine(config).sync(false).await.unwrap();

    assert_eq!(
        report.lines(),
        vec!["Uploaded\tindex.html", "Deleted\tsecret.env"]
    );
}

#[tokio::test]
async fn test_failed_upload_keeps_stale_remote_copy() {
    let fixture = Fixture::new();
    fixture.write("a", b"new");
    fixture.store.insert("a", b"old");
    fixture.store.fail_on("a");
    let mut config = fixture.config();
    config.extras.delete_old_files = true;

    let report = fixture.engine(config).sync(false).await.unwrap();

    assert_eq!(report.deleted(), 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(fixture.store.get("a").unwrap().data, b"old");
}

#[tokio::test]
async fn test_failed_delete_reported_and_others_continue() {
    let fixture = Fixture::new();
    fixture.write("keep", b"keep");
    for key in ["keep", "old-1", "old-2", "old-3"] {
        fixture.store.insert(key, key.as_bytes());
    }
    fixture.store.fail_on("old-2");
    let mut config = fixture.config();
    config.extras.delete_old_files = true;
    let (engine, printed) = fixture.recording_engine(config);

    let report = engine.sync(false).await.unwrap();

    assert_eq!(
        report.lines(),
        vec!["Skipped\tkeep", "Deleted\told-1", "Deleted\told-3"]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].subject, "old-2");
    assert_eq!(fixture.store.keys(), vec!["keep", "old-2"]);
    assert_eq!(printed.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_unreadable_twin_keeps_remote_object() {
    let fixture = Fixture::new();
    fixture.write_sized("index.html", 500);
    let doomed = fixture.write_sized("index.html.gz", 200);
    fixture.store.insert("index.html", b"published");
    let mut config = fixture.config();
    config.extras.replace_with_gzip = true;
    config.extras.delete_old_files = true;
    let store = Arc::new(RemoveOnList {
        inner: fixture.store.clone(),
        doomed,
    });

    let report = SyncEngine::new(store, config).sync(false).await.unwrap();

    assert!(report.lines().is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].subject, "index.html");
    assert!(report.active.contains("index.html"));
    assert_eq!(fixture.store.get("index.html").unwrap().data, b"published");
}
