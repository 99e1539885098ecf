// Tests for replace_with_gzip: twin selection, keys and encoding metadata

use super::common::Fixture;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use s3deploy::config::EffectiveConfig;
use std::io::{Read, Write};

fn gzip_config(fixture: &Fixture) -> EffectiveConfig {
    let mut config = fixture.config();
    config.extras.replace_with_gzip = true;
    config
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_smaller_gzip_twin_replaces_plain_file() {
    let fixture = Fixture::new();
    fixture.write_sized("index.html", 500);
    fixture.write_sized("index.html.gz", 200);

    let report = fixture.engine(gzip_config(&fixture)).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Uploaded\tindex.html (gzip)"]);
    assert_eq!(fixture.store.keys(), vec!["index.html"]);
    let stored = fixture.store.get("index.html").unwrap();
    assert_eq!(stored.data.len(), 200);
    assert_eq!(stored.metadata.content_encoding.as_deref(), Some("gzip"));
    assert!(report.active.contains("index.html"));
    assert!(!report.active.contains("index.html.gz"));
}

#[tokio::test]
async fn test_inflated_gzip_twin_loses_to_plain_file() {
    let fixture = Fixture::new();
    fixture.write_sized("tiny.txt", 10);
    fixture.write_sized("tiny.txt.gz", 30);

    let report = fixture.engine(gzip_config(&fixture)).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Uploaded\ttiny.txt"]);
    let stored = fixture.store.get("tiny.txt").unwrap();
    assert_eq!(stored.data.len(), 10);
    assert_eq!(stored.metadata.content_encoding, None);
}

#[tokio::test]
async fn test_equal_sizes_keep_plain_file() {
    let fixture = Fixture::new();
    fixture.write_sized("same.css", 64);
    fixture.write_sized("same.css.gz", 64);

    let report = fixture.engine(gzip_config(&fixture)).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Uploaded\tsame.css"]);
}

#[tokio::test]
async fn test_stored_gzip_bytes_decompress_to_original() {
    let fixture = Fixture::new();
    let page = "<html><body>hello</body></html>".repeat(50);
    fixture.write("page.html", page.as_bytes());
    fixture.write("page.html.gz", &gzip(page.as_bytes()));
    let mut config = gzip_config(&fixture);
    config.html_charset = Some("utf-8".to_string());

    let report = fixture.engine(config).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Uploaded\tpage.html (gzip, charset=utf-8)"]);
    let stored = fixture.store.get("page.html").unwrap();
    let mut decoded = String::new();
    GzDecoder::new(stored.data.as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, page);
}

#[tokio::test]
async fn test_second_run_skips_replaced_twin() {
    let fixture = Fixture::new();
    fixture.write_sized("app.js", 400);
    fixture.write_sized("app.js.gz", 100);
    let engine = fixture.engine(gzip_config(&fixture));

    engine.sync(false).await.unwrap();
    let report = engine.sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Skipped\tapp.js"]);
}

#[tokio::test]
async fn test_lone_gzip_file_keeps_its_name() {
    let fixture = Fixture::new();
    fixture.write("archive.tar.gz", &gzip(b"payload"));

    let report = fixture.engine(gzip_config(&fixture)).sync(false).await.unwrap();

    assert_eq!(report.lines(), vec!["Uploaded\tarchive.tar.gz (gzip)"]);
}

#[tokio::test]
async fn test_twins_uploaded_separately_when_disabled() {
    let fixture = Fixture::new();
    fixture.write_sized("index.html", 500);
    fixture.write_sized("index.html.gz", 200);

    let report = fixture.engine(fixture.config()).sync(false).await.unwrap();

    assert_eq!(
        report.lines(),
        vec!["Uploaded\tindex.html", "Uploaded\tindex.html.gz (gzip)"]
    );
    assert_eq!(fixture.store.keys(), vec!["index.html", "index.html.gz"]);
}

#[tokio::test]
async fn test_replaced_twin_prunes_stale_gzip_key() {
    let fixture = Fixture::new();
    fixture.write_sized("index.html", 500);
    fixture.write_sized("index.html.gz", 200);
    fixture.store.insert("index.html.gz", b"left over from an older deploy");
    let mut config = gzip_config(&fixture);
    config.extras.delete_old_files = true;

    let report = fixture.engine(config).sync(false).await.unwrap();

    assert_eq!(
        report.lines(),
        vec!["Uploaded\tindex.html (gzip)", "Deleted\tindex.html.gz"]
    );
    assert_eq!(fixture.store.keys(), vec!["index.html"]);
}
