use anyhow::Result;
use spec_registry::error::RegistryError;
use spec_registry::storage::{ContentStore, MetadataIndex, SqliteIndex};
use spec_registry::types::{FetchQuery, SpecRecord, UploadedFile};
use spec_registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn sqlite_registry() -> Result<(TempDir, Registry)> {
    let dir = tempdir()?;
    let index = SqliteIndex::open(dir.path().join("db").join("sqlite.db"))?;
    let registry = Registry::new(Arc::new(index), ContentStore::new(dir.path().join("uploads")));
    Ok((dir, registry))
}

fn spec(title: &str, version: &str) -> String {
    format!(
        r#"{{"openapi":"3.0.0","info":{{"title":"{}","version":"{}"}},"paths":{{}}}}"#,
        title, version
    )
}

fn json_file(body: &str) -> Option<UploadedFile> {
    Some(UploadedFile::new("spec.json", body.as_bytes().to_vec()))
}

#[test]
fn upload_then_get_returns_identical_content() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    let body = "openapi: 3.0.0
info:
  title: Billing Service
  version: 1.2
paths:
  /invoices:
    get:
      responses:
        200:
          description: ok
";

    let uploaded = registry
        .upload(Some(UploadedFile::new("billing.yaml", body.as_bytes().to_vec())))?;
    assert_eq!(uploaded.message, "Schema uploaded successfully");
    assert_eq!(uploaded.data.app_name, "Billing_Service");
    assert_eq!(uploaded.data.app_version, "1.2.0");
    assert_eq!(uploaded.data.file_path, "Billing_Service/v1.2.0.yaml");

    let fetched = registry
        .get(FetchQuery::new("Billing Service", Some("1.2".to_string())))?;
    assert_eq!(fetched.content, body);
    assert_eq!(fetched.app_version, "1.2.0");
    assert_eq!(fetched.created_at, uploaded.data.created_at);
    Ok(())
}

#[test]
fn duplicate_upload_is_rejected_and_leaves_state_alone() -> Result<()> {
    let (dir, registry) = sqlite_registry()?;
    registry.upload(json_file(&spec("My App", "1.0.0")))?;

    let err = registry.upload(json_file(&spec("My  App", "1"))).unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.error, "DuplicateAppVersion");

    assert_eq!(registry.list(None)?.len(), 1);
    let stored = std::fs::read_to_string(dir.path().join("uploads/My_App/v1.0.0.json"))?;
    assert_eq!(stored, spec("My App", "1.0.0"));
    Ok(())
}

#[test]
fn padded_versions_map_to_one_record() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    registry.upload(json_file(&spec("A", "1.1")))?;

    for padded in ["1.01", "+1.1"] {
        let err = registry.upload(json_file(&spec("A", padded))).unwrap_err();
        assert_eq!((err.status, err.error.as_str()), (400, "DuplicateAppVersion"));
    }
    let versions: Vec<String> = registry.list(None)?.into_iter().map(|r| r.app_version).collect();
    assert_eq!(versions, vec!["1.1.0"]);

    let edited = r#"{"info":{"title":"A","version":"1.01.00"},"paths":{"/edited":{}}}"#;
    let resp = registry.edit(json_file(edited))?;
    assert_eq!(resp.data.app_version, "1.1.0");

    let fetched = registry.get(FetchQuery::new("A", Some("001.1".to_string())))?;
    assert_eq!(fetched.content, edited);
    Ok(())
}

#[test]
fn get_without_version_returns_highest() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    for version in ["1.2.0", "1.10.0", "1.9.5"] {
        registry.upload(json_file(&spec("Svc", version)))?;
    }

    let latest = registry.get(FetchQuery::new("Svc", None))?;
    assert_eq!(latest.app_version, "1.10.0");

    let blank = registry
        .get(FetchQuery::new("Svc", Some("  ".to_string())))?;
    assert_eq!(blank.app_version, "1.10.0");
    Ok(())
}

#[test]
fn get_reports_missing_app_and_version() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    registry.upload(json_file(&spec("Svc", "1.0.0")))?;

    let err = registry.get(FetchQuery::new("Nope", None)).unwrap_err();
    assert_eq!((err.status, err.error.as_str()), (400, "NotFound"));

    let err = registry
        .get(FetchQuery::new("Svc", Some("2".to_string())))
        .unwrap_err();
    assert_eq!((err.status, err.error.as_str()), (400, "AppVersionNotFound"));
    Ok(())
}

#[test]
fn repeated_uploads_share_the_app_directory() -> Result<()> {
    let (dir, registry) = sqlite_registry()?;
    registry.upload(json_file(&spec("Svc", "1")))?;
    registry.upload(json_file(&spec("Svc", "2")))?;

    let mut names: Vec<String> = std::fs::read_dir(dir.path().join("uploads/Svc"))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    assert_eq!(names, vec!["v1.0.0.json", "v2.0.0.json"]);
    Ok(())
}

#[test]
fn edit_replaces_content_and_keeps_one_row() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    let first = registry.upload(json_file(&spec("Svc", "1.0")))?;

    let updated = r#"{"info":{"title":"Svc","version":"1.0.0"},"paths":{"/v2":{}}}"#;
    let resp = registry.edit(json_file(updated))?;
    assert_eq!(resp.message, "Schema replaced and timestamp updated");
    assert_eq!(resp.data.file_path, "Svc/v1.0.0.json");

    let rows = registry.list(Some("Svc"))?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, first.data.id);
    assert!(rows[0].created_at >= first.data.created_at);

    let fetched = registry.get(FetchQuery::new("Svc", None))?;
    assert_eq!(fetched.content, updated);
    Ok(())
}

#[test]
fn edit_of_unknown_version_is_not_found() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    let err = registry.edit(json_file(&spec("Svc", "3"))).unwrap_err();
    assert_eq!((err.status, err.error.as_str()), (400, "AppVersionNotFound"));
    Ok(())
}

#[test]
fn malformed_bodies_are_invalid_spec() -> Result<()> {
    let (_dir, registry) = sqlite_registry()?;
    let err = registry
        .upload(Some(UploadedFile::new("x.json", b"{not json: [".to_vec())))
        .unwrap_err();
    assert_eq!(err.error, "InvalidSpec");

    let err = registry.upload(json_file(r#"{"info":{"title":"Svc"}}"#)).unwrap_err();
    assert_eq!(err.error, "MissingAppVersion");

    let err = registry.upload(json_file(&spec("Svc", "1.x"))).unwrap_err();
    assert_eq!(err.error, "InvalidVersion");
    assert!(registry.list(None)?.is_empty());
    Ok(())
}

/// Counts every index call so tests can assert none happened.
struct CountingIndex {
    calls: AtomicUsize,
}

impl CountingIndex {
    fn hit<T>(&self, value: T) -> spec_registry::Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }
}

impl MetadataIndex for CountingIndex {
    fn find_by_name_version(&self, _: &str, _: &str) -> spec_registry::Result<Option<SpecRecord>> {
        self.hit(None)
    }
    fn find_all_by_name(&self, _: &str) -> spec_registry::Result<Vec<SpecRecord>> {
        self.hit(Vec::new())
    }
    fn find_by_id(&self, _: i64) -> spec_registry::Result<Option<SpecRecord>> {
        self.hit(None)
    }
    fn insert(&self, _: &str, _: &str, _: &str) -> spec_registry::Result<i64> {
        self.hit(1)
    }
    fn update_path(&self, _: i64, _: &str) -> spec_registry::Result<()> {
        self.hit(())
    }
    fn touch_timestamp(&self, _: i64) -> spec_registry::Result<()> {
        self.hit(())
    }
    fn list_all(&self) -> spec_registry::Result<Vec<SpecRecord>> {
        self.hit(Vec::new())
    }
    fn clear(&self) -> spec_registry::Result<usize> {
        self.hit(0)
    }
}

#[test]
fn missing_app_name_fails_before_index_access() -> Result<()> {
    let dir = tempdir()?;
    let index = Arc::new(CountingIndex { calls: AtomicUsize::new(0) });
    let registry = Registry::new(index.clone(), ContentStore::new(dir.path()));

    for query in [FetchQuery::default(), FetchQuery::new("", Some("1".to_string()))] {
        let err = registry.get(query).unwrap_err();
        assert_eq!((err.status, err.error.as_str()), (400, "MissingParameter"));
    }
    let err = registry.upload(None).unwrap_err();
    assert_eq!(err.error, "FileMissing");

    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

/// SQLite index whose writes always fail.
struct BrokenWrites {
    inner: SqliteIndex,
}

fn locked() -> RegistryError {
    RegistryError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("database is locked".to_string()),
    ))
}

impl MetadataIndex for BrokenWrites {
    fn find_by_name_version(&self, a: &str, v: &str) -> spec_registry::Result<Option<SpecRecord>> {
        self.inner.find_by_name_version(a, v)
    }
    fn find_all_by_name(&self, a: &str) -> spec_registry::Result<Vec<SpecRecord>> {
        self.inner.find_all_by_name(a)
    }
    fn find_by_id(&self, id: i64) -> spec_registry::Result<Option<SpecRecord>> {
        self.inner.find_by_id(id)
    }
    fn insert(&self, _: &str, _: &str, _: &str) -> spec_registry::Result<i64> {
        Err(locked())
    }
    fn update_path(&self, _: i64, _: &str) -> spec_registry::Result<()> {
        Err(locked())
    }
    fn touch_timestamp(&self, _: i64) -> spec_registry::Result<()> {
        Err(locked())
    }
    fn list_all(&self) -> spec_registry::Result<Vec<SpecRecord>> {
        self.inner.list_all()
    }
    fn clear(&self) -> spec_registry::Result<usize> {
        self.inner.clear()
    }
}

#[test]
fn failed_index_writes_roll_back_blobs() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("sqlite.db");
    let uploads = dir.path().join("uploads");

    let healthy = Registry::new(
        Arc::new(SqliteIndex::open(&db_path)?),
        ContentStore::new(&uploads),
    );
    let original = spec("Svc", "1.0.0");
    let seeded = healthy.upload(json_file(&original))?;

    let broken = Registry::new(
        Arc::new(BrokenWrites { inner: SqliteIndex::open(&db_path)? }),
        ContentStore::new(&uploads),
    );

    let err = broken.upload(json_file(&spec("Svc", "2.0.0"))).unwrap_err();
    assert_eq!((err.status, err.error.as_str()), (400, "FileUploadRollback"));
    assert!(err.details.contains("database is locked"));
    assert!(!uploads.join("Svc/v2.0.0.json").exists());

    let err = broken
        .edit(json_file(r#"{"info":{"title":"Svc","version":"1"},"changed":true}"#))
        .unwrap_err();
    assert_eq!((err.status, err.error.as_str()), (400, "FileUpdateRollback"));
    assert_eq!(std::fs::read_to_string(uploads.join("Svc/v1.0.0.json"))?, original);

    let rows = healthy.list(None)?;
    assert_eq!(rows, vec![seeded.data]);
    Ok(())
}
