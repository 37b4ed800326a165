use crate::error::{ErrorKind, RegistryError, Result};
use crate::normalize::Version;
use crate::pipeline::context::required;
use crate::pipeline::{FetchedSchema, RequestContext, Step};
use crate::storage::{ContentStore, MetadataIndex};
use crate::types::SpecRecord;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Resolves a fetch to one index row (exact version, or the highest one) and
/// loads its blob.
pub struct FetchSchema {
    index: Arc<dyn MetadataIndex>,
    store: Arc<ContentStore>,
}

impl FetchSchema {
    pub fn new(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Self {
        Self { index, store }
    }
}

/// Row with the greatest version; on ties the first one seen is kept.
pub fn select_latest(rows: Vec<SpecRecord>) -> Result<Option<SpecRecord>> {
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Ok(None);
    };
    let mut latest_version = Version::normalize(first.app_version.as_str());
    let mut latest = first;
    for row in rows {
        let version = Version::normalize(row.app_version.as_str());
        if version.compare(&latest_version)? == Ordering::Greater {
            latest_version = version;
            latest = row;
        }
    }
    Ok(Some(latest))
}

impl Step for FetchSchema {
    fn name(&self) -> &'static str {
        "FetchSchema"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let app_name = required(&ctx.app_name, "app name")?.clone();
        let requested = ctx
            .query
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Version::canonical)
            .transpose()?;

        let record = match requested {
            Some(version) => self
                .index
                .find_by_name_version(&app_name, version.as_str())?
                .ok_or_else(|| {
                    RegistryError::step(
                        ErrorKind::AppVersionNotFound,
                        format!("Schema for {} with app_version {} not found", app_name, version),
                    )
                })?,
            None => {
                let rows = self.index.find_all_by_name(&app_name)?;
                debug!("{} candidate versions for {}", rows.len(), app_name);
                select_latest(rows)?.ok_or_else(|| {
                    RegistryError::step(
                        ErrorKind::NotFound,
                        format!("No schema found for {}", app_name),
                    )
                })?
            }
        };

        let content = self.store.read(&record.file_path)?;
        ctx.app_version = Some(Version::normalize(record.app_version.as_str()));
        ctx.fetched = Some(FetchedSchema { record, content });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::test_support::fixture;
    use crate::pipeline::steps::GetSchemaValidation;
    use crate::types::FetchQuery;
    use chrono::Utc;

    fn row(id: i64, version: &str) -> SpecRecord {
        SpecRecord {
            id,
            app_name: "App".to_string(),
            app_version: version.to_string(),
            file_path: format!("App/v{version}.json"),
            created_at: Utc::now(),
        }
    }

    fn run(
        index: Arc<dyn MetadataIndex>,
        store: Arc<ContentStore>,
        query: FetchQuery,
    ) -> Result<RequestContext> {
        let mut ctx = RequestContext::for_fetch(query);
        GetSchemaValidation.handle(&mut ctx)?;
        FetchSchema::new(index, store).handle(&mut ctx)?;
        Ok(ctx)
    }

    #[test]
    fn latest_is_numeric_not_insertion_order() {
        let rows = vec![row(1, "1.0.0"), row(2, "1.2.0"), row(3, "1.1.5")];
        assert_eq!(select_latest(rows).unwrap().unwrap().id, 2);

        let rows = vec![row(1, "1.10.0"), row(2, "1.9.0")];
        assert_eq!(select_latest(rows).unwrap().unwrap().id, 1);
    }

    #[test]
    fn ties_keep_first_seen() {
        let rows = vec![row(7, "2.0.0"), row(8, "2.0")];
        assert_eq!(select_latest(rows).unwrap().unwrap().id, 7);
    }

    #[test]
    fn empty_set_has_no_latest() {
        assert!(select_latest(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn uncomparable_row_is_invalid_version() {
        let rows = vec![row(1, "1.0.0"), row(2, "1.beta.0")];
        let err = select_latest(rows).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidVersion));
    }

    #[test]
    fn fetches_latest_content() {
        let (_dir, index, store) = fixture();
        for v in ["1.0.0", "1.2.0", "1.1.5"] {
            let blob = store
                .write("App", &Version::normalize(v), "s.json", format!("v{v}").as_bytes())
                .unwrap();
            index.insert("App", v, &blob.relative_path).unwrap();
        }

        let ctx = run(index, store, FetchQuery::new("App", None)).unwrap();
        let fetched = ctx.fetched.unwrap();
        assert_eq!(fetched.record.app_version, "1.2.0");
        assert_eq!(fetched.content, "v1.2.0");
    }

    #[test]
    fn exact_version_is_normalized() {
        let (_dir, index, store) = fixture();
        let blob = store.write("App", &Version::normalize("2"), "s.json", b"two").unwrap();
        index.insert("App", "2.0.0", &blob.relative_path).unwrap();

        let ctx = run(index, store, FetchQuery::new("App", Some(" 2 ".to_string()))).unwrap();
        assert_eq!(ctx.fetched.unwrap().content, "two");
    }

    #[test]
    fn blank_version_means_latest() {
        let (_dir, index, store) = fixture();
        let blob = store.write("App", &Version::normalize("3"), "s.json", b"three").unwrap();
        index.insert("App", "3.0.0", &blob.relative_path).unwrap();

        let ctx = run(index, store, FetchQuery::new("App", Some("  ".to_string()))).unwrap();
        assert_eq!(ctx.fetched.unwrap().record.app_version, "3.0.0");
    }

    #[test]
    fn unknown_app_and_version() {
        let (_dir, index, store) = fixture();
        let err = run(index.clone(), store.clone(), FetchQuery::new("Ghost", None)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        index.insert("App", "1.0.0", "App/v1.0.0.json").unwrap();
        let err = run(index, store, FetchQuery::new("App", Some("9".to_string()))).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AppVersionNotFound));
    }

    #[test]
    fn requested_version_is_canonicalized() {
        let (_dir, index, store) = fixture();
        let blob = store.write("App", &Version::normalize("1.1"), "s.json", b"one-one").unwrap();
        index.insert("App", "1.1.0", &blob.relative_path).unwrap();

        let padded = FetchQuery::new("App", Some("01.01".to_string()));
        let ctx = run(index.clone(), store.clone(), padded).unwrap();
        assert_eq!(ctx.fetched.unwrap().content, "one-one");

        let err = run(index, store, FetchQuery::new("App", Some("1.x".to_string()))).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidVersion));
    }

    #[test]
    fn missing_blob_is_file_error() {
        let (_dir, index, store) = fixture();
        index.insert("App", "1.0.0", "App/v1.0.0.json").unwrap();
        let err = run(index, store, FetchQuery::new("App", None)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::FileError));
        assert!(err.cause_message().contains("App/v1.0.0.json"));
    }
}
