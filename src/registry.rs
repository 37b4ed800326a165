//! Facade operations: build a chain, run it, shape the response.

use crate::config::StorageConfig;
use crate::constants;
use crate::error::{RegistryError, Result};
use crate::error_response::ErrorResponse;
use crate::metrics::RegistryMetrics;
use crate::pipeline::context::required;
use crate::pipeline::{edit_chain, get_chain, upload_chain, Chain, RequestContext};
use crate::storage::{ContentStore, MetadataIndex, SqliteIndex};
use crate::types::{
    EditData, EditResponse, FetchQuery, FetchResponse, SpecRecord, UploadResponse, UploadedFile,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn};

pub struct Registry {
    index: Arc<dyn MetadataIndex>,
    store: Arc<ContentStore>,
}

impl Registry {
    pub fn new(index: Arc<dyn MetadataIndex>, store: ContentStore) -> Self {
        Self {
            index,
            store: Arc::new(store),
        }
    }

    /// SQLite index plus filesystem store, as configured.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let index = SqliteIndex::open(&config.database_path)?;
        Ok(Self::new(Arc::new(index), ContentStore::new(&config.uploads_root)))
    }

    /// Ingest a spec whose (name, version) is not yet registered.
    pub fn upload(
        &self,
        file: Option<UploadedFile>,
    ) -> std::result::Result<UploadResponse, ErrorResponse> {
        let chain = upload_chain(self.index.clone(), self.store.clone());
        self.run(&chain, RequestContext::for_upload(file), |ctx| {
            Ok(UploadResponse {
                message: constants::MSG_UPLOADED.to_string(),
                data: required(&ctx.saved_record, "saved record")?.clone(),
            })
        })
    }

    /// Replace the content of an already registered (name, version).
    pub fn edit(
        &self,
        file: Option<UploadedFile>,
    ) -> std::result::Result<EditResponse, ErrorResponse> {
        let chain = edit_chain(self.index.clone(), self.store.clone());
        self.run(&chain, RequestContext::for_upload(file), |ctx| {
            Ok(EditResponse {
                message: constants::MSG_REPLACED.to_string(),
                data: EditData {
                    app_name: required(&ctx.app_name, "app name")?.clone(),
                    app_version: required(&ctx.app_version, "app version")?.to_string(),
                    file_path: required(&ctx.stored, "stored blob")?.relative_path.clone(),
                },
            })
        })
    }

    /// Fetch one version of a spec, or the highest version if none is given.
    pub fn get(&self, query: FetchQuery) -> std::result::Result<FetchResponse, ErrorResponse> {
        let chain = get_chain(self.index.clone(), self.store.clone());
        self.run(&chain, RequestContext::for_fetch(query), |ctx| {
            let fetched = required(&ctx.fetched, "fetched schema")?;
            Ok(FetchResponse {
                app_name: fetched.record.app_name.clone(),
                app_version: fetched.record.app_version.clone(),
                created_at: fetched.record.created_at,
                file_path: fetched.record.file_path.clone(),
                content: fetched.content.clone(),
            })
        })
    }

    /// Index rows, for one app or all of them.
    pub fn list(
        &self,
        app_name: Option<&str>,
    ) -> std::result::Result<Vec<SpecRecord>, ErrorResponse> {
        let rows = match app_name {
            Some(name) => self.index.find_all_by_name(&crate::normalize::to_safe_name(name.trim())),
            None => self.index.list_all(),
        };
        rows.map_err(|e| ErrorResponse::from_error(&e))
    }

    fn run<T, F>(
        &self,
        chain: &Chain,
        mut ctx: RequestContext,
        finish: F,
    ) -> std::result::Result<T, ErrorResponse>
    where
        F: FnOnce(&RequestContext) -> Result<T>,
    {
        let operation = chain.name();
        let span = info_span!("operation", op = operation, request_id = %ctx.request_id);
        let _enter = span.enter();
        let started = Instant::now();

        let outcome = chain.run(&mut ctx).and_then(|()| finish(&ctx));
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(value) => {
                info!("{} succeeded in {:.3}s", operation, elapsed);
                RegistryMetrics::record_success(operation, elapsed);
                Ok(value)
            }
            Err(err) => {
                let response = ErrorResponse::from_error(&err);
                if matches!(err, RegistryError::Step { .. }) {
                    warn!("{} failed: {}", operation, response);
                } else {
                    error!("{} failed: {}", operation, err);
                }
                RegistryMetrics::record_failure(operation, &response.error, elapsed);
                Err(response)
            }
        }
    }
}
