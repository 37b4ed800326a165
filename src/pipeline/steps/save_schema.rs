use crate::error::{ErrorKind, RegistryError, Result};
use crate::metrics::RegistryMetrics;
use crate::normalize::Version;
use crate::pipeline::context::required;
use crate::pipeline::{RequestContext, Step};
use crate::storage::{ContentStore, MetadataIndex, StoredBlob};
use crate::types::SpecRecord;
use std::sync::Arc;
use tracing::{info, warn};

/// Stores a new (name, version): duplicate check, blob write, index insert.
///
/// The duplicate check runs before anything is written. Once the blob is on
/// disk, any later failure deletes it and surfaces as `FileUploadRollback`.
pub struct SaveSchema {
    index: Arc<dyn MetadataIndex>,
    store: Arc<ContentStore>,
}

impl SaveSchema {
    pub fn new(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Self {
        Self { index, store }
    }

    fn persist(&self, app_name: &str, version: &Version, blob: &StoredBlob) -> Result<SpecRecord> {
        let id = self.index.insert(app_name, version.as_str(), &blob.relative_path)?;
        self.index
            .find_by_id(id)?
            .ok_or_else(|| RegistryError::Internal("Failed to fetch saved record".to_string()))
    }
}

impl Step for SaveSchema {
    fn name(&self) -> &'static str {
        "SaveSchema"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let app_name = required(&ctx.app_name, "app name")?.clone();
        let raw = required(&ctx.parsed, "parsed spec")?.app_version.clone();
        let version = Version::canonical(raw)?;
        ctx.app_version = Some(version.clone());

        if self
            .index
            .find_by_name_version(&app_name, version.as_str())?
            .is_some()
        {
            return Err(RegistryError::step(
                ErrorKind::DuplicateAppVersion,
                format!("Version {} already exists for app {}", version, app_name),
            ));
        }

        let file = required(&ctx.file, "uploaded file")?;
        let blob = self
            .store
            .write(&app_name, &version, &file.original_name, &file.bytes)?;

        match self.persist(&app_name, &version, &blob) {
            Ok(record) => {
                info!(id = record.id, path = %blob.relative_path, "Saved {} {}", app_name, version);
                ctx.saved_record = Some(record);
                ctx.stored = Some(blob);
                Ok(())
            }
            Err(cause) => {
                warn!("Rolling back {} after index failure: {}", blob.relative_path, cause);
                self.store.delete(&blob.absolute_path);
                RegistryMetrics::record_rollback("upload");
                Err(RegistryError::step(
                    ErrorKind::FileUploadRollback,
                    format!(
                        "File was uploaded but rolled back due to DB error: {}",
                        cause.cause_message()
                    ),
                ))
            }
        }
    }
}
