use crate::error::{ErrorKind, RegistryError, Result};
use crate::metrics::RegistryMetrics;
use crate::pipeline::context::required;
use crate::pipeline::{RequestContext, Step};
use crate::storage::{ContentStore, MetadataIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Rewrites the blob of an indexed (name, version) and repoints its row.
///
/// If the index update fails, the blob at the target path is put back the
/// way it was (previous bytes restored, or the new file removed) and the
/// row is left untouched.
pub struct UpdateSchema {
    index: Arc<dyn MetadataIndex>,
    store: Arc<ContentStore>,
}

impl UpdateSchema {
    pub fn new(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Self {
        Self { index, store }
    }

    fn undo_write(&self, path: &Path, previous: Option<&[u8]>) {
        match previous {
            Some(bytes) => self.store.restore(path, bytes),
            None => self.store.delete(path),
        };
    }
}

impl Step for UpdateSchema {
    fn name(&self) -> &'static str {
        "UpdateSchema"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let app_name = required(&ctx.app_name, "app name")?.clone();
        let version = required(&ctx.app_version, "app version")?.clone();

        let existing = self
            .index
            .find_by_name_version(&app_name, version.as_str())?
            .ok_or_else(|| {
                RegistryError::step(
                    ErrorKind::AppVersionNotFound,
                    format!("No existing record found for app_version {}", version),
                )
            })?;

        let file = required(&ctx.file, "uploaded file")?;
        let target = self.store.absolute(&ContentStore::relative_path(
            &app_name,
            &version,
            ContentStore::extension_for(&file.original_name),
        ));
        let previous = self.store.snapshot(&target)?;

        let blob = match self
            .store
            .write(&app_name, &version, &file.original_name, &file.bytes)
        {
            Ok(blob) => blob,
            Err(e) => {
                self.undo_write(&target, previous.as_deref());
                return Err(e);
            }
        };

        if let Err(cause) = self.index.update_path(existing.id, &blob.relative_path) {
            warn!("Rolling back {} after index failure: {}", blob.relative_path, cause);
            self.undo_write(&blob.absolute_path, previous.as_deref());
            RegistryMetrics::record_rollback("update");
            return Err(RegistryError::step(
                ErrorKind::FileUpdateRollback,
                format!(
                    "DB update failed, rolled back file upload for version {}. Original error: {}",
                    version,
                    cause.cause_message()
                ),
            ));
        }

        // A replace with a different extension leaves the old blob behind.
        if let Some(old) = ctx.existing.as_ref().map(|e| &e.absolute_path) {
            if *old != blob.absolute_path {
                self.store.delete(old);
            }
        }

        let record = self
            .index
            .find_by_id(existing.id)?
            .ok_or_else(|| RegistryError::Internal("Failed to fetch updated record".to_string()))?;
        info!(id = record.id, path = %blob.relative_path, "Replaced {} {}", app_name, version);

        ctx.saved_record = Some(record);
        ctx.stored = Some(blob);
        Ok(())
    }
}
