use crate::error::{ErrorKind, RegistryError, Result};
use crate::normalize::{to_safe_name, Version};
use crate::pipeline::context::required;
use crate::pipeline::{ExistingSchema, RequestContext, Step};
use crate::storage::{ContentStore, MetadataIndex};
use std::sync::Arc;

/// Precondition for a replace: the (name, version) must already be indexed
/// and its blob must still be on disk.
pub struct ValidateExistingSchema {
    index: Arc<dyn MetadataIndex>,
    store: Arc<ContentStore>,
}

impl ValidateExistingSchema {
    pub fn new(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Self {
        Self { index, store }
    }
}

impl Step for ValidateExistingSchema {
    fn name(&self) -> &'static str {
        "ValidateExistingSchema"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let app_name = to_safe_name(required(&ctx.app_name, "app name")?);
        let raw = required(&ctx.parsed, "parsed spec")?.app_version.clone();
        let version = Version::canonical(raw)?;

        let record = self
            .index
            .find_by_name_version(&app_name, version.as_str())?
            .ok_or_else(|| {
                RegistryError::step(
                    ErrorKind::AppVersionNotFound,
                    format!("App version {} for app {} does not exist in DB", version, app_name),
                )
            })?;

        let absolute_path = self.store.locate_existing(&app_name, &version)?;

        ctx.app_name = Some(app_name);
        ctx.app_version = Some(version);
        ctx.existing = Some(ExistingSchema {
            record,
            absolute_path,
        });
        Ok(())
    }
}
