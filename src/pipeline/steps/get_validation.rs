use crate::error::{ErrorKind, RegistryError, Result};
use crate::normalize::to_safe_name;
use crate::pipeline::{RequestContext, Step};

/// Requires an app name on fetch and normalizes it.
pub struct GetSchemaValidation;

impl Step for GetSchemaValidation {
    fn name(&self) -> &'static str {
        "GetSchemaValidation"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let app_name = ctx
            .query
            .app_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                RegistryError::step(ErrorKind::MissingParameter, "appName is required")
            })?;
        ctx.app_name = Some(to_safe_name(app_name));
        Ok(())
    }
}
