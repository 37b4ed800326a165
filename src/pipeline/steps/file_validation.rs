use crate::error::{ErrorKind, RegistryError, Result};
use crate::pipeline::{RequestContext, Step};

/// Rejects ingest requests that carry no file.
pub struct FileValidation;

impl Step for FileValidation {
    fn name(&self) -> &'static str {
        "FileValidation"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        if ctx.file.is_none() {
            return Err(RegistryError::step(
                ErrorKind::FileMissing,
                "No file uploaded in request",
            ));
        }
        Ok(())
    }
}
