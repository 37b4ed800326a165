use crate::error::Result;
use crate::parser;
use crate::pipeline::context::required;
use crate::pipeline::{RequestContext, Step};

/// Decodes the uploaded file and records the app name it declares.
pub struct ParseSpec;

impl Step for ParseSpec {
    fn name(&self) -> &'static str {
        "ParseSpec"
    }

    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let file = required(&ctx.file, "uploaded file")?;
        let parsed = parser::parse(&file.bytes)?;
        ctx.app_name = Some(parsed.app_name.clone());
        ctx.parsed = Some(parsed);
        Ok(())
    }
}
