// Request-processing pipeline: steps, the chain driver, and the three chains

pub mod chains;
pub mod context;
pub mod steps;

pub use chains::{edit_chain, get_chain, upload_chain};
pub use context::{ExistingSchema, FetchedSchema, RequestContext};

use crate::error::Result;
use tracing::debug;

/// One stage of request processing.
///
/// A step reads and extends the context, then either returns `Ok(())` so the
/// chain continues or returns an error that aborts the chain unchanged.
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, ctx: &mut RequestContext) -> Result<()>;
}

/// A fixed, ordered list of steps. Holds no per-request state.
pub struct Chain {
    name: &'static str,
    steps: Vec<Box<dyn Step>>,
}

impl Chain {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn then<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(&self, ctx: &mut RequestContext) -> Result<()> {
        for step in &self.steps {
            debug!(chain = self.name, step = step.name(), "running step");
            step.handle(ctx)?;
        }
        Ok(())
    }
}
