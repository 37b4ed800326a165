pub mod config;
pub mod constants;
pub mod error;
pub mod error_response;
pub mod logging;
pub mod metrics;
pub mod types;

// Identity handling: normalization and spec parsing
pub mod normalize;
pub mod parser;

// Content store and metadata index
pub mod storage;

// Request-processing chains and the facade that drives them
pub mod pipeline;
pub mod registry;

pub mod server;

pub use error::{ErrorKind, RegistryError, Result};
pub use error_response::ErrorResponse;
pub use registry::Registry;
