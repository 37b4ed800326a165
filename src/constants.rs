/// Defaults and well-known names shared by the library and its front ends

// Storage layout
pub const DEFAULT_UPLOADS_ROOT: &str = "database/uploads";
pub const DEFAULT_DATABASE_PATH: &str = "database/sqlite.db";

// Server
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
/// Largest request body accepted by the upload and edit routes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

// Logging
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "registry.log";

// Configuration sources
pub const DEFAULT_CONFIG_FILE: &str = "registry.toml";
pub const ENV_CONFIG_FILE: &str = "SPEC_REGISTRY_CONFIG";
pub const ENV_UPLOADS_DIR: &str = "SPEC_REGISTRY_UPLOADS_DIR";
pub const ENV_DB_PATH: &str = "SPEC_REGISTRY_DB_PATH";
pub const ENV_HOST: &str = "SPEC_REGISTRY_HOST";
pub const ENV_PORT: &str = "SPEC_REGISTRY_PORT";
pub const ENV_MAX_UPLOAD_BYTES: &str = "SPEC_REGISTRY_MAX_UPLOAD_BYTES";
pub const ENV_LOG_DIR: &str = "SPEC_REGISTRY_LOG_DIR";

// Response messages
pub const MSG_UPLOADED: &str = "Schema uploaded successfully";
pub const MSG_REPLACED: &str = "Schema replaced and timestamp updated";

/// Extensions tried, in order, when locating an existing blob.
pub const STORED_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];
