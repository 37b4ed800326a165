use std::fmt;
use thiserror::Error;

/// Structured failure raised by a pipeline step.
///
/// The wire name of each kind is what callers see in the `error` field of a
/// failure response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileMissing,
    InvalidSpec,
    MissingAppVersion,
    InvalidVersion,
    DuplicateAppVersion,
    AppVersionNotFound,
    NotFound,
    FileError,
    FileUploadRollback,
    FileUpdateRollback,
    MissingParameter,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileMissing => "FileMissing",
            ErrorKind::InvalidSpec => "InvalidSpec",
            ErrorKind::MissingAppVersion => "MissingAppVersion",
            ErrorKind::InvalidVersion => "InvalidVersion",
            ErrorKind::DuplicateAppVersion => "DuplicateAppVersion",
            ErrorKind::AppVersionNotFound => "AppVersionNotFound",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::FileError => "FileError",
            ErrorKind::FileUploadRollback => "FileUploadRollback",
            ErrorKind::FileUpdateRollback => "FileUpdateRollback",
            ErrorKind::MissingParameter => "MissingParameter",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{kind}: {details}")]
    Step { kind: ErrorKind, details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl RegistryError {
    pub fn step(kind: ErrorKind, details: impl Into<String>) -> Self {
        RegistryError::Step {
            kind,
            details: details.into(),
        }
    }

    /// The domain kind, if this is a structured step failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RegistryError::Step { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Human-readable cause, used when embedding this error into a rollback.
    pub fn cause_message(&self) -> String {
        match self {
            RegistryError::Step { details, .. } => details.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
