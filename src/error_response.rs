//! Uniform failure shape shared by every front end.

use crate::error::RegistryError;
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

pub const INTERNAL_SERVER_ERROR: &str = "InternalServerError";
pub const UNKNOWN_ERROR: &str = "UnknownError";
pub const PAYLOAD_TOO_LARGE: &str = "PayloadTooLarge";
const FALLBACK_DETAILS: &str = "An unexpected error occurred";

/// `{status, error, details}` produced for any failed operation.
///
/// Structured step failures map to 400 with their kind and details passed
/// through; anything else is a 500.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{error} - {details}")]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn from_error(err: &RegistryError) -> Self {
        match err {
            RegistryError::Step { kind, details } => Self {
                status: 400,
                error: kind.as_str().to_string(),
                details: details.clone(),
            },
            other => {
                let message = other.to_string();
                Self {
                    status: 500,
                    error: INTERNAL_SERVER_ERROR.to_string(),
                    details: if message.trim().is_empty() {
                        FALLBACK_DETAILS.to_string()
                    } else {
                        message
                    },
                }
            }
        }
    }

    /// 413 for a request body over the configured upload limit.
    pub fn payload_too_large(details: impl Into<String>) -> Self {
        Self {
            status: 413,
            error: PAYLOAD_TOO_LARGE.to_string(),
            details: details.into(),
        }
    }

    /// Translate a value that is not an error at all, such as a panic payload
    /// recovered at a front-end boundary.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let details = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            format!("{payload:?}")
        };
        Self {
            status: 500,
            error: UNKNOWN_ERROR.to_string(),
            details,
        }
    }
}

impl From<RegistryError> for ErrorResponse {
    fn from(err: RegistryError) -> Self {
        ErrorResponse::from_error(&err)
    }
}
