use crate::error::{RegistryError, Result};
use crate::normalize::Version;
use crate::parser::ParsedSpec;
use crate::storage::StoredBlob;
use crate::types::{FetchQuery, SpecRecord, UploadedFile};
use std::path::PathBuf;
use uuid::Uuid;

/// Per-operation record threaded through a chain.
///
/// Fields start empty and are filled in by the step noted on each one. A step
/// that needs an earlier step's output goes through [`required`], so running
/// steps out of order is an internal error rather than a silent default.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub file: Option<UploadedFile>,
    pub query: FetchQuery,
    /// ParseSpec
    pub parsed: Option<ParsedSpec>,
    /// ParseSpec; normalized by GetSchemaValidation and ValidateExistingSchema.
    pub app_name: Option<String>,
    /// SaveSchema, ValidateExistingSchema, FetchSchema
    pub app_version: Option<Version>,
    /// ValidateExistingSchema
    pub existing: Option<ExistingSchema>,
    /// SaveSchema, UpdateSchema
    pub stored: Option<StoredBlob>,
    /// SaveSchema, UpdateSchema
    pub saved_record: Option<SpecRecord>,
    /// FetchSchema
    pub fetched: Option<FetchedSchema>,
}

#[derive(Debug, Clone)]
pub struct ExistingSchema {
    pub record: SpecRecord,
    pub absolute_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FetchedSchema {
    pub record: SpecRecord,
    pub content: String,
}

impl RequestContext {
    fn empty() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            file: None,
            query: FetchQuery::default(),
            parsed: None,
            app_name: None,
            app_version: None,
            existing: None,
            stored: None,
            saved_record: None,
            fetched: None,
        }
    }

    pub fn for_upload(file: Option<UploadedFile>) -> Self {
        Self {
            file,
            ..Self::empty()
        }
    }

    pub fn for_fetch(query: FetchQuery) -> Self {
        Self {
            query,
            ..Self::empty()
        }
    }
}

pub fn required<'a, T>(slot: &'a Option<T>, what: &str) -> Result<&'a T> {
    slot.as_ref()
        .ok_or_else(|| {
            RegistryError::Internal(format!("{what} is not set; pipeline steps ran out of order"))
        })
}
