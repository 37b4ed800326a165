use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the metadata index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    pub id: i64,
    pub app_name: String,
    pub app_version: String,
    /// Store-relative locator of the content blob.
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// A spec file as submitted by a caller.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Query parameters of a fetch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchQuery {
    #[serde(rename = "appName", alias = "app_name")]
    pub app_name: Option<String>,
    pub version: Option<String>,
}

impl FetchQuery {
    pub fn new(app_name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: SpecRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub message: String,
    pub data: EditData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditData {
    pub app_name: String,
    pub app_version: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub app_name: String,
    pub app_version: String,
    pub created_at: DateTime<Utc>,
    pub file_path: String,
    pub content: String,
}
