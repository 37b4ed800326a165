use super::steps::{
    FetchSchema, FileValidation, GetSchemaValidation, ParseSpec, SaveSchema, UpdateSchema,
    ValidateExistingSchema,
};
use super::Chain;
use crate::storage::{ContentStore, MetadataIndex};
use std::sync::Arc;

/// Ingest-New: `FileValidation -> ParseSpec -> SaveSchema`
pub fn upload_chain(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Chain {
    Chain::new("upload")
        .then(FileValidation)
        .then(ParseSpec)
        .then(SaveSchema::new(index, store))
}

/// Ingest-Replace: `FileValidation -> ParseSpec -> ValidateExistingSchema -> UpdateSchema`
pub fn edit_chain(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Chain {
    Chain::new("edit")
        .then(FileValidation)
        .then(ParseSpec)
        .then(ValidateExistingSchema::new(index.clone(), store.clone()))
        .then(UpdateSchema::new(index, store))
}

/// Fetch: `GetSchemaValidation -> FetchSchema`
pub fn get_chain(index: Arc<dyn MetadataIndex>, store: Arc<ContentStore>) -> Chain {
    Chain::new("get")
        .then(GetSchemaValidation)
        .then(FetchSchema::new(index, store))
}
