// Pipeline steps shared by the upload, edit and get chains

pub mod fetch_schema;
pub mod file_validation;
pub mod get_validation;
pub mod parse_spec;
pub mod save_schema;
pub mod update_schema;
pub mod validate_existing;

pub use fetch_schema::FetchSchema;
pub use file_validation::FileValidation;
pub use get_validation::GetSchemaValidation;
pub use parse_spec::ParseSpec;
pub use save_schema::SaveSchema;
pub use update_schema::UpdateSchema;
pub use validate_existing::ValidateExistingSchema;
