// Canonical forms for the two identity fields of a spec

pub mod app_name;
pub mod version;

pub use app_name::to_safe_name;
pub use version::{RawVersion, Version};
