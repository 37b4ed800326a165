//! Two-tier persistence: a filesystem content store for spec blobs and a
//! relational metadata index pointing at them.

pub mod content_store;
pub mod in_memory;
pub mod sqlite;

pub use content_store::{ContentStore, StoredBlob};
pub use in_memory::InMemoryIndex;
pub use sqlite::SqliteIndex;

use crate::error::Result;
use crate::types::SpecRecord;

/// Metadata index over `(app_name, app_version) -> file_path`.
///
/// Every call acquires and releases its own storage scope; implementations
/// hold no state that outlives a single call besides the backing store.
pub trait MetadataIndex: Send + Sync {
    fn find_by_name_version(&self, app_name: &str, app_version: &str) -> Result<Option<SpecRecord>>;

    /// All versions of one app, in no particular order.
    fn find_all_by_name(&self, app_name: &str) -> Result<Vec<SpecRecord>>;

    fn find_by_id(&self, id: i64) -> Result<Option<SpecRecord>>;

    /// Insert a row and return the id assigned by storage.
    fn insert(&self, app_name: &str, app_version: &str, file_path: &str) -> Result<i64>;

    /// Point a row at a new blob and refresh its timestamp.
    fn update_path(&self, id: i64, file_path: &str) -> Result<()>;

    /// Refresh a row's timestamp without touching its path.
    fn touch_timestamp(&self, id: i64) -> Result<()>;

    fn list_all(&self) -> Result<Vec<SpecRecord>>;

    /// Remove every row and reset id assignment. Returns the number of rows removed.
    fn clear(&self) -> Result<usize>;
}
