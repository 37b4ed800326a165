use super::MetadataIndex;
use crate::error::{RegistryError, Result};
use crate::types::SpecRecord;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory index implementation for development/testing
#[derive(Default)]
pub struct InMemoryIndex {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: BTreeMap<i64, SpecRecord>,
    last_id: i64,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RegistryError::Internal("in-memory index lock poisoned".to_string()))
    }
}

impl MetadataIndex for InMemoryIndex {
    fn find_by_name_version(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> Result<Option<SpecRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .find(|r| r.app_name == app_name && r.app_version == app_version)
            .cloned())
    }

    fn find_all_by_name(&self, app_name: &str) -> Result<Vec<SpecRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .filter(|r| r.app_name == app_name)
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<SpecRecord>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn insert(&self, app_name: &str, app_version: &str, file_path: &str) -> Result<i64> {
        let mut inner = self.lock()?;
        if inner
            .rows
            .values()
            .any(|r| r.app_name == app_name && r.app_version == app_version)
        {
            return Err(RegistryError::Internal(format!(
                "UNIQUE constraint failed: schemas.app_name, schemas.app_version \
                 ({app_name}, {app_version})"
            )));
        }
        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(
            id,
            SpecRecord {
                id,
                app_name: app_name.to_string(),
                app_version: app_version.to_string(),
                file_path: file_path.to_string(),
                created_at: Utc::now(),
            },
        );
        debug!("Inserted schema row {} for {} {}", id, app_name, app_version);
        Ok(id)
    }

    fn update_path(&self, id: i64, file_path: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(row) = inner.rows.get_mut(&id) {
            row.file_path = file_path.to_string();
            row.created_at = Utc::now();
        }
        Ok(())
    }

    fn touch_timestamp(&self, id: i64) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(row) = inner.rows.get_mut(&id) {
            row.created_at = Utc::now();
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<SpecRecord>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn clear(&self) -> Result<usize> {
        let mut inner = self.lock()?;
        let removed = inner.rows.len();
        inner.rows.clear();
        inner.last_id = 0;
        Ok(removed)
    }
}
