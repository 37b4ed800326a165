use crate::constants::STORED_EXTENSIONS;
use crate::error::{ErrorKind, RegistryError, Result};
use crate::normalize::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Filesystem layout for spec blobs: `<root>/<app_name>/v<version>.<ext>`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

/// Where a blob landed, both as recorded in the index and on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.yaml`/`.yml` uploads are stored as yaml, everything else as json.
    pub fn extension_for(original_name: &str) -> &'static str {
        let lower = original_name.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            "yaml"
        } else {
            "json"
        }
    }

    pub fn relative_path(app_name: &str, version: &Version, ext: &str) -> String {
        format!("{}/v{}.{}", app_name, version, ext)
    }

    pub fn absolute(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Directory for one app, created on demand.
    pub fn resolve_dir(&self, app_name: &str) -> Result<PathBuf> {
        let dir = self.app_dir(app_name)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write (or overwrite) the blob for `(app_name, version)`.
    pub fn write(
        &self,
        app_name: &str,
        version: &Version,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob> {
        self.resolve_dir(app_name)?;
        let ext = Self::extension_for(original_name);
        let relative_path = Self::relative_path(app_name, version, ext);
        let absolute_path = self.absolute(&relative_path);
        fs::write(&absolute_path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), absolute_path.display());
        Ok(StoredBlob {
            relative_path,
            absolute_path,
        })
    }

    /// First existing blob for `(app_name, version)` across json, yaml, yml.
    pub fn locate_existing(&self, app_name: &str, version: &Version) -> Result<PathBuf> {
        let dir = self.app_dir(app_name)?;
        STORED_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("v{}.{}", version, ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                RegistryError::step(
                    ErrorKind::FileMissing,
                    format!("File for app version {} is missing in uploads folder", version),
                )
            })
    }

    pub fn read(&self, relative_path: &str) -> Result<String> {
        let path = self.absolute(relative_path);
        fs::read_to_string(&path).map_err(|e| {
            debug!("read of {} failed: {}", path.display(), e);
            RegistryError::step(
                ErrorKind::FileError,
                format!("Could not read schema file at {}", relative_path),
            )
        })
    }

    /// Current bytes at `path`, or `None` if nothing is there yet.
    pub fn snapshot(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal used to compensate a write. Failures are logged,
    /// never returned.
    pub fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) => {
                error!("Rollback failed: could not delete {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Best-effort restore of previously snapshotted bytes.
    pub fn restore(&self, path: &Path, bytes: &[u8]) -> bool {
        match fs::write(path, bytes) {
            Ok(()) => true,
            Err(e) => {
                error!("Rollback failed: could not restore {}: {}", path.display(), e);
                false
            }
        }
    }

    fn app_dir(&self, app_name: &str) -> Result<PathBuf> {
        let unsafe_name = app_name.is_empty()
            || app_name == "."
            || app_name == ".."
            || app_name.contains(['/', '\\']);
        if unsafe_name {
            return Err(RegistryError::step(
                ErrorKind::InvalidSpec,
                format!("App name '{}' cannot be used as a storage directory", app_name),
            ));
        }
        Ok(self.root.join(app_name))
    }
}
