use crate::constants;
use crate::error::{RegistryError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub uploads_root: PathBuf,
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_root: PathBuf::from(constants::DEFAULT_UPLOADS_ROOT),
            database_path: PathBuf::from(constants::DEFAULT_DATABASE_PATH),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            max_upload_bytes: constants::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(constants::DEFAULT_LOG_DIR),
            file_name: constants::DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load `.env`, then the TOML config file, then environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let explicit = std::env::var(constants::ENV_CONFIG_FILE).ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| constants::DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            return Err(RegistryError::Config(format!(
                "Config file '{}' does not exist",
                path
            )));
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(constants::ENV_UPLOADS_DIR) {
            self.storage.uploads_root = PathBuf::from(v);
        }
        if let Some(v) = lookup(constants::ENV_DB_PATH) {
            self.storage.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(constants::ENV_HOST) {
            self.server.host = v;
        }
        if let Some(v) = lookup(constants::ENV_PORT) {
            self.server.port = v.trim().parse().map_err(|_| {
                RegistryError::Config(format!(
                    "{} must be a port number, got '{}'",
                    constants::ENV_PORT,
                    v
                ))
            })?;
        }
        if let Some(v) = lookup(constants::ENV_MAX_UPLOAD_BYTES) {
            self.server.max_upload_bytes = v.trim().parse().map_err(|_| {
                RegistryError::Config(format!(
                    "{} must be a byte count, got '{}'",
                    constants::ENV_MAX_UPLOAD_BYTES,
                    v
                ))
            })?;
        }
        if let Some(v) = lookup(constants::ENV_LOG_DIR) {
            self.logging.directory = PathBuf::from(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, constants::DEFAULT_HOST);
        assert_eq!(config.storage.uploads_root, PathBuf::from(constants::DEFAULT_UPLOADS_ROOT));
        assert_eq!(config.logging.file_name, constants::DEFAULT_LOG_FILE);
        assert_eq!(config.server.max_upload_bytes, constants::DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (constants::ENV_UPLOADS_DIR, "/srv/specs"),
            (constants::ENV_PORT, " 9000 "),
            (constants::ENV_MAX_UPLOAD_BYTES, "1048576"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.storage.uploads_root, PathBuf::from("/srv/specs"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
        assert_eq!(config.storage.database_path, PathBuf::from(constants::DEFAULT_DATABASE_PATH));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == constants::ENV_PORT).then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        fs::write(&path, "[storage]\nuploads_root = \"blobs\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.storage.uploads_root, PathBuf::from("blobs"));
    }
}
