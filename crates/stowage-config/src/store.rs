//! File-backed configuration store used for manual recovery.
//!
//! # Design
//! - Reads and writes the same JSON document the server persists.
//! - Writes go to a sibling temp file and are renamed into place.
//! - A missing file reads as an empty configuration (initial setup).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Configuration;
use crate::session::ConfigBackend;

/// Environment variable overriding the config file location.
pub const CONFIG_FILE_ENV: &str = "STOWAGE_CONFIG_FILE";

/// Conventional config location: `<user config dir>/stowage/config.json`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stowage").join("config.json"))
}

/// Configuration stored as a JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileConfigBackend {
    path: PathBuf,
}

impl FileConfigBackend {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an IO or parse error when the file exists but cannot be loaded.
    pub async fn read(&self) -> ConfigResult<Configuration> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Configuration::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    operation: "config.read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the document.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the directory, temp file or rename fails.
    pub async fn write(&self, config: &Configuration) -> ConfigResult<()> {
        let io_err = |operation: &'static str, path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::Io {
                operation,
                path,
                source,
            }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(io_err("config.create_dir", parent))?;
        }

        let mut payload = serde_json::to_vec_pretty(config).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        payload.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &payload)
            .await
            .map_err(io_err("config.write_temp", &tmp))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(io_err("config.rename", &self.path))?;
        info!(path = %self.path.display(), "configuration file written");
        Ok(())
    }
}

#[async_trait]
impl ConfigBackend for FileConfigBackend {
    async fn get_config(&self) -> Result<Configuration> {
        Ok(self.read().await?)
    }

    async fn set_config(&self, config: &Configuration) -> Result<Configuration> {
        self.write(config).await?;
        Ok(self.read().await?)
    }
}
