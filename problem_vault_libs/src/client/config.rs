use crate::client::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const CONFIG_FILE_NAME: &str = "client.json";

/// Snapshot of the client configuration.
///
/// Snapshots are never mutated in place; the `with_*` methods and [`ConfigFile::store`]
/// return a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

impl SyncConfig {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>) -> Self {
        Self::default().merge(base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn with_base_url(self, base_url: &str) -> Self {
        self.merge(Some(base_url), None)
    }

    pub fn with_api_key(self, api_key: &str) -> Self {
        self.merge(None, Some(api_key))
    }

    /// Overrides the fields that are given and non-blank, keeps the others.
    pub fn merge(self, base_url: Option<&str>, api_key: Option<&str>) -> Self {
        let base_url = clean(base_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .or(self.base_url);
        let api_key = clean(api_key).map(String::from).or(self.api_key);

        Self { base_url, api_key }
    }
}

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// JSON file holding the persisted [`SyncConfig`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/problem_vault/client.json`
    pub fn at_default_location() -> Result<Self> {
        let path = dirs::config_dir()
            .ok_or(SyncError::ConfigDirUnavailable)?
            .join("problem_vault")
            .join(CONFIG_FILE_NAME);
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty configuration.
    pub fn load(&self) -> Result<SyncConfig> {
        if !self.path.exists() {
            tracing::debug!("no client configuration at {}", self.path.display());
            return Ok(SyncConfig::default());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| SyncError::ConfigIo {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SyncError::ConfigParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Merges the given values into the persisted configuration and returns the new snapshot.
    pub fn store(&self, base_url: Option<&str>, api_key: Option<&str>) -> Result<SyncConfig> {
        let config = self.load()?.merge(base_url, api_key);
        self.write(&config)?;
        tracing::info!("client configuration saved to {}", self.path.display());

        Ok(config)
    }

    fn write(&self, config: &SyncConfig) -> Result<()> {
        let io_error = |source| SyncError::ConfigIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let raw =
            serde_json::to_string_pretty(config).map_err(|source| SyncError::ConfigParse {
                path: self.path.clone(),
                source,
            })?;
        std::fs::write(&self.path, raw).map_err(io_error)
    }
}
