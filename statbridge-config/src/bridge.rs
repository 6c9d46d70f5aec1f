//! Static configuration read from `statbridge.toml`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::store::SettingsStore;
use crate::{CONFIG_ENV, CONFIG_FILE_NAME};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub backend: BackendConfig,
    pub settings: SettingsConfig,
    pub database: DatabaseConfig,
    pub kpm: KpmConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Host of the statistics backend; the port comes from the settings.
    pub host: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Settings store file. Defaults to [`SettingsStore::default_path`].
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory patched by `patchDatabaseFile`. The tool stays disabled
    /// while this is unset.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpmSource {
    /// Ask the backend's `/read-logs` endpoint.
    #[default]
    Backend,
    /// Read the log file directly.
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpmConfig {
    pub source: KpmSource,
    /// Defaults to `~/.kpm_log.csv`.
    pub log_path: Option<PathBuf>,
}

impl KpmConfig {
    pub fn resolved_log_path(&self) -> Option<PathBuf> {
        self.log_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".kpm_log.csv")))
    }
}

impl BridgeConfig {
    /// Load configuration.
    ///
    /// Lookup order: `explicit`, then `$STATBRIDGE_CONFIG`, then
    /// `<config dir>/statbridge/statbridge.toml`. An explicitly named file must
    /// exist; the implicit locations fall back to defaults when absent.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        match Self::from_file(&path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file; using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|err| err.to_string())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statbridge").join(CONFIG_FILE_NAME))
    }

    /// Settings store selected by this config, if any location is known.
    pub fn settings_store(&self) -> Option<SettingsStore> {
        self.settings
            .path
            .clone()
            .or_else(SettingsStore::default_path)
            .map(SettingsStore::new)
    }
}
