//! JSON key-value file holding persisted settings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::SETTINGS_KEY;
use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;

/// A flat JSON object on disk; settings live under [`SETTINGS_KEY`] and
/// other keys are preserved on write.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/statbridge/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statbridge").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or `None` when nothing has been saved yet.
    pub fn load(&self) -> ConfigResult<Option<Settings>> {
        let entries = self.read_entries()?;
        let Some(raw) = entries.get(SETTINGS_KEY) else {
            return Ok(None);
        };

        let settings = serde_json::from_value(raw.clone()).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            message: format!("{SETTINGS_KEY}: {err}"),
        })?;
        trace!(path = %self.path.display(), "Loaded settings");
        Ok(Some(settings))
    }

    pub fn save(&self, settings: &Settings) -> ConfigResult<()> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(ConfigError::Parse { message, .. }) => {
                warn!(
                    path = %self.path.display(),
                    error = %message,
                    "Settings store is corrupt; rewriting it"
                );
                Map::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(SETTINGS_KEY.to_string(), serde_json::to_value(settings)?);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let body = serde_json::to_string_pretty(&Value::Object(entries))?;
        fs::write(&self.path, body).map_err(|source| ConfigError::Io {
            action: "write",
            path: self.path.clone(),
            source,
        })
    }

    fn read_entries(&self) -> ConfigResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(ConfigError::Io {
                    action: "read",
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(ConfigError::Parse {
                path: self.path.clone(),
                message: "expected a JSON object".to_string(),
            }),
            Err(err) => Err(ConfigError::Parse {
                path: self.path.clone(),
                message: err.to_string(),
            }),
        }
    }
}
