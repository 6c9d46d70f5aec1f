use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigResult;
use crate::store::SettingsStore;
use crate::{DEFAULT_API_PORT, DEFAULT_REFRESH_INTERVAL_SECS};

/// User-editable runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Port of the local statistics backend.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl Settings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }
}

/// Settings shared between the registry and the tools that read them.
///
/// Clones observe the same values; [`reload`](Self::reload) and
/// [`update`](Self::update) are visible to every clone immediately.
#[derive(Clone, Debug)]
pub struct SharedSettings {
    current: Arc<RwLock<Settings>>,
    store: Option<Arc<SettingsStore>>,
}

impl SharedSettings {
    /// In-memory settings with no backing store.
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(settings)),
            store: None,
        }
    }

    /// Settings backed by `store`, loaded now. A store without an entry
    /// yields the defaults.
    pub fn with_store(store: SettingsStore) -> ConfigResult<Self> {
        let settings = store.load()?.unwrap_or_default();
        Ok(Self {
            current: Arc::new(RwLock::new(settings)),
            store: Some(Arc::new(store)),
        })
    }

    pub fn get(&self) -> Settings {
        *self.current.read()
    }

    pub fn api_port(&self) -> u16 {
        self.current.read().api_port
    }

    pub fn store(&self) -> Option<&SettingsStore> {
        self.store.as_deref()
    }

    /// Re-read the backing store. Without a store, or when the store has no
    /// entry, the current settings are kept.
    pub fn reload(&self) -> ConfigResult<Settings> {
        if let Some(store) = &self.store
            && let Some(settings) = store.load()?
        {
            *self.current.write() = settings;
        }
        Ok(self.get())
    }

    /// Change settings and persist them. Clones only see the new value once
    /// it has been saved; a failed save leaves the current settings intact.
    pub fn update<F>(&self, change: F) -> ConfigResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut current = self.current.write();
        let mut updated = *current;
        change(&mut updated);

        if let Some(store) = &self.store {
            store.save(&updated)?;
        }
        *current = updated;
        drop(current);

        debug!(
            api_port = updated.api_port,
            refresh_interval = updated.refresh_interval,
            "Settings updated"
        );
        Ok(updated)
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
