//! Configuration for statbridge.
//!
//! Two layers live here:
//! - [`BridgeConfig`], the static TOML file describing where the backend,
//!   the settings store and the database live
//! - [`Settings`], the small user-editable record (`apiPort`,
//!   `refreshInterval`) persisted in a key-value [`SettingsStore`] and shared
//!   at runtime through [`SharedSettings`]

pub mod bridge;
pub mod error;
pub mod settings;
pub mod store;

pub use bridge::{BackendConfig, BridgeConfig, DatabaseConfig, KpmConfig, KpmSource, SettingsConfig};
pub use error::{ConfigError, ConfigResult};
pub use settings::{Settings, SharedSettings};
pub use store::SettingsStore;

/// Key under which settings are kept in the settings store.
pub const SETTINGS_KEY: &str = "apiStatsFetcher_settings";

pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "STATBRIDGE_CONFIG";
pub const CONFIG_FILE_NAME: &str = "statbridge.toml";
