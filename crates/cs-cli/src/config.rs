//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cs_core::{CascadeConfig, parse_time_to_minutes};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Whether edits recompute downstream start times.
    pub cascade_enabled: bool,

    /// Anchor for empty lanes on days without a start time (`HH:MM`).
    pub default_day_start: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("cascade_enabled", &self.cascade_enabled)
            .field("default_day_start", &self.default_day_start)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("callsheet.db"),
            cascade_enabled: true,
            default_day_start: "07:00".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (CALLSHEET_*)
        figment = figment.merge(Env::prefixed("CALLSHEET_"));

        figment.extract()
    }

    /// Builds the per-call cascade settings.
    pub fn cascade(&self) -> anyhow::Result<CascadeConfig> {
        let default_day_start_minutes = parse_time_to_minutes(&self.default_day_start)
            .with_context(|| {
                format!(
                    "invalid default_day_start {:?}, expected HH:MM",
                    self.default_day_start
                )
            })?;
        Ok(CascadeConfig {
            enabled: self.cascade_enabled,
            default_day_start_minutes,
        })
    }
}

/// Returns the platform-specific config directory for callsheet.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("callsheet"))
}

/// Returns the platform-specific data directory for callsheet.
///
/// On Linux: `~/.local/share/callsheet`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("callsheet"))
}
