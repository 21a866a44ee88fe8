//! # Settings
//!
//! Host settings: the engine configuration plus where the snapshot lives.
//!
//! ## Load Order
//! 1. Defaults
//! 2. `tally.toml` (explicit `--config` path, else the platform config dir)
//! 3. `TALLY_*` environment variables
//! 4. Validation
//!
//! ## File Format
//! ```toml
//! snapshot_path = "tally-snapshot.json"
//!
//! [engine]
//! default_markup = 2.0
//! recipe_markup = 2.5
//! week_start = "monday"
//! leaderboard_top_n = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::{ConfigError, EngineConfig};
use thiserror::Error;
use tracing::{debug, info};

/// Overrides the snapshot location.
pub const ENV_SNAPSHOT: &str = "TALLY_SNAPSHOT";

const CONFIG_FILE: &str = "tally.toml";

/// Settings loading errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// JSON snapshot read by the report commands and written by `seed`.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("tally-snapshot.json")
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            snapshot_path: default_snapshot_path(),
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the file, then the process environment.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, SettingsError> {
        Self::load_with(config_path.or_else(Self::default_config_path), |key| {
            std::env::var(key).ok()
        })
    }

    /// Loads settings from `path` (when it exists) and the given variables.
    pub fn load_with<F>(path: Option<PathBuf>, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading settings from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Settings file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        if let Some(snapshot) = lookup(ENV_SNAPSHOT) {
            debug!(snapshot = %snapshot, "Overriding snapshot path from environment");
            settings.snapshot_path = PathBuf::from(snapshot);
        }
        settings.engine.apply_overrides(&lookup);
        settings.engine.validate()?;

        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// `tally.toml` in the platform config directory.
    ///
    /// - **macOS**: `~/Library/Application Support/com.tally.tally/tally.toml`
    /// - **Linux**: `~/.config/tally/tally.toml`
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "tally")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
