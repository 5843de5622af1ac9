//! Playback settings and where they are loaded from.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::controller::{BindOptions, DEFAULT_MS_PER_STEP};
use crate::core::view::DEFAULT_LABEL_PREFIX;

/// Settings file name
pub const SETTINGS_FILE: &str = "stepscrub.json";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "STEPSCRUB_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (STEPSCRUB_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. STEPSCRUB_CONFIG_DIR environment variable
/// 3. Current directory IF it already holds stepscrub.json
/// 4. Platform-specific config directory from dirs-next
///
/// Platform paths:
/// - Linux: ~/.config/stepscrub/{name}
/// - macOS: ~/Library/Application Support/stepscrub/{name}
/// - Windows: %APPDATA%\stepscrub\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if current_dir.join(SETTINGS_FILE).exists() {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("stepscrub");
    }

    PathBuf::from(".")
}

/// Persistent playback defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Wall-clock milliseconds per step
    pub ms_per_step: u32,
    /// Frame driver cadence in ms; 0 leaves ticking to the host
    pub frame_interval_ms: u64,
    /// Text in front of the step label
    pub label_prefix: String,
    /// Start position; None starts on the final step
    pub initial_position: Option<f64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            ms_per_step: DEFAULT_MS_PER_STEP,
            frame_interval_ms: 16,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            initial_position: None,
        }
    }
}

impl PlaybackSettings {
    /// Load from an explicit file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load `stepscrub.json` from the resolved config dir, or defaults if absent.
    pub fn load_or_default(config: &PathConfig) -> Result<Self> {
        let path = config_file(SETTINGS_FILE, config);
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }

    /// Typed bind options for these settings
    pub fn bind_options(&self) -> BindOptions {
        BindOptions {
            initial_position: self.initial_position,
            ms_per_step: self.ms_per_step,
            label_prefix: self.label_prefix.clone(),
            frame_interval: match self.frame_interval_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}
