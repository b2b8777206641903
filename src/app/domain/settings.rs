use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::infrastructure::error::AppError;

/// Tunables for the state layer, stored as JSON in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSettings {
    /// Lifetime of a toast enqueued without an explicit duration.
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,

    /// Simulated round trip of the demo authentication backend.
    #[serde(default = "default_auth_latency_ms")]
    pub auth_latency_ms: u64,

    /// How often the desktop theme setting is polled.
    #[serde(default = "default_system_theme_poll_ms")]
    pub system_theme_poll_ms: u64,

    /// Where persisted store records live. Defaults to the data directory.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_toast_duration_ms() -> u64 {
    5000
}

fn default_auth_latency_ms() -> u64 {
    1000
}

fn default_system_theme_poll_ms() -> u64 {
    2000
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
            auth_latency_ms: default_auth_latency_ms(),
            system_theme_poll_ms: default_system_theme_poll_ms(),
            storage_dir: None,
        }
    }
}

impl StateSettings {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn auth_latency(&self) -> Duration {
        Duration::from_millis(self.auth_latency_ms)
    }

    /// Poll interval, never below 100ms.
    pub fn system_theme_poll(&self) -> Duration {
        Duration::from_millis(self.system_theme_poll_ms.max(100))
    }

    /// Load settings from disk, or create default if not exists
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Failed to parse settings: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist, use defaults
                let default = Self::default();
                // Try to save defaults for next time
                if let Err(e) = default.save_to(path) {
                    tracing::debug!("Could not write default settings: {e}");
                }
                default
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("adminx");
        path.push("settings.json");
        path
    }
}
