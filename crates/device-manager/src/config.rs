//! Device manager configuration.
//!
//! Loaded from a JSON file. Every key is optional; missing keys fall back to defaults, and a
//! missing or unreadable file yields the default config.

use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Size (in pixels) of the device icon in the list view.
pub const DEVICE_ICON_SIZE: u32 = 32;

/// Size (in pixels) of the overlay drawn over remembered-but-absent devices.
pub const DEVICE_ICON_OVERLAY_SIZE: u32 = 16;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceManagerConfig {
    /// SQLite file holding remembered devices.
    pub registry_path: PathBuf,
    pub icon_size: u32,
    pub overlay_icon_size: u32,
    /// Theme icon composited over devices that are remembered but not plugged in.
    pub not_connected_overlay_icon: String,
}

impl Default for DeviceManagerConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            icon_size: DEVICE_ICON_SIZE,
            overlay_icon_size: DEVICE_ICON_OVERLAY_SIZE,
            not_connected_overlay_icon: "edit-delete".to_string(),
        }
    }
}

/// Like `~/.local/share/device-manager/devices.db` on Linux.
fn default_registry_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("device-manager")
        .join("devices.db")
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Invalid config JSON: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reads and parses the config file, surfacing every failure.
pub fn try_load_config(path: &Path) -> Result<DeviceManagerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Loads the config, returning defaults if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> DeviceManagerConfig {
    match try_load_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No device config at {}, using defaults", path.display());
            DeviceManagerConfig::default()
        }
        Err(e) => {
            warn!("Failed to load device config from {}: {e}", path.display());
            DeviceManagerConfig::default()
        }
    }
}
