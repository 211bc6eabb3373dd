//! The list-model view of the catalog: one column, one row per device.

use serde::Serialize;

use super::DeviceManager;
use crate::driver::DriverRef;
use crate::icons::DeviceIcon;

/// Which attribute of a row to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Name (or unique ID if unnamed) plus the size, like "Cruzer (16.0 GB)".
    Display,
    /// Icon, with an overlay if the device isn't plugged in.
    Decoration,
    FriendlyName,
    UniqueId,
    IconName,
    Capacity,
    FreeSpace,
    State,
    UpdatingPercentage,
    MountPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Saved in the registry, not plugged in.
    Remembered,
    /// Plugged in, no driver.
    NotConnected,
    Connected,
}

/// An overlay drawn in the bottom-right corner of the icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconOverlay {
    pub icon: DeviceIcon,
    pub size: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconDecoration {
    pub icon: DeviceIcon,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<IconOverlay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Icon(IconDecoration),
    Bytes(u64),
    State(DeviceState),
    Percentage(i32),
}

impl DeviceManager {
    /// Reads one attribute of a row. `None` for out-of-range rows and absent values.
    pub fn data(&self, row: usize, role: Role) -> Option<AttributeValue> {
        let info = self.devices.get(row)?;
        let best = info.best_backend(&self.listers);
        let live_lister = best.and_then(|backend| backend.lister).and_then(|id| self.lister(id));

        match role {
            Role::Display => {
                let mut text = if info.friendly_name.is_empty() {
                    best.map(|backend| backend.unique_id.clone()).unwrap_or_default()
                } else {
                    info.friendly_name.clone()
                };
                if info.size != 0 {
                    text = format!("{text} ({})", pretty_size(info.size));
                }
                Some(AttributeValue::Text(text))
            }
            Role::Decoration => {
                let size = self.config.icon_size;
                let overlay = live_lister.is_none().then(|| {
                    let overlay_size = self.config.overlay_icon_size;
                    let offset = size.saturating_sub(overlay_size);
                    IconOverlay {
                        icon: self.not_connected_overlay.clone(),
                        size: overlay_size,
                        x: offset,
                        y: offset,
                    }
                });
                Some(AttributeValue::Icon(IconDecoration {
                    icon: info.icon.clone(),
                    size,
                    overlay,
                }))
            }
            Role::FriendlyName => Some(AttributeValue::Text(info.friendly_name.clone())),
            Role::UniqueId => best.map(|backend| AttributeValue::Text(backend.unique_id.clone())),
            Role::IconName => Some(AttributeValue::Text(info.icon.name.clone())),
            Role::Capacity => Some(AttributeValue::Bytes(info.size)),
            Role::FreeSpace => {
                let unique_id = &best?.unique_id;
                live_lister?.device_free_space(unique_id).map(AttributeValue::Bytes)
            }
            Role::State => {
                let state = if info.driver.is_some() {
                    DeviceState::Connected
                } else if live_lister.is_some() {
                    DeviceState::NotConnected
                } else {
                    DeviceState::Remembered
                };
                Some(AttributeValue::State(state))
            }
            Role::UpdatingPercentage => info.task_percentage.map(AttributeValue::Percentage),
            Role::MountPath => {
                let driver = info.driver.as_ref()?;
                Some(AttributeValue::Text(driver.handle.url().path().to_string()))
            }
        }
    }

    pub fn state(&self, row: usize) -> Option<DeviceState> {
        match self.data(row, Role::State)? {
            AttributeValue::State(state) => Some(state),
            _ => None,
        }
    }

    /// Rows of connected devices, in list order. Backs views that only show usable devices.
    pub fn connected_rows(&self) -> Vec<usize> {
        self.devices
            .iter()
            .enumerate()
            .filter(|(_, info)| info.driver.is_some())
            .map(|(row, _)| row)
            .collect()
    }

    /// The row's driver, connecting the device first if needed. See [`connect`](Self::connect).
    pub fn storage(&mut self, row: usize) -> Option<DriverRef> {
        self.connect(row)
    }
}

/// Formats a byte count for display, using decimal units like drive vendors do.
pub fn pretty_size(bytes: u64) -> String {
    const KB: u64 = 1000;
    const MB: u64 = KB * 1000;
    const GB: u64 = MB * 1000;
    const TB: u64 = GB * 1000;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
