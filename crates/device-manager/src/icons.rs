//! Device icon selection.
//!
//! Listers suggest icon names in order of preference. The first one the icon theme knows wins;
//! if none resolves we guess from the names (phone, iPod, or a generic USB stick).

use serde::Serialize;
use std::path::PathBuf;

/// Fallback icon for any removable device.
pub const GENERIC_DEVICE_ICON: &str = "drive-removable-media-usb-pendrive";
pub const PHONE_ICON: &str = "phone";
pub const IPOD_ICON: &str = "multimedia-player-ipod-standard-monochrome";

/// Resolves theme icon names to image files.
pub trait IconTheme: Send {
    /// Returns the icon file for `name` at roughly `size` pixels, or `None` if the theme doesn't
    /// have it.
    fn lookup(&self, name: &str, size: u32) -> Option<PathBuf>;
}

/// Theme that knows no icons. Every device falls through to the name heuristic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIconTheme;

impl IconTheme for NoIconTheme {
    fn lookup(&self, _name: &str, _size: u32) -> Option<PathBuf> {
        None
    }
}

/// The user's XDG icon theme.
#[cfg(target_os = "linux")]
#[derive(Debug, Default, Clone, Copy)]
pub struct XdgIconTheme;

#[cfg(target_os = "linux")]
impl IconTheme for XdgIconTheme {
    fn lookup(&self, name: &str, size: u32) -> Option<PathBuf> {
        let size = u16::try_from(size).unwrap_or(u16::MAX);
        freedesktop_icons::lookup(name).with_size(size).find()
    }
}

/// A selected icon: the theme name (persisted) and the file it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIcon {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DeviceIcon {
    fn named(theme: &dyn IconTheme, name: &str, size: u32) -> Self {
        Self {
            name: name.to_string(),
            path: theme.lookup(name, size),
        }
    }
}

/// Picks the icon for a device from the lister's candidates and the device name.
pub fn load_device_icon(theme: &dyn IconTheme, candidates: &[String], name_hint: &str, size: u32) -> DeviceIcon {
    let Some(first) = candidates.first() else {
        return DeviceIcon::named(theme, GENERIC_DEVICE_ICON, size);
    };

    for name in candidates {
        if let Some(path) = theme.lookup(name, size) {
            return DeviceIcon {
                name: name.clone(),
                path: Some(path),
            };
        }
    }

    let hint = format!("{first}{name_hint}").to_lowercase();
    let guess = if hint.contains("phone") {
        PHONE_ICON
    } else if hint.contains("ipod") || hint.contains("apple") {
        IPOD_ICON
    } else {
        GENERIC_DEVICE_ICON
    };
    DeviceIcon::named(theme, guess, size)
}
