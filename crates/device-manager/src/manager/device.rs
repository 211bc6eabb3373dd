//! The catalog's per-device state.

use std::sync::Arc;

use super::rows::DeviceKey;
use crate::driver::ConnectedDevice;
use crate::icons::{DeviceIcon, IconTheme, load_device_icon};
use crate::lister::{DeviceLister, ListerId};
use crate::registry::DeviceRecord;

/// One path through which a logical device has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Backend {
    /// `None` while the device isn't present through this lister (or we don't know yet, for
    /// devices loaded from the registry).
    pub lister: Option<ListerId>,
    pub unique_id: String,
}

/// A driver owned by the catalog.
pub(crate) struct ConnectedDriver {
    pub handle: Arc<dyn ConnectedDevice>,
    /// The lister the device was connected through.
    pub lister: ListerId,
    /// Distinguishes this connection from earlier ones of the same device.
    pub connection: u64,
}

pub(crate) struct DeviceInfo {
    pub key: DeviceKey,
    /// `None` until the device is saved in the registry.
    pub database_id: Option<i64>,
    pub friendly_name: String,
    pub size: u64,
    pub icon: DeviceIcon,
    pub backends: Vec<Backend>,
    pub driver: Option<ConnectedDriver>,
    pub task_percentage: Option<i32>,
}

impl DeviceInfo {
    /// A remembered device. Its listers are unknown until they report it again.
    pub fn from_record(key: DeviceKey, record: &DeviceRecord, icons: &dyn IconTheme, icon_size: u32) -> Self {
        Self {
            key,
            database_id: Some(record.id),
            friendly_name: record.friendly_name.clone(),
            size: record.size,
            icon: load_device_icon(icons, &record.icon_names(), &record.friendly_name, icon_size),
            backends: record
                .unique_ids()
                .into_iter()
                .map(|unique_id| Backend { lister: None, unique_id })
                .collect(),
            driver: None,
            task_percentage: None,
        }
    }

    /// A device seen for the first time.
    pub fn from_lister(
        key: DeviceKey,
        lister_id: ListerId,
        lister: &dyn DeviceLister,
        unique_id: &str,
        icons: &dyn IconTheme,
        icon_size: u32,
    ) -> Self {
        let friendly_name = lister.make_friendly_name(unique_id);
        Self {
            key,
            database_id: None,
            icon: load_device_icon(icons, &lister.device_icons(unique_id), &friendly_name, icon_size),
            friendly_name,
            size: lister.device_capacity(unique_id),
            backends: vec![Backend {
                lister: Some(lister_id),
                unique_id: unique_id.to_string(),
            }],
            driver: None,
            task_percentage: None,
        }
    }

    /// Replaces name and icon with what the lister reports.
    pub fn load_identity(&mut self, lister: &dyn DeviceLister, unique_id: &str, icons: &dyn IconTheme, icon_size: u32) {
        self.friendly_name = lister.make_friendly_name(unique_id);
        self.icon = load_device_icon(icons, &lister.device_icons(unique_id), &self.friendly_name, icon_size);
    }

    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord {
            id: self.database_id.unwrap_or(-1),
            unique_id: self
                .backends
                .iter()
                .map(|backend| backend.unique_id.as_str())
                .collect::<Vec<_>>()
                .join(","),
            friendly_name: self.friendly_name.clone(),
            size: self.size,
            icon_name: self.icon.name.clone(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.database_id.is_some()
    }

    /// The backend used for display and connection: the live one with the highest lister
    /// priority (first wins ties), or the first backend if none is live.
    pub fn best_backend(&self, listers: &[Arc<dyn DeviceLister>]) -> Option<&Backend> {
        let mut best: Option<(i32, &Backend)> = None;
        for backend in &self.backends {
            let Some(lister) = backend.lister.and_then(|id| listers.get(id.0)) else {
                continue;
            };
            let priority = lister.priority();
            if best.is_none_or(|(best_priority, _)| priority > best_priority) {
                best = Some((priority, backend));
            }
        }
        best.map(|(_, backend)| backend).or_else(|| self.backends.first())
    }

    /// The best backend's lister, if it's live.
    pub fn live_lister(&self, listers: &[Arc<dyn DeviceLister>]) -> Option<(ListerId, String)> {
        let backend = self.best_backend(listers)?;
        backend.lister.map(|id| (id, backend.unique_id.clone()))
    }

    pub fn backend_index(&self, unique_id: &str) -> Option<usize> {
        self.backends.iter().position(|backend| backend.unique_id == unique_id)
    }
}
