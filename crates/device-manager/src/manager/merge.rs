//! Merging lister reports into logical devices.
//!
//! The same physical device can show up through several listers under different IDs (say,
//! udisks and GIO both see a USB stick). Reports are matched to existing devices by unique ID
//! first, then by overlapping access URLs.

use log::debug;

use super::device::{Backend, DeviceInfo};
use super::{CatalogEvent, DeviceManager};
use crate::lister::ListerId;
use crate::url::DeviceUrl;

impl DeviceManager {
    pub(super) fn find_device_by_id(&self, unique_id: &str) -> Option<usize> {
        self.devices
            .iter()
            .position(|info| info.backend_index(unique_id).is_some())
    }

    /// Finds a device that is reachable, through one of its live backends, at any of `urls`.
    pub(super) fn find_device_by_urls(&self, urls: &[DeviceUrl]) -> Option<usize> {
        if urls.is_empty() {
            return None;
        }
        self.devices.iter().position(|info| {
            info.backends.iter().any(|backend| {
                let Some(lister) = backend.lister.and_then(|id| self.lister(id)) else {
                    return false;
                };
                lister
                    .make_device_urls(&backend.unique_id)
                    .iter()
                    .any(|url| urls.contains(url))
            })
        })
    }

    pub(super) fn physical_device_added(&mut self, lister_id: ListerId, unique_id: &str) {
        let Some(lister) = self.lister(lister_id).cloned() else {
            return;
        };
        debug!("Device added: {unique_id} (lister {lister_id:?})");

        // Seen before (this session or a remembered one): it's present again.
        if let Some(row) = self.find_device_by_id(unique_id) {
            let info = &mut self.devices[row];
            if let Some(index) = info.backend_index(unique_id) {
                info.backends[index].lister = Some(lister_id);
            }
            self.row_changed(row);
            return;
        }

        // The same device, reached through another lister.
        if let Some(row) = self.find_device_by_urls(&lister.make_device_urls(unique_id)) {
            let info = &mut self.devices[row];
            info.backends.push(Backend {
                lister: Some(lister_id),
                unique_id: unique_id.to_string(),
            });

            // Until the user saves the device, its identity follows the best backend.
            let is_best = info
                .best_backend(&self.listers)
                .is_some_and(|best| best.lister == Some(lister_id) && best.unique_id == unique_id);
            if !info.is_persisted() && is_best {
                info.load_identity(lister.as_ref(), unique_id, self.icons.as_ref(), self.config.icon_size);
                info.size = lister.device_capacity(unique_id);
            }
            debug!("Merged {unique_id} into existing device {}", info.friendly_name);
            self.row_changed(row);
            return;
        }

        let info = DeviceInfo::from_lister(
            self.keys.next(),
            lister_id,
            lister.as_ref(),
            unique_id,
            self.icons.as_ref(),
            self.config.icon_size,
        );
        let row = self.devices.len();
        self.devices.push(info);
        self.emit(CatalogEvent::RowsInserted { first: row, last: row });
    }

    pub(super) fn physical_device_removed(&mut self, lister_id: ListerId, unique_id: &str) {
        debug!("Device removed: {unique_id} (lister {lister_id:?})");

        let Some(row) = self.find_device_by_id(unique_id) else {
            debug!("Removed device {unique_id} was never listed");
            return;
        };
        let info = &mut self.devices[row];
        let Some(index) = info.backend_index(unique_id) else {
            return;
        };

        if info.is_persisted() {
            // Remembered: keep the row, just mark this path as absent.
            info.backends[index].lister = None;
            if info.driver.as_ref().is_some_and(|driver| driver.lister == lister_id) {
                info.driver = None;
            }
            let disconnected = info.driver.is_none();

            self.row_changed(row);
            if disconnected {
                self.emit(CatalogEvent::DeviceDisconnected { row });
            }
        } else {
            info.backends.remove(index);
            if info.backends.is_empty() {
                self.remove_row(row);
            } else {
                self.row_changed(row);
            }
        }
    }

    pub(super) fn physical_device_changed(&mut self, lister_id: ListerId, unique_id: &str) {
        match self.find_device_by_id(unique_id) {
            Some(row) => debug!("Device changed: {unique_id} (row {row}, lister {lister_id:?})"),
            None => debug!("Changed device {unique_id} was never listed"),
        }
    }
}
