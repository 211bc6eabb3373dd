//! Connecting devices to drivers, and the other user actions on a row.

use log::{debug, error, info, warn};
use std::sync::Arc;

use super::device::ConnectedDriver;
use super::{CatalogEvent, DeviceManager};
use crate::driver::{DriverArgs, DriverRef, DriverSignals};
use crate::icons::load_device_icon;

impl DeviceManager {
    /// Connects the device at `row` to a driver, or returns the existing connection.
    ///
    /// Returns `None` if the device isn't plugged in, no driver handles any of its URLs, or the
    /// driver couldn't be created. A device connected for the first time is saved in the
    /// registry before its driver is created, even if creation then fails.
    pub fn connect(&mut self, row: usize) -> Option<DriverRef> {
        let info = self.devices.get(row)?;
        if let Some(driver) = &info.driver {
            return Some(DriverRef::new(&driver.handle));
        }

        let Some((lister_id, unique_id)) = info.live_lister(&self.listers) else {
            debug!("Can't connect row {row}: device isn't plugged in");
            return None;
        };
        let lister = Arc::clone(self.lister(lister_id)?);

        let first_time = !info.is_persisted();
        if first_time {
            let record = info.to_record();
            match self.registry.add_device(&record) {
                Ok(id) => {
                    info!("Remembering device {} as #{id}", record.friendly_name);
                    self.devices[row].database_id = Some(id);
                }
                Err(e) => {
                    error!("Couldn't save device {} in the registry: {e}", record.friendly_name);
                    return None;
                }
            }
        }
        let database_id = self.devices[row].database_id?;

        let urls = lister.make_device_urls(&unique_id);
        if urls.is_empty() {
            debug!("Lister has no URLs for {unique_id}");
            return None;
        }

        // Later URLs win when several have a driver.
        let Some(url) = urls.iter().rfind(|url| self.drivers.supports(url.scheme())).cloned() else {
            let url_list = urls.iter().map(|url| url.as_str()).collect::<Vec<_>>().join(", ");
            self.emit(CatalogEvent::Error {
                message: format!("This type of device is not supported: {url_list}"),
            });
            return None;
        };
        let factory = Arc::clone(self.drivers.get(url.scheme())?);

        self.next_connection += 1;
        let connection = self.next_connection;
        debug!("Connecting {url} (connection {connection})");
        let args = DriverArgs {
            url: url.clone(),
            lister,
            lister_id,
            unique_id,
            catalog: DriverSignals::new(self.devices[row].key, connection, self.sender.clone()),
            database_id,
            first_time,
        };

        let handle = match factory(args) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not create device for {url}: {e}");
                return None;
            }
        };

        let reference = DriverRef::new(&handle);
        self.devices[row].driver = Some(ConnectedDriver {
            handle,
            lister: lister_id,
            connection,
        });
        info!("Connected {url}");
        self.row_changed(row);
        self.emit(CatalogEvent::DeviceConnected { row });
        Some(reference)
    }

    /// Drops the device's driver. No-op if it isn't connected.
    pub fn disconnect(&mut self, row: usize) {
        let Some(info) = self.devices.get_mut(row) else {
            return;
        };
        let Some(driver) = info.driver.take() else {
            return;
        };
        info!("Disconnecting {}", driver.handle.url());
        drop(driver);

        self.emit(CatalogEvent::DeviceDisconnected { row });
        self.row_changed(row);
    }

    /// Removes the device from the registry.
    ///
    /// If the device isn't plugged in, its row goes away. Otherwise it stays as a fresh,
    /// unsaved device with the name and icon its lister reports. If the registry delete fails,
    /// nothing changes.
    pub fn forget(&mut self, row: usize) {
        let Some(database_id) = self.database_id(row) else {
            return;
        };
        if let Err(e) = self.registry.remove_device(database_id) {
            error!("Couldn't remove device #{database_id} from the registry: {e}");
            return;
        }
        self.disconnect(row);
        info!("Forgot device #{database_id}");

        let info = &mut self.devices[row];
        info.database_id = None;

        let Some((lister_id, unique_id)) = info.live_lister(&self.listers) else {
            self.remove_row(row);
            return;
        };
        // Absent paths were only known through the registry record.
        info.backends.retain(|backend| backend.lister.is_some());
        if let Some(lister) = self.listers.get(lister_id.0) {
            info.load_identity(lister.as_ref(), &unique_id, self.icons.as_ref(), self.config.icon_size);
        }
        self.row_changed(row);
    }

    /// Renames the device and changes its icon. Saved devices are updated in the registry too.
    pub fn set_device_identity(&mut self, row: usize, friendly_name: &str, icon_name: &str) {
        let Some(info) = self.devices.get_mut(row) else {
            return;
        };
        info.friendly_name = friendly_name.to_string();
        info.icon = load_device_icon(
            self.icons.as_ref(),
            &[icon_name.to_string()],
            friendly_name,
            self.config.icon_size,
        );
        let database_id = info.database_id;
        self.row_changed(row);

        if let Some(id) = database_id
            && let Err(e) = self.registry.set_device_identity(id, friendly_name, icon_name)
        {
            error!("Couldn't update device #{id} in the registry: {e}");
        }
    }

    /// Disconnects a saved device and asks its lister to unmount it.
    ///
    /// Must run on the manager's thread; other threads use
    /// [`CatalogHandle::unmount_async`](super::CatalogHandle::unmount_async).
    pub fn unmount(&mut self, row: usize) {
        if self.database_id(row).is_none() {
            return;
        }
        self.disconnect(row);

        let Some((lister_id, unique_id)) = self.devices[row].live_lister(&self.listers) else {
            debug!("Not unmounting row {row}: device isn't plugged in");
            return;
        };
        if let Some(lister) = self.lister(lister_id) {
            info!("Unmounting {unique_id}");
            lister.unmount_device(&unique_id);
        }
    }
}
