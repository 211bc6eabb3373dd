//! The device catalog.
//!
//! Owns the list of logical devices, merges lister reports into it, connects devices to drivers
//! and tracks their background tasks. The catalog is single-threaded: listers, drivers and
//! other threads queue [`CatalogMessage`]s, and the owner applies them with
//! [`DeviceManager::process_events`].
//!
//! - `device`: per-device state and backend selection
//! - `merge`: lister add/remove/change handling
//! - `connector`: connect, disconnect, forget, rename, unmount
//! - `progress`: task progress bridge
//! - `model`: row/role query surface
//! - `rows`: stable row references

mod connector;
mod device;
mod events;
mod merge;
mod model;
mod progress;
mod rows;

pub use events::{CatalogEvent, CatalogHandle};
pub(crate) use events::CatalogMessage;
pub use model::{AttributeValue, DeviceState, IconDecoration, IconOverlay, Role, pretty_size};
pub(crate) use rows::DeviceKey;
pub use rows::RowRef;

use log::{debug, error, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::config::DeviceManagerConfig;
use crate::driver::{ConnectedDevice, DriverArgs, DriverError, DriverRef, DriverRegistry};
use crate::icons::{DeviceIcon, IconTheme};
use crate::lister::{DeviceLister, ListerEvent, ListerEvents, ListerId};
use crate::registry::{DeviceRegistry, RegistryError, RegistryHandle};
use device::DeviceInfo;
use rows::KeyAllocator;

pub struct DeviceManager {
    devices: Vec<DeviceInfo>,
    listers: Vec<Arc<dyn DeviceLister>>,
    drivers: DriverRegistry,
    registry: Box<dyn DeviceRegistry>,
    icons: Box<dyn IconTheme>,
    config: DeviceManagerConfig,
    not_connected_overlay: DeviceIcon,
    keys: KeyAllocator,
    next_connection: u64,
    /// Task ID → device that started it.
    active_tasks: BTreeMap<u64, RowRef>,
    sender: Sender<CatalogMessage>,
    receiver: Receiver<CatalogMessage>,
    subscribers: Vec<Sender<CatalogEvent>>,
}

impl DeviceManager {
    /// Creates the catalog with every device remembered in `registry`.
    ///
    /// A registry that can't be read is logged and treated as empty.
    pub fn new(registry: Box<dyn DeviceRegistry>, icons: Box<dyn IconTheme>, config: DeviceManagerConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        let not_connected_overlay = DeviceIcon {
            name: config.not_connected_overlay_icon.clone(),
            path: icons.lookup(&config.not_connected_overlay_icon, config.overlay_icon_size),
        };

        let mut keys = KeyAllocator::default();
        let devices = match registry.get_all_devices() {
            Ok(records) => records
                .iter()
                .map(|record| DeviceInfo::from_record(keys.next(), record, icons.as_ref(), config.icon_size))
                .collect(),
            Err(e) => {
                error!("Couldn't load remembered devices: {e}");
                Vec::new()
            }
        };
        debug!("Loaded {} remembered device(s)", devices.len());

        Self {
            devices,
            listers: Vec::new(),
            drivers: DriverRegistry::new(),
            registry,
            icons,
            config,
            not_connected_overlay,
            keys,
            next_connection: 0,
            active_tasks: BTreeMap::new(),
            sender,
            receiver,
            subscribers: Vec::new(),
        }
    }

    /// Opens the registry at `config.registry_path` on its own worker thread and loads the
    /// catalog from it.
    pub fn open(icons: Box<dyn IconTheme>, config: DeviceManagerConfig) -> Result<Self, RegistryError> {
        let registry = RegistryHandle::spawn(&config.registry_path)?;
        info!("Device registry at {}", config.registry_path.display());
        Ok(Self::new(Box::new(registry), icons, config))
    }

    /// Registers and starts a lister.
    pub fn add_lister(&mut self, lister: Arc<dyn DeviceLister>) -> ListerId {
        let id = ListerId(self.listers.len());
        self.listers.push(Arc::clone(&lister));
        info!("Starting device lister {id:?} (priority {})", lister.priority());
        lister.start(ListerEvents::new(id, self.sender.clone()));
        id
    }

    /// Registers the driver factory for URLs with `scheme`.
    pub fn register_driver<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn(DriverArgs) -> Result<Arc<dyn ConnectedDevice>, DriverError> + Send + Sync + 'static,
    {
        self.drivers.register(scheme, factory);
    }

    /// Replaces the whole driver registry.
    pub fn set_drivers(&mut self, drivers: DriverRegistry) {
        self.drivers = drivers;
    }

    /// Returns a receiver for all future change notifications.
    pub fn subscribe(&mut self) -> Receiver<CatalogEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn handle(&self) -> CatalogHandle {
        CatalogHandle::new(self.sender.clone())
    }

    /// Applies every queued lister, driver and cross-thread message. Returns how many there were.
    pub fn process_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.dispatch(message);
            count += 1;
        }
        count
    }

    /// Like [`process_events`](Self::process_events), but first waits up to `timeout` for a
    /// message to arrive.
    pub fn wait_and_process_events(&mut self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => {
                self.dispatch(message);
                1 + self.process_events()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn dispatch(&mut self, message: CatalogMessage) {
        match message {
            CatalogMessage::Lister { lister, event } => match event {
                ListerEvent::Added(id) => self.physical_device_added(lister, &id),
                ListerEvent::Removed(id) => self.physical_device_removed(lister, &id),
                ListerEvent::Changed(id) => self.physical_device_changed(lister, &id),
            },
            CatalogMessage::DriverTaskStarted {
                device,
                connection,
                task_id,
            } => self.device_task_started(device, connection, task_id),
            CatalogMessage::DriverError {
                device,
                connection,
                message,
            } => {
                if self.row_of_connection(device, connection).is_some() {
                    self.emit(CatalogEvent::Error { message });
                } else {
                    debug!("Ignoring error from a disconnected driver: {message}");
                }
            }
            CatalogMessage::Unmount(row_ref) => match self.resolve(&row_ref) {
                Some(row) => self.unmount(row),
                None => debug!("Unmount requested for a device that's no longer listed"),
            },
        }
    }

    fn emit(&mut self, event: CatalogEvent) {
        self.subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn row_changed(&mut self, row: usize) {
        self.emit(CatalogEvent::RowChanged { row });
    }

    /// Removes a row, dropping its driver. Row references to it stop resolving.
    fn remove_row(&mut self, row: usize) {
        let info = self.devices.remove(row);
        debug!("Removed device row {row} ({})", info.friendly_name);
        drop(info);
        self.emit(CatalogEvent::RowsRemoved { first: row, last: row });
    }

    fn lister(&self, id: ListerId) -> Option<&Arc<dyn DeviceLister>> {
        self.listers.get(id.0)
    }

    fn row_of_connection(&self, device: DeviceKey, connection: u64) -> Option<usize> {
        self.devices.iter().position(|info| {
            info.key == device && info.driver.as_ref().is_some_and(|driver| driver.connection == connection)
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn row_count(&self) -> usize {
        self.devices.len()
    }

    /// Stable reference to the device currently at `row`.
    pub fn row_ref(&self, row: usize) -> Option<RowRef> {
        self.devices.get(row).map(|info| RowRef(info.key))
    }

    /// The current row of a referenced device, or `None` if it has left the list.
    pub fn resolve(&self, row_ref: &RowRef) -> Option<usize> {
        self.devices.iter().position(|info| info.key == row_ref.0)
    }

    pub fn connected_device(&self, row: usize) -> Option<DriverRef> {
        let driver = self.devices.get(row)?.driver.as_ref()?;
        Some(DriverRef::new(&driver.handle))
    }

    pub fn database_id(&self, row: usize) -> Option<i64> {
        self.devices.get(row)?.database_id
    }

    /// The lister through which the device is currently present.
    pub fn lister_for_row(&self, row: usize) -> Option<Arc<dyn DeviceLister>> {
        let (lister_id, _) = self.devices.get(row)?.live_lister(&self.listers)?;
        self.lister(lister_id).cloned()
    }

    pub fn config(&self) -> &DeviceManagerConfig {
        &self.config
    }
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod merge_test;
