//! Device drivers and their scheme-based factory registry.
//!
//! A driver is the live handler for a connected device (a mounted filesystem, an iPod
//! database, ...). Driver modules register a factory for the URL scheme they handle; when
//! connecting, the device manager picks the scheme from the lister's URLs and calls the factory.
//!
//! The device manager is the only owner of a driver. Everyone else gets a [`DriverRef`], which
//! stops resolving once the device is disconnected.

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Weak};

use crate::lister::{DeviceLister, ListerId};
use crate::manager::{CatalogMessage, DeviceKey};
use crate::url::DeviceUrl;

/// A live connection to a device. Dropping it disconnects.
pub trait ConnectedDevice: Send + Sync {
    /// The URL the driver was created for.
    fn url(&self) -> &DeviceUrl;
}

/// Everything a driver factory gets.
pub struct DriverArgs {
    pub url: DeviceUrl,
    /// The lister through which the device is present.
    pub lister: Arc<dyn DeviceLister>,
    pub lister_id: ListerId,
    pub unique_id: String,
    /// Back-channel to the device manager.
    pub catalog: DriverSignals,
    /// Registry ID. Always valid: the device is saved before its first driver is created.
    pub database_id: i64,
    /// Whether this is the first time the device was ever connected.
    pub first_time: bool,
}

/// Why a driver couldn't be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The device went away or refused the connection.
    Unavailable(String),
    /// Anything else the driver wants to report.
    Other(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Device unavailable: {msg}"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for DriverError {}

pub type DriverFactory = Arc<dyn Fn(DriverArgs) -> Result<Arc<dyn ConnectedDevice>, DriverError> + Send + Sync>;

/// Maps URL schemes to driver factories.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `scheme`, replacing any previous one.
    pub fn register<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn(DriverArgs) -> Result<Arc<dyn ConnectedDevice>, DriverError> + Send + Sync + 'static,
    {
        let scheme = scheme.to_ascii_lowercase();
        debug!("Registered driver for scheme {scheme}");
        self.factories.insert(scheme, Arc::new(factory));
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }

    pub fn get(&self, scheme: &str) -> Option<&DriverFactory> {
        self.factories.get(scheme)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("schemes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Signals from a driver back to the device manager. `Send`, so worker threads can keep a copy.
///
/// Signals from a driver that has since been disconnected are ignored.
#[derive(Debug, Clone)]
pub struct DriverSignals {
    device: DeviceKey,
    connection: u64,
    sender: Sender<CatalogMessage>,
}

impl DriverSignals {
    pub(crate) fn new(device: DeviceKey, connection: u64, sender: Sender<CatalogMessage>) -> Self {
        Self {
            device,
            connection,
            sender,
        }
    }

    /// A long-running task (see [`TaskManager`](crate::TaskManager)) was started for this device.
    pub fn task_started(&self, task_id: u64) {
        self.send(CatalogMessage::DriverTaskStarted {
            device: self.device,
            connection: self.connection,
            task_id,
        });
    }

    /// Reports a user-facing error.
    pub fn error(&self, message: impl Into<String>) {
        self.send(CatalogMessage::DriverError {
            device: self.device,
            connection: self.connection,
            message: message.into(),
        });
    }

    fn send(&self, message: CatalogMessage) {
        if self.sender.send(message).is_err() {
            debug!("Dropping driver signal for {:?}: device manager shut down", self.device);
        }
    }
}

/// Non-owning reference to a connected driver.
#[derive(Clone)]
pub struct DriverRef(Weak<dyn ConnectedDevice>);

impl DriverRef {
    pub(crate) fn new(driver: &Arc<dyn ConnectedDevice>) -> Self {
        Self(Arc::downgrade(driver))
    }

    /// Returns the driver while the device is still connected. Don't hold on to the result:
    /// that would keep the driver alive past its disconnection.
    pub fn get(&self) -> Option<Arc<dyn ConnectedDevice>> {
        self.0.upgrade()
    }

    pub fn is_connected(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for DriverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRef")
            .field("connected", &self.is_connected())
            .finish()
    }
}
