//! The contract for device enumeration backends ("listers").
//!
//! A lister watches one discovery mechanism (udisks, GIO mounts, libimobiledevice, ...) and
//! reports devices by a lister-scoped unique ID that stays stable across reconnects of the same
//! physical unit. Listers run on their own threads and only talk to the device manager through
//! the [`ListerEvents`] sink they receive in [`DeviceLister::start`].

use log::debug;
use serde::Serialize;
use std::sync::mpsc::Sender;

use crate::manager::CatalogMessage;
use crate::url::DeviceUrl;

/// Identifies a lister registered with a device manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListerId(pub(crate) usize);

/// What a lister reports about one of its devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListerEvent {
    Added(String),
    Removed(String),
    Changed(String),
}

/// Device enumeration backend.
///
/// Query methods are called from the device manager's thread while the lister's own detection
/// runs elsewhere, hence `Send + Sync`.
pub trait DeviceLister: Send + Sync {
    /// Starts detection. Devices already present should be reported as added.
    fn start(&self, events: ListerEvents);

    /// When several listers see the same device, the one with the highest priority is used.
    fn priority(&self) -> i32;

    fn make_friendly_name(&self, id: &str) -> String;

    /// Total capacity in bytes, 0 if unknown.
    fn device_capacity(&self, id: &str) -> u64;

    fn device_free_space(&self, id: &str) -> Option<u64>;

    /// Icon name candidates, most specific first.
    fn device_icons(&self, id: &str) -> Vec<String>;

    /// URLs the device can be accessed through. Order matters: later entries win when several
    /// have a driver.
    fn make_device_urls(&self, id: &str) -> Vec<DeviceUrl>;

    fn unmount_device(&self, id: &str);
}

/// Event sink handed to a lister. Cloneable and `Send`, so detection threads can own a copy.
#[derive(Debug, Clone)]
pub struct ListerEvents {
    lister: ListerId,
    sender: Sender<CatalogMessage>,
}

impl ListerEvents {
    pub(crate) fn new(lister: ListerId, sender: Sender<CatalogMessage>) -> Self {
        Self { lister, sender }
    }

    pub fn lister_id(&self) -> ListerId {
        self.lister
    }

    pub fn device_added(&self, id: impl Into<String>) {
        self.send(ListerEvent::Added(id.into()));
    }

    pub fn device_removed(&self, id: impl Into<String>) {
        self.send(ListerEvent::Removed(id.into()));
    }

    pub fn device_changed(&self, id: impl Into<String>) {
        self.send(ListerEvent::Changed(id.into()));
    }

    fn send(&self, event: ListerEvent) {
        let message = CatalogMessage::Lister {
            lister: self.lister,
            event,
        };
        if self.sender.send(message).is_err() {
            // The device manager is gone; nothing is listening anymore.
            debug!("Dropping event from lister {:?}: device manager shut down", self.lister);
        }
    }
}
