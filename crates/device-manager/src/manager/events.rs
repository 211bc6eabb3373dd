//! Messages into the device manager, and change notifications out of it.

use serde::Serialize;
use std::sync::mpsc::Sender;

use super::rows::{DeviceKey, RowRef};
use crate::lister::{ListerEvent, ListerId};

/// Notifications for the list view and other observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum CatalogEvent {
    /// Rows `first..=last` were added.
    RowsInserted { first: usize, last: usize },
    /// Rows `first..=last` were removed. Later rows moved up.
    RowsRemoved { first: usize, last: usize },
    /// Some attribute of the row changed.
    RowChanged { row: usize },
    DeviceConnected { row: usize },
    DeviceDisconnected { row: usize },
    /// A user-facing error message.
    Error { message: String },
}

/// Everything that reaches the manager from other threads.
#[derive(Debug)]
pub(crate) enum CatalogMessage {
    Lister {
        lister: ListerId,
        event: ListerEvent,
    },
    DriverTaskStarted {
        device: DeviceKey,
        connection: u64,
        task_id: u64,
    },
    DriverError {
        device: DeviceKey,
        connection: u64,
        message: String,
    },
    Unmount(RowRef),
}

/// Cloneable, `Send` handle for requests that must run on the manager's thread.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    sender: Sender<CatalogMessage>,
}

impl CatalogHandle {
    pub(crate) fn new(sender: Sender<CatalogMessage>) -> Self {
        Self { sender }
    }

    /// Queues an unmount of the device. Returns `false` if the manager is gone.
    pub fn unmount_async(&self, row: RowRef) -> bool {
        self.sender.send(CatalogMessage::Unmount(row)).is_ok()
    }
}
