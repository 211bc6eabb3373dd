//! Registry of remembered devices.
//!
//! A device is remembered once the user has connected it. Its record survives unplugging and
//! restarts, so the device keeps its row (and its custom name and icon) in the list.
//!
//! - `store`: SQLite schema and queries
//! - `worker`: the thread that owns the connection, and the blocking handle to it

mod store;
mod worker;

pub use store::DeviceStore;
pub use worker::RegistryHandle;

use serde::Serialize;

/// A persisted device row.
///
/// `unique_id` and `icon_name` hold comma-separated lists: every unique ID the device was seen
/// under, and the icon name candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Assigned by the store; ignored by [`DeviceRegistry::add_device`].
    pub id: i64,
    pub unique_id: String,
    pub friendly_name: String,
    pub size: u64,
    pub icon_name: String,
}

impl DeviceRecord {
    pub fn unique_ids(&self) -> Vec<String> {
        self.unique_id.split(',').map(str::to_string).collect()
    }

    pub fn icon_names(&self) -> Vec<String> {
        self.icon_name.split(',').map(str::to_string).collect()
    }
}

/// Durable device storage.
///
/// Calls block until the store has answered, except where noted.
pub trait DeviceRegistry: Send {
    fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, RegistryError>;

    /// Stores a new device and returns its ID.
    fn add_device(&self, record: &DeviceRecord) -> Result<i64, RegistryError>;

    fn remove_device(&self, id: i64) -> Result<(), RegistryError>;

    /// May return before the update is written.
    fn set_device_identity(&self, id: i64, friendly_name: &str, icon_name: &str) -> Result<(), RegistryError>;
}

#[derive(Debug)]
pub enum RegistryError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    SchemaMismatch { expected: String, found: String },
    /// The worker thread has shut down.
    WorkerGone,
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Sqlite(err)
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Io(err)
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Sqlite(e) => write!(f, "SQLite error: {e}"),
            RegistryError::Io(e) => write!(f, "I/O error: {e}"),
            RegistryError::SchemaMismatch { expected, found } => {
                write!(f, "Schema mismatch: expected {expected}, found {found}")
            }
            RegistryError::WorkerGone => write!(f, "Device registry thread has shut down"),
        }
    }
}

impl std::error::Error for RegistryError {}
