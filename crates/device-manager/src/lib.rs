//! Device manager for removable media: USB drives, portable players, phones.
//!
//! Several independent listers report raw device IDs. The [`DeviceManager`] merges them into
//! logical devices that survive reconnects (and restarts, through the [`registry`]), exposes
//! them as a one-column list model, and connects them on demand to a driver picked by URL
//! scheme.
//!
//! # Architecture
//!
//! - `lister`: the contract every enumeration backend implements
//! - `registry`: SQLite store of remembered devices, owned by a worker thread
//! - `driver`: driver trait and the scheme → factory registry
//! - `manager`: the catalog, the connector, and the task progress bridge
//! - `tasks`: in-process task tracker whose progress the manager republishes
//! - `icons`, `url`, `config`: supporting types
//!
//! All catalog state lives on the thread that owns the [`DeviceManager`]. Listers, drivers and
//! other threads talk to it through queued messages, drained by
//! [`DeviceManager::process_events`].

// Warn on unused dependencies to catch platform-specific cfg mismatches
#![warn(unused_crate_dependencies)]
// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod driver;
pub mod icons;
mod ignore_poison;
pub mod lister;
pub mod manager;
pub mod registry;
pub mod tasks;
pub mod url;

pub use config::{DeviceManagerConfig, load_config};
pub use driver::{ConnectedDevice, DriverArgs, DriverError, DriverRef, DriverRegistry, DriverSignals};
pub use icons::{DeviceIcon, IconTheme, NoIconTheme};
pub use lister::{DeviceLister, ListerEvents, ListerId};
pub use manager::{
    AttributeValue, CatalogEvent, CatalogHandle, DeviceManager, DeviceState, IconDecoration, Role, RowRef,
};
pub use registry::{DeviceRecord, DeviceRegistry, RegistryError, RegistryHandle};
pub use tasks::{Task, TaskManager, TaskTracker};
pub use url::{DeviceUrl, UrlParseError};
