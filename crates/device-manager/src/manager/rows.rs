//! Stable row references.
//!
//! Rows shift when devices are inserted or removed, so anything that must outlive the current
//! call (a task's owning row, an unmount request from another thread, a UI selection) holds a
//! [`RowRef`] instead. It names the device, not the position, and is resolved to the current row
//! with [`DeviceManager::resolve`](super::DeviceManager::resolve).

use serde::Serialize;

/// Catalog-assigned device identity. Never reused within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub(crate) struct DeviceKey(pub u64);

/// Persistent reference to a device row. Resolves to `None` once the device leaves the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowRef(pub(crate) DeviceKey);

#[derive(Debug, Default)]
pub(crate) struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    pub fn next(&mut self) -> DeviceKey {
        self.next += 1;
        DeviceKey(self.next)
    }
}
