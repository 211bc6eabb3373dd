//! `Mutex::lock` that shrugs off poisoning.
//!
//! Shared state in this crate is plain data (task snapshots, subscriber lists), so a panic on
//! another thread leaves it usable.

use std::sync::{Mutex, MutexGuard};

pub(crate) trait IgnorePoison<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}
