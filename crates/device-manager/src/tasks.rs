//! Long-running background tasks (copying to a device, rebuilding its database, ...).
//!
//! Drivers start tasks on a shared [`TaskManager`] and report progress from their worker
//! threads. Whoever owns the device manager subscribes to the task manager and calls
//! [`DeviceManager::tasks_changed`](crate::DeviceManager::tasks_changed) once per notification.

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::ignore_poison::IgnorePoison;

/// Snapshot of an active task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub name: String,
    pub progress: u64,
    pub progress_max: u64,
}

/// Source of the active task list.
pub trait TaskTracker {
    /// Returns all tasks that haven't finished yet.
    fn get_tasks(&self) -> Vec<Task>;
}

/// Thread-safe in-process task tracker.
#[derive(Debug, Default)]
pub struct TaskManager {
    next_id: AtomicU64,
    tasks: Mutex<BTreeMap<u64, Task>>,
    subscribers: Mutex<Vec<Sender<()>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a receiver that gets a `()` every time the task list changes.
    pub fn subscribe(&self) -> Receiver<()> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.lock_ignore_poison().push(sender);
        receiver
    }

    pub fn start_task(&self, name: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.tasks.lock_ignore_poison().insert(
            id,
            Task {
                id,
                name: name.to_string(),
                progress: 0,
                progress_max: 0,
            },
        );
        debug!("Task {id} started: {name}");
        self.notify();
        id
    }

    /// Ignored for unknown or finished tasks.
    pub fn set_task_progress(&self, id: u64, progress: u64, progress_max: u64) {
        {
            let mut tasks = self.tasks.lock_ignore_poison();
            let Some(task) = tasks.get_mut(&id) else {
                return;
            };
            task.progress = progress;
            task.progress_max = progress_max;
        }
        self.notify();
    }

    pub fn set_task_finished(&self, id: u64) {
        let removed = self.tasks.lock_ignore_poison().remove(&id);
        if let Some(task) = removed {
            debug!("Task {id} finished: {}", task.name);
            self.notify();
        }
    }

    fn notify(&self) {
        self.subscribers.lock_ignore_poison().retain(|subscriber| subscriber.send(()).is_ok());
    }
}

impl TaskTracker for TaskManager {
    fn get_tasks(&self) -> Vec<Task> {
        self.tasks.lock_ignore_poison().values().cloned().collect()
    }
}
