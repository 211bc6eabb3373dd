//! Republishing background task progress as a per-row percentage.

use log::debug;
use std::collections::BTreeSet;

use super::rows::{DeviceKey, RowRef};
use super::DeviceManager;
use crate::tasks::TaskTracker;

impl DeviceManager {
    pub(super) fn device_task_started(&mut self, device: DeviceKey, connection: u64, task_id: u64) {
        let Some(row) = self.row_of_connection(device, connection) else {
            debug!("Ignoring task {task_id} from a disconnected driver");
            return;
        };
        self.active_tasks.insert(task_id, RowRef(device));
        self.devices[row].task_percentage = Some(0);
        self.row_changed(row);
    }

    /// Updates progress from the tracker's current task list. Call once per tracker change.
    ///
    /// Tracked tasks that are gone from the list are finished: their row's percentage is
    /// cleared, unless another of the row's tasks is still running.
    pub fn tasks_changed(&mut self, tracker: &dyn TaskTracker) {
        let tasks = tracker.get_tasks();
        let mut finished: BTreeSet<u64> = self.active_tasks.keys().copied().collect();
        let mut updated_rows = BTreeSet::new();

        for task in &tasks {
            let Some(row_ref) = self.active_tasks.get(&task.id).copied() else {
                continue;
            };
            finished.remove(&task.id);
            let Some(row) = self.resolve(&row_ref) else {
                continue;
            };

            let percentage = if task.progress_max == 0 {
                0
            } else {
                (task.progress as f64 / task.progress_max as f64 * 100.0) as i32
            };
            self.devices[row].task_percentage = Some(percentage);
            updated_rows.insert(row);
            self.row_changed(row);
        }

        for task_id in finished {
            let Some(row_ref) = self.active_tasks.remove(&task_id) else {
                continue;
            };
            debug!("Device task {task_id} finished");
            let Some(row) = self.resolve(&row_ref) else {
                continue;
            };
            if !updated_rows.insert(row) {
                continue;
            }
            self.devices[row].task_percentage = None;
            self.row_changed(row);
        }
    }

    /// Tasks currently associated with a row.
    pub fn active_task_ids(&self, row: usize) -> Vec<u64> {
        let Some(row_ref) = self.row_ref(row) else {
            return Vec::new();
        };
        self.active_tasks
            .iter()
            .filter(|(_, task_row)| **task_row == row_ref)
            .map(|(task_id, _)| *task_id)
            .collect()
    }
}
