//! Project domain model and board read views.

use crate::model::task::{Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named grouping of tasks with its own phase and styling metadata.
///
/// Tasks are held behind `Arc` so a new snapshot can reuse every task a
/// mutation did not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phase: String,
    /// Display color token, e.g. `bg-blue-600`.
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub tasks: Vec<Arc<Task>>,
}

impl Project {
    pub fn find_task(&self, task_id: &str) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    /// Returns the tasks of one board column, keeping list order.
    pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.iter().filter(move |task| task.status == status)
    }

    /// Sum of task costs.
    pub fn total_cost(&self) -> f64 {
        self.tasks.iter().map(|task| task.cost).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks_with_status(TaskStatus::Done).count()
    }

    /// Share of `done` tasks as a rounded percentage; `0` for an empty project.
    pub fn completion_rate(&self) -> u8 {
        if self.tasks.is_empty() {
            return 0;
        }
        let ratio = self.completed_count() as f64 / self.tasks.len() as f64;
        (ratio * 100.0).round() as u8
    }
}
