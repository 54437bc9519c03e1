//! Task identifier generation.

use crate::model::dashboard::Dashboard;
use crate::model::task::TaskId;
use uuid::Uuid;

/// Draws a fresh random 128-bit task id.
pub fn random_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

/// Returns the first id from `draw` not used by any task in `dashboard`.
///
/// Uniqueness is checked across all projects, not only the target one.
pub fn unique_task_id<F>(dashboard: &Dashboard, mut draw: F) -> TaskId
where
    F: FnMut() -> TaskId,
{
    loop {
        let candidate = draw();
        if !candidate.is_empty() && !dashboard.contains_task_id(&candidate) {
            return candidate;
        }
    }
}
