//! Pure snapshot transformations behind the store mutations.
//!
//! Each function maps `(&Dashboard, args, now)` to a new `Dashboard` and never
//! touches its input. Only the path down to the changed task is copied; every
//! other project and task `Arc` is carried over as is.

use crate::model::dashboard::Dashboard;
use crate::model::project::Project;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus, TaskValidationError};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Why a mutation left the snapshot unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The store is not in the `Ready` state.
    NotReady,
    ProjectNotFound(String),
    TaskNotFound { project_id: String, task_id: String },
    Invalid(TaskValidationError),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "dashboard is not loaded"),
            Self::ProjectNotFound(project_id) => write!(f, "project not found: {project_id}"),
            Self::TaskNotFound {
                project_id,
                task_id,
            } => write!(f, "task not found: {project_id}/{task_id}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SkipReason {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for SkipReason {
    fn from(value: TaskValidationError) -> Self {
        Self::Invalid(value)
    }
}

pub type OpResult = Result<Dashboard, SkipReason>;

/// Moves one task to another board column.
pub fn set_task_status(
    current: &Dashboard,
    project_id: &str,
    task_id: &str,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> OpResult {
    with_project(current, project_id, now, |project| {
        replace_task(project, task_id, |task| {
            task.status = status;
            task.touch(now);
            Ok(())
        })
    })
}

/// Appends a new task under `id`. The caller guarantees `id` is unused.
pub fn add_task(
    current: &Dashboard,
    project_id: &str,
    id: TaskId,
    new: NewTask,
    now: DateTime<Utc>,
) -> OpResult {
    new.validate()?;
    with_project(current, project_id, now, |project| {
        let mut next = project.clone();
        next.tasks
            .push(Arc::new(Task::from_new(id, project_id, new, now)));
        Ok(next)
    })
}

/// Removes a task from its project.
pub fn delete_task(
    current: &Dashboard,
    project_id: &str,
    task_id: &str,
    now: DateTime<Utc>,
) -> OpResult {
    with_project(current, project_id, now, |project| {
        let index = task_index(project, task_id)?;
        let mut next = project.clone();
        next.tasks.remove(index);
        Ok(next)
    })
}

/// Merges the fields named by `patch` into one task.
pub fn update_task(
    current: &Dashboard,
    project_id: &str,
    task_id: &str,
    patch: &TaskPatch,
    now: DateTime<Utc>,
) -> OpResult {
    with_project(current, project_id, now, |project| {
        replace_task(project, task_id, |task| {
            task.apply_patch(patch);
            task.validate()?;
            task.touch(now);
            Ok(())
        })
    })
}

fn with_project<F>(current: &Dashboard, project_id: &str, now: DateTime<Utc>, change: F) -> OpResult
where
    F: FnOnce(&Project) -> Result<Project, SkipReason>,
{
    let project = current
        .projects
        .get(project_id)
        .ok_or_else(|| SkipReason::ProjectNotFound(project_id.to_string()))?;
    let changed = change(project)?;

    let mut projects = current.projects.clone();
    projects.insert(project_id.to_string(), Arc::new(changed));
    Ok(Dashboard {
        projects,
        cost_tracking: current.cost_tracking,
        last_updated: now,
    })
}

fn replace_task<F>(project: &Project, task_id: &str, change: F) -> Result<Project, SkipReason>
where
    F: FnOnce(&mut Task) -> Result<(), SkipReason>,
{
    let index = task_index(project, task_id)?;
    let mut task = Task::clone(&project.tasks[index]);
    change(&mut task)?;

    let mut next = project.clone();
    next.tasks[index] = Arc::new(task);
    Ok(next)
}

fn task_index(project: &Project, task_id: &str) -> Result<usize, SkipReason> {
    project
        .tasks
        .iter()
        .position(|task| task.id == task_id)
        .ok_or_else(|| SkipReason::TaskNotFound {
            project_id: project.id.clone(),
            task_id: task_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{add_task, delete_task, set_task_status, update_task, SkipReason};
    use crate::model::dashboard::{CostTracking, Dashboard};
    use crate::model::project::Project;
    use crate::model::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn project(id: &str, task_ids: &[&str]) -> Arc<Project> {
        let tasks = task_ids
            .iter()
            .map(|task_id| {
                Arc::new(Task::from_new(
                    task_id.to_string(),
                    id,
                    NewTask::new(format!("task {task_id}"), TaskStatus::Todo, TaskPriority::Low),
                    t0(),
                ))
            })
            .collect();
        Arc::new(Project {
            id: id.to_string(),
            name: id.to_uppercase(),
            emoji: "🚀".to_string(),
            description: String::new(),
            phase: "Build".to_string(),
            color: "bg-blue-600".to_string(),
            tasks,
        })
    }

    fn board() -> Dashboard {
        let mut projects = BTreeMap::new();
        projects.insert("p1".to_string(), project("p1", &["t1", "t2"]));
        projects.insert("p2".to_string(), project("p2", &["t3"]));
        Dashboard {
            projects,
            cost_tracking: CostTracking::new(100.0, 0.0, 100.0),
            last_updated: t0(),
        }
    }

    #[test]
    fn set_status_only_changes_target_task_and_shares_the_rest() {
        let before = board();
        let now = t0() + Duration::minutes(5);
        let after = set_task_status(&before, "p1", "t1", TaskStatus::Done, now).unwrap();

        let old_p1 = &before.projects["p1"];
        let new_p1 = &after.projects["p1"];
        assert_eq!(new_p1.tasks[0].status, TaskStatus::Done);
        assert_eq!(new_p1.tasks[0].updated_at, now);

        let mut expected = Task::clone(&old_p1.tasks[0]);
        expected.status = TaskStatus::Done;
        expected.updated_at = now;
        assert_eq!(*new_p1.tasks[0], expected);

        assert!(Arc::ptr_eq(&old_p1.tasks[1], &new_p1.tasks[1]));
        assert!(Arc::ptr_eq(&before.projects["p2"], &after.projects["p2"]));
        assert_eq!(before.projects["p1"].tasks[0].status, TaskStatus::Todo);
    }

    #[test]
    fn missing_project_is_reported_for_every_op() {
        let before = board();
        let now = t0();
        let expected = SkipReason::ProjectNotFound("nope".to_string());

        assert_eq!(
            set_task_status(&before, "nope", "t1", TaskStatus::Done, now).unwrap_err(),
            expected
        );
        assert_eq!(delete_task(&before, "nope", "t1", now).unwrap_err(), expected);
        assert_eq!(
            update_task(&before, "nope", "t1", &TaskPatch::new().title("x"), now).unwrap_err(),
            expected
        );
        let new = NewTask::new("x", TaskStatus::Todo, TaskPriority::Low);
        assert_eq!(
            add_task(&before, "nope", "n1".to_string(), new, now).unwrap_err(),
            expected
        );
    }

    #[test]
    fn delete_missing_task_is_a_task_not_found_skip() {
        let before = board();
        let err = delete_task(&before, "p1", "ghost", t0()).unwrap_err();
        assert!(matches!(err, SkipReason::TaskNotFound { .. }));
    }

    #[test]
    fn add_stamps_project_and_timestamps() {
        let before = board();
        let now = t0() + Duration::hours(1);
        let new = NewTask::new("Write spec", TaskStatus::Todo, TaskPriority::High)
            .cost(2.5)
            .tags(["docs", "q2"]);
        let after = add_task(&before, "p2", "n1".to_string(), new, now).unwrap();

        let added = after.projects["p2"].tasks.last().unwrap();
        assert_eq!(added.id, "n1");
        assert_eq!(added.project_id, "p2");
        assert_eq!(added.created_at, now);
        assert_eq!(added.updated_at, now);
        assert_eq!(added.tags, vec!["docs".to_string(), "q2".to_string()]);
        assert_eq!(after.last_updated, now);
    }

    #[test]
    fn add_rejects_invalid_input() {
        let new = NewTask::new("", TaskStatus::Todo, TaskPriority::High);
        let err = add_task(&board(), "p1", "n1".to_string(), new, t0()).unwrap_err();
        assert!(matches!(err, SkipReason::Invalid(_)));
    }

    #[test]
    fn update_rejects_patch_that_breaks_validation() {
        let patch = TaskPatch::new().cost(-3.0);
        let err = update_task(&board(), "p1", "t1", &patch, t0()).unwrap_err();
        assert!(matches!(err, SkipReason::Invalid(_)));
    }

    #[test]
    fn update_then_set_status_keeps_updated_at_increasing() {
        let before = board();
        let now = t0() + Duration::seconds(1);
        let patched =
            update_task(&before, "p1", "t1", &TaskPatch::new().status(TaskStatus::Done), now)
                .unwrap();
        let first = patched.projects["p1"].tasks[0].updated_at;

        let moved = set_task_status(&patched, "p1", "t1", TaskStatus::Todo, now).unwrap();
        let task = &moved.projects["p1"].tasks[0];
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.updated_at > first);
    }
}
