//! Task domain model.
//!
//! # Responsibility
//! - Define the atomic unit of work rendered as a board card.
//! - Define the creation (`NewTask`) and patch (`TaskPatch`) inputs accepted
//!   by store mutations.
//!
//! # Invariants
//! - `id`, `project_id` and `created_at` are fixed once a task exists.
//!   `TaskPatch` has no field for them.
//! - `cost` is finite and non-negative.
//! - `updated_at` is never earlier than `created_at`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque task identifier, unique within the dashboard.
pub type TaskId = String;

/// Board column a task is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
    /// Scheduled for later.
    Planned,
}

impl TaskStatus {
    /// All statuses in board column order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Planned,
    ];

    /// Wire name used in the JSON snapshot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Planned => "planned",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Canonical task record as stored in the dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Must equal the key of the project entry holding this task.
    pub project_id: String,
    /// Estimated resource-token count.
    #[serde(default)]
    pub estimated_tokens: u64,
    #[serde(default)]
    pub cost: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Accepts RFC 3339 or a bare `YYYY-MM-DD` (read as midnight UTC).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_due_date"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Builds a task from creation input with both timestamps set to `now`.
    pub fn from_new(
        id: TaskId,
        project_id: impl Into<String>,
        new: NewTask,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            project_id: project_id.into(),
            estimated_tokens: new.estimated_tokens,
            cost: new.cost,
            created_at: now,
            updated_at: now,
            due_date: new.due_date,
            assigned_to: new.assigned_to,
            tags: new.tags,
        }
    }

    /// Refreshes `updated_at` so it strictly increases for this task.
    ///
    /// Uses `now` unless that would not move past the previous value, in
    /// which case the previous value plus one millisecond is used.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + Duration::milliseconds(1);
        self.updated_at = if now >= floor { now } else { floor };
    }

    /// Applies every field present in `patch`. Identity fields are untouched.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(estimated_tokens) = patch.estimated_tokens {
            self.estimated_tokens = estimated_tokens;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(assigned_to) = &patch.assigned_to {
            self.assigned_to = assigned_to.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }

    /// Validates field-level invariants.
    ///
    /// # Errors
    /// - `BlankTitle` when title is empty after trimming.
    /// - `InvalidCost` when cost is negative, NaN or infinite.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(&self.title, self.cost)
    }
}

/// Validation failures for task input.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    BlankTitle,
    InvalidCost(f64),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title cannot be blank"),
            Self::InvalidCost(cost) => {
                write!(f, "task cost must be finite and non-negative, got {cost}")
            }
        }
    }
}

impl Error for TaskValidationError {}

fn validate_fields(title: &str, cost: f64) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(TaskValidationError::InvalidCost(cost));
    }
    Ok(())
}

/// Creation input for `add_task`.
///
/// Identity and timestamps are assigned by the store; the owning project is
/// taken from the target project key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub estimated_tokens: u64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, deserialize_with = "lenient_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTask {
    /// Creates input with the required fields and everything else empty.
    pub fn new(title: impl Into<String>, status: TaskStatus, priority: TaskPriority) -> Self {
        Self {
            title: title.into(),
            description: None,
            status,
            priority,
            estimated_tokens: 0,
            cost: 0.0,
            due_date: None,
            assigned_to: None,
            tags: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn estimated_tokens(mut self, estimated_tokens: u64) -> Self {
        self.estimated_tokens = estimated_tokens;
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// # Errors
    /// Same rules as [`Task::validate`].
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_fields(&self.title, self.cost)
    }
}

/// Typed field mask for `update_task`.
///
/// `None` means "leave as is". For clearable fields the inner `Option` is the
/// new value, so `Some(None)` clears it. When deserialized from a JSON partial,
/// an explicit `null` clears and an absent key leaves the field alone; keys
/// naming identity fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub estimated_tokens: Option<u64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default, deserialize_with = "present_due_date")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn estimated_tokens(mut self, estimated_tokens: u64) -> Self {
        self.estimated_tokens = Some(estimated_tokens);
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn assigned_to(mut self, assignee: Option<String>) -> Self {
        self.assigned_to = Some(assignee);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Returns whether the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// Maps a present key (including `null`) to `Some(..)`; absent keys keep the
// `#[serde(default)]` value of `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parses a due date written either as an RFC 3339 timestamp or as a plain
/// calendar date. A plain date is pinned to midnight UTC.
pub fn parse_due_date(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("unrecognized due date `{text}`"))
}

// Blank strings count as "no due date".
fn lenient_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.trim().is_empty() => parse_due_date(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn present_due_date<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_due_date(deserializer).map(Some)
}
