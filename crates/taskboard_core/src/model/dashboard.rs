//! Dashboard snapshot model.
//!
//! # Responsibility
//! - Define the top-level document fetched from the remote resource and
//!   written to the local cache.
//! - Provide the seed value used when neither source has data.
//!
//! # Invariants
//! - Project keys are unique; iteration order carries no meaning.
//! - Every task's `project_id` equals the key of the project holding it.
//!   Snapshots loaded from outside are not re-validated against this.

use crate::model::project::Project;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SEED_PROJECT_ID: &str = "sample-project";
pub const SEED_TOTAL_BUDGET: f64 = 100.0;

/// Budget bookkeeping for the whole board.
///
/// The three fields are stored independently. `spent + remaining` is not
/// guaranteed to equal `total_budget`; use [`CostTracking::is_balanced`] to
/// check and [`CostTracking::derived_remaining`] for a computed figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostTracking {
    pub total_budget: f64,
    pub spent: f64,
    pub remaining: f64,
}

impl CostTracking {
    pub fn new(total_budget: f64, spent: f64, remaining: f64) -> Self {
        Self {
            total_budget,
            spent,
            remaining,
        }
    }

    pub fn derived_remaining(&self) -> f64 {
        self.total_budget - self.spent
    }

    pub fn is_balanced(&self) -> bool {
        (self.spent + self.remaining - self.total_budget).abs() < 1e-9
    }
}

/// Full board snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub projects: BTreeMap<String, Arc<Project>>,
    pub cost_tracking: CostTracking,
    pub last_updated: DateTime<Utc>,
}

impl Dashboard {
    /// Default board with one empty sample project and a budget of 100.
    pub fn seed(now: DateTime<Utc>) -> Self {
        let project = Project {
            id: SEED_PROJECT_ID.to_string(),
            name: "Sample Project".to_string(),
            emoji: "📋".to_string(),
            description: "Drag tasks between columns to track progress.".to_string(),
            phase: "Planning".to_string(),
            color: "bg-blue-600".to_string(),
            tasks: Vec::new(),
        };
        let mut projects = BTreeMap::new();
        projects.insert(project.id.clone(), Arc::new(project));
        Self {
            projects,
            cost_tracking: CostTracking::new(SEED_TOTAL_BUDGET, 0.0, SEED_TOTAL_BUDGET),
            last_updated: now,
        }
    }

    pub fn project(&self, project_id: &str) -> Option<&Arc<Project>> {
        self.projects.get(project_id)
    }

    /// Returns whether any project already holds a task with `task_id`.
    pub fn contains_task_id(&self, task_id: &str) -> bool {
        self.projects
            .values()
            .any(|project| project.find_task(task_id).is_some())
    }

    pub fn task_count(&self) -> usize {
        self.projects.values().map(|project| project.tasks.len()).sum()
    }
}
