//! Board domain model.
//!
//! # Responsibility
//! - Define the value types making up a dashboard snapshot.
//! - Keep snapshots cheap to copy: projects and tasks are shared via `Arc`,
//!   so a new snapshot reuses every untouched level.
//!
//! # Invariants
//! - A `Dashboard` owns its projects; a `Project` owns its tasks.
//! - Snapshot values are never edited in place once published.

pub mod dashboard;
pub mod project;
pub mod task;
