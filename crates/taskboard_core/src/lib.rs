//! Core state and synchronization logic for the task-board dashboard.
//! The presentation layer renders from `DashboardStore` and calls back into
//! its mutations; nothing here knows about rendering.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod store;

pub use cache::memory_slot::MemoryCacheSlot;
pub use cache::sqlite_slot::SqliteCacheSlot;
pub use cache::{CacheError, CacheResult, CacheSlot};
pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::dashboard::{CostTracking, Dashboard, SEED_PROJECT_ID};
pub use model::project::Project;
pub use model::task::{
    parse_due_date, NewTask, Task, TaskId, TaskPatch, TaskPriority, TaskStatus,
    TaskValidationError,
};
pub use remote::http::HttpSnapshotSource;
pub use remote::{RemoteDocument, RemoteError, RemoteResult, SnapshotSource};
pub use store::ops::SkipReason;
pub use store::state::{LoadState, MutationOutcome, SnapshotOrigin, StoreView};
pub use store::{open_store, DashboardStore, OpenStoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
