//! Dashboard store: the single owner of the in-memory snapshot.
//!
//! # Responsibility
//! - Resolve the initial snapshot once per session: remote document, else
//!   cached copy, else the seed board.
//! - Apply the four task mutations as whole-snapshot replacements.
//! - Persist every applied mutation to the local cache slot and notify
//!   subscribers.
//!
//! # Invariants
//! - Mutations take effect only in `Ready`; in every other state they are
//!   skipped with `SkipReason::NotReady`.
//! - A skipped mutation publishes nothing and writes nothing.
//! - Mutation, cache write and publish for one call happen under the state
//!   lock, so calls apply and persist in issue order.
//! - Bootstrap runs at most once per store.

use crate::cache::sqlite_slot::SqliteCacheSlot;
use crate::cache::{CacheError, CacheSlot};
use crate::config::StoreConfig;
use crate::model::dashboard::Dashboard;
use crate::model::task::{NewTask, TaskId, TaskPatch, TaskStatus};
use crate::remote::http::HttpSnapshotSource;
use crate::remote::{RemoteError, SnapshotSource};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

pub mod ids;
pub mod ops;
pub mod state;

use ops::SkipReason;
use state::{LoadState, MutationOutcome, SnapshotOrigin, StoreView};

const LOAD_ERROR_PREFIX: &str = "Failed to load dashboard data";

/// Errors raised while wiring a store from configuration.
#[derive(Debug)]
pub enum OpenStoreError {
    Cache(CacheError),
    Remote(RemoteError),
}

impl Display for OpenStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache(err) => write!(f, "failed to open cache: {err}"),
            Self::Remote(err) => write!(f, "failed to configure remote source: {err}"),
        }
    }
}

impl Error for OpenStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<CacheError> for OpenStoreError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<RemoteError> for OpenStoreError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Builds the production store: HTTP remote source plus SQLite cache slot.
///
/// The cache lives in memory when `config.cache_path` is `None`.
///
/// # Errors
/// - `OpenStoreError::Remote` when `remote_url` is not a valid URL.
/// - `OpenStoreError::Cache` when the cache database cannot be opened.
pub fn open_store(
    config: StoreConfig,
) -> Result<DashboardStore<SqliteCacheSlot, HttpSnapshotSource>, OpenStoreError> {
    let source = HttpSnapshotSource::new(&config.remote_url)?;
    let cache = match &config.cache_path {
        Some(path) => SqliteCacheSlot::open(path)?,
        None => SqliteCacheSlot::open_in_memory()?,
    };
    Ok(DashboardStore::new(config, cache, source))
}

/// Why bootstrap ended in the `Error` state.
#[derive(Debug)]
enum BootstrapError {
    CacheRead(CacheError),
    CorruptCache(serde_json::Error),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheRead(err) => write!(f, "cache read failed: {err}"),
            Self::CorruptCache(err) => write!(f, "cached snapshot is invalid: {err}"),
        }
    }
}

/// Explicitly owned dashboard state container.
///
/// Construct one per session and hand it (or an `Arc` of it) to the
/// presentation layer.
pub struct DashboardStore<C, S> {
    config: StoreConfig,
    cache: C,
    source: S,
    state: RwLock<LoadState>,
    origin: Mutex<Option<SnapshotOrigin>>,
    updates: watch::Sender<StoreView>,
}

impl<C, S> DashboardStore<C, S>
where
    C: CacheSlot,
    S: SnapshotSource,
{
    pub fn new(config: StoreConfig, cache: C, source: S) -> Self {
        let initial = LoadState::Uninitialized;
        let (updates, _) = watch::channel(initial.view());
        Self {
            config,
            cache,
            source,
            state: RwLock::new(initial),
            origin: Mutex::new(None),
            updates,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current snapshot and loading/error flags.
    pub fn state(&self) -> StoreView {
        self.state.read().view()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// Current snapshot when `Ready`.
    pub fn snapshot(&self) -> Option<Arc<Dashboard>> {
        match &*self.state.read() {
            LoadState::Ready(snapshot) => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    /// Source of the bootstrap snapshot, once bootstrap has succeeded.
    pub fn snapshot_origin(&self) -> Option<SnapshotOrigin> {
        *self.origin.lock()
    }

    /// Receives every published view, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.updates.subscribe()
    }

    /// Runs the one-time load sequence and returns the resulting view.
    ///
    /// Later calls return the current view without loading again.
    ///
    /// # Side effects
    /// - Performs at most one remote fetch, bounded by `fetch_timeout`.
    /// - Overwrites the cache slot when the remote document wins.
    /// - Emits `store_bootstrap` logging events with origin and duration.
    pub async fn bootstrap(&self) -> StoreView {
        {
            let mut state = self.state.write();
            if *state != LoadState::Uninitialized {
                debug!(
                    "event=store_bootstrap module=store status=skipped state={}",
                    state.name()
                );
                return state.view();
            }
            *state = LoadState::Loading;
            self.updates.send_replace(state.view());
        }

        let started_at = Instant::now();
        info!("event=store_bootstrap module=store status=start");

        let next = match self.resolve_initial().await {
            Ok((dashboard, origin)) => {
                info!(
                    "event=store_bootstrap module=store status=ok origin={} projects={} tasks={} duration_ms={}",
                    origin.as_str(),
                    dashboard.projects.len(),
                    dashboard.task_count(),
                    started_at.elapsed().as_millis()
                );
                *self.origin.lock() = Some(origin);
                LoadState::Ready(Arc::new(dashboard))
            }
            Err(err) => {
                error!(
                    "event=store_bootstrap module=store status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                LoadState::Error(format!("{LOAD_ERROR_PREFIX}: {err}"))
            }
        };

        let mut state = self.state.write();
        if *state == LoadState::Loading {
            *state = next;
            self.updates.send_replace(state.view());
        }
        state.view()
    }

    /// Ends the session. Further mutations are skipped.
    pub fn dispose(&self) {
        let mut state = self.state.write();
        *state = LoadState::Disposed;
        self.updates.send_replace(state.view());
        debug!("event=store_dispose module=store status=ok");
    }

    /// Moves a task to another column.
    pub fn set_task_status(
        &self,
        project_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> MutationOutcome {
        self.mutate("set_task_status", project_id, |current, now| {
            ops::set_task_status(current, project_id, task_id, status, now).map(|next| (next, ()))
        })
    }

    /// Appends a task and returns its generated id.
    pub fn add_task(&self, project_id: &str, new: NewTask) -> MutationOutcome<TaskId> {
        self.mutate("add_task", project_id, |current, now| {
            let id = ids::unique_task_id(current, ids::random_task_id);
            ops::add_task(current, project_id, id.clone(), new, now).map(|next| (next, id))
        })
    }

    /// Removes a task; an unknown id is a skip, not an error.
    pub fn delete_task(&self, project_id: &str, task_id: &str) -> MutationOutcome {
        self.mutate("delete_task", project_id, |current, now| {
            ops::delete_task(current, project_id, task_id, now).map(|next| (next, ()))
        })
    }

    /// Merges the fields named by `patch` into a task.
    pub fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> MutationOutcome {
        self.mutate("update_task", project_id, |current, now| {
            ops::update_task(current, project_id, task_id, patch, now).map(|next| (next, ()))
        })
    }

    async fn resolve_initial(&self) -> Result<(Dashboard, SnapshotOrigin), BootstrapError> {
        let fetched = match tokio::time::timeout(self.config.fetch_timeout, self.source.fetch())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        };

        match fetched {
            Ok(document) => {
                let dashboard = document.resolve(Utc::now());
                self.persist(&dashboard);
                return Ok((dashboard, SnapshotOrigin::Remote));
            }
            Err(err) => warn!(
                "event=store_bootstrap module=store status=fallback stage=remote error={err}"
            ),
        }

        match self.cache.read(&self.config.storage_key) {
            Ok(Some(text)) => serde_json::from_str::<Dashboard>(&text)
                .map(|dashboard| (dashboard, SnapshotOrigin::Cache))
                .map_err(BootstrapError::CorruptCache),
            Ok(None) => {
                info!(
                    "event=store_bootstrap module=store status=fallback stage=cache reason=empty"
                );
                Ok((Dashboard::seed(Utc::now()), SnapshotOrigin::Seed))
            }
            Err(err) => Err(BootstrapError::CacheRead(err)),
        }
    }

    fn mutate<T, F>(&self, op: &'static str, project_id: &str, apply: F) -> MutationOutcome<T>
    where
        F: FnOnce(&Dashboard, DateTime<Utc>) -> Result<(Dashboard, T), SkipReason>,
    {
        let mut state = self.state.write();
        let current = match &*state {
            LoadState::Ready(snapshot) => Arc::clone(snapshot),
            _ => return self.skipped(op, project_id, SkipReason::NotReady),
        };

        match apply(&current, Utc::now()) {
            Ok((next, value)) => {
                let next = Arc::new(next);
                *state = LoadState::Ready(Arc::clone(&next));
                self.persist(&next);
                self.updates.send_replace(state.view());
                debug!(
                    "event=store_mutation module=store status=ok op={op} project_id={project_id}"
                );
                MutationOutcome::Applied(value)
            }
            Err(reason) => self.skipped(op, project_id, reason),
        }
    }

    fn skipped<T>(&self, op: &str, project_id: &str, reason: SkipReason) -> MutationOutcome<T> {
        debug!(
            "event=store_mutation module=store status=skipped op={op} project_id={project_id} reason={reason}"
        );
        MutationOutcome::Skipped(reason)
    }

    fn persist(&self, dashboard: &Dashboard) {
        let key = self.config.storage_key.as_str();
        let result = serde_json::to_string(dashboard)
            .map_err(|err| err.to_string())
            .and_then(|text| self.cache.write(key, &text).map_err(|err| err.to_string()));
        if let Err(err) = result {
            error!("event=cache_write module=store status=error key={key} error={err}");
        }
    }
}
