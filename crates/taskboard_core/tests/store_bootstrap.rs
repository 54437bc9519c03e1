use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::{
    CostTracking, Dashboard, DashboardStore, LoadState, MemoryCacheSlot, MutationOutcome,
    NewTask, Project, RemoteDocument, RemoteError, RemoteResult, SkipReason, SnapshotOrigin,
    SnapshotSource, StoreConfig, Task, TaskPatch, TaskPriority, TaskStatus, SEED_PROJECT_ID,
};
use tokio::sync::Notify;

const KEY: &str = "dashboard_state";

struct StaticSource {
    result: RemoteResult<RemoteDocument>,
    calls: AtomicUsize,
}

impl StaticSource {
    fn ok(json: &str) -> Self {
        Self::with(Ok(RemoteDocument::from_json(json).unwrap()))
    }

    fn failing() -> Self {
        Self::with(Err(RemoteError::Network("connection refused".to_string())))
    }

    fn with(result: RemoteResult<RemoteDocument>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SnapshotSource for StaticSource {
    async fn fetch(&self) -> RemoteResult<RemoteDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct PendingSource;

impl SnapshotSource for PendingSource {
    async fn fetch(&self) -> RemoteResult<RemoteDocument> {
        std::future::pending().await
    }
}

struct GatedSource {
    gate: Notify,
}

impl SnapshotSource for GatedSource {
    async fn fetch(&self) -> RemoteResult<RemoteDocument> {
        self.gate.notified().await;
        Err(RemoteError::Status(503))
    }
}

fn config() -> StoreConfig {
    StoreConfig::default().with_fetch_timeout(Duration::from_secs(2))
}

fn cached_board() -> Dashboard {
    let at = Utc.with_ymd_and_hms(2026, 4, 10, 8, 30, 0).unwrap();
    let task = Task::from_new(
        "t1".to_string(),
        "p1",
        NewTask::new("Draft release notes", TaskStatus::Todo, TaskPriority::Medium),
        at,
    );
    let project = Project {
        id: "p1".to_string(),
        name: "Launch".to_string(),
        emoji: "🚀".to_string(),
        description: "d".to_string(),
        phase: "Build".to_string(),
        color: "bg-blue-600".to_string(),
        tasks: vec![Arc::new(task)],
    };
    let mut projects = BTreeMap::new();
    projects.insert("p1".to_string(), Arc::new(project));
    Dashboard {
        projects,
        cost_tracking: CostTracking::new(250.0, 40.0, 210.0),
        last_updated: at,
    }
}

#[tokio::test]
async fn remote_document_wins_and_is_cached() {
    let cache = Arc::new(MemoryCacheSlot::new());
    let source = StaticSource::ok(
        r#"{"projects": {"p1": {"id":"p1","name":"Launch","emoji":"🚀","description":"d",
            "phase":"Build","color":"bg-blue-600","tasks":[]}},
            "costTracking":{"totalBudget":100,"spent":0,"remaining":100}}"#,
    );
    let store = DashboardStore::new(config(), Arc::clone(&cache), source);

    let view = store.bootstrap().await;

    assert!(!view.is_loading);
    assert!(view.error_message.is_none());
    let snapshot = view.snapshot.expect("ready snapshot");
    assert_eq!(snapshot.projects.len(), 1);
    let project = &snapshot.projects["p1"];
    assert_eq!(project.name, "Launch");
    assert!(project.tasks.is_empty());
    assert_eq!(snapshot.cost_tracking, CostTracking::new(100.0, 0.0, 100.0));
    assert_eq!(store.snapshot_origin(), Some(SnapshotOrigin::Remote));

    let cached: Dashboard = serde_json::from_str(&cache.peek(KEY).expect("cache written")).unwrap();
    assert_eq!(cached, *snapshot);
}

#[tokio::test]
async fn remote_wins_over_existing_cache() {
    let stale = serde_json::to_string(&cached_board()).unwrap();
    let cache = Arc::new(MemoryCacheSlot::with_entry(KEY, stale));
    let store = DashboardStore::new(config(), Arc::clone(&cache), StaticSource::ok("{}"));

    let snapshot = store.bootstrap().await.snapshot.unwrap();

    assert!(snapshot.projects.is_empty());
    assert_eq!(snapshot.cost_tracking, CostTracking::default());
    let cached: Dashboard = serde_json::from_str(&cache.peek(KEY).unwrap()).unwrap();
    assert!(cached.projects.is_empty());
}

#[tokio::test]
async fn failed_fetch_falls_back_to_cached_snapshot_unchanged() {
    let board = cached_board();
    let cache = MemoryCacheSlot::with_entry(KEY, serde_json::to_string(&board).unwrap());
    let store = DashboardStore::new(config(), cache, StaticSource::failing());

    let view = store.bootstrap().await;

    assert_eq!(*view.snapshot.unwrap(), board);
    assert_eq!(store.snapshot_origin(), Some(SnapshotOrigin::Cache));
}

#[tokio::test]
async fn failed_fetch_and_empty_cache_seed_the_board() {
    let cache = Arc::new(MemoryCacheSlot::new());
    let store = DashboardStore::new(config(), Arc::clone(&cache), StaticSource::failing());

    let snapshot = store.bootstrap().await.snapshot.unwrap();

    assert_eq!(snapshot.projects.len(), 1);
    assert!(snapshot.projects[SEED_PROJECT_ID].tasks.is_empty());
    assert_eq!(snapshot.cost_tracking, CostTracking::new(100.0, 0.0, 100.0));
    assert_eq!(store.snapshot_origin(), Some(SnapshotOrigin::Seed));
    assert!(cache.peek(KEY).is_none());
}

#[tokio::test]
async fn non_success_status_and_bad_body_fall_back_like_network_errors() {
    for result in [
        Err(RemoteError::Status(404)),
        Err(RemoteError::Parse("expected value".to_string())),
    ] {
        let board = cached_board();
        let cache = MemoryCacheSlot::with_entry(KEY, serde_json::to_string(&board).unwrap());
        let store = DashboardStore::new(config(), cache, StaticSource::with(result));
        assert_eq!(*store.bootstrap().await.snapshot.unwrap(), board);
    }
}

#[tokio::test]
async fn hung_fetch_is_bounded_by_timeout() {
    let config = StoreConfig::default().with_fetch_timeout(Duration::from_millis(20));
    let store = DashboardStore::new(config, MemoryCacheSlot::new(), PendingSource);

    let view = store.bootstrap().await;

    assert!(view.snapshot.is_some());
    assert_eq!(store.snapshot_origin(), Some(SnapshotOrigin::Seed));
}

#[tokio::test]
async fn corrupt_cache_on_fallback_path_is_a_load_error() {
    let cache = MemoryCacheSlot::with_entry(KEY, "{not json");
    let store = DashboardStore::new(config(), cache, StaticSource::failing());

    let view = store.bootstrap().await;

    assert!(view.snapshot.is_none());
    assert!(!view.is_loading);
    let message = view.error_message.expect("error message");
    assert!(message.starts_with("Failed to load dashboard data"));
    assert!(matches!(store.load_state(), LoadState::Error(_)));
    assert_eq!(store.snapshot_origin(), None);
}

#[tokio::test]
async fn mutations_in_error_state_are_skipped_without_writing() {
    let cache = Arc::new(MemoryCacheSlot::with_entry(KEY, "{not json"));
    let store = DashboardStore::new(config(), Arc::clone(&cache), StaticSource::failing());
    store.bootstrap().await;
    let failed = store.load_state();
    assert!(matches!(failed, LoadState::Error(_)));
    let mut updates = store.subscribe();
    updates.borrow_and_update();

    let new = NewTask::new("after failure", TaskStatus::Todo, TaskPriority::Low);
    assert_eq!(
        store.add_task("p1", new),
        MutationOutcome::Skipped(SkipReason::NotReady)
    );
    assert_eq!(
        store.set_task_status("p1", "t1", TaskStatus::Done),
        MutationOutcome::Skipped(SkipReason::NotReady)
    );
    assert_eq!(
        store.delete_task("p1", "t1"),
        MutationOutcome::Skipped(SkipReason::NotReady)
    );
    assert_eq!(
        store.update_task("p1", "t1", &TaskPatch::new().cost(2.0)),
        MutationOutcome::Skipped(SkipReason::NotReady)
    );

    assert_eq!(store.load_state(), failed);
    assert_eq!(cache.peek(KEY).as_deref(), Some("{not json"));
    assert!(!updates.has_changed().unwrap());
}

#[tokio::test]
async fn unreadable_cache_on_fallback_path_is_a_load_error() {
    let cache = MemoryCacheSlot::new();
    cache.set_unavailable("storage quota exceeded");
    let store = DashboardStore::new(config(), cache, StaticSource::failing());

    let view = store.bootstrap().await;

    assert!(view.error_message.unwrap().contains("storage quota exceeded"));
}

#[tokio::test]
async fn cache_write_failure_does_not_block_remote_snapshot() {
    let cache = MemoryCacheSlot::new();
    cache.set_unavailable("read-only");
    let store = DashboardStore::new(config(), cache, StaticSource::ok("{}"));

    let view = store.bootstrap().await;

    assert!(view.snapshot.is_some());
    assert!(view.error_message.is_none());
}

#[tokio::test]
async fn bootstrap_runs_once() {
    let source = Arc::new(StaticSource::ok("{}"));
    let store = DashboardStore::new(config(), MemoryCacheSlot::new(), Arc::clone(&source));

    let first = store.bootstrap().await;
    let second = store.bootstrap().await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(
        first.snapshot.as_ref().unwrap(),
        second.snapshot.as_ref().unwrap()
    ));
}

#[tokio::test]
async fn state_reports_loading_before_bootstrap_completes() {
    let source = Arc::new(GatedSource {
        gate: Notify::new(),
    });
    let store = DashboardStore::new(config(), MemoryCacheSlot::new(), Arc::clone(&source));
    assert!(store.state().is_loading);
    assert_eq!(store.load_state(), LoadState::Uninitialized);

    let (view, ()) = tokio::join!(store.bootstrap(), async {
        assert_eq!(store.load_state(), LoadState::Loading);
        assert!(store.state().is_loading);

        let new = NewTask::new("too early", TaskStatus::Todo, TaskPriority::Low);
        assert_eq!(
            store.add_task(SEED_PROJECT_ID, new),
            MutationOutcome::Skipped(SkipReason::NotReady)
        );
        assert_eq!(
            store.set_task_status(SEED_PROJECT_ID, "t1", TaskStatus::Done),
            MutationOutcome::Skipped(SkipReason::NotReady)
        );
        assert_eq!(
            store.delete_task(SEED_PROJECT_ID, "t1"),
            MutationOutcome::Skipped(SkipReason::NotReady)
        );
        assert_eq!(
            store.update_task(SEED_PROJECT_ID, "t1", &TaskPatch::new().title("renamed")),
            MutationOutcome::Skipped(SkipReason::NotReady)
        );
        assert_eq!(store.load_state(), LoadState::Loading);

        source.gate.notify_one();
    });

    assert!(view.snapshot.is_some());
    assert_eq!(store.snapshot_origin(), Some(SnapshotOrigin::Seed));
}

#[tokio::test]
async fn subscribers_observe_loading_then_ready() {
    let store = DashboardStore::new(config(), MemoryCacheSlot::new(), StaticSource::failing());
    let mut updates = store.subscribe();
    assert!(updates.borrow_and_update().is_loading);

    store.bootstrap().await;

    assert!(updates.has_changed().unwrap());
    let view = updates.borrow_and_update().clone();
    assert!(!view.is_loading);
    assert!(view.snapshot.is_some());
}
