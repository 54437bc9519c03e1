//! Store lifecycle states and the view handed to the presentation layer.

use crate::model::dashboard::Dashboard;
use crate::store::ops::SkipReason;
use std::sync::Arc;

/// Per-session lifecycle.
///
/// `Uninitialized -> Loading -> Ready | Error`, then optionally `Disposed`.
/// There is no way back to `Loading` within one store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready(Arc<Dashboard>),
    Error(String),
    Disposed,
}

impl LoadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Error(_) => "error",
            Self::Disposed => "disposed",
        }
    }

    pub fn view(&self) -> StoreView {
        match self {
            Self::Uninitialized | Self::Loading => StoreView {
                snapshot: None,
                is_loading: true,
                error_message: None,
            },
            Self::Ready(snapshot) => StoreView {
                snapshot: Some(Arc::clone(snapshot)),
                is_loading: false,
                error_message: None,
            },
            Self::Error(message) => StoreView {
                snapshot: None,
                is_loading: false,
                error_message: Some(message.clone()),
            },
            Self::Disposed => StoreView {
                snapshot: None,
                is_loading: false,
                error_message: None,
            },
        }
    }
}

/// What the presentation layer renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreView {
    pub snapshot: Option<Arc<Dashboard>>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

/// Where the bootstrap snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Remote,
    Cache,
    Seed,
}

impl SnapshotOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Cache => "cache",
            Self::Seed => "seed",
        }
    }
}

/// Result of a store mutation. Mutations never fail loudly; a skip carries
/// the reason and leaves the snapshot untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T = ()> {
    Applied(T),
    Skipped(SkipReason),
}

impl<T> MutationOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Applied(_) => None,
            Self::Skipped(reason) => Some(reason),
        }
    }
}
