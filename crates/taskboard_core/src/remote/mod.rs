//! Remote dashboard snapshot source.
//!
//! # Responsibility
//! - Define the document shape served by the shared remote resource.
//! - Define the fetch contract the store bootstraps from.
//!
//! # Invariants
//! - Any top-level field of the document may be absent; `resolve` fills it.
//! - Fetch failures are reported, never retried here. The store decides the
//!   fallback.

use crate::model::dashboard::{CostTracking, Dashboard};
use crate::model::project::Project;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;

pub mod http;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level failure (DNS, connect, reset, body read).
    Network(String),
    /// Server answered with a non-success status code.
    Status(u16),
    /// Body was not a valid snapshot document.
    Parse(String),
    /// No answer within the configured fetch timeout.
    Timeout,
    InvalidUrl(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Parse(message) => write!(f, "invalid snapshot document: {message}"),
            Self::Timeout => write!(f, "remote fetch timed out"),
            Self::InvalidUrl(value) => write!(f, "invalid remote url: {value}"),
        }
    }
}

impl Error for RemoteError {}

/// Snapshot document as served remotely, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub projects: Option<BTreeMap<String, Arc<Project>>>,
    #[serde(default)]
    pub cost_tracking: Option<CostTracking>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl RemoteDocument {
    /// Parses a document from JSON text.
    ///
    /// # Errors
    /// - `RemoteError::Parse` when the text is not a valid document.
    pub fn from_json(text: &str) -> RemoteResult<Self> {
        serde_json::from_str(text).map_err(|err| RemoteError::Parse(err.to_string()))
    }

    /// Fills absent fields: no projects, a zero budget, `now` as timestamp.
    pub fn resolve(self, now: DateTime<Utc>) -> Dashboard {
        Dashboard {
            projects: self.projects.unwrap_or_default(),
            cost_tracking: self.cost_tracking.unwrap_or_default(),
            last_updated: self.last_updated.unwrap_or(now),
        }
    }
}

/// Provider of the authoritative remote snapshot.
pub trait SnapshotSource {
    fn fetch(&self) -> impl Future<Output = RemoteResult<RemoteDocument>> + Send;
}

impl<T: SnapshotSource + Send + Sync> SnapshotSource for Arc<T> {
    fn fetch(&self) -> impl Future<Output = RemoteResult<RemoteDocument>> + Send {
        (**self).fetch()
    }
}
