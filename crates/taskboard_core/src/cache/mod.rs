//! Local cache slot abstraction and implementations.
//!
//! # Responsibility
//! - Hold the last-known dashboard snapshot as one serialized string per key.
//! - Serve as an availability fallback when the remote resource is down.
//!
//! # Invariants
//! - `write` is a total overwrite of the slot, never an incremental patch.
//! - A missing slot is `Ok(None)`, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_slot;
pub mod sqlite_slot;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    /// The backing store cannot be used at all (e.g. simulated outage).
    Unavailable(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "cache unavailable: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed storage for serialized snapshots.
pub trait CacheSlot {
    fn read(&self, key: &str) -> CacheResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> CacheResult<()>;
}

impl<T: CacheSlot + ?Sized> CacheSlot for std::sync::Arc<T> {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> CacheResult<()> {
        (**self).write(key, value)
    }
}
