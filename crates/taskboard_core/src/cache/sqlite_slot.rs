//! SQLite-backed cache slot.
//!
//! # Responsibility
//! - Persist serialized snapshots across process restarts.
//! - Keep SQL details inside the cache boundary.
//!
//! # Invariants
//! - Each write is one atomic upsert; readers see the old or the new value,
//!   never a mix.
//! - The connection is used under a mutex, so the slot is safe to share.

use crate::cache::{CacheResult, CacheSlot};
use crate::db::{open_db, open_db_in_memory};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Durable cache slot stored in the `cache_slots` table.
pub struct SqliteCacheSlot {
    conn: Mutex<Connection>,
}

impl SqliteCacheSlot {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the cache database at `path`, creating it when absent.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Returns the last write time of `key` in epoch milliseconds.
    pub fn updated_at_ms(&self, key: &str) -> CacheResult<Option<i64>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT updated_at FROM cache_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl CacheSlot for SqliteCacheSlot {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM cache_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cache_slots (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}
