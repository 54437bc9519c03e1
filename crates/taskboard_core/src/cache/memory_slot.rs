//! In-process cache slot.

use crate::cache::{CacheError, CacheResult, CacheSlot};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Cache slot kept in process memory.
///
/// Lost when the process exits. A slot can be switched to "unavailable" to
/// exercise the store's cache-failure paths.
#[derive(Debug, Default)]
pub struct MemoryCacheSlot {
    entries: Mutex<HashMap<String, String>>,
    unavailable: Mutex<Option<String>>,
}

impl MemoryCacheSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let slot = Self::new();
        slot.entries.lock().insert(key.into(), value.into());
        slot
    }

    /// Makes every subsequent read and write fail with `message`.
    pub fn set_unavailable(&self, message: impl Into<String>) {
        *self.unavailable.lock() = Some(message.into());
    }

    /// Returns the stored value without going through the failure switch.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn check_available(&self) -> CacheResult<()> {
        match self.unavailable.lock().as_ref() {
            Some(message) => Err(CacheError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl CacheSlot for MemoryCacheSlot {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_available()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> CacheResult<()> {
        self.check_available()?;
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryCacheSlot;
    use crate::cache::{CacheError, CacheSlot};

    #[test]
    fn write_overwrites_previous_value() {
        let slot = MemoryCacheSlot::new();
        assert_eq!(slot.read("k").unwrap(), None);

        slot.write("k", "first").unwrap();
        slot.write("k", "second").unwrap();
        assert_eq!(slot.read("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn unavailable_slot_fails_reads_and_writes() {
        let slot = MemoryCacheSlot::with_entry("k", "v");
        slot.set_unavailable("disk gone");

        assert!(matches!(slot.read("k"), Err(CacheError::Unavailable(_))));
        assert!(slot.write("k", "x").is_err());
        assert_eq!(slot.peek("k").as_deref(), Some("v"));
    }
}
