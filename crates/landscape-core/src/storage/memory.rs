//! In-memory [`Storage`] implementation for testing and WASM targets.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Result};

use super::Storage;

/// In-memory blob storage.
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, String>>,
    available: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            available: true,
        }
    }

    /// A medium that rejects every read and write, like a browser with
    /// storage disabled.
    pub fn unavailable() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            available: false,
        }
    }

    /// Put a raw blob in place, bypassing availability checks.
    pub fn seed(&self, key: &str, value: &str) {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), value.to_string());
    }

    /// Current raw blob under `key`, bypassing availability checks.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs.get(key).cloned()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        if !self.available {
            bail!("storage unavailable");
        }
        Ok(self.snapshot(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if !self.available {
            bail!("storage unavailable");
        }
        self.seed(key, value);
        Ok(())
    }
}
