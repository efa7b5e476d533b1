//! Storage abstraction for the research store.
//!
//! The [`Storage`] trait is a flat named-blob key-value medium: the research
//! store serializes its whole state into one blob and writes it wholesale on
//! every mutation. Implementations decide where the blob lives (memory,
//! a directory of files, browser local storage).
//!
//! Implementations must be `Send + Sync` so a store can be shared across
//! async handlers.

pub mod memory;

use anyhow::Result;

pub use memory::MemoryStorage;

/// Name of the blob holding the saved research.
pub const STORAGE_KEY: &str = "arctern_landscape_data";

/// Abstract persistence medium.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`read`](Storage::read) | Fetch a blob, `None` when it was never written |
/// | [`write`](Storage::write) | Replace a blob |
///
/// Both operations may fail when the medium is unavailable. Callers in this
/// crate treat such failures as non-fatal.
pub trait Storage: Send + Sync {
    /// Read the blob stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}
