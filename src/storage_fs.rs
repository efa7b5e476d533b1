//! File-backed [`Storage`] and store construction.
//!
//! Each blob is one file, `<dir>/<key>.json`. Writes go to a temporary file in
//! the same directory and are renamed into place, so readers see either the
//! old blob or the new one, never a torn write.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use landscape_core::research::ResearchStore;
use landscape_core::storage::Storage;

use crate::config::Config;

/// Blob storage in a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Keep keys from escaping the storage directory.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage dir: {}", self.dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        Ok(())
    }
}

/// Open the research store configured in `[storage]`.
pub fn open_store(config: &Config) -> ResearchStore {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.storage.dir));
    ResearchStore::load_with_key(storage, config.storage.key.clone())
}

/// Run a store operation on tokio's blocking pool.
///
/// Mutations write through to [`FileStorage`] with synchronous file I/O while
/// holding the store's write lock, so async callers go through here.
pub async fn run_blocking<T, F>(store: &Arc<ResearchStore>, op: F) -> Result<T>
where
    F: FnOnce(&ResearchStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .context("Store task panicked")
}
