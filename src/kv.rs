//! Process-local key-value storage that survives restarts.
//!
//! Values are raw strings: the theme mode is stored as the literal `light` or
//! `dark`, the other keys hold JSON text.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;
use crate::files;

pub const THEME_KEY: &str = "theme";
pub const THEME_CONFIG_KEY: &str = "themeConfig";
pub const COMMANDS_CACHE_KEY: &str = "archmie-commands";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// In-memory store keyed by string.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    inner: Mutex<IndexMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.inner.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file, rewritten atomically on every
/// change. The file is read once at open time.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<IndexMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`. A missing file is an empty store; a corrupt
    /// one is logged and treated as empty so startup never fails on it.
    pub fn open(path: &Path) -> Self {
        let entries = if path.exists() {
            match files::read_json::<IndexMap<String, String>>(path) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Discarding unreadable storage file: {e}");
                    IndexMap::new()
                }
            }
        } else {
            IndexMap::new()
        };
        Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &IndexMap<String, String>) -> Result<(), AppError> {
        files::write_json(&self.path, entries).map_err(|e| AppError::storage(e.to_string()))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}

/// Load and deserialize a JSON value. A present but malformed value is a
/// [`AppError::CacheParse`].
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| AppError::CacheParse {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Serialize a value as compact JSON and store it.
pub fn set_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
