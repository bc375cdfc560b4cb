//! Key-value persistence for the last good snapshot.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::StoreResult;

pub const SHOPS_KEY: &str = "shops-cache";
pub const BILLS_KEY: &str = "bills-cache";

const DEFAULT_CACHE_PATH: &str = "config/kanakku_cache.json";

/// String storage keyed by name. Values are serialized JSON documents.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String) -> StoreResult<()>;
}

impl<T: Cache + ?Sized> Cache for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local cache, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }
}

/// Cache backed by one JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileCache {
    /// Opens the cache file. A missing file is an empty cache.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl Cache for JsonFileCache {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }
}

pub fn default_cache_path() -> &'static str {
    DEFAULT_CACHE_PATH
}
