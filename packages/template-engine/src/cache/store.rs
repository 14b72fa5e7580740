use crate::file_system::FileSystem;
use crate::ml_parser::ast::Template;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// A parsed template and the modification time of every file it was built
/// from (the template file first, then its includes).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub template: Arc<Template>,
    pub timestamps: IndexMap<PathBuf, SystemTime>,
}

impl CacheEntry {
    pub fn new(template: Arc<Template>, timestamps: IndexMap<PathBuf, SystemTime>) -> Self {
        CacheEntry {
            template,
            timestamps,
        }
    }

    /// Every recorded file still exists with the recorded modification time.
    pub fn is_fresh(&self, fs: &dyn FileSystem) -> bool {
        self.timestamps.iter().all(|(path, recorded)| {
            fs.exists(path) && fs.modified(path).map_or(false, |current| current == *recorded)
        })
    }
}

/// Keyed storage for parsed templates.
///
/// Entries are only ever stored complete, so readers on other threads never
/// see a template under construction.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, entry: CacheEntry);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// Process-local cache store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
