//! In-memory file system
//!
//! Files live in a map guarded by a mutex. Modification times come from a
//! logical clock that advances by one second on every write or touch, so
//! invalidation tests never depend on the resolution of real timestamps.

use super::types::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: SystemTime,
}

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, MemoryFile>>,
    clock: AtomicU64,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<P: Into<PathBuf>, C: Into<String>>(files: impl IntoIterator<Item = (P, C)>) -> Self {
        let fs = Self::new();
        for (path, content) in files {
            fs.write(path, content);
        }
        fs
    }

    fn tick(&self) -> SystemTime {
        let seconds = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        UNIX_EPOCH + Duration::from_secs(seconds)
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, MemoryFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates or replaces a file.
    pub fn write(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let modified = self.tick();
        self.files().insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Advances the modification time of an existing file.
    pub fn touch(&self, path: &Path) -> io::Result<()> {
        let modified = self.tick();
        match self.files().get_mut(path) {
            Some(file) => {
                file.modified = modified;
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    pub fn remove(&self, path: &Path) -> io::Result<()> {
        self.files().remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files()
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| not_found(path))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files()
            .get(path)
            .map(|file| file.modified)
            .ok_or_else(|| not_found(path))
    }
}
