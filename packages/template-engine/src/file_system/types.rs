use std::io;
use std::path::Path;
use std::time::SystemTime;

/// The subset of file-system access the engine needs: existence checks,
/// reads and modification times.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}
