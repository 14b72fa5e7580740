//! File System Module
//!
//! File access behind a trait so the cache can be exercised against a
//! deterministic in-memory implementation.

pub mod memory;
pub mod os;
pub mod resolver;
pub mod types;

pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;
pub use resolver::{FileIncludeLoader, NamespaceResolver};
pub use types::FileSystem;
