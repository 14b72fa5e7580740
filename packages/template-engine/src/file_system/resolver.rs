//! Logical path resolution
//!
//! Include references are dotted logical paths whose first segment is a
//! namespace alias: with `Application` mapped to `/srv/app`,
//! `Application.layouts.header` names `/srv/app/layouts/header.tpl`.

use super::types::FileSystem;
use crate::config::EngineConfig;
use crate::ml_parser::include::IncludeLoader;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceResolver {
    namespaces: IndexMap<String, PathBuf>,
    extension: String,
}

impl NamespaceResolver {
    pub fn new(namespaces: IndexMap<String, PathBuf>, extension: impl Into<String>) -> Self {
        NamespaceResolver {
            namespaces,
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.namespaces.clone(), config.template_extension.clone())
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File a logical path points at, whether or not it exists.
    pub fn resolve_path(&self, reference: &str) -> Option<PathBuf> {
        let (alias, rest) = reference.trim().split_once('.')?;
        let root = self.namespaces.get(alias)?;
        let mut segments = rest.split('.').peekable();
        let mut path = root.clone();
        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                return None;
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}{}", segment, self.extension));
            }
        }
        Some(path)
    }
}

/// Include loader reading through a [`FileSystem`].
///
/// The modification time of every loaded file is taken right before its
/// content is read, so a write racing the read leaves a time older than the
/// file and the cached result is seen as stale on the next lookup.
pub struct FileIncludeLoader<'a> {
    fs: &'a dyn FileSystem,
    resolver: &'a NamespaceResolver,
    loaded: RefCell<IndexMap<PathBuf, Option<SystemTime>>>,
}

impl<'a> FileIncludeLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem, resolver: &'a NamespaceResolver) -> Self {
        FileIncludeLoader {
            fs,
            resolver,
            loaded: RefCell::new(IndexMap::new()),
        }
    }

    /// Loaded files in load order with the modification time seen before
    /// their first read; `None` when it could not be determined.
    pub fn into_timestamps(self) -> IndexMap<PathBuf, Option<SystemTime>> {
        self.loaded.into_inner()
    }
}

impl IncludeLoader for FileIncludeLoader<'_> {
    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        self.resolver
            .resolve_path(reference)
            .filter(|path| self.fs.exists(path))
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        let modified = self.fs.modified(path).ok();
        self.loaded
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_insert(modified);
        self.fs.read_to_string(path)
    }
}
