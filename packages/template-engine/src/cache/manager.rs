//! Template Manager
//!
//! Loads templates from files and keeps the parsed result in a
//! [`CacheStore`]. An entry is reused while the template file and every
//! file it includes keep their recorded modification times; in
//! [`CacheMode::Trusted`] entries are reused unconditionally.
//!
//! Two threads missing on the same key both parse the file and the last
//! writer wins. Both results are equivalent, so no coordination is needed.

use super::store::{CacheEntry, CacheStore};
use crate::config::{CacheMode, EngineConfig};
use crate::error::{ErrorKind, TemplateError};
use crate::file_system::{FileIncludeLoader, FileSystem, NamespaceResolver};
use crate::ml_parser::ast::Template;
use crate::ml_parser::parser::{Parser, TemplateOptions};
use crate::parse_util::SourceLocation;
use crate::schema::ComponentRegistry;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

type Timestamps = IndexMap<PathBuf, SystemTime>;

pub struct TemplateManager {
    config: EngineConfig,
    fs: Arc<dyn FileSystem>,
    registry: Arc<dyn ComponentRegistry>,
    resolver: NamespaceResolver,
    cache: Option<Arc<dyn CacheStore>>,
}

impl TemplateManager {
    pub fn new(config: EngineConfig, fs: Arc<dyn FileSystem>, registry: Arc<dyn ComponentRegistry>) -> Self {
        let resolver = NamespaceResolver::from_config(&config);
        TemplateManager {
            config,
            fs,
            registry,
            resolver,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &NamespaceResolver {
        &self.resolver
    }

    /// Template stored in `path`, or `None` when the file does not exist.
    pub fn template_by_file(&self, path: &Path) -> Result<Option<Arc<Template>>, TemplateError> {
        if !self.fs.exists(path) {
            return Ok(None);
        }

        let key = self.cache_key(path);
        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Some(entry) if self.config.cache_mode == CacheMode::Trusted => {
                    tracing::debug!(file = %path.display(), "template cache hit (trusted)");
                    return Ok(Some(entry.template));
                }
                Some(entry) if entry.is_fresh(self.fs.as_ref()) => {
                    tracing::debug!(file = %path.display(), "template cache hit");
                    return Ok(Some(entry.template));
                }
                Some(_) => tracing::debug!(file = %path.display(), "template cache entry is stale"),
                None => tracing::debug!(file = %path.display(), "template cache miss"),
            }
        }

        let (template, timestamps) = self.parse_file(path)?;
        let template = Arc::new(template);
        if let Some(cache) = &self.cache {
            match timestamps {
                Some(timestamps) => cache.set(&key, CacheEntry::new(template.clone(), timestamps)),
                None => tracing::debug!(file = %path.display(), "template not cached: modification time unavailable"),
            }
        }
        Ok(Some(template))
    }

    /// Template of a component type, stored next to it as
    /// `<dir>/<TypeName><extension>`.
    pub fn template_for_type(
        &self,
        dir: &Path,
        type_name: &str,
    ) -> Result<Option<Arc<Template>>, TemplateError> {
        let file_name = format!("{}{}", type_name, self.config.template_extension);
        self.template_by_file(&dir.join(file_name))
    }

    /// Parses markup that has no backing file. Include markers are still
    /// resolved through the configured namespaces.
    pub fn parse_inline(&self, source: &str, context_path: &Path) -> Result<Template, TemplateError> {
        let options = TemplateOptions::inline(context_path).with_max_include_depth(self.config.max_include_depth);
        let loader = FileIncludeLoader::new(self.fs.as_ref(), &self.resolver);
        self.parse(&loader, source, &options)
    }

    /// Parses `path` and returns the modification time of every file read,
    /// each taken before the read. `None` when one is unavailable.
    fn parse_file(&self, path: &Path) -> Result<(Template, Option<Timestamps>), TemplateError> {
        let modified = self.fs.modified(path).ok();
        let source = self.fs.read_to_string(path).map_err(|e| {
            TemplateError::new(
                ErrorKind::UnreadableFile {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                },
                SourceLocation::File {
                    path: path.to_path_buf(),
                    line: 1,
                },
            )
        })?;
        let options = TemplateOptions::for_file(path).with_max_include_depth(self.config.max_include_depth);
        let loader = FileIncludeLoader::new(self.fs.as_ref(), &self.resolver);
        let template = self.parse(&loader, &source, &options)?;

        let timestamps = std::iter::once((path.to_path_buf(), modified))
            .chain(loader.into_timestamps())
            .map(|(file, time)| Some((file, time?)))
            .collect();
        Ok((template, timestamps))
    }

    fn parse(
        &self,
        loader: &FileIncludeLoader<'_>,
        source: &str,
        options: &TemplateOptions,
    ) -> Result<Template, TemplateError> {
        Parser::new(self.registry.as_ref())
            .with_include_loader(loader)
            .parse(source, options)
    }

    fn cache_key(&self, path: &Path) -> String {
        format!("{}{}", self.config.cache_key_prefix, path.display())
    }
}
