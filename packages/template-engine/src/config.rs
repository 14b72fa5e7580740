//! Engine configuration
//!
//! Loaded from a JSON document, every field optional:
//!
//! ```json
//! {
//!   "cacheMode": "validate",
//!   "templateExtension": ".tpl",
//!   "namespaces": { "Application": "/srv/app/protected" },
//!   "maxIncludeDepth": 16,
//!   "cacheKeyPrefix": "template:"
//! }
//! ```

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How cached templates are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Re-check the modification time of the template and every included
    /// file on each lookup.
    #[default]
    Validate,
    /// Return cached entries without touching the file system. Stale
    /// templates stay in use until the cache is cleared.
    Trusted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub cache_mode: CacheMode,
    /// Extension appended to include references and type-name lookups.
    pub template_extension: String,
    /// Namespace alias to directory, used to resolve include references such
    /// as `Application.layouts.header`.
    pub namespaces: IndexMap<String, PathBuf>,
    pub max_include_depth: usize,
    pub cache_key_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_mode: CacheMode::Validate,
            template_extension: ".tpl".to_string(),
            namespaces: IndexMap::new(),
            max_include_depth: crate::ml_parser::DEFAULT_MAX_INCLUDE_DEPTH,
            cache_key_prefix: "template:".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid engine config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_namespace(mut self, alias: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.namespaces.insert(alias.into(), dir.into());
        self
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }
}
