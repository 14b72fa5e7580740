#![deny(clippy::all)]

/**
 * Template Engine
 *
 * Parses component-tree markup into immutable, cacheable templates and
 * expands them into live object graphs.
 */

pub mod cache;
pub mod config;
pub mod error;
pub mod file_system;
pub mod instantiate;
pub mod ml_parser;
pub mod parse_util;
pub mod schema;

pub use cache::{CacheStore, MemoryCacheStore, TemplateManager};
pub use config::{CacheMode, EngineConfig};
pub use error::{ErrorKind, InstantiateError, TemplateError};
pub use ml_parser::{AttrValue, Node, Parser, Template, TemplateOptions};
pub use parse_util::SourceLocation;
pub use schema::{ComponentDescriptor, ComponentRegistry, StaticRegistry, TypeDescriptor};
