//! Cache Module
//!
//! Parsed-template cache with timestamp invalidation.

pub mod manager;
pub mod store;

pub use manager::TemplateManager;
pub use store::{CacheEntry, CacheStore, MemoryCacheStore};
