//! Schema Module
//!
//! Component capability descriptors and attribute validation.

pub mod component_registry;
pub mod validator;

pub use component_registry::*;
pub use validator::{is_event_name, resolve_type, validate_attribute};
