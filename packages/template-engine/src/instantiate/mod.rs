//! Instantiate Module
//!
//! Expansion of parsed templates into live object graphs.

pub mod component;
pub mod composite;
pub mod instantiator;
pub mod services;

pub use component::*;
pub use composite::{value_to_text, BoundCompositeLiteral};
pub use services::*;
