//! Live object contracts
//!
//! The engine does not own the runtime object model. Instantiation talks to
//! live components only through [`Component`]; everything a component does
//! with the values it receives is up to its implementation.

use super::composite::BoundCompositeLiteral;
use crate::ml_parser::ast::Template;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub type ComponentRef = Rc<RefCell<dyn Component>>;
pub type WeakComponentRef = Weak<RefCell<dyn Component>>;

/// A value assigned to a (sub)property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Literal text, or the resolved text of an asset, localization or
    /// identity value.
    Text(String),
    /// Result of an evaluated expression or a parameter lookup.
    Value(serde_json::Value),
    /// A nested template the receiving property instantiates itself.
    Template(Arc<Template>),
}

/// Event handler reference: `method` is invoked on `context` when the event
/// fires.
#[derive(Debug, Clone)]
pub struct EventHandler {
    pub context: WeakComponentRef,
    pub method: String,
}

/// A child handed to its structural parent.
pub enum ParsedObject {
    Component(ComponentRef),
    Literal(String),
    Composite(BoundCompositeLiteral),
}

impl fmt::Debug for ParsedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedObject::Component(component) => match component.try_borrow() {
                Ok(component) => write!(f, "Component({})", component.type_name()),
                Err(_) => write!(f, "Component(<borrowed>)"),
            },
            ParsedObject::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            ParsedObject::Composite(composite) => f.debug_tuple("Composite").field(composite).finish(),
        }
    }
}

/// A live object created from a component node.
///
/// Structural components (controls) receive their template owner, a cache
/// key prefix, skinning and tracking calls, and may defer expressions and
/// bind data. Plain components only get plain property assignments.
pub trait Component {
    fn type_name(&self) -> &str;

    fn is_structural(&self) -> bool {
        true
    }

    /// When `false`, nodes nested under this component are not instantiated.
    fn allows_children(&self) -> bool {
        true
    }

    /// Whether the component declares property `name`. Plain components
    /// that do not declare `id` only get registered under it.
    fn has_property(&self, _name: &str) -> bool {
        false
    }

    fn set_template_owner(&mut self, _owner: WeakComponentRef) {}

    fn set_cache_key_prefix(&mut self, _prefix: &str) {}

    /// Suspends (`false`) or resumes (`true`) change tracking.
    fn set_tracking(&mut self, _enabled: bool) {}

    /// Assigns a (possibly dotted) property path.
    fn set_property(&mut self, path: &str, value: PropertyValue) -> anyhow::Result<()>;

    /// Records a data binding evaluated on the next explicit bind.
    fn bind_property(&mut self, _path: &str, _expression: &str) {}

    /// Records an expression evaluated automatically before rendering.
    fn auto_bind_property(&mut self, _path: &str, _expression: &str) {}

    fn attach_event_handler(&mut self, event: &str, handler: EventHandler) -> anyhow::Result<()> {
        let _ = handler;
        anyhow::bail!("{} does not raise events (got '{}')", self.type_name(), event)
    }

    fn add_parsed_object(&mut self, _object: ParsedObject) {}

    fn evaluate_expression(&self, expression: &str) -> anyhow::Result<serde_json::Value> {
        anyhow::bail!("{} cannot evaluate '{}'", self.type_name(), expression)
    }

    fn evaluate_statements(&self, statements: &str) -> anyhow::Result<String> {
        anyhow::bail!("{} cannot run '{}'", self.type_name(), statements)
    }

    /// Makes `component` reachable under `id` from this owner.
    fn register_object(&mut self, _id: &str, _component: ComponentRef) {}
}
