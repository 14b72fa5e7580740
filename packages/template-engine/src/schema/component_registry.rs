//! Component Registry
//!
//! Capability descriptors the parser validates component tags against. The
//! parser never inspects live types; whatever owns the component types
//! describes them through [`ComponentDescriptor`] and hands out descriptors
//! through a [`ComponentRegistry`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What a component type accepts from a template.
///
/// Every name passed in is lower-cased; implementations compare
/// case-insensitively.
pub trait ComponentDescriptor: Send + Sync {
    /// The type has a getter for `name`.
    fn has_readable_property(&self, name: &str) -> bool;

    /// The type has a setter for `name`.
    fn has_writable_property(&self, name: &str) -> bool;

    /// The type declares event `name`, given with its `on` prefix
    /// (`onclick`).
    fn has_event(&self, name: &str) -> bool;

    /// Full structural component (control): supports events, data binding
    /// and child content. Plain value holders return `false`.
    fn is_structural(&self) -> bool;
}

/// Resolves type names used in `<com:Type>` tags.
pub trait ComponentRegistry: Send + Sync {
    fn descriptor(&self, type_name: &str) -> Option<Arc<dyn ComponentDescriptor>>;
}

/// Table-driven descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDescriptor {
    structural: bool,
    readable: HashSet<String>,
    writable: HashSet<String>,
    events: HashSet<String>,
}

impl TypeDescriptor {
    /// A structural component. Controls always carry the `ID` and `SkinID`
    /// properties.
    pub fn control() -> Self {
        TypeDescriptor {
            structural: true,
            ..Default::default()
        }
        .property("ID")
        .property("SkinID")
    }

    /// A plain, non-structural component.
    pub fn component() -> Self {
        TypeDescriptor::default()
    }

    /// Readable and writable property.
    pub fn property(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.readable.insert(name.clone());
        self.writable.insert(name);
        self
    }

    pub fn read_only(mut self, name: &str) -> Self {
        self.readable.insert(name.to_ascii_lowercase());
        self
    }

    pub fn write_only(mut self, name: &str) -> Self {
        self.writable.insert(name.to_ascii_lowercase());
        self
    }

    /// Declares an event; `Click` and `OnClick` both declare `onclick`.
    pub fn event(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        let name = if name.starts_with("on") {
            name
        } else {
            format!("on{}", name)
        };
        self.events.insert(name);
        self
    }

    /// Inherits every property and event of `base`.
    pub fn extend(mut self, base: &TypeDescriptor) -> Self {
        self.readable.extend(base.readable.iter().cloned());
        self.writable.extend(base.writable.iter().cloned());
        self.events.extend(base.events.iter().cloned());
        self
    }
}

impl ComponentDescriptor for TypeDescriptor {
    fn has_readable_property(&self, name: &str) -> bool {
        self.readable.contains(&name.to_ascii_lowercase())
    }

    fn has_writable_property(&self, name: &str) -> bool {
        self.writable.contains(&name.to_ascii_lowercase())
    }

    fn has_event(&self, name: &str) -> bool {
        self.events.contains(&name.to_ascii_lowercase())
    }

    fn is_structural(&self) -> bool {
        self.structural
    }
}

/// Registry backed by a map of type name to descriptor.
#[derive(Default, Clone)]
pub struct StaticRegistry {
    types: HashMap<String, Arc<dyn ComponentDescriptor>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        descriptor: impl ComponentDescriptor + 'static,
    ) -> &mut Self {
        self.types.insert(type_name.into(), Arc::new(descriptor));
        self
    }

    pub fn with(
        mut self,
        type_name: impl Into<String>,
        descriptor: impl ComponentDescriptor + 'static,
    ) -> Self {
        self.register(type_name, descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ComponentRegistry for StaticRegistry {
    fn descriptor(&self, type_name: &str) -> Option<Arc<dyn ComponentDescriptor>> {
        self.types.get(type_name).cloned()
    }
}
