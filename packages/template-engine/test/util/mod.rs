#![allow(dead_code)]
#![allow(unused_imports)]

/**
 * Template Engine Test Utilities
 *
 * A small component registry, token humanizer and recording live components
 * shared by the integration tests.
 */
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use template_engine::error::TemplateError;
use template_engine::instantiate::{
    Component, ComponentFactory, ComponentRef, EventHandler, ParsedObject, PropertyValue, WeakComponentRef,
};
use template_engine::ml_parser::lexer::tokenize;
use template_engine::ml_parser::{Parser, Template, TemplateOptions};
use template_engine::schema::{StaticRegistry, TypeDescriptor};

pub fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .with("Btn", TypeDescriptor::control().property("Text").event("Click"))
        .with(
            "Panel",
            TypeDescriptor::control()
                .property("Title")
                .property("Visible")
                .property("ItemTemplate")
                .read_only("Font")
                .read_only("Controls"),
        )
        .with("Label", TypeDescriptor::control().property("Text").read_only("Length"))
        .with("Image", TypeDescriptor::control().property("ImageUrl").property("AlternateText"))
        .with(
            "Style",
            TypeDescriptor::component().property("Color").read_only("Font"),
        )
}

pub fn parse(source: &str) -> Result<Template, TemplateError> {
    let registry = registry();
    Parser::new(&registry).parse(source, &TemplateOptions::default())
}

pub fn parse_ok(source: &str) -> Template {
    match parse(source) {
        Ok(template) => template,
        Err(error) => panic!("unexpected parse error: {}", error),
    }
}

/// `[label, matched text]` per token.
pub fn humanize_tokens(source: &str) -> Vec<[String; 2]> {
    tokenize(source)
        .iter()
        .map(|token| [token.label().to_string(), token.span.slice(source).to_string()])
        .collect()
}

/// Live component recording everything the instantiator does to it.
pub struct Recorder {
    pub type_name: String,
    pub structural: bool,
    pub allows_children: bool,
    pub properties: Vec<(String, PropertyValue)>,
    pub bindings: Vec<(String, String)>,
    pub auto_bindings: Vec<(String, String)>,
    pub events: Vec<(String, EventHandler)>,
    pub children: Vec<ParsedObject>,
    pub registered: Vec<(String, ComponentRef)>,
    pub owner: Option<WeakComponentRef>,
    pub cache_key_prefix: Option<String>,
    pub tracking: Vec<bool>,
    pub variables: HashMap<String, serde_json::Value>,
}

impl Recorder {
    pub fn new(type_name: &str) -> Self {
        Recorder {
            type_name: type_name.to_string(),
            structural: true,
            allows_children: true,
            properties: Vec::new(),
            bindings: Vec::new(),
            auto_bindings: Vec::new(),
            events: Vec::new(),
            children: Vec::new(),
            registered: Vec::new(),
            owner: None,
            cache_key_prefix: None,
            tracking: Vec::new(),
            variables: HashMap::new(),
        }
    }

    /// Page-like owner evaluating expressions by variable lookup.
    pub fn page(variables: &[(&str, serde_json::Value)]) -> Rc<RefCell<Recorder>> {
        let mut page = Recorder::new("Page");
        for (name, value) in variables {
            page.variables.insert(name.to_string(), value.clone());
        }
        Rc::new(RefCell::new(page))
    }

    pub fn property(&self, path: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, value)| value)
    }

    /// Children as `<Type>` for components and their text otherwise.
    pub fn child_summary(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|child| match child {
                ParsedObject::Component(component) => format!("<{}>", component.borrow().type_name()),
                ParsedObject::Literal(text) => text.clone(),
                ParsedObject::Composite(composite) => composite.text(),
            })
            .collect()
    }
}

impl Component for Recorder {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn is_structural(&self) -> bool {
        self.structural
    }

    fn allows_children(&self) -> bool {
        self.allows_children
    }

    fn set_template_owner(&mut self, owner: WeakComponentRef) {
        self.owner = Some(owner);
    }

    fn set_cache_key_prefix(&mut self, prefix: &str) {
        self.cache_key_prefix = Some(prefix.to_string());
    }

    fn set_tracking(&mut self, enabled: bool) {
        self.tracking.push(enabled);
    }

    fn set_property(&mut self, path: &str, value: PropertyValue) -> anyhow::Result<()> {
        if path == "fail" {
            anyhow::bail!("rejected");
        }
        self.properties.push((path.to_string(), value));
        Ok(())
    }

    fn bind_property(&mut self, path: &str, expression: &str) {
        self.bindings.push((path.to_string(), expression.to_string()));
    }

    fn auto_bind_property(&mut self, path: &str, expression: &str) {
        self.auto_bindings.push((path.to_string(), expression.to_string()));
    }

    fn attach_event_handler(&mut self, event: &str, handler: EventHandler) -> anyhow::Result<()> {
        self.events.push((event.to_string(), handler));
        Ok(())
    }

    fn add_parsed_object(&mut self, object: ParsedObject) {
        self.children.push(object);
    }

    /// Looks up `expression` as a variable name; attribute expressions
    /// arrive wrapped as `(name)`.
    fn evaluate_expression(&self, expression: &str) -> anyhow::Result<serde_json::Value> {
        let name = expression
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(expression);
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("undefined variable {}", expression))
    }

    fn evaluate_statements(&self, statements: &str) -> anyhow::Result<String> {
        Ok(format!("ran {}", statements))
    }

    fn register_object(&mut self, id: &str, component: ComponentRef) {
        self.registered.push((id.to_string(), component));
    }
}

/// Creates [`Recorder`]s and keeps a handle on each of them.
#[derive(Default)]
pub struct RecordingFactory {
    /// Type name to `(structural, allows_children)`.
    kinds: HashMap<String, (bool, bool)>,
    pub created: RefCell<Vec<Rc<RefCell<Recorder>>>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        RecordingFactory::default()
            .with_kind("Btn", true, true)
            .with_kind("Panel", true, true)
            .with_kind("Label", true, true)
            .with_kind("Image", true, true)
            .with_kind("Style", false, true)
    }

    pub fn with_kind(mut self, type_name: &str, structural: bool, allows_children: bool) -> Self {
        self.kinds.insert(type_name.to_string(), (structural, allows_children));
        self
    }

    pub fn created(&self, index: usize) -> Rc<RefCell<Recorder>> {
        self.created.borrow()[index].clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }
}

impl ComponentFactory for RecordingFactory {
    fn create(&self, type_name: &str) -> anyhow::Result<ComponentRef> {
        let (structural, allows_children) = *self
            .kinds
            .get(type_name)
            .ok_or_else(|| anyhow::anyhow!("no such type {}", type_name))?;
        let mut recorder = Recorder::new(type_name);
        recorder.structural = structural;
        recorder.allows_children = allows_children;
        let recorder = Rc::new(RefCell::new(recorder));
        self.created.borrow_mut().push(recorder.clone());
        let component: ComponentRef = recorder;
        Ok(component)
    }
}
