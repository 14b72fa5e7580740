//! Instantiator
//!
//! Expands a parsed [`Template`] into live objects. Nodes are visited in
//! array order, so every container is created before its children. Objects
//! nested in another component are attached right away; objects at the
//! template root are attached to the structural parent only after the whole
//! array has been processed.
//!
//! The template is only read. Every call creates fresh instances and fresh
//! literal copies, so one cached template can be instantiated any number of
//! times.

use super::component::{Component, ComponentRef, EventHandler, ParsedObject, PropertyValue};
use super::composite::{value_to_text, BoundCompositeLiteral};
use super::services::Services;
use crate::error::InstantiateError;
use crate::ml_parser::ast::{AttrValue, Container, Node, NodeIndex, Template, TextContent};
use crate::schema::is_event_name;
use indexmap::IndexMap;
use std::cell::{Ref, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// Prefix given to handler names that do not name their target.
const TEMPLATE_CONTROL_PREFIX: &str = "TemplateControl.";

impl Template {
    /// Instantiates the template on behalf of `owner`, attaching root-level
    /// objects to `parent` (the owner itself when `None`).
    pub fn instantiate_in(
        &self,
        owner: &ComponentRef,
        parent: Option<&ComponentRef>,
        services: &Services<'_>,
    ) -> Result<(), InstantiateError> {
        let parent = parent.unwrap_or(owner);
        let mut containers: HashMap<NodeIndex, ComponentRef> = HashMap::new();
        let mut direct_children: Vec<ParsedObject> = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let container = match node.container() {
                Container::Root => None,
                Container::Node(container) => match containers.get(&container) {
                    Some(component) => Some(component.clone()),
                    // enclosing component does not accept children
                    None => continue,
                },
            };

            let object = match node {
                Node::Component {
                    type_name,
                    attributes,
                    ..
                } => {
                    let component = self.create_component(index, type_name, attributes, owner, services)?;
                    if borrow(&component, type_name)?.allows_children() {
                        containers.insert(index, component.clone());
                    }
                    ParsedObject::Component(component)
                }
                Node::Text {
                    content: TextContent::Literal(text),
                    ..
                } => ParsedObject::Literal(text.clone()),
                Node::Text {
                    content: TextContent::Composite(composite),
                    ..
                } => ParsedObject::Composite(BoundCompositeLiteral::bind(
                    composite,
                    owner,
                    &self.context_path,
                    services,
                )?),
            };

            match container {
                Some(container) => borrow_mut(&container, "container")?.add_parsed_object(object),
                None => direct_children.push(object),
            }
        }

        tracing::trace!(
            hash = %self.hash,
            children = direct_children.len(),
            "attaching instantiated template"
        );
        let mut parent = borrow_mut(parent, "parent")?;
        for object in direct_children {
            parent.add_parsed_object(object);
        }
        Ok(())
    }

    fn create_component(
        &self,
        index: NodeIndex,
        type_name: &str,
        attributes: &IndexMap<String, AttrValue>,
        owner: &ComponentRef,
        services: &Services<'_>,
    ) -> Result<ComponentRef, InstantiateError> {
        let component = services
            .factory
            .create(type_name)
            .map_err(|e| InstantiateError::Create {
                type_name: type_name.to_string(),
                reason: e.to_string(),
            })?;
        let structural = borrow(&component, type_name)?.is_structural();

        let mut properties: Vec<(&str, AttrValue)> = attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();

        if structural {
            let mut instance = borrow_mut(&component, type_name)?;
            instance.set_cache_key_prefix(&format!("{}{}", self.hash, index));
            instance.set_template_owner(Rc::downgrade(owner));
        }

        if let Some(position) = properties.iter().position(|(name, _)| *name == "id") {
            let id = self.resolve_text(&properties[position].1, owner, services)?;
            borrow_mut(owner, "owner")?.register_object(&id, component.clone());
            if structural || borrow(&component, type_name)?.has_property("id") {
                properties[position].1 = AttrValue::Literal(id);
            } else {
                properties.remove(position);
            }
        }

        let mut instance = borrow_mut(&component, type_name)?;
        if structural {
            let skin_id = match properties.iter().position(|(name, _)| *name == "skinid") {
                Some(position) => {
                    let (_, value) = properties.remove(position);
                    Some(self.resolve_text(&value, owner, services)?)
                }
                None => None,
            };
            services
                .skins
                .apply_skin(&mut *instance, skin_id.as_deref())
                .map_err(|e| InstantiateError::Property {
                    type_name: type_name.to_string(),
                    path: "skinid".to_string(),
                    reason: e.to_string(),
                })?;
        }

        instance.set_tracking(false);
        for (name, value) in &properties {
            if structural && is_event_name(name) {
                attach_event(&mut *instance, type_name, name, value, owner)?;
            } else {
                self.configure_property(&mut *instance, type_name, structural, name, value, owner, services)?;
            }
        }
        instance.set_tracking(true);
        drop(instance);

        Ok(component)
    }

    #[allow(clippy::too_many_arguments)]
    fn configure_property(
        &self,
        instance: &mut dyn Component,
        type_name: &str,
        structural: bool,
        path: &str,
        value: &AttrValue,
        owner: &ComponentRef,
        services: &Services<'_>,
    ) -> Result<(), InstantiateError> {
        let value = match value {
            AttrValue::DataBinding(expression) => {
                instance.bind_property(path, expression);
                return Ok(());
            }
            AttrValue::Expression(expression) if structural => {
                instance.auto_bind_property(path, expression);
                return Ok(());
            }
            AttrValue::Expression(expression) => PropertyValue::Value(evaluate(owner, expression)?),
            AttrValue::Literal(text) => PropertyValue::Text(text.clone()),
            AttrValue::NestedTemplate(template) => PropertyValue::Template(template.clone()),
            AttrValue::Asset(_) | AttrValue::Localization(_) => {
                PropertyValue::Text(self.resolve_text(value, owner, services)?)
            }
            AttrValue::Parameter(name) => {
                PropertyValue::Value(services.parameters.parameter(name).unwrap_or_default())
            }
        };
        instance
            .set_property(path, value)
            .map_err(|e| InstantiateError::Property {
                type_name: type_name.to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Text of a value that must be known at instantiation time.
    fn resolve_text(
        &self,
        value: &AttrValue,
        owner: &ComponentRef,
        services: &Services<'_>,
    ) -> Result<String, InstantiateError> {
        match value {
            AttrValue::Literal(text) => Ok(text.clone()),
            AttrValue::Expression(expression) | AttrValue::DataBinding(expression) => {
                Ok(value_to_text(&evaluate(owner, expression)?))
            }
            AttrValue::Asset(path) => {
                let path = self.context_path.join(path);
                services.assets.publish(&path).map_err(|e| InstantiateError::Asset {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
            AttrValue::Parameter(name) => Ok(services
                .parameters
                .parameter(name)
                .map(|value| value_to_text(&value))
                .unwrap_or_default()),
            AttrValue::Localization(text) => Ok(services.localizer.localize(text)),
            AttrValue::NestedTemplate(template) => Ok(template.hash().to_string()),
        }
    }
}

fn attach_event(
    instance: &mut dyn Component,
    type_name: &str,
    event: &str,
    value: &AttrValue,
    owner: &ComponentRef,
) -> Result<(), InstantiateError> {
    let event_error = |handler: &str, reason: String| InstantiateError::Event {
        type_name: type_name.to_string(),
        event: event.to_string(),
        handler: handler.to_string(),
        reason,
    };
    let handler = value
        .as_literal()
        .ok_or_else(|| event_error("", format!("handler must be a name, got {}", value.kind_name())))?;
    let method = if handler.contains('.') {
        handler.to_string()
    } else {
        format!("{}{}", TEMPLATE_CONTROL_PREFIX, handler)
    };
    instance
        .attach_event_handler(
            event,
            EventHandler {
                context: Rc::downgrade(owner),
                method,
            },
        )
        .map_err(|e| event_error(handler, e.to_string()))
}

fn evaluate(owner: &ComponentRef, expression: &str) -> Result<serde_json::Value, InstantiateError> {
    borrow(owner, "owner")?
        .evaluate_expression(expression)
        .map_err(|e| InstantiateError::Expression {
            expression: expression.to_string(),
            reason: e.to_string(),
        })
}

fn borrow<'c>(component: &'c ComponentRef, role: &str) -> Result<Ref<'c, dyn Component>, InstantiateError> {
    component
        .try_borrow()
        .map_err(|_| InstantiateError::InUse(role.to_string()))
}

fn borrow_mut<'c>(
    component: &'c ComponentRef,
    role: &str,
) -> Result<RefMut<'c, dyn Component + 'static>, InstantiateError> {
    component
        .try_borrow_mut()
        .map_err(|_| InstantiateError::InUse(role.to_string()))
}
