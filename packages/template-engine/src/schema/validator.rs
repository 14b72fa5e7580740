//! Attribute validation
//!
//! Decides whether a (lower-cased) attribute name and its classified value
//! are legal for a component type:
//!
//! * `a.b`: the first segment must be readable;
//! * `on*`: the type must declare the event and the handler must be a
//!   literal name;
//! * anything else must be writable. A readable-only name is reported as
//!   read-only, a name with neither accessor as unknown.
//!
//! Non-structural types never accept data bindings or events, but always
//! accept `id`.

use super::component_registry::{ComponentDescriptor, ComponentRegistry};
use crate::error::ErrorKind;
use crate::ml_parser::ast::AttrValue;
use std::sync::Arc;

/// Looks up a tag's type, falling back to the last segment of a dotted
/// (namespaced) name.
pub fn resolve_type(
    registry: &dyn ComponentRegistry,
    type_name: &str,
) -> Result<Arc<dyn ComponentDescriptor>, ErrorKind> {
    registry
        .descriptor(type_name)
        .or_else(|| {
            type_name
                .rsplit_once('.')
                .and_then(|(_, short)| registry.descriptor(short))
        })
        .ok_or_else(|| ErrorKind::UnknownComponentType(type_name.to_string()))
}

pub fn is_event_name(name: &str) -> bool {
    name.get(..2).map_or(false, |prefix| prefix.eq_ignore_ascii_case("on"))
}

pub fn validate_attribute(
    type_name: &str,
    descriptor: &dyn ComponentDescriptor,
    name: &str,
    value: &AttrValue,
) -> Result<(), ErrorKind> {
    if descriptor.is_structural() {
        validate_control_attribute(type_name, descriptor, name, value)
    } else {
        validate_component_attribute(type_name, descriptor, name, value)
    }
}

fn validate_control_attribute(
    type_name: &str,
    descriptor: &dyn ComponentDescriptor,
    name: &str,
    value: &AttrValue,
) -> Result<(), ErrorKind> {
    if let Some((head, _)) = name.split_once('.') {
        return check_readable_head(type_name, descriptor, head);
    }

    if is_event_name(name) {
        if !descriptor.has_event(name) {
            return Err(ErrorKind::UnknownEvent {
                type_name: type_name.to_string(),
                name: name.to_string(),
            });
        }
        if !value.is_literal() {
            return Err(ErrorKind::InvalidEventHandler {
                type_name: type_name.to_string(),
                name: name.to_string(),
            });
        }
        return Ok(());
    }

    check_writable(type_name, descriptor, name)?;

    if !matches!(value, AttrValue::Literal(_) | AttrValue::Expression(_)) {
        if name == "id" {
            return Err(ErrorKind::InvalidControlId(type_name.to_string()));
        }
        if name == "skinid" {
            return Err(ErrorKind::InvalidSkinId(type_name.to_string()));
        }
    }
    Ok(())
}

fn validate_component_attribute(
    type_name: &str,
    descriptor: &dyn ComponentDescriptor,
    name: &str,
    value: &AttrValue,
) -> Result<(), ErrorKind> {
    if matches!(value, AttrValue::DataBinding(_)) {
        return Err(ErrorKind::DataBindingForbidden {
            type_name: type_name.to_string(),
            name: name.to_string(),
        });
    }

    if let Some((head, _)) = name.split_once('.') {
        return check_readable_head(type_name, descriptor, head);
    }

    if is_event_name(name) {
        return Err(ErrorKind::EventForbidden {
            type_name: type_name.to_string(),
            name: name.to_string(),
        });
    }

    // `id` is accepted even without a matching property
    if name == "id" {
        return Ok(());
    }
    check_writable(type_name, descriptor, name)
}

fn check_readable_head(
    type_name: &str,
    descriptor: &dyn ComponentDescriptor,
    head: &str,
) -> Result<(), ErrorKind> {
    if descriptor.has_readable_property(head) {
        Ok(())
    } else {
        Err(ErrorKind::UnknownProperty {
            type_name: type_name.to_string(),
            name: head.to_string(),
        })
    }
}

fn check_writable(
    type_name: &str,
    descriptor: &dyn ComponentDescriptor,
    name: &str,
) -> Result<(), ErrorKind> {
    if descriptor.has_writable_property(name) {
        return Ok(());
    }
    if descriptor.has_readable_property(name) {
        Err(ErrorKind::ReadOnlyProperty {
            type_name: type_name.to_string(),
            name: name.to_string(),
        })
    } else {
        Err(ErrorKind::UnknownProperty {
            type_name: type_name.to_string(),
            name: name.to_string(),
        })
    }
}
