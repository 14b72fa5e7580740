//! Bound composite literals
//!
//! The per-instance copy of a [`CompositeLiteral`]. Static lookups
//! (parameters, assets, localized text) are resolved when the copy is made;
//! expressions and statements are evaluated through the owner on every
//! [`render`](BoundCompositeLiteral::render), data bindings only on
//! [`data_bind`](BoundCompositeLiteral::data_bind).

use super::component::{ComponentRef, WeakComponentRef};
use super::services::Services;
use crate::error::InstantiateError;
use crate::ml_parser::ast::{CompositeLiteral, Fragment};
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Expression { source: String, value: String },
    Statements { source: String, value: String },
    DataBinding { source: String, value: String },
}

impl Piece {
    fn value(&self) -> &str {
        match self {
            Piece::Text(text) => text,
            Piece::Expression { value, .. }
            | Piece::Statements { value, .. }
            | Piece::DataBinding { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoundCompositeLiteral {
    pieces: Vec<Piece>,
    context: WeakComponentRef,
}

impl BoundCompositeLiteral {
    pub(crate) fn bind(
        literal: &CompositeLiteral,
        context: &ComponentRef,
        context_path: &Path,
        services: &Services<'_>,
    ) -> Result<Self, InstantiateError> {
        let mut pieces = Vec::with_capacity(literal.fragments().len());
        for fragment in literal.fragments() {
            let piece = match fragment {
                Fragment::Text(text) => Piece::Text(text.clone()),
                Fragment::Expression(source) => Piece::Expression {
                    source: source.clone(),
                    value: String::new(),
                },
                Fragment::Statements(source) => Piece::Statements {
                    source: source.clone(),
                    value: String::new(),
                },
                Fragment::DataBinding(source) => Piece::DataBinding {
                    source: source.clone(),
                    value: String::new(),
                },
                Fragment::Parameter(name) => Piece::Text(
                    services
                        .parameters
                        .parameter(name)
                        .map(|value| value_to_text(&value))
                        .unwrap_or_default(),
                ),
                Fragment::Asset(path) => {
                    let path = context_path.join(path);
                    Piece::Text(services.assets.publish(&path).map_err(|e| InstantiateError::Asset {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?)
                }
                Fragment::Localization(text) => Piece::Text(services.localizer.localize(text)),
            };
            pieces.push(piece);
        }
        Ok(BoundCompositeLiteral {
            pieces,
            context: Rc::downgrade(context),
        })
    }

    /// Evaluates expressions and statements, then returns the concatenated
    /// text. Data bindings keep the value of the last [`data_bind`] call.
    ///
    /// [`data_bind`]: BoundCompositeLiteral::data_bind
    pub fn render(&mut self) -> Result<String, InstantiateError> {
        let context = self.context()?;
        let context = context
            .try_borrow()
            .map_err(|_| InstantiateError::InUse("composite literal owner".to_string()))?;
        for piece in self.pieces.iter_mut() {
            match piece {
                Piece::Expression { source, value } => {
                    let result = context
                        .evaluate_expression(source)
                        .map_err(|e| expression_error(source, e))?;
                    *value = value_to_text(&result);
                }
                Piece::Statements { source, value } => {
                    *value = context
                        .evaluate_statements(source)
                        .map_err(|e| expression_error(source, e))?;
                }
                Piece::Text(_) | Piece::DataBinding { .. } => {}
            }
        }
        Ok(self.text())
    }

    /// Evaluates every data-binding fragment.
    pub fn data_bind(&mut self) -> Result<(), InstantiateError> {
        let context = self.context()?;
        let context = context
            .try_borrow()
            .map_err(|_| InstantiateError::InUse("composite literal owner".to_string()))?;
        for piece in self.pieces.iter_mut() {
            if let Piece::DataBinding { source, value } = piece {
                let result = context
                    .evaluate_expression(source)
                    .map_err(|e| expression_error(source, e))?;
                *value = value_to_text(&result);
            }
        }
        Ok(())
    }

    /// Current text without evaluating anything.
    pub fn text(&self) -> String {
        self.pieces.iter().map(Piece::value).collect()
    }

    fn context(&self) -> Result<ComponentRef, InstantiateError> {
        self.context.upgrade().ok_or_else(|| InstantiateError::Expression {
            expression: String::new(),
            reason: "the owner of this literal no longer exists".to_string(),
        })
    }
}

fn expression_error(source: &str, error: anyhow::Error) -> InstantiateError {
    InstantiateError::Expression {
        expression: source.to_string(),
        reason: error.to_string(),
    }
}

/// Text form of an evaluated value; strings are not quoted and `null` is
/// empty.
pub fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
