//! Error types
//!
//! Every problem found while preprocessing, tokenizing, parsing or validating
//! a template is reported as a [`TemplateError`]: an [`ErrorKind`] plus the
//! corrected location. Instantiation problems are runtime failures of the
//! live object model and get their own [`InstantiateError`].

use crate::parse_util::SourceLocation;
use thiserror::Error;

/// What went wrong while turning markup into a `Template`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Structural errors
    #[error("unexpected closing tag {0}")]
    UnexpectedClosingTag(String),
    #[error("expected closing tag {0}")]
    ExpectedClosingTag(String),
    #[error("property or attribute '{0}' is configured more than once")]
    DuplicateProperty(String),
    #[error("a directive must be unique and must appear before any other content")]
    DirectiveNotUnique,
    #[error("comments are not allowed inside a property value")]
    CommentForbidden,
    #[error("include of '{0}' is cyclic")]
    IncludeCycle(String),
    #[error("includes are nested deeper than {0} levels")]
    IncludeTooDeep(usize),

    // Semantic-validation errors
    #[error("{type_name} has no property or attribute named '{name}'")]
    UnknownProperty { type_name: String, name: String },
    #[error("property '{name}' of {type_name} is read-only")]
    ReadOnlyProperty { type_name: String, name: String },
    #[error("{type_name} does not declare event '{name}'")]
    UnknownEvent { type_name: String, name: String },
    #[error("handler of event '{name}' on {type_name} must be a plain name")]
    InvalidEventHandler { type_name: String, name: String },
    #[error("{type_name} is not a control and cannot handle event '{name}'")]
    EventForbidden { type_name: String, name: String },
    #[error("{type_name} is not a control and cannot data-bind '{name}'")]
    DataBindingForbidden { type_name: String, name: String },
    #[error("id of {0} must be a literal or an expression")]
    InvalidControlId(String),
    #[error("skin id of {0} must be a literal or an expression")]
    InvalidSkinId(String),

    // Resolution errors
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),
    #[error("unable to resolve include '{0}'")]
    UnresolvedInclude(String),
    #[error("unable to read {path}: {reason}")]
    UnreadableFile { path: String, reason: String },
}

/// A template format error with its corrected `(file, line)` location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {location}")]
pub struct TemplateError {
    pub kind: ErrorKind,
    pub location: SourceLocation,
}

impl TemplateError {
    pub fn new(kind: ErrorKind, location: SourceLocation) -> Self {
        TemplateError { kind, location }
    }

    pub fn line(&self) -> usize {
        self.location.line()
    }
}

/// Error raised inside the parser before its location is remapped.
///
/// `line` is 1-based and relative to the expanded text currently being
/// parsed, without any starting-line offset applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawError {
    pub kind: ErrorKind,
    pub line: usize,
}

impl RawError {
    pub fn new(kind: ErrorKind, line: usize) -> Self {
        RawError { kind, line }
    }
}

/// Failure while expanding a parsed template into live objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiateError {
    #[error("unable to create component {type_name}: {reason}")]
    Create { type_name: String, reason: String },
    #[error("unable to configure '{path}' on {type_name}: {reason}")]
    Property {
        type_name: String,
        path: String,
        reason: String,
    },
    #[error("unable to attach handler '{handler}' to event '{event}' of {type_name}: {reason}")]
    Event {
        type_name: String,
        event: String,
        handler: String,
        reason: String,
    },
    #[error("evaluating '{expression}' failed: {reason}")]
    Expression { expression: String, reason: String },
    #[error("unable to publish asset '{path}': {reason}")]
    Asset { path: String, reason: String },
    #[error("{0} is already borrowed")]
    InUse(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
