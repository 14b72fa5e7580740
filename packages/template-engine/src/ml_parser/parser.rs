//! ML Parser
//!
//! Tree builder over the token stream. Pending literal text, expression
//! fragments and components are collected into a flat item list; open tags
//! live on an explicit frame stack, and the item index of the innermost open
//! component is the container of everything emitted after it.
//!
//! A block property tag switches the builder into "awaiting" mode: every
//! token up to the matching `</prop:...>` is skipped (property tags still
//! nest) and the raw text in between becomes the property value. Stripped
//! comments are rejected inside that text.
//!
//! A final pass folds consecutive text and expression fragments of the same
//! container into single text nodes.

use super::ast::*;
use super::attributes::{classify, is_template_property, parse_attributes, site_path_expression};
use super::include::{IncludeLoader, IncludeMap, Preprocessor};
use super::lexer::Lexer;
use super::tokens::*;
use crate::error::{ErrorKind, RawError, TemplateError};
use crate::parse_util::{line_at, newlines_before, SourceLocation};
use crate::schema::{resolve_type, validate_attribute, ComponentDescriptor, ComponentRegistry};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default bound on include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 16;

/// Where a piece of markup comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Directory relative asset references resolve against.
    pub context_path: PathBuf,
    pub source_file: Option<PathBuf>,
    /// Lines preceding the markup in its source.
    pub starting_line: usize,
    pub is_source_template: bool,
    pub max_include_depth: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions {
            context_path: PathBuf::from("."),
            source_file: None,
            starting_line: 0,
            is_source_template: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl TemplateOptions {
    /// Markup with no backing file.
    pub fn inline(context_path: impl Into<PathBuf>) -> Self {
        TemplateOptions {
            context_path: context_path.into(),
            ..Default::default()
        }
    }

    /// Markup read from `path`; its directory becomes the context path.
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let context_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        TemplateOptions {
            context_path,
            source_file: Some(path),
            ..Default::default()
        }
    }

    pub fn with_starting_line(mut self, starting_line: usize) -> Self {
        self.starting_line = starting_line;
        self
    }

    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }
}

/// Turns markup into an immutable [`Template`].
pub struct Parser<'a> {
    registry: &'a dyn ComponentRegistry,
    loader: Option<&'a dyn IncludeLoader>,
}

impl<'a> Parser<'a> {
    pub fn new(registry: &'a dyn ComponentRegistry) -> Self {
        Parser {
            registry,
            loader: None,
        }
    }

    /// Without a loader every include marker is an unresolved include.
    pub fn with_include_loader(mut self, loader: &'a dyn IncludeLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn parse(&self, source: &str, options: &TemplateOptions) -> Result<Template, TemplateError> {
        let mut preprocessor = Preprocessor::new(self.loader, options.max_include_depth)
            .with_root_file(options.source_file.clone());
        let expanded = match preprocessor.expand(source) {
            Ok(expanded) => expanded,
            Err(error) => return Err(locate_error(error, preprocessor.map(), source, options)),
        };
        let map = preprocessor.into_map();

        let scope = Scope {
            context_path: &options.context_path,
            source_file: options.source_file.as_deref(),
            starting_line: options.starting_line,
            is_source_template: options.is_source_template,
            includes: &map,
            base_line: options.starting_line,
            expanded_line: 0,
        };
        let mut template = self
            .build(&expanded, &scope)
            .map_err(|error| locate_error(error, &map, source, options))?;
        template.hash = content_hash(source);
        template.included_files = map.included_files();

        tracing::debug!(
            nodes = template.nodes.len(),
            hash = %template.hash,
            includes = template.included_files.len(),
            "parsed template"
        );
        Ok(template)
    }

    fn build(&self, input: &str, scope: &Scope<'_>) -> Result<Template, RawError> {
        let mut builder = TreeBuilder::new(self, input, scope);
        for token in Lexer::new(input) {
            builder.consume(token)?;
        }
        builder.finish()
    }

    /// Parses a property body as a standalone template. Error lines come back
    /// relative to `input`.
    fn build_nested(
        &self,
        input: &str,
        body: &str,
        body_offset: usize,
        scope: &Scope<'_>,
    ) -> Result<Arc<Template>, RawError> {
        let lines_before = newlines_before(input, body_offset);
        let expanded_line = scope.expanded_line + lines_before;
        let (source_file, starting_line) = match scope.includes.locate(expanded_line + 1) {
            (Some(included), line) => (Some(included), line - 1),
            (None, line) => (scope.source_file, scope.base_line + line - 1),
        };
        tracing::trace!(line = starting_line + 1, "parsing nested template");
        let nested_scope = Scope {
            source_file,
            starting_line,
            is_source_template: false,
            expanded_line,
            ..*scope
        };
        self.build(body, &nested_scope)
            .map(Arc::new)
            .map_err(|error| RawError::new(error.kind, error.line + lines_before))
    }
}

/// Converts a raw error line into a file/line pair through the include map.
fn locate_error(
    error: RawError,
    map: &IncludeMap,
    source: &str,
    options: &TemplateOptions,
) -> TemplateError {
    let (included, line) = map.locate(error.line);
    let location = match (included, &options.source_file) {
        (Some(file), _) => SourceLocation::File {
            path: file.to_path_buf(),
            line,
        },
        (None, Some(path)) => SourceLocation::File {
            path: path.clone(),
            line: options.starting_line + line,
        },
        (None, None) => SourceLocation::Inline {
            source: source.to_string(),
            line: options.starting_line + line,
        },
    };
    TemplateError::new(error.kind, location)
}

fn content_hash(text: &str) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(text.as_bytes()))
}

#[derive(Clone, Copy)]
struct Scope<'s> {
    context_path: &'s Path,
    source_file: Option<&'s Path>,
    starting_line: usize,
    is_source_template: bool,
    includes: &'s IncludeMap,
    /// Starting line of the top-level markup.
    base_line: usize,
    /// Lines of the include-expanded top-level text preceding this input.
    expanded_line: usize,
}

enum Item {
    Text {
        container: Container,
        fragment: Fragment,
    },
    Component {
        container: Container,
        type_name: String,
        attributes: IndexMap<String, AttrValue>,
        descriptor: Arc<dyn ComponentDescriptor>,
    },
}

enum Frame<'i> {
    Component {
        type_name: &'i str,
        prior: Container,
        offset: usize,
    },
    /// Lower-cased property name of a block property tag.
    Property { name: String, offset: usize },
}

impl Frame<'_> {
    fn closing_tag(&self) -> String {
        match self {
            Frame::Component { type_name, .. } => format!("</com:{}>", type_name),
            Frame::Property { name, .. } => format!("</prop:{}>", name),
        }
    }

    fn offset(&self) -> usize {
        match self {
            Frame::Component { offset, .. } | Frame::Property { offset, .. } => *offset,
        }
    }
}

struct TreeBuilder<'p, 'i, 's> {
    parser: &'p Parser<'p>,
    input: &'i str,
    scope: &'s Scope<'s>,
    items: Vec<Item>,
    stack: Vec<Frame<'i>>,
    container: Container,
    directive: Option<IndexMap<String, AttrValue>>,
    /// Start of text not yet attributed to any item.
    text_start: usize,
}

impl<'p, 'i, 's> TreeBuilder<'p, 'i, 's> {
    fn new(parser: &'p Parser<'p>, input: &'i str, scope: &'s Scope<'s>) -> Self {
        TreeBuilder {
            parser,
            input,
            scope,
            items: Vec::new(),
            stack: Vec::new(),
            container: Container::Root,
            directive: None,
            text_start: 0,
        }
    }

    fn awaiting_property(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Property { .. }))
    }

    fn error(&self, kind: ErrorKind, offset: usize) -> RawError {
        RawError::new(kind, line_at(self.input, offset))
    }

    fn consume(&mut self, token: Token<'i>) -> Result<(), RawError> {
        let awaiting = self.awaiting_property();
        match token.kind {
            TokenKind::PropertyOpen { name } => self.open_property(name, token.span),
            TokenKind::PropertyClose { name } => self.close_property(name, token.span),
            TokenKind::Comment(CommentKind::Stripped) if awaiting => {
                Err(self.error(ErrorKind::CommentForbidden, token.span.start))
            }
            // Literal comments are ordinary text.
            TokenKind::Comment(CommentKind::Literal) => Ok(()),
            _ if awaiting => Ok(()),
            TokenKind::ComponentOpen {
                type_name,
                attributes,
                self_closing,
            } => self.open_component(type_name, attributes, self_closing, token.span),
            TokenKind::ComponentClose { type_name } => self.close_component(type_name, token.span),
            TokenKind::Directive { attributes } => self.directive(attributes, token.span),
            TokenKind::Expression { kind, body } => {
                self.flush_text(token.span);
                let body = body.slice(self.input).trim();
                let fragment = match kind {
                    ExpressionKind::Expression => Fragment::Expression(body.to_string()),
                    ExpressionKind::Statements => Fragment::Statements(body.to_string()),
                    ExpressionKind::DataBinding => Fragment::DataBinding(body.to_string()),
                    ExpressionKind::Parameter => Fragment::Parameter(body.to_string()),
                    ExpressionKind::Asset => Fragment::Asset(body.to_string()),
                    ExpressionKind::SitePath => Fragment::Expression(site_path_expression(body)),
                    ExpressionKind::Localization => Fragment::Localization(body.to_string()),
                };
                self.items.push(Item::Text {
                    container: self.container,
                    fragment,
                });
                Ok(())
            }
            TokenKind::PropertySubattributes { name, attributes } => {
                self.flush_text(token.span);
                self.subproperties(name, attributes, token.span)
            }
            TokenKind::Comment(CommentKind::Stripped) => {
                self.flush_text(token.span);
                Ok(())
            }
            // Markers are expanded or rejected before tokenizing; kept as a safety net.
            TokenKind::Include { reference } => Err(self.error(
                ErrorKind::UnresolvedInclude(reference.slice(self.input).trim().to_string()),
                token.span.start,
            )),
        }
    }

    /// Emits the text before `token` and skips past the token.
    fn flush_text(&mut self, token: Span) {
        if token.start > self.text_start {
            self.items.push(Item::Text {
                container: self.container,
                fragment: Fragment::Text(self.input[self.text_start..token.start].to_string()),
            });
        }
        self.text_start = token.end;
    }

    fn open_component(
        &mut self,
        type_name: &'i str,
        attributes: Span,
        self_closing: bool,
        span: Span,
    ) -> Result<(), RawError> {
        self.flush_text(span);
        let descriptor = resolve_type(self.parser.registry, type_name)
            .map_err(|kind| self.error(kind, span.start))?;
        let attributes = self.attribute_map(attributes, None)?;
        for (name, value) in &attributes {
            validate_attribute(type_name, descriptor.as_ref(), name, value)
                .map_err(|kind| self.error(kind, span.start))?;
        }

        self.items.push(Item::Component {
            container: self.container,
            type_name: type_name.to_string(),
            attributes,
            descriptor,
        });
        if !self_closing {
            self.stack.push(Frame::Component {
                type_name,
                prior: self.container,
                offset: span.start,
            });
            self.container = Container::Node(self.items.len() - 1);
        }
        Ok(())
    }

    fn close_component(&mut self, type_name: &'i str, span: Span) -> Result<(), RawError> {
        self.flush_text(span);
        match self.stack.pop() {
            None => Err(self.error(
                ErrorKind::UnexpectedClosingTag(format!("</com:{}>", type_name)),
                span.start,
            )),
            Some(Frame::Component { type_name: open, prior, .. }) if open == type_name => {
                self.container = prior;
                Ok(())
            }
            Some(frame) => Err(self.error(ErrorKind::ExpectedClosingTag(frame.closing_tag()), span.start)),
        }
    }

    fn directive(&mut self, attributes: Span, span: Span) -> Result<(), RawError> {
        self.flush_text(span);
        if !self.items.is_empty() || self.directive.is_some() {
            return Err(self.error(ErrorKind::DirectiveNotUnique, span.start));
        }
        let attributes = self.attribute_map(attributes, None)?;
        self.directive = Some(attributes);
        Ok(())
    }

    fn open_property(&mut self, name: &'i str, span: Span) -> Result<(), RawError> {
        if !self.awaiting_property() {
            self.flush_text(span);
        }
        self.stack.push(Frame::Property {
            name: name.to_ascii_lowercase(),
            offset: span.start,
        });
        Ok(())
    }

    fn close_property(&mut self, name: &'i str, span: Span) -> Result<(), RawError> {
        let name = name.to_ascii_lowercase();
        match self.stack.pop() {
            None => {
                return Err(self.error(
                    ErrorKind::UnexpectedClosingTag(format!("</prop:{}>", name)),
                    span.start,
                ))
            }
            Some(Frame::Property { name: open, .. }) if open == name => {}
            Some(frame) => {
                return Err(self.error(ErrorKind::ExpectedClosingTag(frame.closing_tag()), span.start))
            }
        }
        if self.awaiting_property() {
            // closed a property tag nested in another property's body
            return Ok(());
        }

        let body_start = self.text_start;
        self.text_start = span.end;
        if span.start <= body_start {
            return Ok(());
        }
        let body = &self.input[body_start..span.start];
        let value = if is_template_property(&name) {
            AttrValue::NestedTemplate(self.parser.build_nested(self.input, body, body_start, self.scope)?)
        } else {
            classify(body)
        };
        self.assign(name, value, span.start)
    }

    fn subproperties(&mut self, name: &'i str, attributes: Span, span: Span) -> Result<(), RawError> {
        let prefix = name.to_ascii_lowercase();
        let attributes = self.attribute_map(attributes, Some(&prefix))?;
        for (name, value) in attributes {
            self.assign(name, value, span.start)?;
        }
        Ok(())
    }

    /// Stores a property value on the current component, or on the template
    /// owner when no component is open.
    fn assign(&mut self, name: String, value: AttrValue, offset: usize) -> Result<(), RawError> {
        let target = match self.container {
            Container::Root => self.directive.get_or_insert_with(IndexMap::new),
            Container::Node(index) => match &mut self.items[index] {
                Item::Component {
                    type_name,
                    attributes,
                    descriptor,
                    ..
                } => {
                    if let Err(kind) = validate_attribute(type_name, descriptor.as_ref(), &name, &value) {
                        return Err(RawError::new(kind, line_at(self.input, offset)));
                    }
                    attributes
                }
                Item::Text { .. } => self.directive.get_or_insert_with(IndexMap::new),
            },
        };
        if target.contains_key(&name) {
            return Err(RawError::new(
                ErrorKind::DuplicateProperty(name),
                line_at(self.input, offset),
            ));
        }
        target.insert(name, value);
        Ok(())
    }

    /// Parses an inline attribute run, classifying every value. Names are
    /// prefixed with `prefix.` when given.
    fn attribute_map(
        &self,
        span: Span,
        prefix: Option<&str>,
    ) -> Result<IndexMap<String, AttrValue>, RawError> {
        let mut map = IndexMap::new();
        for attribute in parse_attributes(span.slice(self.input), span.start) {
            let name = match prefix {
                Some(prefix) => format!("{}.{}", prefix, attribute.name),
                None => attribute.name,
            };
            if map.contains_key(&name) {
                return Err(self.error(ErrorKind::DuplicateProperty(name), attribute.offset));
            }
            let value = if is_template_property(&name) {
                AttrValue::NestedTemplate(self.parser.build_nested(
                    self.input,
                    attribute.value,
                    attribute.offset,
                    self.scope,
                )?)
            } else {
                classify(attribute.value)
            };
            map.insert(name, value);
        }
        Ok(map)
    }

    fn finish(mut self) -> Result<Template, RawError> {
        if let Some(frame) = self.stack.last() {
            return Err(self.error(ErrorKind::ExpectedClosingTag(frame.closing_tag()), frame.offset()));
        }
        if self.text_start < self.input.len() {
            self.items.push(Item::Text {
                container: self.container,
                fragment: Fragment::Text(self.input[self.text_start..].to_string()),
            });
        }

        Ok(Template {
            nodes: merge_items(self.items),
            directive: self.directive,
            context_path: self.scope.context_path.to_path_buf(),
            source_file: self.scope.source_file.map(Path::to_path_buf),
            starting_line: self.scope.starting_line,
            is_source_template: self.scope.is_source_template,
            hash: content_hash(self.input),
            included_files: Vec::new(),
        })
    }
}

/// Folds runs of text fragments sharing a container into single nodes and
/// renumbers containers accordingly.
fn merge_items(items: Vec<Item>) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::with_capacity(items.len());
    let mut renumbered: Vec<NodeIndex> = vec![0; items.len()];
    let mut run: Option<(Container, Vec<Fragment>)> = None;

    let renumber = |container: Container, renumbered: &[NodeIndex]| match container {
        Container::Root => Container::Root,
        Container::Node(index) => Container::Node(renumbered[index]),
    };

    for (index, item) in items.into_iter().enumerate() {
        match item {
            Item::Text { container, fragment } => {
                let container = renumber(container, &renumbered);
                if let Some((run_container, fragments)) = run.as_mut() {
                    if *run_container == container {
                        fragments.push(fragment);
                        continue;
                    }
                }
                push_run(&mut nodes, run.take());
                run = Some((container, vec![fragment]));
            }
            Item::Component {
                container,
                type_name,
                attributes,
                ..
            } => {
                push_run(&mut nodes, run.take());
                renumbered[index] = nodes.len();
                nodes.push(Node::Component {
                    container: renumber(container, &renumbered),
                    type_name,
                    attributes,
                });
            }
        }
    }
    push_run(&mut nodes, run);
    nodes
}

fn push_run(nodes: &mut Vec<Node>, run: Option<(Container, Vec<Fragment>)>) {
    let Some((container, fragments)) = run else {
        return;
    };
    let composite = CompositeLiteral::new(fragments);
    let literal = match composite.fragments() {
        [Fragment::Text(text)] => Some(text.clone()),
        _ => None,
    };
    let content = match literal {
        Some(text) => TextContent::Literal(text),
        None => TextContent::Composite(composite),
    };
    nodes.push(Node::Text { container, content });
}
