//! ML Parser Tokens
//!
//! Structurally significant tokens of the template markup. Text between two
//! tokens is not a token; the tree builder attributes it to the container
//! that is open at that point.

use serde::{Deserialize, Serialize};

/// Byte range `[start, end)` in the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The character right after `<%` selects the expression flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// `<%= expr %>`: evaluated on every render.
    Expression,
    /// `<%% statements %>`: executable statement block.
    Statements,
    /// `<%# expr %>`: evaluated only on explicit data binding.
    DataBinding,
    /// `<%$ Name %>`: application parameter lookup.
    Parameter,
    /// `<%~ path %>`: asset path relative to the template directory.
    Asset,
    /// `<%/ path %>`: path relative to the site root.
    SitePath,
    /// `<%[ text ]%>`: localized text.
    Localization,
}

impl ExpressionKind {
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'=' => Some(ExpressionKind::Expression),
            b'%' => Some(ExpressionKind::Statements),
            b'#' => Some(ExpressionKind::DataBinding),
            b'$' => Some(ExpressionKind::Parameter),
            b'~' => Some(ExpressionKind::Asset),
            b'/' => Some(ExpressionKind::SitePath),
            b'[' => Some(ExpressionKind::Localization),
            _ => None,
        }
    }

    pub fn marker(&self) -> char {
        match self {
            ExpressionKind::Expression => '=',
            ExpressionKind::Statements => '%',
            ExpressionKind::DataBinding => '#',
            ExpressionKind::Parameter => '$',
            ExpressionKind::Asset => '~',
            ExpressionKind::SitePath => '/',
            ExpressionKind::Localization => '[',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    /// `<!-- ... --!>` or `<!--- ... --->`, removed from the output.
    Stripped,
    /// `<!-- ... -->`, kept as ordinary text.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// `<com:Type attr="v" ...>` or `<com:Type ... />`.
    ComponentOpen {
        type_name: &'a str,
        attributes: Span,
        self_closing: bool,
    },
    /// `</com:Type>`.
    ComponentClose { type_name: &'a str },
    /// `<%@ name="v" ... %>`.
    Directive { attributes: Span },
    /// One of the `<%x ... %>` forms; `body` excludes the delimiters.
    Expression { kind: ExpressionKind, body: Span },
    /// `<prop:Name>`.
    PropertyOpen { name: &'a str },
    /// `</prop:Name>`.
    PropertyClose { name: &'a str },
    /// `<prop:Name sub="v" ... />`.
    PropertySubattributes { name: &'a str, attributes: Span },
    Comment(CommentKind),
    /// `<%include Logical.Path %>`; normally expanded before tokenizing.
    Include { reference: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Token { kind, span }
    }

    /// Short upper-case label, handy when humanizing a token stream.
    pub fn label(&self) -> &'static str {
        match self.kind {
            TokenKind::ComponentOpen { self_closing: true, .. } => "COMPONENT_VOID",
            TokenKind::ComponentOpen { .. } => "COMPONENT_OPEN",
            TokenKind::ComponentClose { .. } => "COMPONENT_CLOSE",
            TokenKind::Directive { .. } => "DIRECTIVE",
            TokenKind::Expression { .. } => "EXPRESSION",
            TokenKind::PropertyOpen { .. } => "PROPERTY_OPEN",
            TokenKind::PropertyClose { .. } => "PROPERTY_CLOSE",
            TokenKind::PropertySubattributes { .. } => "PROPERTY_VOID",
            TokenKind::Comment(CommentKind::Stripped) => "COMMENT_STRIPPED",
            TokenKind::Comment(CommentKind::Literal) => "COMMENT_LITERAL",
            TokenKind::Include { .. } => "INCLUDE",
        }
    }
}
