//! ML Parser Module
//!
//! Markup to [`ast::Template`]: include expansion, tokenizing, attribute
//! classification and tree building.

pub mod ast;
pub mod attributes;
pub mod include;
pub mod lexer;
pub mod parser;
pub mod tokens;

pub use ast::*;
pub use attributes::classify;
pub use include::{IncludeLoader, IncludeMap, IncludeRecord};
pub use lexer::{tokenize, Lexer};
pub use parser::{Parser, TemplateOptions, DEFAULT_MAX_INCLUDE_DEPTH};
pub use tokens::{CommentKind, ExpressionKind, Span, Token, TokenKind};
