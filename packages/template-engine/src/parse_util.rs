//! Parse Utilities
//!
//! Offset and line bookkeeping shared by the include preprocessor, the tree
//! builder and error reporting. Offsets are byte offsets into the text being
//! parsed; lines are 1-based.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of `\n` characters strictly before `offset`.
pub fn newlines_before(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
}

/// 1-based line containing `offset`.
pub fn line_at(source: &str, offset: usize) -> usize {
    newlines_before(source, offset) + 1
}

/// Number of lines a piece of text occupies once inserted.
///
/// An empty string still occupies the line it is inserted on.
pub fn count_lines(text: &str) -> usize {
    newlines_before(text, text.len()) + 1
}

/// Where a template error happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceLocation {
    /// A line inside a template (or included) file.
    File { path: PathBuf, line: usize },
    /// A line inside an inline template that has no backing file; the raw
    /// source is attached so the line can be shown to the user.
    Inline { source: String, line: usize },
}

impl SourceLocation {
    pub fn line(&self) -> usize {
        match self {
            SourceLocation::File { line, .. } | SourceLocation::Inline { line, .. } => *line,
        }
    }

    pub fn file(&self) -> Option<&Path> {
        match self {
            SourceLocation::File { path, .. } => Some(path),
            SourceLocation::Inline { .. } => None,
        }
    }

    /// Text of the offending line, when it can be recovered without I/O.
    pub fn source_line(&self) -> Option<&str> {
        match self {
            SourceLocation::Inline { source, line } => source.lines().nth(line.checked_sub(1)?),
            SourceLocation::File { .. } => None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::File { path, line } => {
                write!(f, "in {} at line {}", path.display(), line)
            }
            SourceLocation::Inline { line, .. } => write!(f, "at line {}", line),
        }
    }
}
