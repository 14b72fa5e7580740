//! Include preprocessor
//!
//! Expands `<%include Logical.Path %>` markers in place before tokenizing and
//! records one [`IncludeRecord`] per substitution. A line number in the
//! expanded text is mapped back to its originating file by walking the
//! records from the most recent to the oldest:
//!
//! * a record inserted at or before the line either contains it (the line is
//!   rebased onto the included file and the walk stops), or lies entirely
//!   before it (the lines it added are subtracted);
//! * records after the line are ignored.
//!
//! Markers found inside included text are expanded too, so the same walk
//! also resolves lines of nested includes.

use crate::error::{ErrorKind, RawError};
use crate::parse_util::{count_lines, line_at};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

static INCLUDE_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<%include(.*?)%>").unwrap());

/// Resolves and loads include references.
pub trait IncludeLoader {
    /// Absolute path of an existing file for a logical reference.
    fn resolve(&self, reference: &str) -> Option<PathBuf>;
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// One substitution performed on the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeRecord {
    /// Byte offset of the marker in the text at the time it was replaced.
    pub offset: usize,
    /// 1-based line of that offset.
    pub at_line: usize,
    /// Number of lines the inserted text spans.
    pub line_count: usize,
    pub file: PathBuf,
}

/// Ordered substitution records of one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeMap {
    records: Vec<IncludeRecord>,
}

impl IncludeMap {
    pub fn records(&self) -> &[IncludeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Included files in inclusion order, without repeats.
    pub fn included_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if !files.contains(&record.file) {
                files.push(record.file.clone());
            }
        }
        files
    }

    /// Maps a line of the expanded text back to its origin.
    ///
    /// Returns the included file and the line inside it, or `None` and the
    /// line inside the main text.
    pub fn locate(&self, line: usize) -> (Option<&Path>, usize) {
        let mut line = line;
        for record in self.records.iter().rev() {
            if record.at_line > line {
                continue;
            }
            if line < record.at_line + record.line_count {
                return (Some(&record.file), line - record.at_line + 1);
            }
            line = line - record.line_count + 1;
        }
        (None, line)
    }
}

pub(crate) struct Preprocessor<'a> {
    loader: Option<&'a dyn IncludeLoader>,
    max_depth: usize,
    root_file: Option<PathBuf>,
    map: IncludeMap,
}

impl<'a> Preprocessor<'a> {
    pub fn new(loader: Option<&'a dyn IncludeLoader>, max_depth: usize) -> Self {
        Preprocessor {
            loader,
            max_depth,
            root_file: None,
            map: IncludeMap::default(),
        }
    }

    /// File being expanded; including it again is reported as a cycle.
    pub fn with_root_file(mut self, root_file: Option<PathBuf>) -> Self {
        self.root_file = root_file;
        self
    }

    pub fn map(&self) -> &IncludeMap {
        &self.map
    }

    pub fn into_map(self) -> IncludeMap {
        self.map
    }

    /// Expands every include marker. On failure the records gathered so far
    /// stay available through [`Preprocessor::map`] so the error line can be
    /// remapped.
    pub(crate) fn expand(&mut self, input: &str) -> Result<String, RawError> {
        let mut text = input.to_string();
        let mut cursor = 0;
        // (end offset, file) of included regions still enclosing the cursor,
        // innermost last.
        let mut active: Vec<(usize, PathBuf)> = Vec::new();

        loop {
            let Some(caps) = INCLUDE_REGEXP.captures_at(&text, cursor) else {
                break;
            };
            let (Some(marker), Some(reference)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let offset = marker.start();
            let marker_len = marker.len();
            let reference = reference.as_str().trim().to_string();
            let at_line = line_at(&text, offset);

            while active.last().map_or(false, |(end, _)| *end <= offset) {
                active.pop();
            }

            let unresolved = || RawError::new(ErrorKind::UnresolvedInclude(reference.clone()), at_line);
            let loader = self.loader.ok_or_else(unresolved)?;
            let path = loader.resolve(&reference).ok_or_else(unresolved)?;

            if self.root_file.as_deref() == Some(path.as_path())
                || active.iter().any(|(_, file)| *file == path)
            {
                return Err(RawError::new(
                    ErrorKind::IncludeCycle(path.display().to_string()),
                    at_line,
                ));
            }
            if active.len() >= self.max_depth {
                return Err(RawError::new(ErrorKind::IncludeTooDeep(self.max_depth), at_line));
            }

            let content = loader.load(&path).map_err(|e| {
                RawError::new(
                    ErrorKind::UnreadableFile {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    },
                    at_line,
                )
            })?;

            tracing::trace!(
                reference = %reference,
                file = %path.display(),
                line = at_line,
                "expanding include"
            );

            let inserted = content.len();
            text.replace_range(offset..offset + marker_len, &content);
            for (end, _) in active.iter_mut() {
                *end = *end + inserted - marker_len;
            }
            active.push((offset + inserted, path.clone()));

            self.map.records.push(IncludeRecord {
                offset,
                at_line,
                line_count: count_lines(&content),
                file: path,
            });
            cursor = offset;
        }

        Ok(text)
    }
}
