//! ML Parser Lexer
//!
//! Single forward scan over the (already include-expanded) template text.
//! Only a `<` can start a token, and the few bytes after it decide which form
//! is tried; a candidate that does not complete its form is plain text and
//! scanning resumes one byte later. There is no backtracking across kinds.
//!
//! Forms, in the order they are tried:
//!
//! 1. `<com:Type attr="v" ... [/]>`  component open (or self-closing)
//! 2. `</com:Type>`                  component close
//! 3. `<%@ name="v" ... %>`          directive
//! 4. `<%= %>` `<%% %>` `<%# %>` `<%$ %>` `<%~ %>` `<%/ %>` `<%[ ]%>`  expressions
//! 5. `<prop:Name>`                  property open
//! 6. `</prop:Name>`                 property close
//! 7. `<prop:Name sub="v" ... />`    self-closing property with subattributes
//! 8. `<!-- --!>` / `<!--- --->` (stripped) and `<!-- -->` (literal) comments
//! 9. `<%include Path %>`            include marker

use super::tokens::*;

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    fn scan_at(&self, at: usize) -> Option<Token<'a>> {
        let rest = &self.input[at..];
        if rest.starts_with("<com:") {
            return self.scan_component_open(at);
        }
        if rest.starts_with("</com:") {
            return self.scan_component_close(at);
        }
        if rest.starts_with("<%@") {
            return self.scan_directive(at);
        }
        if rest.starts_with("<%") {
            if let Some(kind) = self.bytes.get(at + 2).and_then(|b| ExpressionKind::from_marker(*b)) {
                return self.scan_expression(at, kind);
            }
        }
        if rest.starts_with("<prop:") {
            return self.scan_property_open(at);
        }
        if rest.starts_with("</prop:") {
            return self.scan_property_close(at);
        }
        if rest.starts_with("<!--") {
            return self.scan_comment(at);
        }
        if rest.starts_with("<%include") {
            return self.scan_include(at);
        }
        None
    }

    fn scan_component_open(&self, at: usize) -> Option<Token<'a>> {
        let name_start = at + "<com:".len();
        let name_end = scan_name(self.bytes, name_start)?;
        let attrs_end = scan_attribute_run(self.input, name_end, true);
        let (end, self_closing) = self.scan_tag_end(attrs_end)?;
        Some(Token::new(
            TokenKind::ComponentOpen {
                type_name: &self.input[name_start..name_end],
                attributes: Span::new(name_end, attrs_end),
                self_closing,
            },
            Span::new(at, end),
        ))
    }

    fn scan_component_close(&self, at: usize) -> Option<Token<'a>> {
        let name_start = at + "</com:".len();
        let name_end = scan_name(self.bytes, name_start)?;
        let close = skip_ws(self.bytes, name_end);
        if self.bytes.get(close) != Some(&b'>') {
            return None;
        }
        Some(Token::new(
            TokenKind::ComponentClose {
                type_name: &self.input[name_start..name_end],
            },
            Span::new(at, close + 1),
        ))
    }

    fn scan_directive(&self, at: usize) -> Option<Token<'a>> {
        let attrs_start = at + "<%@".len();
        let attrs_end = scan_attribute_run(self.input, attrs_start, false);
        let close = skip_ws(self.bytes, attrs_end);
        if !self.input[close..].starts_with("%>") {
            return None;
        }
        Some(Token::new(
            TokenKind::Directive {
                attributes: Span::new(attrs_start, attrs_end),
            },
            Span::new(at, close + 2),
        ))
    }

    fn scan_expression(&self, at: usize, kind: ExpressionKind) -> Option<Token<'a>> {
        let body_start = at + 3;
        let terminator = match kind {
            ExpressionKind::Localization => "]%>",
            _ => "%>",
        };
        let body_end = find_from(self.input, body_start, terminator)?;
        Some(Token::new(
            TokenKind::Expression {
                kind,
                body: Span::new(body_start, body_end),
            },
            Span::new(at, body_end + terminator.len()),
        ))
    }

    fn scan_property_open(&self, at: usize) -> Option<Token<'a>> {
        let name_start = at + "<prop:".len();
        let name_end = scan_name(self.bytes, name_start)?;
        let name = &self.input[name_start..name_end];

        let close = skip_ws(self.bytes, name_end);
        if self.bytes.get(close) == Some(&b'>') {
            return Some(Token::new(
                TokenKind::PropertyOpen { name },
                Span::new(at, close + 1),
            ));
        }

        let attrs_end = scan_attribute_run(self.input, name_end, true);
        match self.scan_tag_end(attrs_end)? {
            (end, true) => Some(Token::new(
                TokenKind::PropertySubattributes {
                    name,
                    attributes: Span::new(name_end, attrs_end),
                },
                Span::new(at, end),
            )),
            (_, false) => None,
        }
    }

    fn scan_property_close(&self, at: usize) -> Option<Token<'a>> {
        let name_start = at + "</prop:".len();
        let name_end = scan_name(self.bytes, name_start)?;
        let close = skip_ws(self.bytes, name_end);
        if self.bytes.get(close) != Some(&b'>') {
            return None;
        }
        Some(Token::new(
            TokenKind::PropertyClose {
                name: &self.input[name_start..name_end],
            },
            Span::new(at, close + 1),
        ))
    }

    fn scan_comment(&self, at: usize) -> Option<Token<'a>> {
        let body = at + "<!--".len();
        let mut candidates: Vec<(usize, CommentKind)> = Vec::with_capacity(3);

        if let Some(i) = find_from(self.input, body, "--!>") {
            candidates.push((i + 4, CommentKind::Stripped));
        }
        if self.input[at..].starts_with("<!---") {
            if let Some(i) = find_from(self.input, at + "<!---".len(), "--->") {
                candidates.push((i + 4, CommentKind::Stripped));
            }
        }
        if let Some(i) = find_from(self.input, body, "-->") {
            candidates.push((i + 3, CommentKind::Literal));
        }

        // Earliest terminator wins; on a tie the stripped form wins.
        let (end, kind) = candidates.into_iter().min_by_key(|(end, kind)| {
            (*end, matches!(kind, CommentKind::Literal))
        })?;
        Some(Token::new(TokenKind::Comment(kind), Span::new(at, end)))
    }

    fn scan_include(&self, at: usize) -> Option<Token<'a>> {
        let start = at + "<%include".len();
        let end = find_from(self.input, start, "%>")?;
        if self.input[start..end].contains('\n') {
            return None;
        }
        Some(Token::new(
            TokenKind::Include {
                reference: Span::new(start, end),
            },
            Span::new(at, end + 2),
        ))
    }

    /// `\s*/>` or `\s*>` after a tag's attributes.
    fn scan_tag_end(&self, pos: usize) -> Option<(usize, bool)> {
        let close = skip_ws(self.bytes, pos);
        if self.input[close..].starts_with("/>") {
            Some((close + 2, true))
        } else if self.bytes.get(close) == Some(&b'>') {
            Some((close + 1, false))
        } else {
            None
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        while self.pos < self.input.len() {
            let at = match self.input[self.pos..].find('<') {
                Some(relative) => self.pos + relative,
                None => {
                    self.pos = self.input.len();
                    return None;
                }
            };
            if let Some(token) = self.scan_at(at) {
                self.pos = token.span.end;
                return Some(token);
            }
            self.pos = at + 1;
        }
        None
    }
}

/// Tokenize a whole input.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// End of a `[\w.]+` run starting at `pos`, if non-empty.
fn scan_name(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut end = pos;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    (end > pos).then_some(end)
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn find_from(input: &str, pos: usize, needle: &str) -> Option<usize> {
    input.get(pos..)?.find(needle).map(|i| pos + i)
}

/// Consumes `name = value` pairs starting at `pos` and returns the offset
/// right after the last complete pair. Values are `'...'`, `"..."` or, when
/// `allow_expressions` is set, an unquoted `<%...%>`.
fn scan_attribute_run(input: &str, pos: usize, allow_expressions: bool) -> usize {
    let bytes = input.as_bytes();
    let mut cur = pos;
    loop {
        let start = skip_ws(bytes, cur);
        let Some(name_end) = scan_name(bytes, start) else {
            return cur;
        };
        let eq = skip_ws(bytes, name_end);
        if bytes.get(eq) != Some(&b'=') {
            return cur;
        }
        let value = skip_ws(bytes, eq + 1);
        let value_end = match bytes.get(value) {
            Some(b'\'') => find_from(input, value + 1, "'").map(|i| i + 1),
            Some(b'"') => find_from(input, value + 1, "\"").map(|i| i + 1),
            Some(b'<') if allow_expressions && bytes.get(value + 1) == Some(&b'%') => {
                find_from(input, value + 2, "%>").map(|i| i + 2)
            }
            _ => None,
        };
        match value_end {
            Some(end) => cur = end,
            None => return cur,
        }
    }
}
