//! Attribute scanning and value classification
//!
//! A raw attribute value is classified as one of the [`AttrValue`] kinds:
//!
//! 1. text interleaved with `<%= %>` / `<%# %>` spans becomes one
//!    concatenation expression (`DataBinding` if any span used `#`);
//! 2. a value that is exactly one `<%~ %>`, `<%$ %>`, `<%[ ]%>` or `<%/ %>`
//!    span becomes `Asset`, `Parameter`, `Localization` or a site-path
//!    expression;
//! 3. anything else is a `Literal`.
//!
//! Names ending in `template` are never classified here; the tree builder
//! parses their raw text as a nested template instead.

use super::ast::AttrValue;
use once_cell::sync::Lazy;
use regex::Regex;

static ATTRIBUTE_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z0-9_.]+)\s*=\s*('.*?'|".*?"|<%.*?%>)"#).unwrap()
});

static EMBEDDED_EXPRESSION_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<%[#=].*?%>").unwrap());

static WHOLE_SPAN_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\s*(<%~.*?%>|<%\$.*?%>|<%\[.*?\]%>|<%/.*?%>)\s*").unwrap()
});

/// Name of the helper call produced for `<%/ path %>`.
pub const SITE_PATH_HELPER: &str = "site_path";

/// Suffix marking properties whose value is a nested template.
pub const TEMPLATE_SUFFIX: &str = "template";

/// One `name=value` pair from a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    /// Lower-cased name.
    pub name: String,
    /// Value with surrounding quotes removed.
    pub value: &'a str,
    /// Absolute offset of `value` in the scanned input.
    pub offset: usize,
}

/// Splits an attribute run into name/value pairs, in source order.
///
/// `base_offset` is the offset of `text` inside the input so that every
/// value knows where it came from. Duplicates are reported by the caller.
pub fn parse_attributes(text: &str, base_offset: usize) -> Vec<RawAttribute<'_>> {
    ATTRIBUTE_REGEXP
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            let value = caps.get(2)?;
            let raw = value.as_str();
            let (value, offset) = if raw.starts_with('\'') || raw.starts_with('"') {
                (&raw[1..raw.len() - 1], value.start() + 1)
            } else {
                (raw, value.start())
            };
            Some(RawAttribute {
                name: name.as_str().to_ascii_lowercase(),
                value,
                offset: base_offset + offset,
            })
        })
        .collect()
}

/// `true` when a (lower-cased) property name takes a nested template.
pub fn is_template_property(name: &str) -> bool {
    name.ends_with(TEMPLATE_SUFFIX)
}

/// Classifies one raw attribute or property value.
pub fn classify(value: &str) -> AttrValue {
    if let Some(concatenation) = classify_embedded(value) {
        return concatenation;
    }
    if let Some(lookup) = classify_whole_span(value) {
        return lookup;
    }
    AttrValue::Literal(value.to_string())
}

fn classify_embedded(value: &str) -> Option<AttrValue> {
    let mut parts: Vec<String> = Vec::new();
    let mut is_data_binding = false;
    let mut text_start = 0;

    for span in EMBEDDED_EXPRESSION_REGEXP.find_iter(value) {
        let token = span.as_str();
        if token.as_bytes()[2] == b'#' {
            is_data_binding = true;
        }
        if span.start() > text_start {
            parts.push(quote_literal(&value[text_start..span.start()]));
        }
        parts.push(format!("({})", token[3..token.len() - 2].trim()));
        text_start = span.end();
    }

    if parts.is_empty() {
        return None;
    }
    if value.len() > text_start {
        parts.push(quote_literal(&value[text_start..]));
    }

    let expression = parts.join(" . ");
    Some(if is_data_binding {
        AttrValue::DataBinding(expression)
    } else {
        AttrValue::Expression(expression)
    })
}

fn classify_whole_span(value: &str) -> Option<AttrValue> {
    let caps = WHOLE_SPAN_REGEXP.captures(value)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != value.len() {
        return None;
    }
    let span = caps.get(1)?.as_str();
    let classified = match span.as_bytes()[2] {
        b'~' => AttrValue::Asset(span[3..span.len() - 2].trim().to_string()),
        b'$' => AttrValue::Parameter(span[3..span.len() - 2].trim().to_string()),
        b'[' => AttrValue::Localization(span[3..span.len() - 3].trim().to_string()),
        b'/' => AttrValue::Expression(site_path_expression(span[3..span.len() - 2].trim())),
        _ => return None,
    };
    Some(classified)
}

/// Single-quoted literal with `\` and `'` escaped.
pub fn quote_literal(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Expression resolving `path` against the site root.
pub fn site_path_expression(path: &str) -> String {
    format!("{}({})", SITE_PATH_HELPER, quote_literal(path))
}
