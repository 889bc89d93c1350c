//! XML Attribute Parsing
//!
//! Parses the attribute region of a start tag (the bytes between the element
//! name and `>` or `/>`) with well-formedness checks.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a [u8],
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Every attribute must be preceded by whitespace, carry `=` and a quoted
/// value, and the value may not contain `<`. Duplicate names are left to the
/// caller, which owns the decoded strings.
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, &'static str> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        let ws_start = pos;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            return Ok(attrs);
        }
        if pos == ws_start {
            return Err("Whitespace required before attribute");
        }

        // Attribute name
        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err("Attribute name must start with letter, underscore, or colon");
        }
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // '=' with optional surrounding whitespace
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err("Attribute value required");
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        // Quoted value
        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err("Attribute value must be quoted"),
        };
        pos += 1;
        let value_start = pos;
        while pos < input.len() && input[pos] != quote {
            if input[pos] == b'<' {
                return Err("Attribute value cannot contain '<'");
            }
            pos += 1;
        }
        if pos >= input.len() {
            return Err("Attribute value has mismatched quotes");
        }
        let value = decode_text(&input[value_start..pos])?;
        pos += 1; // closing quote

        attrs.push(Attribute { name, value });
    }
}
