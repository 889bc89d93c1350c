//! XML Entity Decoding
//!
//! Handles the references a catalog export may legally contain:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Anything else is not well-formed without a DTD and is rejected.
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode attribute or text bytes, resolving every entity reference
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
pub fn decode_text(input: &[u8]) -> Result<Cow<'_, [u8]>, &'static str> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;
        let (resolved, len) = reference_at(&input[pos..])?;
        let mut utf8 = [0u8; 4];
        result.extend_from_slice(resolved.encode_utf8(&mut utf8).as_bytes());
        pos += len;
    }
    result.extend_from_slice(&input[pos..]);
    Ok(Cow::Owned(result))
}

/// Validate every entity reference without building decoded output
///
/// Used for character data the scan never surfaces.
pub fn check_references(input: &[u8]) -> Result<(), &'static str> {
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &input[pos..]) {
        pos += amp;
        let (_, len) = reference_at(&input[pos..])?;
        pos += len;
    }
    Ok(())
}

/// Resolve the reference at the start of `input` (which begins with '&')
/// Returns the character and the number of bytes the reference spans
fn reference_at(input: &[u8]) -> Result<(char, usize), &'static str> {
    let semi = memchr(b';', input).ok_or("Unterminated entity reference")?;
    let entity = &input[1..semi];
    let resolved = match entity {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"quot" => '"',
        b"apos" => '\'',
        [b'#', digits @ ..] => decode_numeric(digits)?,
        [] => return Err("Empty entity reference"),
        _ => return Err("Undefined entity reference"),
    };
    Ok((resolved, semi + 1))
}

/// Decode a numeric character reference body (after '#')
fn decode_numeric(digits: &[u8]) -> Result<char, &'static str> {
    let codepoint = match digits {
        [b'x', hex @ ..] if !hex.is_empty() => parse_radix(hex, 16),
        [] => None,
        dec => parse_radix(dec, 10),
    }
    .ok_or("Invalid character reference")?;

    validate_char_ref(codepoint)?;
    char::from_u32(codepoint).ok_or("Invalid character reference")
}

fn parse_radix(digits: &[u8], radix: u32) -> Option<u32> {
    let text = std::str::from_utf8(digits).ok()?;
    if !text.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(text, radix).ok()
}

/// Validate a character reference value against the XML 1.0 Char production
pub fn validate_char_ref(value: u32) -> Result<(), &'static str> {
    // #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
    match value {
        0x9 | 0xA | 0xD => Ok(()),
        0x20..=0xD7FF => Ok(()),
        0xE000..=0xFFFD => Ok(()),
        0x10000..=0x10FFFF => Ok(()),
        _ => Err("Character reference to a non-XML character"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_is_borrowed() {
        let decoded = decode_text(b"Pump housing").unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
    }

    #[test]
    fn test_builtin_entities() {
        let decoded = decode_text(b"Nuts &amp; Bolts &lt;M8&gt;").unwrap();
        assert_eq!(decoded.as_ref(), b"Nuts & Bolts <M8>");
    }

    #[test]
    fn test_numeric_entities() {
        let decoded = decode_text(b"&#65;&#x42;&#xe9;").unwrap();
        assert_eq!(decoded.as_ref(), "ABé".as_bytes());
    }

    #[test]
    fn test_undefined_entity_rejected() {
        assert_eq!(decode_text(b"&nbsp;"), Err("Undefined entity reference"));
    }

    #[test]
    fn test_bare_ampersand_rejected() {
        assert!(decode_text(b"Nuts & Bolts").is_err());
        assert!(check_references(b"Nuts & Bolts").is_err());
    }

    #[test]
    fn test_invalid_char_ref_rejected() {
        assert!(decode_text(b"&#0;").is_err());
        assert!(decode_text(b"&#xZZ;").is_err());
        assert!(decode_text(b"&#;").is_err());
    }

    #[test]
    fn test_check_references_accepts_valid_text() {
        assert!(check_references(b"5 &lt; 6 &#x26; 7 &gt; 3").is_ok());
    }
}
