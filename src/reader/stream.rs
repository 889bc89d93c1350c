//! Streaming XML Reader
//!
//! Pulls element events from any `Read` source through a bounded read-ahead
//! buffer. Only the current token is ever held; everything before it has
//! been consumed. Document-level well-formedness (single root, prolog and
//! epilog rules) is enforced here, tag-name matching is left to whoever
//! tracks the open-element path.

use std::io::{self, Read};

use log::debug;

use super::buffered::BufferedReader;
use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::parse_attributes;
use crate::core::encoding::{DecodedInput, XmlEncoding};
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::error::{CatalogError, Result};

/// Pull reader producing owned element events
pub struct StreamReader<R: Read> {
    input: BufferedReader<DecodedInput<R>>,
    state: DocumentState,
    /// Offset of the first buffered byte in the (UTF-8) stream
    offset: u64,
    /// Label used in SourceUnavailable errors
    origin: String,
    failed: bool,
}

impl<R: Read> StreamReader<R> {
    /// Wrap a byte source. Reads the first bytes to detect the encoding.
    pub fn new(reader: R, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let decoded =
            DecodedInput::sniff(reader).map_err(|e| CatalogError::unavailable(origin.clone(), e))?;
        if decoded.encoding() != XmlEncoding::Utf8 {
            debug!("transcoding {origin} from {:?}", decoded.encoding());
        }
        Ok(StreamReader {
            input: BufferedReader::new(decoded),
            state: DocumentState::default(),
            offset: 0,
            origin,
            failed: false,
        })
    }

    /// Pull the next element event, or `None` once the document is complete
    pub fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        loop {
            let final_chunk = self.input.reached_eof();
            let mut tokenizer = Tokenizer::new(self.input.buffered(), final_chunk);

            let token = match tokenizer.next_token() {
                Ok(token) => token,
                Err(e) => {
                    return Err(CatalogError::malformed(
                        e.message,
                        self.offset + e.position as u64,
                    ))
                }
            };

            match token {
                Some(token) => {
                    let at = self.offset + token.span.0 as u64;
                    let event = self
                        .state
                        .accept(&token)
                        .map_err(|message| CatalogError::malformed(message, at))?;
                    let consumed = tokenizer.position();
                    self.input.consume(consumed);
                    self.offset += consumed as u64;
                    if let Some(event) = event {
                        return Ok(Some(event));
                    }
                }
                None if final_chunk => {
                    self.state
                        .finish()
                        .map_err(|message| CatalogError::malformed(message, self.offset))?;
                    return Ok(None);
                }
                None => {
                    if let Err(e) = self.input.fill_buffer() {
                        return Err(self.read_error(e));
                    }
                }
            }
        }
    }

    fn read_error(&self, e: io::Error) -> CatalogError {
        // Transcoding failures surface as InvalidData from the decoder
        if e.kind() == io::ErrorKind::InvalidData {
            CatalogError::malformed(e.to_string(), self.offset + self.input.buffered().len() as u64)
        } else {
            CatalogError::unavailable(self.origin.clone(), e)
        }
    }

    /// Bytes of the document consumed by returned events
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes pulled from the source so far (read-ahead included)
    pub fn bytes_read(&self) -> u64 {
        self.input.bytes_read()
    }

    /// Size of the read-ahead buffer; grows only for oversized constructs
    pub fn buffer_capacity(&self) -> usize {
        self.input.capacity()
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.state.depth
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl<R: Read> Iterator for StreamReader<R> {
    type Item = Result<XmlEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_event() {
            Ok(event) => event.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Document-level structure seen so far
#[derive(Debug, Default)]
struct DocumentState {
    depth: usize,
    root_seen: bool,
    root_closed: bool,
    doctype_seen: bool,
    any_token: bool,
}

impl DocumentState {
    /// Validate a token against the document structure and turn element
    /// tokens into events
    fn accept(&mut self, token: &Token<'_>) -> std::result::Result<Option<XmlEvent>, String> {
        let first = !self.any_token;
        self.any_token = true;

        match token.kind {
            TokenKind::XmlDeclaration => {
                if !first {
                    return Err("XML declaration allowed only at the start of the document".into());
                }
                Ok(None)
            }
            TokenKind::DocType => {
                if self.root_seen {
                    return Err("DOCTYPE must precede the root element".into());
                }
                if self.doctype_seen {
                    return Err("Duplicate DOCTYPE declaration".into());
                }
                self.doctype_seen = true;
                Ok(None)
            }
            TokenKind::Comment | TokenKind::ProcessingInstruction => Ok(None),
            TokenKind::Text => {
                let content = token.content.unwrap_or_default();
                if self.depth == 0 && !content.iter().all(|&b| is_whitespace(b)) {
                    return Err("Text outside the root element".into());
                }
                Ok(None)
            }
            TokenKind::CData => {
                if self.depth == 0 {
                    return Err("CDATA outside the root element".into());
                }
                Ok(None)
            }
            TokenKind::StartTag | TokenKind::EmptyTag => {
                if self.root_closed {
                    return Err("Content after the root element".into());
                }
                let element = start_element(token)?;
                self.root_seen = true;
                if token.kind == TokenKind::StartTag {
                    self.depth += 1;
                    Ok(Some(XmlEvent::StartElement(element)))
                } else {
                    if self.depth == 0 {
                        self.root_closed = true;
                    }
                    Ok(Some(XmlEvent::EmptyElement(element)))
                }
            }
            TokenKind::EndTag => {
                if self.depth == 0 {
                    return Err("End tag without a matching start tag".into());
                }
                self.depth -= 1;
                if self.depth == 0 {
                    self.root_closed = true;
                }
                Ok(Some(XmlEvent::EndElement(EndElement::new(name_of(token)?))))
            }
        }
    }

    fn finish(&self) -> std::result::Result<(), String> {
        if !self.root_seen {
            return Err("No root element".into());
        }
        if self.depth > 0 {
            return Err(format!("{} unclosed element(s) at end of input", self.depth));
        }
        Ok(())
    }
}

fn name_of(token: &Token<'_>) -> std::result::Result<String, String> {
    let name = token.name.unwrap_or_default();
    std::str::from_utf8(name)
        .map(str::to_owned)
        .map_err(|_| "Element name is not valid UTF-8".to_string())
}

fn start_element(token: &Token<'_>) -> std::result::Result<StartElement, String> {
    let name = name_of(token)?;
    let parsed = parse_attributes(token.content.unwrap_or_default()).map_err(str::to_string)?;

    let mut attributes: Vec<(String, String)> = Vec::with_capacity(parsed.len());
    for attr in parsed {
        let key = attr
            .name_str()
            .ok_or("Attribute name is not valid UTF-8")?
            .to_owned();
        if attributes.iter().any(|(existing, _)| *existing == key) {
            return Err(format!("Duplicate attribute '{key}' on <{name}>"));
        }
        let value = attr
            .value_str()
            .ok_or("Attribute value is not valid UTF-8")?
            .to_owned();
        attributes.push((key, value));
    }

    Ok(StartElement::new(name, attributes))
}
