//! XML Tokenizer - State machine for XML token extraction
//!
//! Works on one buffered chunk of a larger stream. When a construct runs past
//! the end of the chunk the tokenizer rewinds to the construct start and
//! reports that more input is needed; only on the final chunk does a cut
//! construct become an error.
//!
//! Tokens:
//! - Element start/end tags and empty element tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations

use super::entities::check_references;
use super::scanner::{is_whitespace, Scanner};

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
}

/// A token borrowed from the current chunk
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in the chunk (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name or target
    pub name: Option<&'a [u8]>,
    /// For start/empty tags: the raw attribute region.
    /// For text, CDATA and comments: the content.
    pub content: Option<&'a [u8]>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(content);
        self
    }
}

/// A well-formedness violation, positioned relative to the chunk start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// `Ok(None)` means no complete token is available in this chunk
pub type TokenResult<'a> = Result<Option<Token<'a>>, ParseError>;

/// XML tokenizer implementing a pull-parser pattern over one chunk
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    /// True when no more bytes will follow this chunk
    final_chunk: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8], final_chunk: bool) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            final_chunk,
        }
    }

    /// Bytes consumed by the tokens returned so far
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next complete token
    pub fn next_token(&mut self) -> TokenResult<'a> {
        match self.scanner.peek() {
            None => Ok(None),
            Some(b'<') => self.parse_markup(),
            Some(_) => self.parse_text(),
        }
    }

    /// Rewind to `start` and wait for more input, or fail on the final chunk
    fn incomplete(&mut self, start: usize, construct: &str) -> TokenResult<'a> {
        if self.final_chunk {
            return Err(ParseError::new(
                format!("Unexpected end of input inside {construct}"),
                start,
            ));
        }
        self.scanner.set_position(start);
        Ok(None)
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> TokenResult<'a> {
        let start = self.scanner.position();
        match self.scanner.peek_at(1) {
            None => self.incomplete(start, "markup"),
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(1); // Skip '<'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => {
                return Err(ParseError::new(
                    "Invalid element name: must start with letter, underscore, or colon",
                    start,
                ))
            }
        };
        let name_end = self.scanner.position();

        match self.scanner.peek() {
            None => return self.incomplete(start, "start tag"),
            Some(b) if is_whitespace(b) || b == b'/' || b == b'>' => {}
            Some(_) => return Err(ParseError::new("Invalid character in element name", name_end)),
        }

        // Find the end of the tag, handling quoted attributes
        let end = match self.scanner.find_tag_end_quoted() {
            Some(end) => end,
            None => return self.incomplete(start, "start tag"),
        };

        let is_empty = end > name_end && self.scanner.slice(end - 1, end) == b"/";
        let attrs_end = if is_empty { end - 1 } else { end };
        let attrs = self.scanner.slice(name_end, attrs_end);

        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Some(
            Token::new(kind, (start, end + 1))
                .with_name(name)
                .with_content(attrs),
        ))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(2); // Skip '</'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None if self.scanner.is_eof() => return self.incomplete(start, "end tag"),
            None => {
                return Err(ParseError::new(
                    "Invalid element name in end tag: must start with letter, underscore, or colon",
                    start,
                ))
            }
        };

        // Only whitespace may follow the name
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            None => self.incomplete(start, "end tag"),
            Some(b'>') => {
                self.scanner.advance(1);
                Ok(Some(
                    Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name),
                ))
            }
            Some(_) => Err(ParseError::new(
                "End tag cannot have attributes or other content",
                self.scanner.position(),
            )),
        }
    }

    /// Parse markup starting with '<!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(2); // Skip '<!'

        if self.scanner.starts_with(b"--") {
            return self.parse_comment(start);
        }
        if self.scanner.starts_with(b"[CDATA[") {
            return self.parse_cdata(start);
        }
        if self.scanner.starts_with(b"DOCTYPE") {
            return self.parse_doctype(start);
        }

        // The chunk may have been cut inside one of the keywords
        let rest = self.scanner.remaining();
        let is_prefix = [&b"--"[..], b"[CDATA[", b"DOCTYPE"]
            .iter()
            .any(|keyword| rest.len() < keyword.len() && keyword.starts_with(rest));
        if is_prefix {
            return self.incomplete(start, "markup declaration");
        }

        Err(ParseError::new(
            "Invalid declaration - expected comment, CDATA, or DOCTYPE",
            start,
        ))
    }

    /// Parse a comment <!--...-->
    fn parse_comment(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(2); // Skip '--'
        let content_start = self.scanner.position();

        // The first "--" must be the terminator
        let dashes = match self.scanner.find_sequence(b"--") {
            Some(pos) => pos,
            None => return self.incomplete(start, "comment"),
        };
        self.scanner.set_position(dashes + 2);
        match self.scanner.peek() {
            None => return self.incomplete(start, "comment"),
            Some(b'>') => {}
            Some(_) => return Err(ParseError::new("Comment cannot contain '--'", dashes)),
        }

        let content = self.scanner.slice(content_start, dashes);
        self.scanner.advance(1); // Skip '>'
        Ok(Some(
            Token::new(TokenKind::Comment, (start, self.scanner.position())).with_content(content),
        ))
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn parse_cdata(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(7); // Skip '[CDATA['
        let content_start = self.scanner.position();

        let end = match self.scanner.find_sequence(b"]]>") {
            Some(end) => end,
            None => return self.incomplete(start, "CDATA section"),
        };

        let content = self.scanner.slice(content_start, end);
        self.scanner.set_position(end + 3);
        Ok(Some(
            Token::new(TokenKind::CData, (start, end + 3)).with_content(content),
        ))
    }

    /// Parse a DOCTYPE declaration, skipping any internal subset
    fn parse_doctype(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(7); // Skip 'DOCTYPE'

        match self.scanner.peek() {
            None => return self.incomplete(start, "DOCTYPE"),
            Some(b) if is_whitespace(b) => {}
            Some(_) => {
                return Err(ParseError::new(
                    "Whitespace required after DOCTYPE",
                    self.scanner.position(),
                ))
            }
        }

        let end = match self.scanner.find_doctype_end() {
            Some(end) => end,
            None => return self.incomplete(start, "DOCTYPE"),
        };
        self.scanner.set_position(end + 1);
        Ok(Some(Token::new(TokenKind::DocType, (start, end + 1))))
    }

    /// Parse a processing instruction <?...?>
    fn parse_pi(&mut self, start: usize) -> TokenResult<'a> {
        self.scanner.advance(2); // Skip '<?'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None if self.scanner.is_eof() => {
                return self.incomplete(start, "processing instruction")
            }
            None => {
                return Err(ParseError::new(
                    "Invalid processing instruction target",
                    start,
                ))
            }
        };

        match self.scanner.peek() {
            None => return self.incomplete(start, "processing instruction"),
            Some(b) if is_whitespace(b) || b == b'?' => {}
            Some(_) => {
                return Err(ParseError::new(
                    "Invalid character after PI target name",
                    self.scanner.position(),
                ))
            }
        }

        // Only exact lowercase "xml" is allowed, and only as the declaration
        let is_xml_decl = name == b"xml";
        if !is_xml_decl && name.eq_ignore_ascii_case(b"xml") {
            return Err(ParseError::new(
                "Processing instruction target cannot be 'xml' (case-insensitive reserved name)",
                start,
            ));
        }

        let end = match self.scanner.find_sequence(b"?>") {
            Some(end) => end,
            None => return self.incomplete(start, "processing instruction"),
        };
        self.scanner.set_position(end + 2);

        let kind = if is_xml_decl {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        Ok(Some(Token::new(kind, (start, end + 2)).with_name(name)))
    }

    /// Parse text content up to the next '<'
    fn parse_text(&mut self) -> TokenResult<'a> {
        let start = self.scanner.position();

        let end = match self.scanner.find_tag_start() {
            Some(end) => end,
            // Text can only be trusted complete once the next tag is in view
            None if self.final_chunk => start + self.scanner.remaining().len(),
            None => return self.incomplete(start, "text"),
        };

        let content = self.scanner.slice(start, end);
        if std::str::from_utf8(content).is_err() {
            return Err(ParseError::new("Text content is not valid UTF-8", start));
        }
        if let Err(msg) = validate_text_content(content) {
            return Err(ParseError::new(msg, start));
        }
        if let Err(msg) = check_references(content) {
            return Err(ParseError::new(msg, start));
        }

        self.scanner.set_position(end);
        Ok(Some(Token::new(TokenKind::Text, (start, end)).with_content(content)))
    }
}

/// Validate text content (no ']]>' allowed outside CDATA)
pub fn validate_text_content(content: &[u8]) -> Result<(), &'static str> {
    if memchr::memmem::find(content, b"]]>").is_some() {
        return Err("Text content cannot contain ']]>'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<(TokenKind, Option<Vec<u8>>)> {
        let mut tok = Tokenizer::new(input, true);
        let mut out = Vec::new();
        while let Some(t) = tok.next_token().unwrap() {
            out.push((t.kind, t.name.map(|n| n.to_vec())));
        }
        out
    }

    #[test]
    fn test_simple_element() {
        let mut tok = Tokenizer::new(b"<root>content</root>", true);

        let t1 = tok.next_token().unwrap().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name, Some(b"root" as &[u8]));

        let t2 = tok.next_token().unwrap().unwrap();
        assert_eq!(t2.kind, TokenKind::Text);
        assert_eq!(t2.content, Some(b"content" as &[u8]));

        let t3 = tok.next_token().unwrap().unwrap();
        assert_eq!(t3.kind, TokenKind::EndTag);
        assert_eq!(t3.name, Some(b"root" as &[u8]));

        assert!(tok.next_token().unwrap().is_none());
    }

    #[test]
    fn test_empty_element_with_attributes() {
        let mut tok = Tokenizer::new(b"<item name=\"A/B\"/>", true);
        let t = tok.next_token().unwrap().unwrap();
        assert_eq!(t.kind, TokenKind::EmptyTag);
        assert_eq!(t.name, Some(b"item" as &[u8]));
        assert_eq!(t.content, Some(b" name=\"A/B\"" as &[u8]));
    }

    #[test]
    fn test_cdata() {
        let mut tok = Tokenizer::new(b"<![CDATA[<script>code</script>]]>", true);
        let t = tok.next_token().unwrap().unwrap();
        assert_eq!(t.kind, TokenKind::CData);
        assert_eq!(t.content, Some(b"<script>code</script>" as &[u8]));
    }

    #[test]
    fn test_comment() {
        let mut tok = Tokenizer::new(b"<!-- comment - with dash -->", true);
        let t = tok.next_token().unwrap().unwrap();
        assert_eq!(t.kind, TokenKind::Comment);
        assert_eq!(t.content, Some(b" comment - with dash " as &[u8]));
    }

    #[test]
    fn test_comment_with_double_dash_rejected() {
        let mut tok = Tokenizer::new(b"<!-- a -- b -->", true);
        assert!(tok.next_token().is_err());
    }

    #[test]
    fn test_prolog_tokens() {
        let kinds: Vec<TokenKind> = tokens(
            b"<?xml version=\"1.0\"?><!DOCTYPE export [<!ELEMENT export ANY>]><?pi data?><export/>",
        )
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::DocType,
                TokenKind::ProcessingInstruction,
                TokenKind::EmptyTag,
            ]
        );
    }

    #[test]
    fn test_doctype_subset_comment_with_apostrophe() {
        let got = tokens(b"<!DOCTYPE export [<!-- don't panic -->]><export><items/></export>");
        let kinds: Vec<TokenKind> = got.into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::DocType,
                TokenKind::StartTag,
                TokenKind::EmptyTag,
                TokenKind::EndTag,
            ]
        );
    }

    #[test]
    fn test_doctype_subset_comment_and_pi_hide_delimiters() {
        let got = tokens(b"<!DOCTYPE export [<!-- see ]> below --><?pi \"x' ?>]><export/>");
        assert_eq!(
            got,
            vec![
                (TokenKind::DocType, None),
                (TokenKind::EmptyTag, Some(b"export".to_vec())),
            ]
        );
    }

    #[test]
    fn test_doctype_cut_inside_subset_comment_waits() {
        let mut tok = Tokenizer::new(b"<!DOCTYPE export [<!-- see ]> be", false);
        assert!(tok.next_token().unwrap().is_none());
        assert_eq!(tok.position(), 0);
    }

    #[test]
    fn test_incomplete_tag_waits_for_more_input() {
        let mut tok = Tokenizer::new(b"<items><item name=\"Pu", false);
        assert_eq!(tok.next_token().unwrap().unwrap().kind, TokenKind::StartTag);
        assert!(tok.next_token().unwrap().is_none());
        assert_eq!(tok.position(), 7);
    }

    #[test]
    fn test_incomplete_tag_on_final_chunk_fails() {
        let mut tok = Tokenizer::new(b"<item name=\"Pu", true);
        let err = tok.next_token().unwrap_err();
        assert!(err.message.contains("Unexpected end of input"));
    }

    #[test]
    fn test_trailing_text_waits_unless_final() {
        let mut tok = Tokenizer::new(b"abc", false);
        assert!(tok.next_token().unwrap().is_none());
        let mut tok = Tokenizer::new(b"abc", true);
        assert_eq!(tok.next_token().unwrap().unwrap().kind, TokenKind::Text);
    }

    #[test]
    fn test_cut_keyword_waits() {
        let mut tok = Tokenizer::new(b"<![CDA", false);
        assert!(tok.next_token().unwrap().is_none());
        assert_eq!(tok.position(), 0);
        let mut tok = Tokenizer::new(b"<!-", false);
        assert!(tok.next_token().unwrap().is_none());
    }

    #[test]
    fn test_end_tag_with_attributes_rejected() {
        let mut tok = Tokenizer::new(b"</item name=\"x\">", true);
        assert!(tok.next_token().is_err());
    }

    #[test]
    fn test_text_with_bare_ampersand_rejected() {
        let mut tok = Tokenizer::new(b"Nuts & Bolts<a/>", true);
        assert!(tok.next_token().is_err());
    }

    #[test]
    fn test_reserved_pi_target_rejected() {
        let mut tok = Tokenizer::new(b"<?XML version=\"1.0\"?>", true);
        assert!(tok.next_token().is_err());
    }
}
