//! XML Encoding Detection and Conversion
//!
//! Detects UTF-16 input from its byte order mark or byte pattern and
//! transcodes it to UTF-8 while streaming, so the tokenizer only ever sees
//! UTF-8.

use std::io::{self, Cursor, Read};

/// Encoding of the raw byte source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl XmlEncoding {
    /// Detect encoding from the leading bytes.
    /// Returns the encoding and the length of the byte order mark to drop.
    pub fn detect(input: &[u8]) -> (Self, usize) {
        match input {
            // UTF-8 BOM: 0xEF 0xBB 0xBF
            [0xEF, 0xBB, 0xBF, ..] => (XmlEncoding::Utf8, 3),
            // UTF-16 LE BOM: 0xFF 0xFE
            [0xFF, 0xFE, ..] => (XmlEncoding::Utf16Le, 2),
            // UTF-16 BE BOM: 0xFE 0xFF
            [0xFE, 0xFF, ..] => (XmlEncoding::Utf16Be, 2),
            // No BOM - '<' next to a null byte
            [b'<', 0x00, ..] => (XmlEncoding::Utf16Le, 0),
            [0x00, b'<', ..] => (XmlEncoding::Utf16Be, 0),
            _ => (XmlEncoding::Utf8, 0),
        }
    }
}

/// A byte source normalized to UTF-8
pub enum DecodedInput<R: Read> {
    Utf8(io::Chain<Cursor<Vec<u8>>, R>),
    Utf16(Utf16Reader<io::Chain<Cursor<Vec<u8>>, R>>),
}

impl<R: Read> DecodedInput<R> {
    /// Sniff the first bytes of `reader` and wrap it accordingly.
    /// The sniffed bytes (minus any BOM) are replayed ahead of the rest.
    pub fn sniff(mut reader: R) -> io::Result<Self> {
        let mut head = [0u8; 4];
        let mut filled = 0;
        while filled < head.len() {
            match reader.read(&mut head[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let (encoding, bom) = XmlEncoding::detect(&head[..filled]);
        let replay = Cursor::new(head[bom..filled].to_vec()).chain(reader);
        Ok(match encoding {
            XmlEncoding::Utf8 => DecodedInput::Utf8(replay),
            XmlEncoding::Utf16Le => DecodedInput::Utf16(Utf16Reader::new(replay, true)),
            XmlEncoding::Utf16Be => DecodedInput::Utf16(Utf16Reader::new(replay, false)),
        })
    }

    pub fn encoding(&self) -> XmlEncoding {
        match self {
            DecodedInput::Utf8(_) => XmlEncoding::Utf8,
            DecodedInput::Utf16(r) if r.little_endian => XmlEncoding::Utf16Le,
            DecodedInput::Utf16(_) => XmlEncoding::Utf16Be,
        }
    }
}

impl<R: Read> Read for DecodedInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DecodedInput::Utf8(r) => r.read(buf),
            DecodedInput::Utf16(r) => r.read(buf),
        }
    }
}

/// Streaming UTF-16 to UTF-8 transcoder
///
/// Keeps an odd trailing byte and an unpaired high surrogate between reads,
/// so code units split across read boundaries decode correctly.
pub struct Utf16Reader<R: Read> {
    inner: R,
    little_endian: bool,
    /// Raw bytes not yet decoded
    raw: Vec<u8>,
    /// Decoded UTF-8 not yet handed out
    decoded: Vec<u8>,
    pos: usize,
    eof: bool,
}

const RAW_CHUNK: usize = 4096;

impl<R: Read> Utf16Reader<R> {
    pub fn new(inner: R, little_endian: bool) -> Self {
        Utf16Reader {
            inner,
            little_endian,
            raw: Vec::with_capacity(RAW_CHUNK + 4),
            decoded: Vec::with_capacity(RAW_CHUNK * 2),
            pos: 0,
            eof: false,
        }
    }

    /// Decode all complete code units held in `raw`
    fn decode_available(&mut self) -> io::Result<()> {
        let mut units: Vec<u16> = self
            .raw
            .chunks_exact(2)
            .map(|pair| {
                if self.little_endian {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            })
            .collect();

        // Hold back a trailing high surrogate until its partner arrives
        let mut keep = self.raw.len() % 2;
        if !self.eof && units.last().is_some_and(|u| (0xD800..0xDC00).contains(u)) {
            units.pop();
            keep += 2;
        }

        for c in char::decode_utf16(units) {
            let c = c.map_err(|_| invalid_data("Invalid UTF-16: unpaired surrogate"))?;
            let mut utf8 = [0u8; 4];
            self.decoded
                .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        }

        let consumed = self.raw.len() - keep;
        self.raw.drain(..consumed);
        Ok(())
    }
}

impl<R: Read> Read for Utf16Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.decoded.len() {
                let n = buf.len().min(self.decoded.len() - self.pos);
                buf[..n].copy_from_slice(&self.decoded[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            self.decoded.clear();
            self.pos = 0;

            if self.eof {
                if !self.raw.is_empty() {
                    return Err(invalid_data("Invalid UTF-16: truncated code unit"));
                }
                return Ok(0);
            }

            let mut chunk = [0u8; RAW_CHUNK];
            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.raw.extend_from_slice(&chunk[..n]);
            }
            self.decode_available()?;
        }
    }
}

fn invalid_data(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str, little_endian: bool, bom: bool) -> Vec<u8> {
        let mut out = Vec::new();
        if bom {
            out.extend_from_slice(if little_endian { &[0xFF, 0xFE] } else { &[0xFE, 0xFF] });
        }
        for unit in text.encode_utf16() {
            let bytes = if little_endian { unit.to_le_bytes() } else { unit.to_be_bytes() };
            out.extend_from_slice(&bytes);
        }
        out
    }

    fn decode_all(bytes: Vec<u8>) -> (XmlEncoding, String) {
        let mut input = DecodedInput::sniff(Cursor::new(bytes)).unwrap();
        let encoding = input.encoding();
        let mut text = String::new();
        input.read_to_string(&mut text).unwrap();
        (encoding, text)
    }

    #[test]
    fn test_detect_utf8() {
        assert_eq!(XmlEncoding::detect(b"<export/>"), (XmlEncoding::Utf8, 0));
        assert_eq!(XmlEncoding::detect(b"\xEF\xBB\xBF<export/>"), (XmlEncoding::Utf8, 3));
        assert_eq!(XmlEncoding::detect(b""), (XmlEncoding::Utf8, 0));
    }

    #[test]
    fn test_detect_utf16() {
        assert_eq!(XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0]), (XmlEncoding::Utf16Le, 2));
        assert_eq!(XmlEncoding::detect(&[0xFE, 0xFF, 0, b'<']), (XmlEncoding::Utf16Be, 2));
        assert_eq!(XmlEncoding::detect(&[0, b'<', 0, b'a']), (XmlEncoding::Utf16Be, 0));
    }

    #[test]
    fn test_utf8_bom_is_dropped() {
        let (encoding, text) = decode_all(b"\xEF\xBB\xBF<export/>".to_vec());
        assert_eq!(encoding, XmlEncoding::Utf8);
        assert_eq!(text, "<export/>");
    }

    #[test]
    fn test_utf16_le_and_be() {
        let doc = "<items><item name=\"Zahnrad ⚙ 𝄞\"/></items>";
        for little_endian in [true, false] {
            for bom in [true, false] {
                let (_, text) = decode_all(utf16(doc, little_endian, bom));
                assert_eq!(text, doc);
            }
        }
    }

    #[test]
    fn test_surrogate_split_across_reads() {
        // One byte at a time forces every split point
        struct Trickle(Cursor<Vec<u8>>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = buf.len().min(1);
                self.0.read(&mut buf[..n])
            }
        }

        let doc = "<a>𝄞𝄞</a>";
        let mut reader = Utf16Reader::new(Trickle(Cursor::new(utf16(doc, true, false))), true);
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, doc);
    }

    #[test]
    fn test_truncated_utf16_is_invalid_data() {
        let mut bytes = utf16("<a/>", true, true);
        bytes.push(0x41);
        let mut input = DecodedInput::sniff(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        let err = input.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
