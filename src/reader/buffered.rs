//! Buffered byte source
//!
//! Reads from any source implementing Read into a fixed read-ahead buffer.
//! Consumed bytes are compacted away on refill, so the buffer only grows
//! when a single markup construct is larger than it.

use std::io::{self, Read};

/// Buffer size for reading chunks
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Buffered reader for streaming input
pub struct BufferedReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    /// Total bytes pulled from `reader`
    bytes_read: u64,
}

impl<R: Read> BufferedReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        BufferedReader {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            pos: 0,
            end: 0,
            eof: false,
            bytes_read: 0,
        }
    }

    /// Fill the buffer from the reader.
    /// Returns false once the reader is exhausted.
    pub fn fill_buffer(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        // Compact: move remaining data to start
        if self.pos > 0 {
            let remaining = self.end - self.pos;
            if remaining > 0 {
                self.buffer.copy_within(self.pos..self.end, 0);
            }
            self.end = remaining;
            self.pos = 0;
        }

        // A construct larger than the buffer: make room for it
        if self.end == self.buffer.len() {
            let grown = self.buffer.len() * 2;
            self.buffer.resize(grown, 0);
        }

        let read = loop {
            match self.reader.read(&mut self.buffer[self.end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.eof = true;
            Ok(false)
        } else {
            self.end += read;
            self.bytes_read += read as u64;
            Ok(true)
        }
    }

    /// Get current buffered data as a slice
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..self.end]
    }

    /// True once the underlying reader has reported end of input
    pub fn reached_eof(&self) -> bool {
        self.eof
    }

    /// Check if we've reached end of input and drained the buffer
    pub fn is_eof(&self) -> bool {
        self.eof && self.pos >= self.end
    }

    /// Consume n bytes from the buffer
    pub fn consume(&mut self, n: usize) {
        self.pos += n.min(self.end - self.pos);
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_buffered_reader() {
        let data = b"<root>content</root>";
        let mut reader = BufferedReader::new(Cursor::new(data.to_vec()));

        assert!(reader.fill_buffer().unwrap());
        assert_eq!(reader.buffered(), data);
        assert!(!reader.fill_buffer().unwrap());
        assert!(reader.reached_eof());
        assert!(!reader.is_eof());

        reader.consume(data.len());
        assert!(reader.is_eof());
    }

    #[test]
    fn test_compacts_consumed_bytes() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"abcdefgh".to_vec()), 4);
        reader.fill_buffer().unwrap();
        assert_eq!(reader.buffered(), b"abcd");

        reader.consume(3);
        reader.fill_buffer().unwrap();
        assert_eq!(reader.buffered(), b"defg");
        assert_eq!(reader.capacity(), 4);
        assert_eq!(reader.bytes_read(), 7);
    }

    #[test]
    fn test_grows_when_full() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"abcdefgh".to_vec()), 4);
        reader.fill_buffer().unwrap();
        reader.fill_buffer().unwrap();
        assert_eq!(reader.buffered(), b"abcdefgh");
        assert_eq!(reader.capacity(), 8);
    }
}
