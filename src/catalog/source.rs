//! Byte sources a scan can open.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

/// Something a scan can open once and read forward.
///
/// `open` consumes the source: every scan gets its own fresh handle.
pub trait Source {
    type Reader: Read;

    /// Label used in logs and error messages
    fn describe(&self) -> String;

    fn open(self) -> Result<Self::Reader>;
}

impl Source for &Path {
    type Reader = File;

    fn describe(&self) -> String {
        self.display().to_string()
    }

    fn open(self) -> Result<File> {
        File::open(self).map_err(|e| CatalogError::unavailable(self.describe(), e))
    }
}

impl Source for &PathBuf {
    type Reader = File;

    fn describe(&self) -> String {
        self.as_path().describe()
    }

    fn open(self) -> Result<File> {
        self.as_path().open()
    }
}

impl Source for PathBuf {
    type Reader = File;

    fn describe(&self) -> String {
        self.as_path().describe()
    }

    fn open(self) -> Result<File> {
        self.as_path().open()
    }
}

impl Source for &str {
    type Reader = File;

    fn describe(&self) -> String {
        Path::new(self).describe()
    }

    fn open(self) -> Result<File> {
        Path::new(self).open()
    }
}

impl Source for String {
    type Reader = File;

    fn describe(&self) -> String {
        Path::new(self).describe()
    }

    fn open(self) -> Result<File> {
        Path::new(&self).open()
    }
}

/// An in-memory document
impl<'a> Source for &'a [u8] {
    type Reader = &'a [u8];

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.len())
    }

    fn open(self) -> Result<&'a [u8]> {
        Ok(self)
    }
}

/// Adapts an already-open reader. It can be scanned only once.
#[derive(Debug)]
pub struct FromReader<R> {
    reader: R,
    origin: String,
}

impl<R: Read> FromReader<R> {
    pub fn new(reader: R) -> Self {
        FromReader {
            reader,
            origin: "<reader>".to_string(),
        }
    }

    pub fn with_origin(reader: R, origin: impl Into<String>) -> Self {
        FromReader {
            reader,
            origin: origin.into(),
        }
    }
}

impl<R: Read> Source for FromReader<R> {
    type Reader = R;

    fn describe(&self) -> String {
        self.origin.clone()
    }

    fn open(self) -> Result<R> {
        Ok(self.reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_missing_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("export_full.xml");
        let err = missing.as_path().open().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert!(err.to_string().contains("export_full.xml"));
    }

    #[test]
    fn test_path_sources_open_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<export/>").unwrap();
        let path = file.path().to_path_buf();

        let mut text = String::new();
        (&path).open().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<export/>");

        let as_str = path.to_str().unwrap();
        assert_eq!(as_str.describe(), path.display().to_string());
        assert!(as_str.to_string().open().is_ok());
    }

    #[test]
    fn test_memory_and_reader_sources() {
        let doc: &[u8] = b"<export/>";
        assert_eq!(doc.describe(), "<9 bytes in memory>");
        assert_eq!(doc.open().unwrap(), b"<export/>");

        let source = FromReader::with_origin(std::io::Cursor::new(b"<a/>".to_vec()), "upload");
        assert_eq!(source.describe(), "upload");
        let mut out = Vec::new();
        source.open().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"<a/>");
    }
}
