//! Error types for catalog scans.

use std::io;
use thiserror::Error;

/// Coarse classification handed to callers that only need the category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    MalformedDocument,
}

/// The failure that aborts a scan. No partial results accompany it.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The byte source could not be opened or read.
    #[error("Catalog source {origin} is unavailable: {source}")]
    SourceUnavailable {
        origin: String,
        #[source]
        source: io::Error,
    },

    /// The byte stream is not well-formed markup.
    #[error("Malformed document at byte {offset}: {message}")]
    MalformedDocument { message: String, offset: u64 },
}

impl CatalogError {
    pub fn unavailable(origin: impl Into<String>, source: io::Error) -> Self {
        CatalogError::SourceUnavailable {
            origin: origin.into(),
            source,
        }
    }

    pub fn malformed(message: impl Into<String>, offset: u64) -> Self {
        CatalogError::MalformedDocument {
            message: message.into(),
            offset,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            CatalogError::MalformedDocument { .. } => ErrorKind::MalformedDocument,
        }
    }
}

/// A convenience `Result` type alias using the crate's `CatalogError` type.
pub type Result<T> = std::result::Result<T, CatalogError>;
