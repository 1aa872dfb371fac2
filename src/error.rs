// src/error.rs
use thiserror::Error;

/// Failures while obtaining or decoding the event archive.
///
/// Cloneable so a failed cache can hand the same error to every waiter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArchiveError {
    #[error("archive location is not configured")]
    NotConfigured,
    #[error("archive request failed: {0}")]
    Http(String),
    #[error("archive fetch returned HTTP {0}")]
    Status(u16),
    #[error("compressed archive exceeds {limit} bytes")]
    CompressedTooLarge { limit: usize },
    #[error("decompressed archive exceeds {limit} bytes")]
    DecompressedTooLarge { limit: usize },
    #[error("failed to decompress archive: {0}")]
    Decompress(String),
    #[error("failed to parse archive: {0}")]
    Parse(String),
    #[error("failed to read archive: {0}")]
    Io(String),
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        ArchiveError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Parse(e.to_string())
    }
}
