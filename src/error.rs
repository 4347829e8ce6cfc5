//! Error taxonomy for fetching, verifying, parsing and indexing the dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SemeionError> = std::result::Result<T, E>;

/// Errors raised while turning the raw text file into records.
/// Line numbers are 1-based; columns are 0-based token indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line does not carry 16 full rows of 16 pixel tokens.
    #[error("line {line}: expected at least 256 pixel tokens, found {found}")]
    MalformedRow { line: usize, found: usize },
    #[error("line {line}: invalid pixel value {token:?} at column {column}")]
    InvalidPixelValue {
        line: usize,
        column: usize,
        token: String,
    },
    #[error("line {line}: invalid label value {token:?} at column {column}")]
    InvalidLabelValue {
        line: usize,
        column: usize,
        token: String,
    },
}

#[derive(Debug, Error)]
pub enum SemeionError {
    #[error("fetch of {url} failed: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error(
        "dataset not found or corrupted at {}; build with download(true) to fetch it",
        .path.display()
    )]
    DatasetNotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

impl SemeionError {
    pub(crate) fn fetch_failed(url: &str, err: anyhow::Error) -> Self {
        SemeionError::FetchFailed {
            url: url.to_string(),
            source: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_names_line_and_token() {
        let e = ParseError::InvalidPixelValue {
            line: 3,
            column: 17,
            token: "x".into(),
        };
        assert_eq!(e.to_string(), "line 3: invalid pixel value \"x\" at column 17");
        let e = ParseError::MalformedRow { line: 1, found: 255 };
        assert!(e.to_string().contains("found 255"));
    }

    #[test]
    fn parse_error_converts_into_semeion_error() {
        let e: SemeionError = ParseError::MalformedRow { line: 2, found: 0 }.into();
        assert!(matches!(
            e,
            SemeionError::Parse(ParseError::MalformedRow { line: 2, found: 0 })
        ));
    }

    #[test]
    fn fetch_failed_keeps_context_chain() {
        let inner = anyhow::anyhow!("connection refused").context("GET request failed");
        let e = SemeionError::fetch_failed("http://127.0.0.1:1/", inner);
        let msg = e.to_string();
        assert!(msg.starts_with("fetch of http://127.0.0.1:1/ failed"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
