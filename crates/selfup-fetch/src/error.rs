//! Error types for selfup-fetch.

use std::path::PathBuf;

use selfup_verify::{Hash, SignatureError};
use thiserror::Error;

use crate::data::PackageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url:    String,
        source: url::ParseError,
    },

    #[error("error downloading '{url}': {message}")]
    Network { url: String, message: String },

    #[error("error downloading '{url}', status: {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("error parsing '{url}': {source}")]
    Manifest {
        url:    String,
        source: PackageError,
    },

    #[error("failed to verify '{url}' signature: {source}")]
    Signature {
        url:    String,
        source: SignatureError,
    },

    #[error("content of '{url}' does not match the expected digest (got {actual})")]
    DigestMismatch {
        url:      String,
        expected: Hash,
        actual:   Hash,
    },

    #[error("file I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("resource not available ({} source(s) failed)", failures.len())]
    ResourceUnavailable { failures: Vec<SourceFailure> },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn network(url: &url::Url, e: impl std::fmt::Display) -> Self {
        Error::Network {
            url:     url.to_string(),
            message: e.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, Error::Cancelled) }
}

/// Why one download source was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub uri:    String,
    pub reason: String,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.uri, self.reason)
    }
}
