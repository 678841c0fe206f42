use selfup_verify::SignatureError;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] selfup_fetch::Error),

    #[error(transparent)]
    Platform(#[from] selfup_platform::Error),

    #[error(transparent)]
    Install(#[from] selfup_install::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("installed product evaluation did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse classification of an [`Error`], for hosts that map failures to
/// their own codes or messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Parse,
    SignatureFormat,
    UntrustedSigner,
    AlgorithmNotTrusted,
    SignatureInvalid,
    DigestMismatch,
    ResourceUnavailable,
    Enumeration,
    Filesystem,
    ProcessLaunch,
    Cancellation,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use selfup_fetch::Error as Fetch;

        match self {
            Error::Fetch(e) => match e {
                Fetch::InvalidUrl { .. } | Fetch::Manifest { .. } => ErrorKind::Parse,
                Fetch::Network { .. } => ErrorKind::Network,
                Fetch::HttpStatus { .. } => ErrorKind::HttpStatus,
                Fetch::Signature { source, .. } => match source {
                    SignatureError::Format(_) | SignatureError::PublicKey(_) => {
                        ErrorKind::SignatureFormat
                    }
                    SignatureError::UntrustedSigner { .. } => ErrorKind::UntrustedSigner,
                    SignatureError::AlgorithmNotTrusted { .. } => ErrorKind::AlgorithmNotTrusted,
                    SignatureError::Invalid { .. } => ErrorKind::SignatureInvalid,
                },
                Fetch::DigestMismatch { .. } => ErrorKind::DigestMismatch,
                Fetch::Io { .. } => ErrorKind::Filesystem,
                Fetch::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
                Fetch::Cancelled => ErrorKind::Cancellation,
            },
            Error::Platform(e) => match e {
                selfup_platform::Error::Enumeration(_) => ErrorKind::Enumeration,
                selfup_platform::Error::Cancelled => ErrorKind::Cancellation,
            },
            Error::Install(e) => match e {
                selfup_install::Error::Filesystem { .. } => ErrorKind::Filesystem,
                selfup_install::Error::ProcessLaunch { .. } => ErrorKind::ProcessLaunch,
            },
            Error::Config(_) => ErrorKind::Config,
            Error::Task(_) => ErrorKind::Enumeration,
        }
    }

    /// True when the operation stopped because its token was cancelled.
    /// Hosts usually report nothing in that case.
    pub fn is_cancelled(&self) -> bool { self.kind() == ErrorKind::Cancellation }
}
