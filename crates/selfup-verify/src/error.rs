use thiserror::Error;

use crate::signature::{KeyId, SignatureAlgorithm};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("invalid digest length: expected 64 hex characters, got {len}")]
    InvalidLength { len: usize },

    #[error("invalid hex character {character:?} at position {index}")]
    InvalidCharacter { character: char, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid signature format: {0}")]
    Format(String),

    #[error("invalid public key: {0}")]
    PublicKey(String),

    #[error("signer {key_id} is not trusted")]
    UntrustedSigner { key_id: KeyId },

    #[error("signature algorithm {algorithm} is not trusted for signer {key_id}")]
    AlgorithmNotTrusted {
        key_id:    KeyId,
        algorithm: SignatureAlgorithm,
    },

    #[error("invalid signature from signer {key_id}: {reason}")]
    Invalid { key_id: KeyId, reason: &'static str },
}
