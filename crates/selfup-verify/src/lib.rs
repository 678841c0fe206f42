//! Content and manifest verification primitives.
//!
//! - [`Hash`]: fixed 32-byte SHA-256 digest with hex codec and constant-time
//!   comparison.
//! - [`Sha256Hasher`]: incremental hashing so content can be verified while it
//!   streams to disk.
//! - [`verify_signature`]: minisign detached-signature check against an
//!   allow-list of [`TrustedSigner`]s.
//!
//! # Example
//!
//! ```
//! use selfup_verify::{Hash, Sha256Hasher};
//!
//! let expected: Hash = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
//!     .parse()
//!     .unwrap();
//!
//! let mut hasher = Sha256Hasher::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! assert!(hasher.finalize().matches(&expected));
//! ```

pub use self::error::{HashError, SignatureError};
pub use self::hash::{HASH_LEN, Hash};
pub use self::hasher::Sha256Hasher;
pub use self::signature::{
    AlgorithmMask, KeyId, PublicKey, Signature, SignatureAlgorithm, TrustedSigner,
    verify_signature,
};

#[cfg(any(test, feature = "sign"))]
pub use self::sign::SecretKey;

mod error;
mod hash;
mod hasher;
mod signature;

#[cfg(any(test, feature = "sign"))]
mod sign;
