//! Fixed-size SHA-256 digest.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use subtle::ConstantTimeEq;

use crate::error::HashError;

pub const HASH_LEN: usize = 32;

/// A 32-byte content digest.
///
/// The all-zero value stands for "no digest"; it never matches the digest of
/// real content, so verifying against it always fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    pub const ZERO: Hash = Hash([0; HASH_LEN]);

    pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self { Self(bytes) }

    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] { &self.0 }

    pub fn is_zero(&self) -> bool { self.0 == [0; HASH_LEN] }

    /// Decode a hex digest. An empty string yields [`Hash::ZERO`].
    pub fn decode_hex(s: &str) -> Result<Self, HashError> {
        if s.is_empty() {
            return Ok(Self::ZERO);
        }
        if s.len() != HASH_LEN * 2 {
            return Err(HashError::InvalidLength { len: s.len() });
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => HashError::InvalidCharacter {
                character: c,
                index,
            },
            _ => HashError::InvalidLength { len: s.len() },
        })?;
        Ok(Self(bytes))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    /// Constant-time equality, for comparing a computed digest with an
    /// expected one.
    pub fn matches(&self, other: &Hash) -> bool { self.0.ct_eq(&other.0).into() }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self { Self(bytes) }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] { &self.0 }
}

impl std::str::FromStr for Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Hash::decode_hex(s) }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HashVisitor;

        impl Visitor<'_> for HashVisitor {
            type Value = Hash;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a 64-character hex SHA-256 digest")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Hash, E> {
                Hash::decode_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HashVisitor)
    }
}
