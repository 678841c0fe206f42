//! Minisign detached-signature verification.
//!
//! A signature sidecar has four lines:
//!
//! ```text
//! untrusted comment: <free text>
//! base64(<algorithm:2> <key id:8> <ed25519 signature:64>)
//! trusted comment: <free text>
//! base64(<ed25519 global signature:64>)
//! ```
//!
//! The `Ed` algorithm signs the content itself, `ED` signs its BLAKE2b-512
//! digest. The global signature covers the content signature followed by the
//! trusted comment text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey};

use crate::error::SignatureError;

const UNTRUSTED_PREFIX: &str = "untrusted comment:";
pub(crate) const TRUSTED_PREFIX: &str = "trusted comment: ";
const KEY_ID_LEN: usize = 8;
const PUBLIC_KEY_LEN: usize = 2 + KEY_ID_LEN + 32;
const SIGNATURE_LEN: usize = 2 + KEY_ID_LEN + 64;
const LEGACY_TAG: [u8; 2] = *b"Ed";
const PREHASHED_TAG: [u8; 2] = *b"ED";

/// Signature algorithms a [`TrustedSigner`] may be trusted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorithmMask(u8);

impl AlgorithmMask {
    pub const NONE: AlgorithmMask = AlgorithmMask(0);
    pub const LEGACY: AlgorithmMask = AlgorithmMask(1);
    pub const PREHASHED: AlgorithmMask = AlgorithmMask(1 << 1);
    pub const ANY: AlgorithmMask = AlgorithmMask(1 | 1 << 1);

    pub const fn bits(self) -> u8 { self.0 }

    /// Returns `None` when `bits` names an unknown algorithm.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ANY.0 != 0 { None } else { Some(Self(bits)) }
    }

    pub const fn allows(self, algorithm: SignatureAlgorithm) -> bool {
        self.0 & algorithm.mask().0 != 0
    }
}

impl Default for AlgorithmMask {
    fn default() -> Self { Self::ANY }
}

impl std::ops::BitOr for AlgorithmMask {
    type Output = AlgorithmMask;

    fn bitor(self, rhs: Self) -> Self::Output { AlgorithmMask(self.0 | rhs.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// EdDSA over the raw content (`Ed`).
    Legacy,
    /// EdDSA over the BLAKE2b-512 digest of the content (`ED`).
    Prehashed,
}

impl SignatureAlgorithm {
    pub const fn tag(self) -> [u8; 2] {
        match self {
            SignatureAlgorithm::Legacy => LEGACY_TAG,
            SignatureAlgorithm::Prehashed => PREHASHED_TAG,
        }
    }

    pub fn from_tag(tag: [u8; 2]) -> Option<Self> {
        match tag {
            LEGACY_TAG => Some(SignatureAlgorithm::Legacy),
            PREHASHED_TAG => Some(SignatureAlgorithm::Prehashed),
            _ => None,
        }
    }

    pub const fn mask(self) -> AlgorithmMask {
        match self {
            SignatureAlgorithm::Legacy => AlgorithmMask::LEGACY,
            SignatureAlgorithm::Prehashed => AlgorithmMask::PREHASHED,
        }
    }

    pub(crate) fn message<'a>(self, content: &'a [u8]) -> std::borrow::Cow<'a, [u8]> {
        match self {
            SignatureAlgorithm::Legacy => std::borrow::Cow::Borrowed(content),
            SignatureAlgorithm::Prehashed => {
                std::borrow::Cow::Owned(Blake2b512::digest(content).to_vec())
            }
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureAlgorithm::Legacy => write!(f, "legacy (Ed)"),
            SignatureAlgorithm::Prehashed => write!(f, "prehashed (ED)"),
        }
    }
}

/// Minisign key identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub [u8; KEY_ID_LEN]);

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // minisign prints the id as a little-endian integer
        write!(f, "{:016X}", u64::from_le_bytes(self.0))
    }
}

impl std::fmt::Debug for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyId({})", self)
    }
}

/// Minisign public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_id: KeyId,
    key:    VerifyingKey,
}

impl PublicKey {
    #[cfg(any(test, feature = "sign"))]
    pub(crate) fn from_parts(key_id: KeyId, key: VerifyingKey) -> Self { Self { key_id, key } }

    /// Parse the base64 form, e.g. `RWRPrtnepBgoU86p...`.
    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        let bin = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SignatureError::PublicKey(e.to_string()))?;
        if bin.len() != PUBLIC_KEY_LEN {
            return Err(SignatureError::PublicKey(format!(
                "expected {PUBLIC_KEY_LEN} bytes, got {}",
                bin.len()
            )));
        }
        if bin[..2] != LEGACY_TAG {
            return Err(SignatureError::PublicKey("unsupported key algorithm".into()));
        }
        let mut key_id = [0u8; KEY_ID_LEN];
        key_id.copy_from_slice(&bin[2..2 + KEY_ID_LEN]);
        let mut key = [0u8; 32];
        key.copy_from_slice(&bin[2 + KEY_ID_LEN..]);
        let key =
            VerifyingKey::from_bytes(&key).map_err(|e| SignatureError::PublicKey(e.to_string()))?;
        Ok(Self {
            key_id: KeyId(key_id),
            key,
        })
    }

    pub fn to_base64(&self) -> String {
        let mut bin = Vec::with_capacity(PUBLIC_KEY_LEN);
        bin.extend_from_slice(&LEGACY_TAG);
        bin.extend_from_slice(&self.key_id.0);
        bin.extend_from_slice(self.key.as_bytes());
        STANDARD.encode(bin)
    }

    pub fn key_id(&self) -> KeyId { self.key_id }

    /// Check both the content signature and the global signature.
    pub fn verify(&self, content: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let invalid = |reason| SignatureError::Invalid {
            key_id: self.key_id,
            reason,
        };
        if signature.key_id != self.key_id {
            return Err(invalid("key identifiers differ"));
        }
        let message = signature.algorithm.message(content);
        self.key
            .verify(&message, &signature.signature)
            .map_err(|_| invalid("content signature does not verify"))?;

        let mut global = signature.signature.to_bytes().to_vec();
        global.extend_from_slice(signature.trusted_comment.as_bytes());
        self.key
            .verify(&global, &signature.global_signature)
            .map_err(|_| invalid("global signature does not verify"))
    }
}

impl std::str::FromStr for PublicKey {
    type Err = SignatureError;

    /// Accepts the bare base64 key or the contents of a minisign `.pub` file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with(UNTRUSTED_PREFIX))
            .next_back()
            .ok_or_else(|| SignatureError::PublicKey("empty key".into()))?;
        PublicKey::from_base64(line)
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Decoded minisign signature.
#[derive(Debug, Clone)]
pub struct Signature {
    pub(crate) algorithm:        SignatureAlgorithm,
    pub(crate) key_id:           KeyId,
    pub(crate) signature:        Ed25519Signature,
    pub(crate) trusted_comment:  String,
    pub(crate) global_signature: Ed25519Signature,
}

impl Signature {
    pub fn decode(text: &str) -> Result<Self, SignatureError> {
        let format = |msg: &str| SignatureError::Format(msg.to_string());

        let mut lines = text.splitn(4, '\n');
        let (Some(_untrusted), Some(sig_line), Some(comment_line), Some(global_line)) =
            (lines.next(), lines.next(), lines.next(), lines.next())
        else {
            return Err(format("incomplete signature"));
        };

        let bin = STANDARD
            .decode(sig_line.trim())
            .map_err(|e| SignatureError::Format(e.to_string()))?;
        if bin.len() != SIGNATURE_LEN {
            return Err(format("unexpected signature length"));
        }
        let algorithm = SignatureAlgorithm::from_tag([bin[0], bin[1]])
            .ok_or_else(|| format("unsupported signature algorithm"))?;
        let mut key_id = [0u8; KEY_ID_LEN];
        key_id.copy_from_slice(&bin[2..2 + KEY_ID_LEN]);
        let signature = signature_from_slice(&bin[2 + KEY_ID_LEN..])?;

        let trusted_comment = comment_line
            .trim_end_matches('\r')
            .strip_prefix(TRUSTED_PREFIX)
            .ok_or_else(|| format("missing trusted comment"))?
            .to_string();

        let global = STANDARD
            .decode(global_line.trim())
            .map_err(|e| SignatureError::Format(e.to_string()))?;
        let global_signature = signature_from_slice(&global)?;

        Ok(Self {
            algorithm,
            key_id: KeyId(key_id),
            signature,
            trusted_comment,
            global_signature,
        })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm { self.algorithm }

    pub fn key_id(&self) -> KeyId { self.key_id }

    pub fn trusted_comment(&self) -> &str { &self.trusted_comment }
}

fn signature_from_slice(bytes: &[u8]) -> Result<Ed25519Signature, SignatureError> {
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| SignatureError::Format("unexpected signature length".into()))?;
    Ok(Ed25519Signature::from_bytes(&bytes))
}

/// A public key together with the algorithms it is trusted to sign with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSigner {
    pub public_key: PublicKey,
    pub algorithms: AlgorithmMask,
}

impl TrustedSigner {
    pub fn new(public_key: PublicKey, algorithms: AlgorithmMask) -> Self {
        Self {
            public_key,
            algorithms,
        }
    }
}

impl std::str::FromStr for TrustedSigner {
    type Err = SignatureError;

    /// Parses `<base64 key>` or `<base64 key>|<mask>`. Without a mask both
    /// algorithms are trusted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, mask) = match s.split_once('|') {
            Some((key, mask)) => {
                let bits: u8 = mask
                    .trim()
                    .parse()
                    .map_err(|_| SignatureError::PublicKey(format!("invalid mask {mask:?}")))?;
                let mask = AlgorithmMask::from_bits(bits)
                    .ok_or_else(|| SignatureError::PublicKey(format!("invalid mask {bits}")))?;
                (key, mask)
            }
            None => (s, AlgorithmMask::ANY),
        };
        Ok(Self::new(PublicKey::from_base64(key)?, mask))
    }
}

/// Check that `content` was signed by one of `signers`.
///
/// Only the first signer whose key id matches the signature is consulted;
/// if it rejects the signature there is no fallback to other signers.
pub fn verify_signature(
    content: &[u8],
    signature: &str,
    signers: &[TrustedSigner],
) -> Result<KeyId, SignatureError> {
    let signature = Signature::decode(signature)?;
    let signer = signers
        .iter()
        .find(|s| s.public_key.key_id() == signature.key_id)
        .ok_or(SignatureError::UntrustedSigner {
            key_id: signature.key_id,
        })?;
    if !signer.algorithms.allows(signature.algorithm) {
        return Err(SignatureError::AlgorithmNotTrusted {
            key_id:    signature.key_id,
            algorithm: signature.algorithm,
        });
    }
    signer.public_key.verify(content, &signature)?;
    Ok(signature.key_id)
}
