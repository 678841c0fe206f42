//! Producing minisign signatures, for publishers and tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signer, SigningKey};

use crate::signature::{KeyId, PublicKey, SignatureAlgorithm, TRUSTED_PREFIX};

pub struct SecretKey {
    key_id:  KeyId,
    signing: SigningKey,
}

impl SecretKey {
    pub fn from_seed(seed: [u8; 32], key_id: [u8; 8]) -> Self {
        Self {
            key_id:  KeyId(key_id),
            signing: SigningKey::from_bytes(&seed),
        }
    }

    pub fn key_id(&self) -> KeyId { self.key_id }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_parts(self.key_id, self.signing.verifying_key())
    }

    /// Sign `content` and return the text of a `.minisig` sidecar.
    pub fn sign(
        &self,
        content: &[u8],
        algorithm: SignatureAlgorithm,
        trusted_comment: &str,
    ) -> String {
        let signature = self.signing.sign(&algorithm.message(content)).to_bytes();

        let mut bin = Vec::with_capacity(2 + 8 + 64);
        bin.extend_from_slice(&algorithm.tag());
        bin.extend_from_slice(&self.key_id.0);
        bin.extend_from_slice(&signature);

        let mut global = signature.to_vec();
        global.extend_from_slice(trusted_comment.as_bytes());
        let global = self.signing.sign(&global).to_bytes();

        format!(
            "untrusted comment: signature from selfup secret key\n{}\n{}{}\n{}\n",
            STANDARD.encode(bin),
            TRUSTED_PREFIX,
            trusted_comment,
            STANDARD.encode(global),
        )
    }
}
