use sha2::{Digest, Sha256};

use crate::hash::{HASH_LEN, Hash};

/// Incremental SHA-256 producing a [`Hash`].
#[derive(Clone, Default)]
pub struct Sha256Hasher(Sha256);

impl Sha256Hasher {
    pub fn new() -> Self { Self(Sha256::new()) }

    pub fn update(&mut self, data: &[u8]) { self.0.update(data); }

    pub fn finalize(self) -> Hash { to_hash(&self.0.finalize()) }

    pub fn digest(data: &[u8]) -> Hash { to_hash(&Sha256::digest(data)) }
}

fn to_hash(digest: &[u8]) -> Hash {
    let mut bytes = [0u8; HASH_LEN];
    bytes.copy_from_slice(digest);
    Hash::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hasher() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello world");
        let hash = hasher.finalize();

        let expected =
            hex::decode("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
                .unwrap();
        assert_eq!(hash.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = b"test data for verification";
        let mut hasher = Sha256Hasher::new();
        for chunk in data.chunks(5) {
            hasher.update(chunk);
        }
        assert!(hasher.finalize().matches(&Sha256Hasher::digest(data)));
    }
}
