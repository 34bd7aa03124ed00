//! Content hashing for uploaded documents

use sha2::{Digest, Sha256};

/// SHA-256 of the raw document bytes, lowercase hex
///
/// Used as the file-level duplicate key across uploads.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_different_bytes_different_hash() {
        assert_ne!(content_hash(b"front.jpg"), content_hash(b"back.jpg"));
        assert_eq!(content_hash(b""), content_hash(&[]));
    }
}
