//! Shared SHA-256 hex digest utility.
//!
//! Used for prompt-keyed image names and content-addressed document names.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Storage key for an image prompt.
pub fn prompt_hash(prompt: &str) -> String {
    sha256_hex(prompt.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        let hash = sha256_hex(b"");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn prompt_hash_is_stable() {
        assert_eq!(prompt_hash("a red fox"), prompt_hash("a red fox"));
        assert_ne!(prompt_hash("a red fox"), prompt_hash("a red fox "));
        assert_eq!(prompt_hash("a red fox").len(), 64);
    }
}
