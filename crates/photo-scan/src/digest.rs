//! BLAKE3 content fingerprints.

use std::path::Path;

use photo_core::{ContentDigest, Result};

/// Fingerprints files with BLAKE3 over a memory map of their contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Digest;

impl ContentDigest for Blake3Digest {
    fn digest(&self, path: &Path) -> Result<String> {
        let mut hasher = blake3::Hasher::new();
        hasher.update_mmap(path)?;
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_lowercase_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let digest = Blake3Digest.digest(&path).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(digest, blake3::hash(b"not really a jpeg").to_hex().to_string());
    }

    #[test]
    fn test_digest_follows_content_not_name() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        let c = dir.path().join("c.jpg");
        std::fs::write(&a, b"same").unwrap();
        std::fs::write(&b, b"same").unwrap();
        std::fs::write(&c, b"other").unwrap();

        assert_eq!(Blake3Digest.digest(&a).unwrap(), Blake3Digest.digest(&b).unwrap());
        assert_ne!(Blake3Digest.digest(&a).unwrap(), Blake3Digest.digest(&c).unwrap());
    }

    #[test]
    fn test_digest_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            Blake3Digest.digest(&path).unwrap(),
            blake3::hash(b"").to_hex().to_string()
        );
    }

    #[test]
    fn test_digest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Blake3Digest.digest(&dir.path().join("gone.jpg")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
