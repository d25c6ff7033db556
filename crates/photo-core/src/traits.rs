//! Interfaces between the catalogue core and its collaborators.

use std::path::Path;

use crate::error::Result;

/// Content fingerprint of a file's bytes.
///
/// Implementations must be deterministic, collision resistant, and return a
/// lowercase hexadecimal string so the digest can serve as a map key and be
/// written to the catalogue verbatim.
pub trait ContentDigest: Send + Sync {
    /// Fingerprint the file at `path`.
    fn digest(&self, path: &Path) -> Result<String>;
}

