//! photo-scan - Directory reconciliation
//!
//! Walks a photo tree, fingerprints every candidate file by content, and
//! merges the result into a [`PhotoStore`](photo_store::PhotoStore). Records
//! follow their content: a moved or renamed file keeps its tags.
//!
//! # Example
//!
//! ```rust,ignore
//! use photo_scan::{Blake3Digest, Reconciler};
//! use photo_core::ScanConfig;
//!
//! let reconciler = Reconciler::new(Blake3Digest, ScanConfig::default());
//! let report = reconciler.scan(Path::new("/photos"), &mut store)?;
//! println!("{} new photos", report.added);
//! ```

mod digest;
mod reconcile;

pub use digest::Blake3Digest;
pub use reconcile::{Candidate, Fingerprint, Reconciler, ScanReport, SkippedFile};

// Re-export for convenience
pub use photo_core::{ContentDigest, ScanConfig};
