//! photo-store - Record store and catalogue file format
//!
//! This crate owns the in-memory catalogue: photo records, the concept
//! table, and the digest, path and name indexes that are kept in step with
//! them. It also reads and writes the flat text file the catalogue lives in.
//!
//! # Example
//!
//! ```rust
//! use photo_store::{parse, serialize, PhotoStore};
//!
//! let mut store = PhotoStore::new();
//! let photo = store.add_photo("d41d8cd98f00b204e9800998ecf8427e", "beach.jpg").unwrap();
//! store.tag_photo(photo, "Sea").unwrap();
//!
//! let text = serialize(&store);
//! let (reloaded, report) = parse(&text);
//! assert!(report.is_clean());
//! assert_eq!(reloaded.photo_count(), 1);
//! ```

mod codec;
mod file;
mod store;

pub use codec::{parse, serialize, ParseReport, ParseWarning};
pub use store::{PhotoStore, MAX_CONCEPT_SLOTS};

// Re-export types for convenience
pub use photo_core::{Concept, Id, PhotoRecord, Stats};
