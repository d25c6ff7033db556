//! photo-core - Core types and traits for the photo catalogue
//!
//! This crate provides the record types, the compact id codec used by the
//! catalogue file, configuration, and the error type shared by every other
//! crate in the workspace.

pub mod config;
pub mod error;
pub mod id;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{PhotoError, Result};
pub use id::{decode_id, encode_id, Id};
pub use traits::ContentDigest;
pub use types::*;
