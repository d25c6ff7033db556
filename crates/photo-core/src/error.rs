//! Error types for the photo catalogue.

use thiserror::Error;

use crate::id::Id;

/// Result type alias using PhotoError.
pub type Result<T> = std::result::Result<T, PhotoError>;

/// Errors that can occur while loading, scanning, or querying a catalogue.
#[derive(Error, Debug)]
pub enum PhotoError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed base-36 id token.
    #[error("Invalid id token: {token:?}")]
    InvalidToken { token: String },

    /// Tag name that no concept carries.
    #[error("Unknown concept: {name}")]
    UnknownConcept { name: String },

    /// Concept id beyond the concept table.
    #[error("Concept id {id} out of range (table holds {len})")]
    OutOfRange { id: Id, len: usize },

    /// Photo id beyond the photo collection.
    #[error("Photo not found: {id}")]
    PhotoNotFound { id: Id },

    /// A second record with a digest the store already holds.
    #[error("Duplicate content digest: {digest}")]
    DuplicateDigest { digest: String },

    /// Name or path that cannot be stored in the catalogue file.
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Directory traversal failure.
    #[error("Walk error: {message}")]
    Walk { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PhotoError {
    /// Create an invalid token error.
    pub fn invalid_token(token: impl Into<String>) -> Self {
        Self::InvalidToken {
            token: token.into(),
        }
    }

    /// Create an unknown concept error.
    pub fn unknown_concept(name: impl Into<String>) -> Self {
        Self::UnknownConcept { name: name.into() }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a walk error.
    pub fn walk(message: impl Into<String>) -> Self {
        Self::Walk {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable code for scripting and log filtering.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::UnknownConcept { .. } => "UNKNOWN_CONCEPT",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::PhotoNotFound { .. } => "PHOTO_NOT_FOUND",
            Self::DuplicateDigest { .. } => "DUPLICATE_DIGEST",
            Self::InvalidName { .. } => "INVALID_NAME",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Walk { .. } => "WALK_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }
}
