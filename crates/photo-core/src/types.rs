//! Core domain types for the photo catalogue.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{PhotoError, Result};
use crate::id::Id;

/// One catalogued photo file.
///
/// The digest is the durable identity of the record; the relative path only
/// tells where the content was last seen. Records are owned by the store,
/// which hands out shared references so digest and path cannot drift from
/// its indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    id: Id,
    digest: String,
    relative_path: String,
    tags: BTreeSet<Id>,
    done: bool,
    starred: bool,
}

impl PhotoRecord {
    /// Create an untagged, unreviewed record.
    pub fn new(id: Id, digest: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            id,
            digest: digest.into(),
            relative_path: relative_path.into(),
            tags: BTreeSet::new(),
            done: false,
            starred: false,
        }
    }

    /// Position of the record in its store's load order.
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Concept ids attached to this photo, ascending.
    pub fn tags(&self) -> &BTreeSet<Id> {
        &self.tags
    }

    pub fn has_tag(&self, tag: Id) -> bool {
        self.tags.contains(&tag)
    }

    /// Attach a concept id. Returns false if it was already attached.
    pub fn add_tag(&mut self, tag: Id) -> bool {
        self.tags.insert(tag)
    }

    /// Detach a concept id. Returns false if it was not attached.
    pub fn remove_tag(&mut self, tag: Id) -> bool {
        self.tags.remove(&tag)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    pub fn is_starred(&self) -> bool {
        self.starred
    }

    pub fn set_starred(&mut self, starred: bool) {
        self.starred = starred;
    }

    /// Untagged and not yet marked done.
    pub fn is_pending(&self) -> bool {
        self.tags.is_empty() && !self.done
    }

    /// Point the record at a new location of the same content.
    pub fn relocate(&mut self, relative_path: impl Into<String>) {
        self.relative_path = relative_path.into();
    }

    /// Full path of the photo below `root`.
    pub fn display_path(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }
}

/// A named tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Slot in the concept table.
    pub id: Id,

    /// Lower-case name.
    pub name: String,
}

/// Usage count of one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptUsage {
    pub id: Id,
    pub name: String,
    pub photos: u64,
}

/// Statistics about a catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of photo records.
    pub photos: u64,

    /// Number of live (non-empty) concepts.
    pub concepts: u64,

    /// Photos with at least one tag.
    pub tagged: u64,

    /// Photos marked done.
    pub done: u64,

    /// Photos marked starred.
    pub starred: u64,

    /// Photos neither tagged nor done.
    pub pending: u64,

    /// Per-concept usage, most used first.
    pub usage: Vec<ConceptUsage>,
}

/// Normalize a concept name for storage and lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check that text can be written inside a quoted catalogue field.
///
/// Quotes are not escaped by the file format, and each record occupies one
/// line, so neither may appear in names or paths.
pub fn check_quotable(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(PhotoError::invalid_name(text, "empty"));
    }
    if text.contains('"') {
        return Err(PhotoError::invalid_name(text, "contains a double quote"));
    }
    if text.contains(['\n', '\r']) {
        return Err(PhotoError::invalid_name(text, "contains a line break"));
    }
    Ok(())
}
