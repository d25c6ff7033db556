//! In-memory record store.

use std::collections::HashMap;

use tracing::debug;

use photo_core::{
    check_quotable, normalize_name, Concept, ConceptUsage, Id, PhotoError, PhotoRecord, Result,
    Stats,
};

/// Upper bound on the concept table.
///
/// Concept ids are dense slot numbers, so a corrupted id token must not be
/// allowed to grow the table to an arbitrary size.
pub const MAX_CONCEPT_SLOTS: u64 = 1 << 20;

/// Photo records, the concept table, and their lookup indexes.
///
/// Every mutation goes through a method of this type, which updates the
/// affected index in the same call. Records are only handed out by shared
/// reference.
#[derive(Debug, Clone, Default)]
pub struct PhotoStore {
    /// Photo records; a record's id is its position.
    photos: Vec<PhotoRecord>,

    /// Concept names by id; an empty name marks a free slot.
    concepts: Vec<String>,

    /// Digest to photo id.
    by_digest: HashMap<String, Id>,

    /// Relative path to photo id.
    by_path: HashMap<String, Id>,

    /// Concept name to concept id.
    by_name: HashMap<String, Id>,
}

impl PhotoStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // Photo operations

    /// All photo records in id order.
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photo(&self, id: Id) -> Option<&PhotoRecord> {
        usize::try_from(id).ok().and_then(|idx| self.photos.get(idx))
    }

    /// Append a record for new content and register it in the digest and
    /// path indexes.
    ///
    /// The new record's id is the number of records before the call.
    pub fn add_photo(
        &mut self,
        digest: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Result<Id> {
        let digest = digest.into();
        let relative_path = relative_path.into();

        if digest.is_empty() || digest.contains(|c: char| c.is_whitespace() || c == '"') {
            return Err(PhotoError::invalid_name(digest, "not a content digest"));
        }
        check_quotable(&relative_path)?;
        if self.by_digest.contains_key(&digest) {
            return Err(PhotoError::DuplicateDigest { digest });
        }

        let id = self.photos.len() as Id;
        self.by_digest.insert(digest.clone(), id);
        self.by_path.insert(relative_path.clone(), id);
        self.photos.push(PhotoRecord::new(id, digest, relative_path));

        debug!("Added photo {} at {}", id, self.photos[id as usize].relative_path());
        Ok(id)
    }

    /// Look up a record by content digest.
    pub fn find_by_digest(&self, digest: &str) -> Option<&PhotoRecord> {
        self.by_digest.get(digest).and_then(|&id| self.photo(id))
    }

    /// Look up a record by relative path.
    pub fn find_by_path(&self, relative_path: &str) -> Option<&PhotoRecord> {
        self.by_path.get(relative_path).and_then(|&id| self.photo(id))
    }

    /// Move a record to the path its content now lives at.
    ///
    /// The old path key is dropped from the path index if it still points
    /// at this record, so lookups by the old path no longer resolve to it.
    pub fn relocate_photo(&mut self, id: Id, relative_path: impl Into<String>) -> Result<()> {
        let relative_path = relative_path.into();
        check_quotable(&relative_path)?;

        let idx = self.photo_index(id)?;
        let old_path = self.photos[idx].relative_path().to_string();
        if old_path == relative_path {
            return Ok(());
        }

        if self.by_path.get(&old_path) == Some(&id) {
            self.by_path.remove(&old_path);
        }
        self.by_path.insert(relative_path.clone(), id);
        self.photos[idx].relocate(relative_path);

        debug!("Relocated photo {}: {} -> {}", id, old_path, self.photos[idx].relative_path());
        Ok(())
    }

    /// Attach a live concept to a photo. Returns false if already attached.
    pub fn add_tag(&mut self, photo: Id, concept: Id) -> Result<bool> {
        self.live_concept(concept)?;
        let idx = self.photo_index(photo)?;
        Ok(self.photos[idx].add_tag(concept))
    }

    /// Detach a concept from a photo. Returns false if it was not attached.
    pub fn remove_tag(&mut self, photo: Id, concept: Id) -> Result<bool> {
        let idx = self.photo_index(photo)?;
        Ok(self.photos[idx].remove_tag(concept))
    }

    /// Tag a photo by name, creating the concept on first use.
    pub fn tag_photo(&mut self, photo: Id, name: &str) -> Result<Id> {
        self.photo_index(photo)?;
        let concept = self.add_concept(name)?;
        self.add_tag(photo, concept)?;
        Ok(concept)
    }

    pub fn set_done(&mut self, photo: Id, done: bool) -> Result<()> {
        let idx = self.photo_index(photo)?;
        self.photos[idx].set_done(done);
        Ok(())
    }

    pub fn set_starred(&mut self, photo: Id, starred: bool) -> Result<()> {
        let idx = self.photo_index(photo)?;
        self.photos[idx].set_starred(starred);
        Ok(())
    }

    /// First photo after `from` that has no tags and is not done.
    pub fn next_pending(&self, from: Id) -> Option<Id> {
        let start = usize::try_from(from).ok()?.checked_add(1)?;
        self.photos
            .iter()
            .skip(start)
            .find(|photo| photo.is_pending())
            .map(PhotoRecord::id)
    }

    /// Mutable access for the loader, which fills in tags and flags of
    /// records it has just added.
    pub(crate) fn photo_mut(&mut self, id: Id) -> Option<&mut PhotoRecord> {
        usize::try_from(id).ok().and_then(|idx| self.photos.get_mut(idx))
    }

    fn photo_index(&self, id: Id) -> Result<usize> {
        usize::try_from(id)
            .ok()
            .filter(|&idx| idx < self.photos.len())
            .ok_or(PhotoError::PhotoNotFound { id })
    }

    // Concept operations

    /// Create a concept, or return the id of the concept already carrying
    /// this name.
    ///
    /// New concepts take the lowest free slot, else extend the table.
    pub fn add_concept(&mut self, name: &str) -> Result<Id> {
        let name = normalize_name(name);
        check_quotable(&name)?;

        if let Some(&id) = self.by_name.get(&name) {
            return Ok(id);
        }

        let id = self
            .concepts
            .iter()
            .position(String::is_empty)
            .unwrap_or(self.concepts.len()) as Id;
        self.insert_concept_at(&name, id)?;

        debug!("Created concept {} ({})", id, name);
        Ok(id)
    }

    /// Place a concept at an explicit slot, as read from a catalogue file.
    ///
    /// Grows the table with free slots as needed. The name index entry for
    /// `name` is overwritten.
    pub fn insert_concept_at(&mut self, name: &str, id: Id) -> Result<()> {
        let name = normalize_name(name);
        check_quotable(&name)?;
        if id >= MAX_CONCEPT_SLOTS {
            return Err(PhotoError::OutOfRange {
                id,
                len: MAX_CONCEPT_SLOTS as usize,
            });
        }

        let idx = id as usize;
        if idx >= self.concepts.len() {
            self.concepts.resize(idx + 1, String::new());
        }

        let previous = std::mem::replace(&mut self.concepts[idx], name.clone());
        if !previous.is_empty() && previous != name && self.by_name.get(&previous) == Some(&id) {
            self.by_name.remove(&previous);
        }
        self.by_name.insert(name, id);
        Ok(())
    }

    /// Name of a concept; empty for a free slot.
    pub fn concept_name(&self, id: Id) -> Result<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.concepts.get(idx))
            .map(String::as_str)
            .ok_or(PhotoError::OutOfRange {
                id,
                len: self.concepts.len(),
            })
    }

    /// Resolve a concept name (normalized first).
    pub fn concept_id(&self, name: &str) -> Option<Id> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    /// Live concepts in id order.
    pub fn concepts(&self) -> impl Iterator<Item = (Id, &str)> + '_ {
        self.concepts
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(idx, name)| (idx as Id, name.as_str()))
    }

    /// Live concepts as owned values.
    pub fn concept_list(&self) -> Vec<Concept> {
        self.concepts()
            .map(|(id, name)| Concept {
                id,
                name: name.to_string(),
            })
            .collect()
    }

    /// Size of the concept table, free slots included.
    pub fn concept_slots(&self) -> usize {
        self.concepts.len()
    }

    /// Free a concept slot and detach the concept from every photo.
    ///
    /// The slot becomes eligible for reuse by [`add_concept`](Self::add_concept).
    pub fn remove_concept(&mut self, id: Id) -> Result<()> {
        let name = self.live_concept(id)?.to_string();
        let idx = id as usize;

        if self.by_name.get(&name) == Some(&id) {
            self.by_name.remove(&name);
        }
        self.concepts[idx].clear();

        let mut detached = 0usize;
        for photo in &mut self.photos {
            if photo.remove_tag(id) {
                detached += 1;
            }
        }

        debug!("Removed concept {} ({}) from {} photos", id, name, detached);
        Ok(())
    }

    /// Give a live concept a new name.
    pub fn rename_concept(&mut self, id: Id, new_name: &str) -> Result<()> {
        let new_name = normalize_name(new_name);
        check_quotable(&new_name)?;
        let old_name = self.live_concept(id)?.to_string();

        match self.by_name.get(&new_name) {
            Some(&other) if other != id => {
                return Err(PhotoError::invalid_name(new_name, "already used by another concept"));
            }
            _ => {}
        }

        if self.by_name.get(&old_name) == Some(&id) {
            self.by_name.remove(&old_name);
        }
        self.concepts[id as usize] = new_name.clone();
        self.by_name.insert(new_name, id);
        Ok(())
    }

    /// Live concepts whose name starts with `prefix`, in id order.
    pub fn complete_concept(&self, prefix: &str, limit: usize) -> Vec<(Id, &str)> {
        let prefix = prefix.to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.concepts()
            .filter(|(_, name)| name.starts_with(&prefix))
            .take(limit)
            .collect()
    }

    fn live_concept(&self, id: Id) -> Result<&str> {
        let name = self.concept_name(id)?;
        if name.is_empty() {
            return Err(PhotoError::OutOfRange {
                id,
                len: self.concepts.len(),
            });
        }
        Ok(name)
    }

    // Stats

    /// Summary counts over the whole catalogue.
    pub fn stats(&self) -> Stats {
        let mut counts = vec![0u64; self.concepts.len()];
        let mut stats = Stats {
            photos: self.photos.len() as u64,
            concepts: self.concepts().count() as u64,
            ..Stats::default()
        };

        for photo in &self.photos {
            if !photo.tags().is_empty() {
                stats.tagged += 1;
            }
            if photo.is_done() {
                stats.done += 1;
            }
            if photo.is_starred() {
                stats.starred += 1;
            }
            if photo.is_pending() {
                stats.pending += 1;
            }
            for &tag in photo.tags() {
                if let Some(count) = usize::try_from(tag).ok().and_then(|i| counts.get_mut(i)) {
                    *count += 1;
                }
            }
        }

        stats.usage = self
            .concepts()
            .map(|(id, name)| ConceptUsage {
                id,
                name: name.to_string(),
                photos: counts[id as usize],
            })
            .collect();
        stats
            .usage
            .sort_by(|a, b| b.photos.cmp(&a.photos).then(a.id.cmp(&b.id)));

        stats
    }
}
