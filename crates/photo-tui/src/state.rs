//! Viewer state machine.
//!
//! The state holds only the cursor and the text being typed; everything
//! else is read from, and written to, the [`PhotoStore`] it is driven with.

use tracing::debug;

use photo_core::{PhotoError, PhotoRecord, Result};
use photo_store::PhotoStore;

/// Something the user asked the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Show the next photo.
    Next,
    /// Show the previous photo.
    Prev,
    /// Jump to the next photo with no tags that is not done.
    NextPending,
    /// Append a character to the typed tag name.
    Input(char),
    /// Drop the last typed character.
    Backspace,
    /// Tag the current photo with the completed name.
    Accept,
    /// Remove the last tag listed for the current photo.
    RemoveLastTag,
    ToggleDone,
    ToggleStarred,
    Quit,
}

/// Cursor, input line, and status of the viewer.
#[derive(Debug, Clone)]
pub struct ViewerState {
    /// Index of the photo on screen.
    index: usize,

    /// Tag name typed so far.
    typed: String,

    /// Number of suggestions offered under the input line.
    max_suggestions: usize,

    /// Feedback from the last action.
    status: Option<String>,

    finished: bool,
}

impl ViewerState {
    /// Start at `start`, clamped to the last photo.
    pub fn new(store: &PhotoStore, start: usize, max_suggestions: usize) -> Self {
        Self {
            index: start.min(store.photo_count().saturating_sub(1)),
            typed: String::new(),
            max_suggestions,
            status: None,
            finished: store.is_empty(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The photo on screen.
    pub fn current<'a>(&self, store: &'a PhotoStore) -> Option<&'a PhotoRecord> {
        store.photos().get(self.index)
    }

    /// Name that Accept would tag with: the first concept starting with the
    /// typed text, else the typed text itself.
    pub fn completion(&self, store: &PhotoStore) -> Option<String> {
        if self.typed.is_empty() {
            return None;
        }
        Some(
            store
                .complete_concept(&self.typed, 1)
                .first()
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| self.typed.to_lowercase()),
        )
    }

    /// Concept names matching the typed text.
    pub fn suggestions<'a>(&self, store: &'a PhotoStore) -> Vec<&'a str> {
        store
            .complete_concept(&self.typed, self.max_suggestions)
            .into_iter()
            .map(|(_, name)| name)
            .collect()
    }

    /// Tag names of the photo on screen, in id order.
    pub fn current_tags<'a>(&self, store: &'a PhotoStore) -> Vec<&'a str> {
        self.current(store)
            .map(|photo| {
                photo
                    .tags()
                    .iter()
                    .map(|&tag| match store.concept_name(tag) {
                        Ok(name) if !name.is_empty() => name,
                        _ => "?",
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Apply an action. Failures are shown in the status line.
    pub fn apply(&mut self, store: &mut PhotoStore, action: Action) {
        if let Err(e) = self.try_apply(store, action) {
            debug!("Viewer action {:?} failed: {}", action, e);
            self.status = Some(e.to_string());
        }
    }

    fn try_apply(&mut self, store: &mut PhotoStore, action: Action) -> Result<()> {
        self.status = None;
        let count = store.photo_count();

        match action {
            Action::Quit => self.finished = true,
            Action::Next => {
                if self.index + 1 < count {
                    self.index += 1;
                }
            }
            Action::Prev => {
                self.index = self.index.saturating_sub(1);
            }
            Action::NextPending => match store.next_pending(self.index as u64) {
                Some(id) => self.index = id as usize,
                None => self.status = Some("No untagged photos ahead".to_string()),
            },
            Action::Input(c) => self.typed.push(c),
            Action::Backspace => {
                self.typed.pop();
            }
            Action::Accept => {
                if let Some(name) = self.completion(store) {
                    let photo = self.photo_id(store)?;
                    store.tag_photo(photo, &name)?;
                    self.status = Some(format!("Tagged {}", name));
                    self.typed.clear();
                }
            }
            Action::RemoveLastTag => {
                let photo = self.photo_id(store)?;
                let last = self.current(store).and_then(|p| p.tags().iter().next_back().copied());
                if let Some(tag) = last {
                    store.remove_tag(photo, tag)?;
                    self.status = Some(format!("Removed {}", store.concept_name(tag).unwrap_or("?")));
                }
            }
            Action::ToggleDone => {
                let photo = self.photo_id(store)?;
                let done = self.current(store).is_some_and(PhotoRecord::is_done);
                store.set_done(photo, !done)?;
            }
            Action::ToggleStarred => {
                let photo = self.photo_id(store)?;
                let starred = self.current(store).is_some_and(PhotoRecord::is_starred);
                store.set_starred(photo, !starred)?;
            }
        }

        Ok(())
    }

    fn photo_id(&self, store: &PhotoStore) -> Result<u64> {
        self.current(store)
            .map(PhotoRecord::id)
            .ok_or(PhotoError::PhotoNotFound {
                id: self.index as u64,
            })
    }
}
