//! Note text collaborator.
//!
//! # Responsibility
//! - Define the two operations the engine needs from the external note store:
//!   read a note's full text and replace it.
//! - Provide an in-memory store for embedding and tests.
//!
//! Note CRUD, markdown rendering and line placement policy belong to the
//! host application, not to this crate.

use crate::model::cadence::NoteId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type NoteStoreResult<T> = Result<T, NoteStoreError>;

#[derive(Debug)]
pub enum NoteStoreError {
    NotFound(NoteId),
    /// Host store failure, carried as text.
    Backend(String),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Backend(message) => write!(f, "note store failure: {message}"),
        }
    }
}

impl Error for NoteStoreError {}

/// Read/replace access to note text, implemented by the host application.
pub trait NoteStore {
    /// Full text of the note, or `None` if the note does not exist.
    fn read_note_text(&self, note_id: NoteId) -> NoteStoreResult<Option<String>>;
    /// Replaces the note's full text.
    fn replace_note_text(&self, note_id: NoteId, text: &str) -> NoteStoreResult<()>;
}

impl<N: NoteStore + ?Sized> NoteStore for &N {
    fn read_note_text(&self, note_id: NoteId) -> NoteStoreResult<Option<String>> {
        (**self).read_note_text(note_id)
    }

    fn replace_note_text(&self, note_id: NoteId, text: &str) -> NoteStoreResult<()> {
        (**self).replace_note_text(note_id, text)
    }
}

/// Mutex-guarded map of note id to text.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<HashMap<NoteId, String>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a note.
    pub fn insert(&self, note_id: NoteId, text: impl Into<String>) {
        self.lock().insert(note_id, text.into());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NoteId, String>> {
        self.notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NoteStore for InMemoryNoteStore {
    fn read_note_text(&self, note_id: NoteId) -> NoteStoreResult<Option<String>> {
        Ok(self.lock().get(&note_id).cloned())
    }

    fn replace_note_text(&self, note_id: NoteId, text: &str) -> NoteStoreResult<()> {
        match self.lock().get_mut(&note_id) {
            Some(existing) => {
                *existing = text.to_string();
                Ok(())
            }
            None => Err(NoteStoreError::NotFound(note_id)),
        }
    }
}
