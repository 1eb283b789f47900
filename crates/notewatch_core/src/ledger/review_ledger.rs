//! Ledger contract, errors and the in-memory implementation.

use crate::db::DbError;
use crate::model::cadence::NoteId;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger read/write failure.
#[derive(Debug)]
pub enum LedgerError {
    Db(DbError),
    /// A stored value could not be interpreted.
    InvalidData(String),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid ledger data: {message}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value store of note id to last-reviewed instant.
pub trait ReviewLedger {
    /// Stores `reviewed_at` as the note's last review, replacing any previous value.
    fn record_review(&self, note_id: NoteId, reviewed_at: DateTime<Utc>) -> LedgerResult<()>;
    /// Returns the note's last review, or `None` if never reviewed.
    fn last_reviewed(&self, note_id: NoteId) -> LedgerResult<Option<DateTime<Utc>>>;
    /// Drops the note's entry on explicit request. Returns whether one existed.
    fn forget(&self, note_id: NoteId) -> LedgerResult<bool>;
}

impl<L: ReviewLedger + ?Sized> ReviewLedger for &L {
    fn record_review(&self, note_id: NoteId, reviewed_at: DateTime<Utc>) -> LedgerResult<()> {
        (**self).record_review(note_id, reviewed_at)
    }

    fn last_reviewed(&self, note_id: NoteId) -> LedgerResult<Option<DateTime<Utc>>> {
        (**self).last_reviewed(note_id)
    }

    fn forget(&self, note_id: NoteId) -> LedgerResult<bool> {
        (**self).forget(note_id)
    }
}

/// Mutex-guarded in-process ledger.
#[derive(Debug, Default)]
pub struct InMemoryReviewLedger {
    entries: Mutex<HashMap<NoteId, DateTime<Utc>>>,
}

impl InMemoryReviewLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned map is still a consistent map: every write is a single insert.
    fn lock(&self) -> MutexGuard<'_, HashMap<NoteId, DateTime<Utc>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReviewLedger for InMemoryReviewLedger {
    fn record_review(&self, note_id: NoteId, reviewed_at: DateTime<Utc>) -> LedgerResult<()> {
        self.lock().insert(note_id, reviewed_at);
        info!("event=review_recorded module=ledger status=ok store=memory note_id={note_id}");
        Ok(())
    }

    fn last_reviewed(&self, note_id: NoteId) -> LedgerResult<Option<DateTime<Utc>>> {
        Ok(self.lock().get(&note_id).copied())
    }

    fn forget(&self, note_id: NoteId) -> LedgerResult<bool> {
        Ok(self.lock().remove(&note_id).is_some())
    }
}
