//! Watchlist use-case service.
//!
//! # Responsibility
//! - Set, read and clear a note's cadence tag through the note store.
//! - Record reviews in the ledger and derive per-note review status.
//! - Serve the periodic poll that refreshes overdue state across notes.
//!
//! # Invariants
//! - `mark_reviewed` is the only operation that changes review state.
//! - One note's failure during `poll` never hides other notes' results.
//! - Cadence decoding and recurrence math stay total; only store and ledger
//!   I/O can fail.

use crate::codec::tag_line::{read_cadence, remove_cadence_line, upsert_cadence_line};
use crate::ledger::review_ledger::{LedgerError, ReviewLedger};
use crate::model::cadence::{CadenceRule, NoteId};
use crate::notes::{NoteStore, NoteStoreError};
use crate::schedule::evaluator::{OverdueEvaluator, ReviewStatus};
use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for watchlist use-cases.
#[derive(Debug)]
pub enum WatchServiceError {
    /// Target note does not exist in the note store.
    NoteNotFound(NoteId),
    Notes(NoteStoreError),
    Ledger(LedgerError),
    /// Written cadence line could not be read back.
    InconsistentState(&'static str),
}

impl Display for WatchServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Notes(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent watch state: {details}"),
        }
    }
}

impl Error for WatchServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Notes(err) => Some(err),
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteStoreError> for WatchServiceError {
    fn from(value: NoteStoreError) -> Self {
        match value {
            NoteStoreError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Notes(other),
        }
    }
}

impl From<LedgerError> for WatchServiceError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

pub type WatchResult<T> = Result<T, WatchServiceError>;

/// Watchlist facade over a review ledger and a note store.
pub struct WatchService<L: ReviewLedger, N: NoteStore> {
    ledger: L,
    notes: N,
    evaluator: OverdueEvaluator,
}

impl<L: ReviewLedger, N: NoteStore> WatchService<L, N> {
    /// Creates a service with default schedule tunables.
    pub fn new(ledger: L, notes: N) -> Self {
        Self::with_evaluator(ledger, notes, OverdueEvaluator::default())
    }

    pub fn with_evaluator(ledger: L, notes: N, evaluator: OverdueEvaluator) -> Self {
        Self {
            ledger,
            notes,
            evaluator,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn notes(&self) -> &N {
        &self.notes
    }

    /// Writes `rule` as the note's single cadence line and returns the rule
    /// decoded back from the stored text.
    ///
    /// # Side effects
    /// - Replaces the note text; other lines are preserved, duplicate cadence
    ///   lines are dropped.
    /// - Emits a `cadence_set` event.
    ///
    /// # Errors
    /// - `NoteNotFound` when the note store has no such note.
    /// - `Notes` when the store fails to read or write.
    /// - `InconsistentState` when the written line does not decode.
    pub fn set_cadence(&self, note_id: NoteId, rule: &CadenceRule) -> WatchResult<CadenceRule> {
        let text = self.note_text(note_id)?;
        let updated = upsert_cadence_line(&text, rule);
        self.notes.replace_note_text(note_id, &updated)?;
        info!(
            "event=cadence_set module=service status=ok note_id={note_id} kind={}",
            rule.kind
        );

        read_cadence(&updated).ok_or(WatchServiceError::InconsistentState(
            "cadence line missing after write",
        ))
    }

    /// Removes the cadence line. Returns whether one was present.
    ///
    /// The ledger entry is kept; reviews are history, not watch state.
    pub fn clear_cadence(&self, note_id: NoteId) -> WatchResult<bool> {
        let text = self.note_text(note_id)?;
        let stripped = remove_cadence_line(&text);
        if stripped == text {
            return Ok(false);
        }
        self.notes.replace_note_text(note_id, &stripped)?;
        info!("event=cadence_cleared module=service status=ok note_id={note_id}");
        Ok(true)
    }

    /// Decodes the note's cadence; `None` when absent or malformed.
    pub fn cadence(&self, note_id: NoteId) -> WatchResult<Option<CadenceRule>> {
        Ok(read_cadence(&self.note_text(note_id)?))
    }

    /// Records a review at `reviewed_at`, replacing any earlier record.
    ///
    /// The instant is stored in UTC; the caller's zone only matters for
    /// display.
    ///
    /// # Side effects
    /// - Writes the ledger, which emits a `review_recorded` event.
    ///
    /// # Errors
    /// - `Ledger` when the ledger write fails. The note store is not consulted,
    ///   so reviews may be recorded for notes not yet loaded.
    pub fn mark_reviewed<Tz: TimeZone>(
        &self,
        note_id: NoteId,
        reviewed_at: &DateTime<Tz>,
    ) -> WatchResult<()> {
        self.ledger
            .record_review(note_id, reviewed_at.with_timezone(&Utc))?;
        Ok(())
    }

    /// Review status of one note at `now`, expressed in `now`'s time zone.
    pub fn status<Tz: TimeZone>(
        &self,
        note_id: NoteId,
        now: &DateTime<Tz>,
    ) -> WatchResult<ReviewStatus<Tz>> {
        let rule = self.cadence(note_id)?;
        let zone = now.timezone();
        let last_reviewed_at = self
            .ledger
            .last_reviewed(note_id)?
            .map(|instant| instant.with_timezone(&zone));

        Ok(self
            .evaluator
            .evaluate(rule.as_ref(), last_reviewed_at.as_ref(), now))
    }

    /// Evaluates every note in `note_ids` at the same `now`.
    ///
    /// Notes that fail to load are logged and left out of the result.
    pub fn poll<Tz: TimeZone>(
        &self,
        note_ids: &[NoteId],
        now: &DateTime<Tz>,
    ) -> Vec<(NoteId, ReviewStatus<Tz>)> {
        note_ids
            .iter()
            .filter_map(|&note_id| match self.status(note_id, now) {
                Ok(status) => Some((note_id, status)),
                Err(err) => {
                    warn!(
                        "event=watch_poll module=service status=skipped note_id={note_id} error={err}"
                    );
                    None
                }
            })
            .collect()
    }

    fn note_text(&self, note_id: NoteId) -> WatchResult<String> {
        self.notes
            .read_note_text(note_id)?
            .ok_or(WatchServiceError::NoteNotFound(note_id))
    }
}
