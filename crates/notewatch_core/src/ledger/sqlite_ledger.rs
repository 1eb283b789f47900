//! SQLite-backed review ledger.
//!
//! # Invariants
//! - Values are RFC 3339 UTC strings with full sub-second precision.
//! - Writes are single-statement upserts, so one note id never holds two rows.
//! - Rows that fail to parse are reported, not skipped.

use crate::ledger::review_ledger::{LedgerError, LedgerResult, ReviewLedger};
use crate::model::cadence::NoteId;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const LEDGER_TABLE: &str = "review_ledger";

/// Ledger stored in the `review_ledger` table of a migrated connection.
pub struct SqliteReviewLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewLedger<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `InvalidData` when the ledger table is missing (unmigrated connection).
    pub fn try_new(conn: &'conn Connection) -> LedgerResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [LEDGER_TABLE],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(LedgerError::InvalidData(format!(
                "missing required table `{LEDGER_TABLE}`"
            )));
        }
        Ok(Self { conn })
    }

    /// Lists every entry ordered by note id.
    pub fn list_reviews(&self) -> LedgerResult<Vec<(NoteId, DateTime<Utc>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, last_reviewed_at
             FROM review_ledger
             ORDER BY note_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let note_id: String = row.get("note_id")?;
            let stored: String = row.get("last_reviewed_at")?;
            entries.push((parse_note_id(&note_id)?, parse_timestamp(&stored)?));
        }
        Ok(entries)
    }
}

impl ReviewLedger for SqliteReviewLedger<'_> {
    /// Upserts the note's row with `reviewed_at` in RFC 3339 UTC.
    ///
    /// # Side effects
    /// - Emits `review_recorded` with `status=ok` or `status=error`.
    ///
    /// # Errors
    /// - `Db` when the statement fails (locked file, read-only database).
    fn record_review(&self, note_id: NoteId, reviewed_at: DateTime<Utc>) -> LedgerResult<()> {
        let result = self.conn.execute(
            "INSERT INTO review_ledger (note_id, last_reviewed_at)
             VALUES (?1, ?2)
             ON CONFLICT(note_id) DO UPDATE SET last_reviewed_at = excluded.last_reviewed_at;",
            params![note_id.to_string(), format_timestamp(reviewed_at)],
        );

        match result {
            Ok(_) => {
                info!("event=review_recorded module=ledger status=ok store=sqlite note_id={note_id}");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=review_recorded module=ledger status=error store=sqlite note_id={note_id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    fn last_reviewed(&self, note_id: NoteId) -> LedgerResult<Option<DateTime<Utc>>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT last_reviewed_at FROM review_ledger WHERE note_id = ?1;",
                [note_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        stored.as_deref().map(parse_timestamp).transpose()
    }

    fn forget(&self, note_id: NoteId) -> LedgerResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM review_ledger WHERE note_id = ?1;",
            [note_id.to_string()],
        )?;
        Ok(removed > 0)
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(value: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            LedgerError::InvalidData(format!(
                "invalid timestamp `{value}` in review_ledger.last_reviewed_at"
            ))
        })
}

fn parse_note_id(value: &str) -> LedgerResult<NoteId> {
    Uuid::parse_str(value).map_err(|_| {
        LedgerError::InvalidData(format!("invalid note id `{value}` in review_ledger.note_id"))
    })
}
