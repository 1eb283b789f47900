//! Review cadence engine for watched notes.
//! Parses cadence tags, computes next due instants and tracks reviews.

pub mod codec;
pub mod config;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod notes;
pub mod schedule;
pub mod service;

pub use codec::rule_codec::{decode, encode};
pub use codec::tag_line::{
    find_cadence_line, format_cadence_line, read_cadence, remove_cadence_line,
    upsert_cadence_line, CADENCE_TAG_PREFIX,
};
pub use config::{load_config, ConfigError, NotewatchConfig, ScheduleConfig};
pub use ledger::review_ledger::{InMemoryReviewLedger, LedgerError, LedgerResult, ReviewLedger};
pub use ledger::sqlite_ledger::SqliteReviewLedger;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cadence::{CadenceKind, CadenceRule, NoteId, ReviewState, TimeOfDay};
pub use notes::{InMemoryNoteStore, NoteStore, NoteStoreError, NoteStoreResult};
pub use schedule::calculator::{next_due, CadenceCalculator};
pub use schedule::evaluator::{
    describe_elapsed, describe_remaining, elapsed_since, is_overdue, remaining_until,
    OverdueEvaluator, ReviewStatus, DUE_NOW_TEXT, NEVER_REVIEWED_TEXT,
};
pub use service::watch_service::{WatchResult, WatchService, WatchServiceError};

/// Minimal health-check API for host integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
