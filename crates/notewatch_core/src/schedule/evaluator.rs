//! Overdue evaluator.
//!
//! # Responsibility
//! - Turn a rule, last review and `now` into a `ReviewStatus` snapshot.
//! - Provide the textual contract for "never" and "Due now" displays.
//!
//! # Invariants
//! - `is_overdue` holds exactly when `now >= next_due`, equality included.
//! - `remaining` is clamped to zero once due; `elapsed` is `None` when the
//!   note was never reviewed.
//! - Time passing is the caller's concern: nothing here owns a timer.

use crate::model::cadence::{CadenceRule, ReviewState};
use crate::schedule::calculator::CadenceCalculator;
use chrono::{DateTime, Duration, TimeZone};

/// Display text when a note has no review on record.
pub const NEVER_REVIEWED_TEXT: &str = "never";
/// Display text when no time remains before the due instant.
pub const DUE_NOW_TEXT: &str = "Due now";

/// Derived per-note review snapshot at one `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStatus<Tz: TimeZone> {
    pub state: ReviewState,
    /// `now >= next_due`. Can be true for `Fresh` notes.
    pub overdue: bool,
    pub next_due: DateTime<Tz>,
    pub last_reviewed_at: Option<DateTime<Tz>>,
    /// Time since the last review; `None` means never reviewed.
    pub elapsed: Option<Duration>,
    /// Time until `next_due`, zero once due.
    pub remaining: Duration,
}

impl<Tz: TimeZone> ReviewStatus<Tz> {
    pub fn elapsed_text(&self) -> String {
        describe_elapsed(self.elapsed)
    }

    pub fn remaining_text(&self) -> String {
        describe_remaining(self.remaining)
    }
}

/// Overdue evaluator bound to one calculator configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverdueEvaluator {
    calculator: CadenceCalculator,
}

impl OverdueEvaluator {
    pub fn new(calculator: CadenceCalculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &CadenceCalculator {
        &self.calculator
    }

    /// Returns `now >= next_due(rule, last_reviewed_at, now)`.
    pub fn is_overdue<Tz: TimeZone>(
        &self,
        rule: Option<&CadenceRule>,
        last_reviewed_at: Option<&DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> bool {
        *now >= self.calculator.next_due(rule, last_reviewed_at, now)
    }

    /// Classifies the note as `Fresh`, `Pending` or `Overdue`.
    pub fn review_state<Tz: TimeZone>(
        &self,
        rule: Option<&CadenceRule>,
        last_reviewed_at: Option<&DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> ReviewState {
        self.evaluate(rule, last_reviewed_at, now).state
    }

    /// Builds the full status snapshot in one calculator pass.
    pub fn evaluate<Tz: TimeZone>(
        &self,
        rule: Option<&CadenceRule>,
        last_reviewed_at: Option<&DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> ReviewStatus<Tz> {
        let next_due = self.calculator.next_due(rule, last_reviewed_at, now);
        let overdue = *now >= next_due;
        let state = match (last_reviewed_at, overdue) {
            (None, _) => ReviewState::Fresh,
            (Some(_), false) => ReviewState::Pending,
            (Some(_), true) => ReviewState::Overdue,
        };

        ReviewStatus {
            state,
            overdue,
            remaining: remaining_until(&next_due, now),
            elapsed: elapsed_since(last_reviewed_at, now),
            last_reviewed_at: last_reviewed_at.cloned(),
            next_due,
        }
    }
}

/// Overdue check with default schedule tunables.
pub fn is_overdue<Tz: TimeZone>(
    rule: Option<&CadenceRule>,
    last_reviewed_at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> bool {
    OverdueEvaluator::default().is_overdue(rule, last_reviewed_at, now)
}

/// Time since the last review, `None` when never reviewed.
///
/// A last review recorded in the future yields zero.
pub fn elapsed_since<Tz: TimeZone>(
    last_reviewed_at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> Option<Duration> {
    last_reviewed_at.map(|last| (now.clone() - last.clone()).max(Duration::zero()))
}

/// Time left until `next_due`, clamped to zero when already due.
pub fn remaining_until<Tz: TimeZone>(next_due: &DateTime<Tz>, now: &DateTime<Tz>) -> Duration {
    (next_due.clone() - now.clone()).max(Duration::zero())
}

/// Renders an elapsed duration, e.g. `3h 5m ago`, or `never`.
pub fn describe_elapsed(elapsed: Option<Duration>) -> String {
    match elapsed {
        None => NEVER_REVIEWED_TEXT.to_string(),
        Some(duration) => format!("{} ago", format_span(duration)),
    }
}

/// Renders remaining time, e.g. `2d 4h`, or `Due now` at zero.
pub fn describe_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        DUE_NOW_TEXT.to_string()
    } else {
        format_span(remaining)
    }
}

fn format_span(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}
