//! Cadence rule domain model.
//!
//! # Responsibility
//! - Define `CadenceRule`, the typed form of a note's review cadence tag.
//! - Provide kind-aware defaults used by the recurrence calculator.
//!
//! # Invariants
//! - `hours`/`minutes` are unsigned and therefore never negative.
//! - `day_of_month` and `month` are stored as given; range policy is applied
//!   at computation time (clamped to the calendar), not at construction.
//! - `start_date`/`end_date` are informational and never consulted by the
//!   calculator.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a watched note.
pub type NoteId = Uuid;

/// Recurrence family of a cadence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceKind {
    /// Fixed offset (`hours` + `minutes`) after the last review.
    EveryInterval,
    /// Once per day at `time`.
    Daily,
    /// On selected weekdays at `time`.
    Weekly,
    /// On `day_of_month` at `time`.
    Monthly,
    /// On `month`/`day_of_month` at `time`.
    Yearly,
}

impl CadenceKind {
    /// Stable wire name used by the cadence tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EveryInterval => "interval",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a wire name, case-insensitively.
    ///
    /// `every` and `hourly` are accepted as aliases of `interval`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "interval" | "every" | "hourly" => Some(Self::EveryInterval),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Whether rules of this kind fire at a wall-clock `time`.
    pub fn uses_time_of_day(self) -> bool {
        !matches!(self, Self::EveryInterval)
    }

    /// Whether rules of this kind read `day_of_month`.
    pub fn uses_day_of_month(self) -> bool {
        matches!(self, Self::Monthly | Self::Yearly)
    }

    /// Nominal period in hours, used to fill display fields.
    pub fn nominal_hours(self) -> u32 {
        match self {
            Self::EveryInterval => 0,
            Self::Daily => 24,
            Self::Weekly => 24 * 7,
            Self::Monthly => 24 * 30,
            Self::Yearly => 24 * 365,
        }
    }
}

impl Display for CadenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 24h wall-clock time in `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    /// Time used when a rule omits `time`.
    pub const DEFAULT: TimeOfDay = TimeOfDay { hour: 9, minute: 0 };

    /// Builds a time when `hour < 24` and `minute < 60`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parses `H:MM` or `HH:MM`.
    pub fn parse(value: &str) -> Option<Self> {
        let (hour, minute) = value.trim().split_once(':')?;
        let (hour, minute) = (hour.trim(), minute.trim());
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return None;
        }
        Self::new(hour.parse().ok()?, minute.parse().ok()?)
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }

    /// Converts to a chrono time at second zero.
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid time of day `{s}`; expected HH:MM"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Typed review cadence attached to one watched note.
///
/// Kind-specific fields are optional so a decoded tag with partial data still
/// yields a usable rule; accessors below supply the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceRule {
    /// Active recurrence family.
    #[serde(rename = "type")]
    pub kind: CadenceKind,
    /// Interval hours for `EveryInterval`; display-only otherwise.
    pub hours: Option<u32>,
    /// Interval minutes for `EveryInterval`; display-only otherwise.
    pub minutes: Option<u32>,
    /// Wall-clock fire time for calendar kinds.
    pub time: Option<TimeOfDay>,
    /// Weekdays for `Weekly`, `0 = Sunday`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub weekdays: BTreeSet<u8>,
    /// Day of month for `Monthly` and `Yearly`.
    pub day_of_month: Option<u32>,
    /// Month (1-12) for `Yearly`.
    pub month: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CadenceRule {
    /// Creates a bare rule of `kind` with every optional field unset.
    pub fn of_kind(kind: CadenceKind) -> Self {
        Self {
            kind,
            hours: None,
            minutes: None,
            time: None,
            weekdays: BTreeSet::new(),
            day_of_month: None,
            month: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Fixed-offset rule due `hours:minutes` after each review.
    pub fn every(hours: u32, minutes: u32) -> Self {
        let mut rule = Self::of_kind(CadenceKind::EveryInterval);
        rule.hours = Some(hours);
        rule.minutes = Some(minutes);
        rule
    }

    pub fn daily(time: TimeOfDay) -> Self {
        Self::calendar(CadenceKind::Daily, time)
    }

    /// Weekly rule; `days` uses `0 = Sunday`.
    pub fn weekly(time: TimeOfDay, days: impl IntoIterator<Item = u8>) -> Self {
        let mut rule = Self::calendar(CadenceKind::Weekly, time);
        rule.weekdays = days.into_iter().collect();
        rule
    }

    pub fn monthly(time: TimeOfDay, day_of_month: u32) -> Self {
        let mut rule = Self::calendar(CadenceKind::Monthly, time);
        rule.day_of_month = Some(day_of_month);
        rule
    }

    pub fn yearly(time: TimeOfDay, month: u32, day_of_month: u32) -> Self {
        let mut rule = Self::calendar(CadenceKind::Yearly, time);
        rule.month = Some(month);
        rule.day_of_month = Some(day_of_month);
        rule
    }

    /// Sets the informational active window.
    pub fn with_bounds(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    fn calendar(kind: CadenceKind, time: TimeOfDay) -> Self {
        let mut rule = Self::of_kind(kind);
        rule.hours = Some(kind.nominal_hours());
        rule.minutes = Some(0);
        rule.time = Some(time);
        rule
    }

    /// Interval offset for `EveryInterval`; unset parts count as zero.
    ///
    /// Returns `None` only when the offset exceeds chrono's duration range.
    pub fn interval(&self) -> Option<Duration> {
        let total_minutes =
            i64::from(self.hours.unwrap_or(0)) * 60 + i64::from(self.minutes.unwrap_or(0));
        Duration::try_minutes(total_minutes)
    }

    pub fn time_or_default(&self) -> TimeOfDay {
        self.time.unwrap_or_default()
    }

    pub fn day_or_default(&self) -> u32 {
        self.day_of_month.unwrap_or(1)
    }

    pub fn month_or_default(&self) -> u32 {
        self.month.unwrap_or(1)
    }

    /// Reports whether `date` lies inside `start_date..=end_date`.
    ///
    /// Missing bounds are open. The recurrence calculator does not call this.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Compares the fields that matter for this rule's kind.
    ///
    /// Defaults are applied on both sides, so an unset `time` equals `09:00`.
    pub fn is_equivalent(&self, other: &CadenceRule) -> bool {
        if self.kind != other.kind
            || self.start_date != other.start_date
            || self.end_date != other.end_date
        {
            return false;
        }

        match self.kind {
            CadenceKind::EveryInterval => self.interval() == other.interval(),
            CadenceKind::Daily => self.time_or_default() == other.time_or_default(),
            CadenceKind::Weekly => {
                self.time_or_default() == other.time_or_default()
                    && self.weekdays == other.weekdays
            }
            CadenceKind::Monthly => {
                self.time_or_default() == other.time_or_default()
                    && self.day_or_default() == other.day_or_default()
            }
            CadenceKind::Yearly => {
                self.time_or_default() == other.time_or_default()
                    && self.day_or_default() == other.day_or_default()
                    && self.month_or_default() == other.month_or_default()
            }
        }
    }
}

/// Derived review state of a watched note. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// The note has never been reviewed.
    Fresh,
    /// Reviewed, and the next due instant is still ahead.
    Pending,
    /// The next due instant has been reached.
    Overdue,
}

impl ReviewState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CadenceKind, CadenceRule, TimeOfDay};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn time_of_day_parses_and_formats_24h() {
        let time = TimeOfDay::parse("7:05").expect("single-digit hour should parse");
        assert_eq!((time.hour(), time.minute()), (7, 5));
        assert_eq!(time.to_string(), "07:05");
        assert!(TimeOfDay::parse("24:00").is_none());
        assert!(TimeOfDay::parse("09:60").is_none());
        assert!(TimeOfDay::parse("0900").is_none());
        assert!(TimeOfDay::parse("09:5").is_none());
    }

    #[test]
    fn kind_parse_accepts_aliases_case_insensitively() {
        assert_eq!(CadenceKind::parse("WEEKLY"), Some(CadenceKind::Weekly));
        assert_eq!(CadenceKind::parse("every"), Some(CadenceKind::EveryInterval));
        assert_eq!(CadenceKind::parse("fortnightly"), None);
    }

    #[test]
    fn constructors_fill_display_hours() {
        assert_eq!(CadenceRule::daily(TimeOfDay::DEFAULT).hours, Some(24));
        assert_eq!(CadenceRule::weekly(TimeOfDay::DEFAULT, [1]).hours, Some(168));
        assert_eq!(CadenceRule::yearly(TimeOfDay::DEFAULT, 1, 1).hours, Some(8760));
    }

    #[test]
    fn interval_treats_missing_parts_as_zero() {
        let mut rule = CadenceRule::of_kind(CadenceKind::EveryInterval);
        rule.minutes = Some(90);
        assert_eq!(rule.interval(), Some(Duration::minutes(90)));
    }

    #[test]
    fn active_window_is_inclusive_and_open_when_unset() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let rule = CadenceRule::daily(TimeOfDay::DEFAULT).with_bounds(Some(start), Some(end));
        assert!(rule.is_active_on(start));
        assert!(rule.is_active_on(end));
        assert!(!rule.is_active_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(CadenceRule::daily(TimeOfDay::DEFAULT).is_active_on(start));
    }

    #[test]
    fn equivalence_applies_defaults_and_ignores_irrelevant_fields() {
        let mut explicit = CadenceRule::daily(TimeOfDay::DEFAULT);
        explicit.day_of_month = Some(17);
        let mut bare = CadenceRule::of_kind(CadenceKind::Daily);
        bare.hours = Some(0);
        assert!(explicit.is_equivalent(&bare));

        let other = CadenceRule::daily(TimeOfDay::new(10, 0).unwrap());
        assert!(!explicit.is_equivalent(&other));
    }
}
