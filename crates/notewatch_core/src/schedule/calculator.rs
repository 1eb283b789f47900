//! Recurrence calculator.
//!
//! # Invariants
//! - No rule: due at `now` when never reviewed, else `last + fallback`.
//! - Calendar kinds search from `base`, which is the last review when it lies
//!   in the future and `now` otherwise; the result is strictly after `base`.
//! - Weekly scanning is bounded by `ScheduleConfig::weekly_scan_days`.
//! - Out-of-range `day_of_month`/`month` are clamped into the calendar.
//! - Arithmetic overflow degrades to the no-rule fallback.

use crate::config::ScheduleConfig;
use crate::model::cadence::{CadenceKind, CadenceRule, TimeOfDay};
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, TimeZone};
use log::{debug, warn};

/// Stateless recurrence calculator parameterized by schedule tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CadenceCalculator {
    config: ScheduleConfig,
}

impl CadenceCalculator {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Computes when a note is next due for review.
    ///
    /// Pure function of its inputs; identical arguments give identical output.
    pub fn next_due<Tz: TimeZone>(
        &self,
        rule: Option<&CadenceRule>,
        last_reviewed_at: Option<&DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> DateTime<Tz> {
        let Some(rule) = rule else {
            debug!("event=next_due module=schedule status=fallback reason=no_rule");
            return self.fallback_due(last_reviewed_at, now);
        };

        let base = review_base(last_reviewed_at, now);
        let computed = match rule.kind {
            CadenceKind::EveryInterval => interval_due(rule, last_reviewed_at, now),
            CadenceKind::Daily => self.daily_due(rule, &base),
            CadenceKind::Weekly => self.weekly_due(rule, &base),
            CadenceKind::Monthly => self.monthly_due(rule, &base),
            CadenceKind::Yearly => self.yearly_due(rule, &base),
        };

        computed.unwrap_or_else(|| {
            warn!(
                "event=next_due module=schedule status=fallback reason=out_of_range kind={}",
                rule.kind
            );
            self.fallback_due(last_reviewed_at, now)
        })
    }

    fn fallback_due<Tz: TimeZone>(
        &self,
        last_reviewed_at: Option<&DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> DateTime<Tz> {
        match last_reviewed_at {
            None => now.clone(),
            Some(last) => last
                .clone()
                .checked_add_signed(self.config.fallback_interval())
                .unwrap_or_else(|| now.clone()),
        }
    }

    fn time_for(&self, rule: &CadenceRule) -> TimeOfDay {
        rule.time.unwrap_or(self.config.default_time)
    }

    fn daily_due<Tz: TimeZone>(
        &self,
        rule: &CadenceRule,
        base: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let time = self.time_for(rule);
        let zone = base.timezone();
        let today = base.naive_local().date();

        let candidate = at_wall_clock(&zone, today, time)?;
        if candidate > *base {
            return Some(candidate);
        }
        at_wall_clock(&zone, today.succ_opt()?, time)
    }

    /// Scans day by day for a configured weekday whose fire time is after
    /// `base`. An empty or out-of-range weekday set never matches; the last
    /// scanned candidate is returned instead of looping.
    fn weekly_due<Tz: TimeZone>(
        &self,
        rule: &CadenceRule,
        base: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let time = self.time_for(rule);
        let zone = base.timezone();
        let start = base.naive_local().date();
        let scan_days = self.config.weekly_scan_days.max(1);

        let mut last_candidate = None;
        for offset in 0..scan_days {
            let date = start.checked_add_days(Days::new(u64::from(offset)))?;
            let candidate = at_wall_clock(&zone, date, time)?;
            let weekday = date.weekday().num_days_from_sunday() as u8;
            if rule.weekdays.contains(&weekday) && candidate > *base {
                return Some(candidate);
            }
            last_candidate = Some(candidate);
        }

        debug!(
            "event=next_due module=schedule status=fallback reason=no_matching_weekday scanned_days={scan_days}"
        );
        last_candidate
    }

    fn monthly_due<Tz: TimeZone>(
        &self,
        rule: &CadenceRule,
        base: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let time = self.time_for(rule);
        let zone = base.timezone();
        let local = base.naive_local();
        let day = rule.day_or_default();

        let candidate = at_month_day(&zone, local.year(), local.month(), day, time)?;
        if candidate > *base {
            return Some(candidate);
        }

        let (year, month) = next_month(local.year(), local.month())?;
        at_month_day(&zone, year, month, day, time)
    }

    fn yearly_due<Tz: TimeZone>(
        &self,
        rule: &CadenceRule,
        base: &DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        let time = self.time_for(rule);
        let zone = base.timezone();
        let year = base.naive_local().year();
        let (month, day) = (rule.month_or_default(), rule.day_or_default());

        let candidate = at_month_day(&zone, year, month, day, time)?;
        if candidate > *base {
            return Some(candidate);
        }
        at_month_day(&zone, year.checked_add(1)?, month, day, time)
    }
}

/// Computes the next due instant with default schedule tunables.
pub fn next_due<Tz: TimeZone>(
    rule: Option<&CadenceRule>,
    last_reviewed_at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    CadenceCalculator::default().next_due(rule, last_reviewed_at, now)
}

fn interval_due<Tz: TimeZone>(
    rule: &CadenceRule,
    last_reviewed_at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    match last_reviewed_at {
        None => Some(now.clone()),
        Some(last) => last.clone().checked_add_signed(rule.interval()?),
    }
}

fn review_base<Tz: TimeZone>(
    last_reviewed_at: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    match last_reviewed_at {
        Some(last) if last > now => last.clone(),
        _ => now.clone(),
    }
}

fn at_month_day<Tz: TimeZone>(
    zone: &Tz,
    year: i32,
    month: u32,
    day: u32,
    time: TimeOfDay,
) -> Option<DateTime<Tz>> {
    let month = month.clamp(1, 12);
    let day = day.clamp(1, days_in_month(year, month)?);
    at_wall_clock(zone, NaiveDate::from_ymd_opt(year, month, day)?, time)
}

fn at_wall_clock<Tz: TimeZone>(zone: &Tz, date: NaiveDate, time: TimeOfDay) -> Option<DateTime<Tz>> {
    resolve_local(zone, date.and_time(time.to_naive_time()))
}

/// Maps a wall-clock reading to an instant.
///
/// Ambiguous readings take the earliest instant; readings inside a DST gap
/// are shifted forward one hour.
fn resolve_local<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        zone.from_local_datetime(&shifted).earliest()
    })
}

fn next_month(year: i32, month: u32) -> Option<(i32, u32)> {
    if month >= 12 {
        Some((year.checked_add(1)?, 1))
    } else {
        Some((year, month + 1))
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = next_month(year, month)?;
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last_day| last_day.day())
}
