//! Rule payload encoder/decoder.
//!
//! Payload shape:
//! `type=<kind>;hours=<h>;minutes=<m>[;time=HH:MM][;days=d,d][;day=n][;month=n][;start=YYYY-MM-DD][;end=YYYY-MM-DD]`

use crate::codec::tag_line::CADENCE_TAG_PREFIX;
use crate::model::cadence::{CadenceKind, CadenceRule, TimeOfDay};
use chrono::NaiveDate;
use log::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serializes a rule into its single-line payload.
///
/// Field order is fixed. `hours`/`minutes` are always written (unset as `0`);
/// kind-specific fields are written only for kinds that read them.
pub fn encode(rule: &CadenceRule) -> String {
    let mut segments = vec![
        format!("type={}", rule.kind.as_str()),
        format!("hours={}", rule.hours.unwrap_or(0)),
        format!("minutes={}", rule.minutes.unwrap_or(0)),
    ];

    if rule.kind.uses_time_of_day() {
        if let Some(time) = rule.time {
            segments.push(format!("time={time}"));
        }
    }
    if rule.kind == CadenceKind::Weekly && !rule.weekdays.is_empty() {
        let days = rule
            .weekdays
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        segments.push(format!("days={days}"));
    }
    if rule.kind.uses_day_of_month() {
        if let Some(day) = rule.day_of_month {
            segments.push(format!("day={day}"));
        }
    }
    if rule.kind == CadenceKind::Yearly {
        if let Some(month) = rule.month {
            segments.push(format!("month={month}"));
        }
    }
    if let Some(start) = rule.start_date {
        segments.push(format!("start={}", start.format(DATE_FORMAT)));
    }
    if let Some(end) = rule.end_date {
        segments.push(format!("end={}", end.format(DATE_FORMAT)));
    }

    segments.join(";")
}

/// Parses a payload (optionally still carrying the tag prefix).
///
/// Unknown keys and unparseable values are ignored; the affected field stays
/// unset. Returns `None` only when no segment names a known `type`.
pub fn decode(payload: &str) -> Option<CadenceRule> {
    let trimmed = payload.trim();
    let body = trimmed.strip_prefix(CADENCE_TAG_PREFIX).unwrap_or(trimmed);

    let mut kind = None;
    let mut rule = CadenceRule::of_kind(CadenceKind::EveryInterval);

    for segment in body.split(';') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "type" => {
                if let Some(parsed) = CadenceKind::parse(value) {
                    kind = Some(parsed);
                }
            }
            "hours" => rule.hours = value.parse().ok(),
            "minutes" => rule.minutes = value.parse().ok(),
            "time" => rule.time = TimeOfDay::parse(value),
            "days" => {
                rule.weekdays = value
                    .split(',')
                    .filter_map(|day| day.trim().parse::<u8>().ok())
                    .collect();
            }
            "day" => rule.day_of_month = value.parse().ok(),
            "month" => rule.month = value.parse().ok(),
            "start" => rule.start_date = parse_date(value),
            "end" => rule.end_date = parse_date(value),
            _ => {}
        }
    }

    match kind {
        Some(kind) => {
            rule.kind = kind;
            Some(rule)
        }
        None => {
            debug!("event=cadence_decode module=codec status=rejected reason=missing_type");
            None
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::model::cadence::{CadenceKind, CadenceRule, TimeOfDay};
    use chrono::NaiveDate;

    #[test]
    fn encode_writes_fields_in_fixed_order() {
        let rule = CadenceRule::weekly(TimeOfDay::DEFAULT, [3, 1])
            .with_bounds(NaiveDate::from_ymd_opt(2024, 1, 1), None);
        assert_eq!(
            encode(&rule),
            "type=weekly;hours=168;minutes=0;time=09:00;days=1,3;start=2024-01-01"
        );
    }

    #[test]
    fn encode_skips_fields_irrelevant_to_kind() {
        let mut rule = CadenceRule::every(4, 30);
        rule.time = TimeOfDay::new(8, 0);
        rule.weekdays.insert(2);
        rule.month = Some(4);
        assert_eq!(encode(&rule), "type=interval;hours=4;minutes=30");
    }

    #[test]
    fn decode_drops_non_numeric_values_but_keeps_rule() {
        let rule = decode("type=monthly;hours=abc;minutes=0;day=x;time=25:00")
            .expect("type segment should be enough");
        assert_eq!(rule.kind, CadenceKind::Monthly);
        assert_eq!(rule.hours, None);
        assert_eq!(rule.day_of_month, None);
        assert_eq!(rule.time, None);
        assert_eq!(rule.time_or_default(), TimeOfDay::DEFAULT);
    }

    #[test]
    fn decode_ignores_unknown_and_malformed_segments() {
        let rule = decode(" type = daily ; colour=blue;;noequals;time=18:45 ").unwrap();
        assert_eq!(rule.kind, CadenceKind::Daily);
        assert_eq!(rule.time, TimeOfDay::new(18, 45));
    }

    #[test]
    fn decode_skips_bad_weekday_entries_individually() {
        let rule = decode("type=weekly;days=1, x,5,-2,300").unwrap();
        assert_eq!(rule.weekdays.into_iter().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn decode_accepts_full_tag_line() {
        let rule = decode("meta::review_cadence::type=interval;hours=2;minutes=15").unwrap();
        assert_eq!(rule, CadenceRule::every(2, 15));
    }

    #[test]
    fn decode_requires_known_type() {
        assert!(decode("garbage").is_none());
        assert!(decode("type=fortnightly;hours=1").is_none());
        assert!(decode("").is_none());
    }
}
