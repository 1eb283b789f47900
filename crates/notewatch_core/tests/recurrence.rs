use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::America::New_York;
use notewatch_core::{next_due, CadenceCalculator, CadenceKind, CadenceRule, ScheduleConfig, TimeOfDay};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn nine() -> TimeOfDay {
    TimeOfDay::new(9, 0).unwrap()
}

#[test]
fn interval_due_is_last_review_plus_offset_regardless_of_now() {
    let rule = CadenceRule::every(4, 0);
    let last = at(2024, 3, 1, 22, 15);
    for now in [at(2024, 3, 1, 22, 16), at(2024, 3, 9, 0, 0), at(2023, 1, 1, 0, 0)] {
        assert_eq!(next_due(Some(&rule), Some(&last), &now), last + Duration::hours(4));
    }

    let with_minutes = CadenceRule::every(1, 30);
    assert_eq!(
        next_due(Some(&with_minutes), Some(&last), &last),
        last + Duration::minutes(90)
    );
}

#[test]
fn interval_rule_is_due_immediately_when_never_reviewed() {
    let now = at(2024, 6, 1, 12, 0);
    assert_eq!(next_due(Some(&CadenceRule::every(4, 0)), None, &now), now);
}

#[test]
fn daily_rolls_to_today_when_fire_time_is_ahead() {
    let rule = CadenceRule::daily(nine());
    let due = next_due(Some(&rule), Some(&at(2024, 1, 1, 10, 0)), &at(2024, 1, 2, 8, 0));
    assert_eq!(due, at(2024, 1, 2, 9, 0));
}

#[test]
fn daily_rolls_to_tomorrow_once_fire_time_passed_or_reached() {
    let rule = CadenceRule::daily(nine());
    let last = at(2024, 1, 1, 10, 0);
    assert_eq!(
        next_due(Some(&rule), Some(&last), &at(2024, 1, 2, 9, 30)),
        at(2024, 1, 3, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), Some(&last), &at(2024, 1, 2, 9, 0)),
        at(2024, 1, 3, 9, 0)
    );
}

#[test]
fn daily_without_time_uses_nine_oclock() {
    let rule = CadenceRule::of_kind(CadenceKind::Daily);
    assert_eq!(next_due(Some(&rule), None, &at(2024, 1, 2, 7, 0)), at(2024, 1, 2, 9, 0));
}

#[test]
fn future_last_review_becomes_the_search_base() {
    let rule = CadenceRule::daily(nine());
    let future_review = at(2024, 1, 5, 10, 0);
    let due = next_due(Some(&rule), Some(&future_review), &at(2024, 1, 2, 8, 0));
    assert_eq!(due, at(2024, 1, 6, 9, 0));
}

#[test]
fn weekly_picks_next_configured_weekday() {
    // 2024-01-02 is a Tuesday; 1 = Monday, 3 = Wednesday.
    let rule = CadenceRule::weekly(nine(), [1, 3]);
    let due = next_due(Some(&rule), None, &at(2024, 1, 2, 10, 0));
    assert_eq!(due, at(2024, 1, 3, 9, 0));
}

#[test]
fn weekly_skips_today_once_fire_time_reached() {
    let rule = CadenceRule::weekly(nine(), [1, 3]);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 3, 8, 59)),
        at(2024, 1, 3, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 3, 9, 0)),
        at(2024, 1, 8, 9, 0)
    );
}

#[test]
fn weekly_sunday_is_day_zero() {
    let rule = CadenceRule::weekly(nine(), [0]);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 2, 10, 0)),
        at(2024, 1, 7, 9, 0)
    );
}

#[test]
fn weekly_without_matching_weekday_returns_last_scanned_candidate() {
    let empty = CadenceRule::weekly(nine(), Vec::<u8>::new());
    let now = at(2024, 1, 2, 10, 0);
    assert_eq!(next_due(Some(&empty), None, &now), at(2024, 1, 15, 9, 0));

    let out_of_range = CadenceRule::weekly(nine(), [7, 9]);
    assert_eq!(next_due(Some(&out_of_range), None, &now), at(2024, 1, 15, 9, 0));
}

#[test]
fn weekly_scan_bound_follows_config() {
    let calculator = CadenceCalculator::new(ScheduleConfig {
        weekly_scan_days: 7,
        ..ScheduleConfig::default()
    });
    let empty = CadenceRule::weekly(nine(), Vec::<u8>::new());
    assert_eq!(
        calculator.next_due(Some(&empty), None, &at(2024, 1, 2, 10, 0)),
        at(2024, 1, 8, 9, 0)
    );
}

#[test]
fn monthly_uses_current_month_until_target_passes() {
    let rule = CadenceRule::monthly(nine(), 15);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 10, 12, 0)),
        at(2024, 1, 15, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 15, 9, 0)),
        at(2024, 2, 15, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 20, 0, 0)),
        at(2024, 2, 15, 9, 0)
    );
}

#[test]
fn monthly_rolls_over_year_end() {
    let rule = CadenceRule::monthly(nine(), 5);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 12, 20, 0, 0)),
        at(2025, 1, 5, 9, 0)
    );
}

#[test]
fn monthly_clamps_day_to_month_length() {
    let rule = CadenceRule::monthly(nine(), 31);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 2, 10, 0, 0)),
        at(2024, 2, 29, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 2, 29, 10, 0)),
        at(2024, 3, 31, 9, 0)
    );

    let zero_day = CadenceRule::monthly(nine(), 0);
    assert_eq!(
        next_due(Some(&zero_day), None, &at(2024, 2, 10, 0, 0)),
        at(2024, 3, 1, 9, 0)
    );
}

#[test]
fn yearly_targets_month_and_day_then_next_year() {
    let rule = CadenceRule::yearly(nine(), 3, 10);
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 1, 1, 0, 0)),
        at(2024, 3, 10, 9, 0)
    );
    assert_eq!(
        next_due(Some(&rule), None, &at(2024, 3, 10, 10, 0)),
        at(2025, 3, 10, 9, 0)
    );
}

#[test]
fn yearly_clamps_leap_day_and_month() {
    let leap_day = CadenceRule::yearly(nine(), 2, 29);
    assert_eq!(
        next_due(Some(&leap_day), None, &at(2024, 3, 1, 0, 0)),
        at(2025, 2, 28, 9, 0)
    );

    let month_thirteen = CadenceRule::yearly(nine(), 13, 1);
    assert_eq!(
        next_due(Some(&month_thirteen), None, &at(2024, 3, 1, 0, 0)),
        at(2024, 12, 1, 9, 0)
    );
}

#[test]
fn missing_rule_falls_back_to_twelve_hours_after_review() {
    let last = at(2024, 1, 1, 10, 0);
    let now = at(2024, 1, 3, 0, 0);
    assert_eq!(next_due(None, Some(&last), &now), last + Duration::hours(12));
    assert_eq!(next_due::<Utc>(None, None, &now), now);
}

#[test]
fn next_due_is_deterministic() {
    let rules = [
        CadenceRule::every(3, 15),
        CadenceRule::daily(nine()),
        CadenceRule::weekly(nine(), [2, 5]),
        CadenceRule::monthly(nine(), 28),
        CadenceRule::yearly(nine(), 7, 4),
    ];
    let last = at(2024, 4, 2, 13, 0);
    let now = at(2024, 4, 3, 8, 45);
    for rule in &rules {
        let first = next_due(Some(rule), Some(&last), &now);
        let second = next_due(Some(rule), Some(&last), &now);
        assert_eq!(first, second, "rule {:?} should be pure", rule.kind);
    }
}

#[test]
fn calendar_results_are_strictly_after_base() {
    let rules = [
        CadenceRule::daily(nine()),
        CadenceRule::weekly(nine(), [0, 1, 2, 3, 4, 5, 6]),
        CadenceRule::monthly(nine(), 1),
        CadenceRule::yearly(nine(), 1, 1),
    ];
    let mut now = at(2024, 1, 1, 0, 0);
    while now < at(2024, 1, 4, 0, 0) {
        for rule in &rules {
            assert!(next_due(Some(rule), None, &now) > now);
        }
        now += Duration::minutes(30);
    }
}

#[test]
fn daily_fire_time_inside_spring_forward_gap_moves_one_hour_later() {
    let rule = CadenceRule::daily(TimeOfDay::new(2, 30).unwrap());
    let now = New_York.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();

    let due = next_due(Some(&rule), None, &now);

    assert_eq!(due, New_York.with_ymd_and_hms(2024, 3, 10, 3, 30, 0).unwrap());
    assert_eq!(due.with_timezone(&Utc), at(2024, 3, 10, 7, 30));
}

#[test]
fn daily_fire_time_repeated_by_fall_back_takes_earlier_instant() {
    let rule = CadenceRule::daily(TimeOfDay::new(1, 30).unwrap());
    let now = New_York.with_ymd_and_hms(2024, 11, 3, 0, 0, 0).unwrap();

    let due = next_due(Some(&rule), None, &now);

    // 01:30 EDT, not the 01:30 EST an hour later.
    assert_eq!(due.with_timezone(&Utc), at(2024, 11, 3, 5, 30));
    assert_eq!(
        due,
        New_York.with_ymd_and_hms(2024, 11, 3, 1, 30, 0).earliest().unwrap()
    );
}

#[test]
fn monthly_rule_landing_in_gap_shifts_forward() {
    let rule = CadenceRule::monthly(TimeOfDay::new(2, 15).unwrap(), 10);
    let now = New_York.with_ymd_and_hms(2024, 2, 20, 12, 0, 0).unwrap();

    let due = next_due(Some(&rule), None, &now);

    assert_eq!(due.with_timezone(&Utc), at(2024, 3, 10, 7, 15));
}
