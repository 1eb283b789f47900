//! CLI probe for `notewatch_core`.
//!
//! # Responsibility
//! - Without arguments print linkage info.
//! - `review <note-id> [rfc3339]` records a review in the configured ledger.
//! - `<tag> [rfc3339 | note-id]` prints the review status at the current
//!   local time, taking the last review from the argument or the ledger.
//!
//! `NOTEWATCH_CONFIG` may point at a TOML config file. Its `database_path`
//! selects the ledger file; without it the ledger lives in memory.

use chrono::{DateTime, Local, TimeZone, Utc};
use notewatch_core::db::open_configured_db;
use notewatch_core::{
    decode, encode, init_logging, load_config, CadenceCalculator, NoteId, NotewatchConfig,
    OverdueEvaluator, ReviewLedger, SqliteReviewLedger,
};
use std::fmt::Display;
use std::process::ExitCode;

const CONFIG_ENV: &str = "NOTEWATCH_CONFIG";
const REVIEW_COMMAND: &str = "review";

#[derive(Debug, PartialEq)]
enum Command {
    Review {
        note_id: NoteId,
        reviewed_at: Option<DateTime<Utc>>,
    },
    Status {
        tag: String,
        last: LastReview,
    },
}

#[derive(Debug, PartialEq)]
enum LastReview {
    Never,
    At(DateTime<Utc>),
    Ledger(NoteId),
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        println!("notewatch_core ping={}", notewatch_core::ping());
        println!("notewatch_core version={}", notewatch_core::core_version());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &[String]) -> Result<Vec<String>, String> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => load_config(&path).map_err(|err| err.to_string())?,
        Err(_) => NotewatchConfig::default(),
    };
    start_logging(&config)?;

    let command = parse_command(args)?;
    let conn =
        open_configured_db(config.database_path.as_deref()).map_err(|err| err.to_string())?;
    let ledger = SqliteReviewLedger::try_new(&conn).map_err(|err| err.to_string())?;
    execute(command, &config, &ledger, &Local::now())
}

fn start_logging(config: &NotewatchConfig) -> Result<(), String> {
    let Some(dir) = config.log_dir.as_deref() else {
        return Ok(());
    };
    let dir = dir
        .to_str()
        .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", dir.display()))?;
    init_logging(&config.log_level, dir)
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some(first) = args.first() else {
        return Err("missing cadence tag or command".to_string());
    };

    if first == REVIEW_COMMAND {
        let raw_id = args
            .get(1)
            .ok_or_else(|| "usage: review <note-id> [rfc3339]".to_string())?;
        return Ok(Command::Review {
            note_id: parse_note_id(raw_id)?,
            reviewed_at: args.get(2).map(|raw| parse_instant(raw)).transpose()?,
        });
    }

    let last = match args.get(1) {
        None => LastReview::Never,
        Some(raw) => match NoteId::parse_str(raw) {
            Ok(note_id) => LastReview::Ledger(note_id),
            Err(_) => LastReview::At(parse_instant(raw)?),
        },
    };
    Ok(Command::Status {
        tag: first.clone(),
        last,
    })
}

fn execute<Tz>(
    command: Command,
    config: &NotewatchConfig,
    ledger: &dyn ReviewLedger,
    now: &DateTime<Tz>,
) -> Result<Vec<String>, String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match command {
        Command::Review {
            note_id,
            reviewed_at,
        } => {
            let reviewed_at = reviewed_at.unwrap_or_else(|| now.with_timezone(&Utc));
            ledger
                .record_review(note_id, reviewed_at)
                .map_err(|err| err.to_string())?;
            Ok(vec![
                format!("note_id={note_id}"),
                format!("reviewed_at={}", reviewed_at.to_rfc3339()),
            ])
        }
        Command::Status { tag, last } => {
            let zone = now.timezone();
            let last_reviewed_at = match last {
                LastReview::Never => None,
                LastReview::At(instant) => Some(instant),
                LastReview::Ledger(note_id) => ledger
                    .last_reviewed(note_id)
                    .map_err(|err| err.to_string())?,
            }
            .map(|instant| instant.with_timezone(&zone));

            let rule = decode(&tag);
            let evaluator = OverdueEvaluator::new(CadenceCalculator::new(config.schedule));
            let status = evaluator.evaluate(rule.as_ref(), last_reviewed_at.as_ref(), now);

            let rule_line = match rule {
                Some(rule) => format!("rule={}", encode(&rule)),
                None => format!(
                    "rule=none (fallback every {}m)",
                    config.schedule.fallback_interval_minutes
                ),
            };
            Ok(vec![
                rule_line,
                format!("state={}", status.state.as_str()),
                format!("next_due={}", status.next_due.to_rfc3339()),
                format!("last_reviewed={}", status.elapsed_text()),
                format!("remaining={}", status.remaining_text()),
            ])
        }
    }
}

fn parse_note_id(raw: &str) -> Result<NoteId, String> {
    NoteId::parse_str(raw).map_err(|err| format!("invalid note id `{raw}`: {err}"))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("invalid last-review instant `{raw}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{execute, parse_command, start_logging, Command, LastReview};
    use chrono::{TimeZone, Utc};
    use notewatch_core::db::open_db_in_memory;
    use notewatch_core::{NoteId, NotewatchConfig, ReviewLedger, SqliteReviewLedger};

    const NOTE: &str = "7f0c3b1e-2a4d-4c8e-9b6f-1d2e3f405162";
    const EVERY_FOUR_HOURS: &str = "meta::review_cadence::type=interval;hours=4;minutes=0";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn second_argument_selects_instant_or_ledger_entry() {
        let note_id = NoteId::parse_str(NOTE).unwrap();

        assert_eq!(
            parse_command(&args(&[EVERY_FOUR_HOURS])).unwrap(),
            Command::Status {
                tag: EVERY_FOUR_HOURS.to_string(),
                last: LastReview::Never,
            }
        );
        assert_eq!(
            parse_command(&args(&[EVERY_FOUR_HOURS, NOTE])).unwrap(),
            Command::Status {
                tag: EVERY_FOUR_HOURS.to_string(),
                last: LastReview::Ledger(note_id),
            }
        );
        assert_eq!(
            parse_command(&args(&[EVERY_FOUR_HOURS, "2024-03-01T10:00:00+02:00"])).unwrap(),
            Command::Status {
                tag: EVERY_FOUR_HOURS.to_string(),
                last: LastReview::At(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()),
            }
        );
        assert!(parse_command(&args(&[EVERY_FOUR_HOURS, "yesterday"])).is_err());
    }

    #[test]
    fn review_command_requires_a_valid_note_id() {
        assert!(parse_command(&args(&["review"])).is_err());
        assert!(parse_command(&args(&["review", "not-a-uuid"])).is_err());
        assert_eq!(
            parse_command(&args(&["review", NOTE])).unwrap(),
            Command::Review {
                note_id: NoteId::parse_str(NOTE).unwrap(),
                reviewed_at: None,
            }
        );
    }

    #[test]
    fn recorded_review_feeds_later_status() {
        let conn = open_db_in_memory().unwrap();
        let ledger = SqliteReviewLedger::try_new(&conn).unwrap();
        let config = NotewatchConfig::default();
        let note_id = NoteId::parse_str(NOTE).unwrap();
        let reviewed = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let recorded = execute(
            parse_command(&args(&["review", NOTE])).unwrap(),
            &config,
            &ledger,
            &reviewed,
        )
        .unwrap();
        assert_eq!(recorded[0], format!("note_id={NOTE}"));
        assert_eq!(ledger.last_reviewed(note_id).unwrap(), Some(reviewed));

        let lines = execute(
            parse_command(&args(&[EVERY_FOUR_HOURS, NOTE])).unwrap(),
            &config,
            &ledger,
            &now,
        )
        .unwrap();
        assert!(lines.contains(&"state=pending".to_string()));
        assert!(lines.contains(&format!("next_due={}", "2024-03-01T12:00:00+00:00")));
    }

    #[test]
    fn status_without_ledger_entry_is_fresh() {
        let conn = open_db_in_memory().unwrap();
        let ledger = SqliteReviewLedger::try_new(&conn).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let lines = execute(
            parse_command(&args(&[EVERY_FOUR_HOURS, NOTE])).unwrap(),
            &NotewatchConfig::default(),
            &ledger,
            &now,
        )
        .unwrap();

        assert!(lines.contains(&"state=fresh".to_string()));
        assert!(lines.contains(&"last_reviewed=never".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_log_dir_is_an_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use std::path::PathBuf;

        let config = NotewatchConfig {
            log_dir: Some(PathBuf::from(OsStr::from_bytes(b"/tmp/notewatch-\xff"))),
            ..NotewatchConfig::default()
        };

        let err = start_logging(&config).unwrap_err();
        assert!(err.contains("not valid UTF-8"));
    }
}
