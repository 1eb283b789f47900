//! Cadence tag line handling within free-form note text.
//!
//! The note store owns where lines live; this module only finds, rewrites,
//! or drops the line starting with `CADENCE_TAG_PREFIX`.

use crate::codec::rule_codec::{decode, encode};
use crate::model::cadence::CadenceRule;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed prefix identifying the cadence line inside a note.
pub const CADENCE_TAG_PREFIX: &str = "meta::review_cadence::";

static CADENCE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*meta::review_cadence::(.*)$").expect("valid cadence line regex")
});

/// Returns the payload of the first cadence line, if any.
pub fn find_cadence_line(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        CADENCE_LINE_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|payload| payload.as_str().trim())
    })
}

/// Decodes the note's cadence rule; `None` when absent or malformed.
pub fn read_cadence(text: &str) -> Option<CadenceRule> {
    find_cadence_line(text).and_then(decode)
}

/// Formats the full tag line for `rule`.
pub fn format_cadence_line(rule: &CadenceRule) -> String {
    format!("{CADENCE_TAG_PREFIX}{}", encode(rule))
}

/// Writes `rule` into `text`, preserving every non-cadence line.
///
/// The first existing cadence line is replaced in place and any later ones
/// are dropped. Without an existing line, the tag is appended as the last
/// line.
pub fn upsert_cadence_line(text: &str, rule: &CadenceRule) -> String {
    let tag_line = format_cadence_line(rule);
    let mut replaced = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if CADENCE_LINE_RE.is_match(line) {
            if !replaced {
                lines.push(tag_line.as_str());
                replaced = true;
            }
            continue;
        }
        lines.push(line);
    }

    if replaced {
        return lines.join("\n");
    }

    if text.is_empty() {
        tag_line
    } else if text.ends_with('\n') {
        format!("{text}{tag_line}\n")
    } else {
        format!("{text}\n{tag_line}")
    }
}

/// Removes every cadence line from `text`.
pub fn remove_cadence_line(text: &str) -> String {
    text.split('\n')
        .filter(|line| !CADENCE_LINE_RE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}
