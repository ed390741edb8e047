//! `git stash list --format=%gd|%H|%ct|%gs`
//!
//! ```text
//! stash@{0}|3f2a...|1704067200|WIP on main: abc1234 Fix bug
//! stash@{1}|9c1d...|1704060000|On feature: experiment
//! ```

use super::Parsed;
use crate::core::records::Stash;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

pub const STASH_FORMAT: &str = "--format=%gd|%H|%ct|%gs";

static STASH_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"stash@\{(\d+)\}").unwrap());
static STASH_BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:WIP on|(?i:on)) ([^:]+):\s*(.*)$").unwrap());

pub fn parse_stashes(output: &str) -> Vec<Stash> {
    parse_stashes_with_report(output).into_items("stash")
}

pub fn parse_stashes_with_report(output: &str) -> Parsed<Stash> {
    let mut parsed = Parsed::default();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        parsed.push(parse_stash_line(line));
    }
    parsed
}

fn parse_stash_line(line: &str) -> Option<Stash> {
    let fields: Vec<&str> = line.splitn(4, '|').collect();
    if fields.len() < 4 {
        return None;
    }

    let index = STASH_INDEX
        .captures(fields[0])?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;

    let raw_message = fields[3].trim();
    let (branch, message) = match STASH_BRANCH.captures(raw_message) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string(),
        ),
        None => (None, raw_message.to_string()),
    };

    Some(Stash {
        index,
        hash: fields[1].to_string(),
        branch,
        message,
        timestamp: fields[2]
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}
