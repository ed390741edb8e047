//! Sentinel-separated `git log` records.
//!
//! Each record starts with one pipe-delimited header line of eleven fields
//! followed by the commit body, and ends with [`LOG_RECORD_SEPARATOR`]:
//!
//! ```text
//! hash|short|author|author@x|2024-01-01T00:00:00Z|committer|c@x|2024-01-01T00:00:00Z|p1 p2|HEAD -> main|Subject
//! Body line
//! ---git-fleet-record---
//! ```

use super::Parsed;
use crate::core::records::{Commit, Signature};
use chrono::{DateTime, Utc};

pub const LOG_RECORD_SEPARATOR: &str = "---git-fleet-record---";

const FIELD_COUNT: usize = 11;

/// `git log` arguments producing output understood by [`parse_log`].
pub fn log_format_args() -> String {
    format!("--format=%H|%h|%an|%ae|%aI|%cn|%ce|%cI|%P|%D|%s%n%b%n{LOG_RECORD_SEPARATOR}")
}

pub fn parse_log(output: &str) -> Vec<Commit> {
    parse_log_with_report(output).into_items("log")
}

pub fn parse_log_with_report(output: &str) -> Parsed<Commit> {
    let mut parsed = Parsed::default();
    for block in output.split(LOG_RECORD_SEPARATOR) {
        let block = block.trim_start_matches(['\n', '\r']);
        if block.trim().is_empty() {
            continue;
        }
        parsed.push(parse_commit_block(block));
    }
    parsed
}

fn parse_commit_block(block: &str) -> Option<Commit> {
    let (header, body) = match block.split_once('\n') {
        Some((header, body)) => (header.trim_end_matches('\r'), body),
        None => (block, ""),
    };

    let fields: Vec<&str> = header.splitn(FIELD_COUNT, '|').collect();
    if fields.len() < FIELD_COUNT || fields[0].is_empty() {
        return None;
    }

    Some(Commit {
        hash: fields[0].to_string(),
        short_hash: fields[1].to_string(),
        author: signature(fields[2], fields[3], fields[4])?,
        committer: signature(fields[5], fields[6], fields[7])?,
        parents: fields[8].split_whitespace().map(str::to_string).collect(),
        refs: fields[9]
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
        subject: fields[10].to_string(),
        body: body.trim().to_string(),
    })
}

fn signature(name: &str, email: &str, date: &str) -> Option<Signature> {
    let date = DateTime::parse_from_rfc3339(date.trim()).ok()?;
    Some(Signature {
        name: name.to_string(),
        email: email.to_string(),
        date: date.with_timezone(&Utc),
    })
}
