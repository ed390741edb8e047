//! `git reflog --format=%H|%gd|%gs`
//!
//! ```text
//! 3f2a...|HEAD@{0}|checkout: moving from main to feature
//! 9c1d...|HEAD@{1}|commit (amend): Fix typo
//! ```

use super::Parsed;
use crate::core::records::ReflogEntry;

pub const REFLOG_FORMAT: &str = "--format=%H|%gd|%gs";

pub fn parse_reflog(output: &str) -> Vec<ReflogEntry> {
    parse_reflog_with_report(output).into_items("reflog")
}

pub fn parse_reflog_with_report(output: &str) -> Parsed<ReflogEntry> {
    let mut parsed = Parsed::default();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        parsed.push(parse_reflog_line(line));
    }
    parsed
}

fn parse_reflog_line(line: &str) -> Option<ReflogEntry> {
    let mut fields = line.splitn(3, '|');
    let hash = fields.next().filter(|h| !h.is_empty())?;
    let selector = fields.next().filter(|s| !s.is_empty())?;
    let subject = fields.next()?;

    let (action, message) = match subject.split_once(": ") {
        Some((action, message)) => (action, message),
        None => (subject, ""),
    };

    Some(ReflogEntry {
        hash: hash.to_string(),
        selector: selector.to_string(),
        action: action.trim().to_string(),
        message: message.trim().to_string(),
    })
}
