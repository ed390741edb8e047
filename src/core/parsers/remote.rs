//! `git remote -v`
//!
//! ```text
//! origin	git@github.com:org/repo.git (fetch)
//! origin	git@github.com:org/repo.git (push)
//! ```

use super::Parsed;
use crate::core::records::Remote;
use once_cell::sync::Lazy;
use regex::Regex;

static REMOTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s+(\S+)\s+\((fetch|push)\)$").unwrap());

pub fn parse_remotes(output: &str) -> Vec<Remote> {
    parse_remotes_with_report(output).into_items("remote")
}

/// Remotes are returned in order of first appearance, one per name.
pub fn parse_remotes_with_report(output: &str) -> Parsed<Remote> {
    let mut parsed: Parsed<Remote> = Parsed::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("HEAD ->") {
            continue;
        }
        let Some(caps) = REMOTE_LINE.captures(line) else {
            parsed.skipped += 1;
            continue;
        };
        let (name, url, direction) = (&caps[1], &caps[2], &caps[3]);

        let position = match parsed.items.iter().position(|r| r.name == name) {
            Some(position) => position,
            None => {
                parsed.items.push(Remote {
                    name: name.to_string(),
                    fetch_url: None,
                    push_url: None,
                });
                parsed.items.len() - 1
            }
        };
        let remote = &mut parsed.items[position];
        match direction {
            "fetch" => remote.fetch_url = Some(url.to_string()),
            _ => remote.push_url = Some(url.to_string()),
        }
    }

    parsed
}
