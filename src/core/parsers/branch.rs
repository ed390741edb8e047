//! `git branch -a -vv`
//!
//! ```text
//! * main                  abc1234 [origin/main: ahead 2, behind 1] Fix bug
//!   feature               def5678 Work in progress
//!   remotes/origin/HEAD   -> origin/main
//!   remotes/origin/main   abc1234 Fix bug
//! ```

use super::Parsed;
use crate::core::records::Branch;
use once_cell::sync::Lazy;
use regex::Regex;

static COMMIT_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{7,40}$").unwrap());
static TRACKING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]:]+)(?::\s*([^\]]*))?\]").unwrap());
static AHEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"ahead (\d+)").unwrap());
static BEHIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"behind (\d+)").unwrap());

const REMOTES_PREFIX: &str = "remotes/";

pub fn parse_branches(output: &str) -> Vec<Branch> {
    parse_branches_with_report(output).into_items("branch")
}

pub fn parse_branches_with_report(output: &str) -> Parsed<Branch> {
    let mut parsed = Parsed::default();
    for line in output.lines() {
        if line.trim().is_empty() || is_pointer_line(line) {
            continue;
        }
        parsed.push(parse_branch_line(line));
    }
    parsed
}

/// `remotes/origin/HEAD -> origin/main` describes a symbolic ref, not a branch.
fn is_pointer_line(line: &str) -> bool {
    line.trim_start_matches(['*', '+'])
        .split_whitespace()
        .nth(1)
        == Some("->")
}

fn parse_branch_line(line: &str) -> Option<Branch> {
    let is_current = line.starts_with('*');
    // `+` marks a branch checked out in another worktree.
    let rest = line.trim_start_matches(['*', '+']).trim_start();

    // `(HEAD detached at abc1234)` is not a branch.
    if rest.starts_with('(') {
        return None;
    }

    let (raw_name, mut rest) = match rest.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (rest, ""),
    };
    if raw_name.is_empty() {
        return None;
    }

    let (name, is_remote) = match raw_name.strip_prefix(REMOTES_PREFIX) {
        Some(stripped) if !stripped.is_empty() => (stripped, true),
        Some(_) => return None,
        None => (raw_name, false),
    };

    let mut branch = Branch {
        name: name.to_string(),
        full_ref: if is_remote {
            format!("refs/remotes/{name}")
        } else {
            format!("refs/heads/{name}")
        },
        is_local: !is_remote,
        is_remote,
        is_current,
        is_protected: false,
        upstream: None,
        ahead_by: None,
        behind_by: None,
        last_commit_hash: None,
        last_commit_message: None,
    };

    if let Some((token, after)) = split_token(rest) {
        if COMMIT_HASH.is_match(token) {
            branch.last_commit_hash = Some(token.to_string());
            rest = after;
        }
    }

    if let Some(caps) = TRACKING.captures(rest) {
        let upstream = caps.get(1).map(|m| m.as_str().trim().to_string());
        let tracking = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if !tracking.contains("gone") {
            branch.ahead_by = Some(capture_count(&AHEAD, tracking));
            branch.behind_by = Some(capture_count(&BEHIND, tracking));
        }
        branch.upstream = upstream;
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        rest = rest[end..].trim_start();
    }

    let message = rest.trim();
    if !message.is_empty() {
        branch.last_commit_message = Some(message.to_string());
    }

    Some(branch)
}

fn split_token(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(match text.split_once(char::is_whitespace) {
        Some((token, after)) => (token, after.trim_start()),
        None => (text, ""),
    })
}

fn capture_count(pattern: &Regex, text: &str) -> u32 {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
