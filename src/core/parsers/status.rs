//! `git status --porcelain [--branch]`
//!
//! ```text
//! ## main...origin/main [ahead 1, behind 2]
//!  M src/lib.rs
//! R  old.rs -> new.rs
//! ?? notes.txt
//! ```

use super::Parsed;
use crate::core::git_status::FileStatusType;
use crate::core::records::{FileStatus, StatusHeader};
use once_cell::sync::Lazy;
use regex::Regex;

static DIVERGENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:ahead (\d+))?(?:, )?(?:behind (\d+))?(gone)?\]$").unwrap());

pub fn parse_status(output: &str) -> Vec<FileStatus> {
    parse_status_with_report(output).into_items("status")
}

pub fn parse_status_with_report(output: &str) -> Parsed<FileStatus> {
    let mut parsed = Parsed::default();
    for line in output.lines() {
        if line.is_empty() || line.starts_with("## ") {
            continue;
        }
        parsed.push(parse_status_line(line));
    }
    parsed
}

fn parse_status_line(line: &str) -> Option<FileStatus> {
    let code = line.get(..2)?;
    if line.get(2..3)? != " " {
        return None;
    }
    let path_part = line.get(3..)?;
    if path_part.is_empty() {
        return None;
    }

    let mut letters = code.chars();
    let index_status = FileStatusType::from_code(letters.next()?);
    let worktree_status = FileStatusType::from_code(letters.next()?);

    let is_copy_or_rename = code.contains('R') || code.contains('C');
    let (old_path, path) = match path_part.split_once(" -> ") {
        Some((old, new)) if is_copy_or_rename => (Some(unquote(old)), unquote(new)),
        _ => (None, unquote(path_part)),
    };

    Some(FileStatus {
        path,
        old_path,
        index_status,
        worktree_status,
        code: code.to_string(),
    })
}

/// Git wraps paths containing special characters in double quotes and
/// C-escapes them, with non-ASCII bytes written as octal (`\303\251`).
fn unquote(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut rest = inner.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        rest = tail;
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some((&escaped, tail)) = rest.split_first() else {
            bytes.push(byte);
            break;
        };
        rest = tail;
        match escaped {
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                let digits = rest.iter().take(2).take_while(|b| (b'0'..=b'7').contains(*b)).count();
                for &digit in &rest[..digits] {
                    value = value * 8 + u32::from(digit - b'0');
                }
                rest = &rest[digits..];
                bytes.push(value as u8);
            }
            b'a' => bytes.push(0x07),
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0c),
            b'n' => bytes.push(b'\n'),
            b'r' => bytes.push(b'\r'),
            b't' => bytes.push(b'\t'),
            b'v' => bytes.push(0x0b),
            other => bytes.push(other),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse the `## ` header line emitted by `--branch`, if present.
pub fn parse_status_header(output: &str) -> Option<StatusHeader> {
    let line = output.lines().find(|l| l.starts_with("## "))?;
    let mut rest = line[3..].trim();
    let mut header = StatusHeader::default();

    if let Some(caps) = DIVERGENCE.captures(rest) {
        header.ahead = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        header.behind = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if let Some(whole) = caps.get(0) {
            rest = rest[..whole.start()].trim_end();
        }
    }

    if rest == "HEAD (no branch)" || rest.starts_with("HEAD (") {
        header.detached = true;
        return Some(header);
    }
    for prefix in ["No commits yet on ", "Initial commit on "] {
        if let Some(branch) = rest.strip_prefix(prefix) {
            header.unborn = true;
            header.branch = Some(branch.to_string());
            return Some(header);
        }
    }

    match rest.split_once("...") {
        Some((branch, upstream)) => {
            header.branch = Some(branch.to_string());
            header.upstream = Some(upstream.to_string());
        }
        None => header.branch = Some(rest.to_string()),
    }
    Some(header)
}
