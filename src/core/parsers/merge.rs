//! Conflicted paths from `git status --porcelain`.

use super::Parsed;
use crate::core::records::{ConflictKind, MergeConflict};

pub fn parse_merge_conflicts(output: &str) -> Vec<MergeConflict> {
    parse_merge_conflicts_with_report(output).into_items("merge conflict")
}

/// Only malformed lines count as skipped; non-conflict codes and `DD` are
/// simply not conflicts worth reporting.
pub fn parse_merge_conflicts_with_report(output: &str) -> Parsed<MergeConflict> {
    let mut parsed = Parsed::default();
    for line in output.lines() {
        if line.is_empty() || line.starts_with("## ") {
            continue;
        }
        let (Some(code), Some(path)) = (line.get(..2), line.get(3..)) else {
            parsed.skipped += 1;
            continue;
        };
        if path.is_empty() {
            parsed.skipped += 1;
            continue;
        }
        if let Some(kind) = ConflictKind::from_code(code) {
            parsed.items.push(MergeConflict {
                path: path.to_string(),
                kind,
            });
        }
    }
    parsed
}
