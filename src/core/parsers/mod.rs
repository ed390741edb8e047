//! Parsers turning git command output into typed records.
//!
//! Every parser is total: malformed lines or blocks are skipped and the valid
//! subset is returned. Git output is untrusted and varies across versions, and a
//! single odd line must never abort a status refresh.
//!
//! Each parser comes in two flavours:
//! - `parse_*` returns the records and logs how much input was skipped
//! - `parse_*_with_report` returns a [`Parsed`] carrying the skip count
//!
//! # Public API
//! - [`status`]: porcelain status lines and the `## branch` header
//! - [`branch`]: `git branch -a -vv`
//! - [`log`]: sentinel-separated `git log` records
//! - [`tag`]: `git for-each-ref refs/tags`
//! - [`stash`]: `git stash list`
//! - [`merge`]: conflicted paths from porcelain status
//! - [`conflict`]: conflict-marker regions inside a file
//! - [`reflog`]: `git reflog`
//! - [`remote`]: `git remote -v`

pub mod branch;
pub mod conflict;
pub mod log;
pub mod merge;
pub mod reflog;
pub mod remote;
pub mod stash;
pub mod status;
pub mod tag;

pub use branch::{parse_branches, parse_branches_with_report};
pub use conflict::{
    count_conflicts, parse_conflict_regions, remove_conflict_markers, Resolution,
};
pub use log::{log_format_args, parse_log, parse_log_with_report, LOG_RECORD_SEPARATOR};
pub use merge::{parse_merge_conflicts, parse_merge_conflicts_with_report};
pub use reflog::{parse_reflog, parse_reflog_with_report, REFLOG_FORMAT};
pub use remote::{parse_remotes, parse_remotes_with_report};
pub use stash::{parse_stashes, parse_stashes_with_report, STASH_FORMAT};
pub use status::{parse_status, parse_status_header, parse_status_with_report};
pub use tag::{parse_tags, parse_tags_with_report, tag_format_args};

/// Records recovered from one command output plus the number of skipped inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> Parsed<T> {
    /// Record the outcome of parsing one line or block.
    pub(crate) fn push(&mut self, item: Option<T>) {
        match item {
            Some(item) => self.items.push(item),
            None => self.skipped += 1,
        }
    }

    /// Drop the report, logging the skip count.
    pub fn into_items(self, what: &str) -> Vec<T> {
        if self.skipped > 0 {
            ::log::debug!(
                "Skipped {} unparseable {what} entries ({} parsed)",
                self.skipped,
                self.items.len()
            );
        }
        self.items
    }
}
