//! Type-safe porcelain status letters.
//!
//! `git status --porcelain` reports two letters per file: the first describes the
//! index, the second the worktree. [`FileStatusType`] is the typed form of one letter.
//!
//! # Public API
//! - [`FileStatusType`]: Enumeration of every porcelain status letter
//!
//! # Key Features
//! - **Total mapping**: unknown letters map to [`FileStatusType::Unchanged`]
//! - **Display formatting**: round-trips to the porcelain letter for output
//! - **Descriptions**: human readable labels for status listings

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a file on one side (index or worktree) of a porcelain status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatusType {
    /// No change on this side (space)
    Unchanged,
    /// Modified file (M)
    Modified,
    /// Added/new file in index (A)
    Added,
    /// Deleted file (D)
    Deleted,
    /// Renamed file (R)
    Renamed,
    /// Copied file (C)
    Copied,
    /// Type changed (T)
    TypeChanged,
    /// Unmerged/conflicted (U)
    Unmerged,
    /// Untracked file (?)
    Untracked,
    /// Ignored file (!)
    Ignored,
}

impl FileStatusType {
    /// Map one porcelain status letter.
    pub fn from_code(code: char) -> Self {
        match code {
            'M' => FileStatusType::Modified,
            'A' => FileStatusType::Added,
            'D' => FileStatusType::Deleted,
            'R' => FileStatusType::Renamed,
            'C' => FileStatusType::Copied,
            'T' => FileStatusType::TypeChanged,
            'U' => FileStatusType::Unmerged,
            '?' => FileStatusType::Untracked,
            '!' => FileStatusType::Ignored,
            _ => FileStatusType::Unchanged,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            FileStatusType::Unchanged => ' ',
            FileStatusType::Modified => 'M',
            FileStatusType::Added => 'A',
            FileStatusType::Deleted => 'D',
            FileStatusType::Renamed => 'R',
            FileStatusType::Copied => 'C',
            FileStatusType::TypeChanged => 'T',
            FileStatusType::Unmerged => 'U',
            FileStatusType::Untracked => '?',
            FileStatusType::Ignored => '!',
        }
    }

    /// Get human-readable description for status
    pub fn description(&self) -> &'static str {
        match self {
            FileStatusType::Unchanged => "unchanged",
            FileStatusType::Modified => "modified",
            FileStatusType::Added => "new",
            FileStatusType::Deleted => "deleted",
            FileStatusType::Renamed => "renamed",
            FileStatusType::Copied => "copied",
            FileStatusType::TypeChanged => "type changed",
            FileStatusType::Unmerged => "unmerged",
            FileStatusType::Untracked => "untracked",
            FileStatusType::Ignored => "ignored",
        }
    }

    /// True for every letter that describes an actual change
    pub fn is_change(&self) -> bool {
        !matches!(self, FileStatusType::Unchanged | FileStatusType::Ignored)
    }
}

impl fmt::Display for FileStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<char> for FileStatusType {
    fn from(code: char) -> Self {
        FileStatusType::from_code(code)
    }
}
