//! Immutable records produced by the output parsers.
//!
//! Every record is built fresh from one command's output and never mutated in
//! place afterwards. Fields mirror what the corresponding git command prints.

use crate::core::git_status::FileStatusType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    pub old_path: Option<String>,
    pub index_status: FileStatusType,
    pub worktree_status: FileStatusType,
    /// The raw two-letter code, e.g. `"M "` or `"??"`
    pub code: String,
}

impl FileStatus {
    pub fn is_staged(&self) -> bool {
        self.index_status.is_change()
            && !matches!(
                self.index_status,
                FileStatusType::Untracked | FileStatusType::Unmerged
            )
    }

    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    pub fn is_conflicted(&self) -> bool {
        matches!(
            self.code.as_str(),
            "DD" | "AU" | "UD" | "UA" | "DU" | "AA" | "UU"
        )
    }
}

/// Branch, upstream and divergence reported by the `## ` header of
/// `git status --porcelain --branch`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHeader {
    /// `None` when HEAD is detached
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub detached: bool,
    /// The branch has no commits yet
    pub unborn: bool,
}

/// One line of `git branch -a -vv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Short name; remote branches keep their remote prefix (`origin/main`)
    pub name: String,
    pub full_ref: String,
    pub is_local: bool,
    pub is_remote: bool,
    pub is_current: bool,
    pub is_protected: bool,
    pub upstream: Option<String>,
    pub ahead_by: Option<u32>,
    pub behind_by: Option<u32>,
    pub last_commit_hash: Option<String>,
    pub last_commit_message: Option<String>,
}

impl Branch {
    /// Name without the remote prefix: `origin/release/1.0` becomes `release/1.0`.
    pub fn short_name(&self) -> &str {
        if self.is_remote {
            self.name
                .split_once('/')
                .map(|(_, rest)| rest)
                .unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}

/// Identity and timestamp of an author or committer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub author: Signature,
    pub committer: Signature,
    pub parents: Vec<String>,
    pub refs: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Annotated,
    Lightweight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub kind: TagKind,
    /// Hash of the tag object (annotated) or of the tagged commit (lightweight)
    pub object_hash: String,
    /// Commit the tag ultimately points at
    pub target_hash: String,
    pub tagger_name: Option<String>,
    pub tagger_email: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stash {
    pub index: usize,
    pub hash: String,
    pub branch: Option<String>,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub fetch_url: Option<String>,
    pub push_url: Option<String>,
}

/// How both sides of a merge touched a conflicted path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    BothModified,
    BothAdded,
    AddedByUs,
    AddedByThem,
    DeletedByUs,
    DeletedByThem,
}

impl ConflictKind {
    /// Map a porcelain code; `DD` and non-conflict codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "UU" => Some(ConflictKind::BothModified),
            "AA" => Some(ConflictKind::BothAdded),
            "AU" => Some(ConflictKind::AddedByUs),
            "UA" => Some(ConflictKind::AddedByThem),
            "DU" => Some(ConflictKind::DeletedByUs),
            "UD" => Some(ConflictKind::DeletedByThem),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConflictKind::BothModified => "both modified",
            ConflictKind::BothAdded => "both added",
            ConflictKind::AddedByUs => "added by us",
            ConflictKind::AddedByThem => "added by them",
            ConflictKind::DeletedByUs => "deleted by us",
            ConflictKind::DeletedByThem => "deleted by them",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub path: String,
    pub kind: ConflictKind,
}

/// One `<<<<<<<` ... `>>>>>>>` region of a conflicted file. Line numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegion {
    pub start_line: usize,
    /// Line of the diff3 `|||||||` marker, if present
    pub base_line: Option<usize>,
    pub divider_line: usize,
    pub end_line: usize,
    pub ours: Vec<String>,
    pub base: Vec<String>,
    pub theirs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflogEntry {
    pub hash: String,
    /// e.g. `HEAD@{0}`
    pub selector: String,
    /// e.g. `checkout`, `commit (amend)`
    pub action: String,
    pub message: String,
}
