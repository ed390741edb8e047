//! Per-repository status records held by the status cache.
//!
//! # Public API
//! - [`RepositoryStatus`]: `Unknown`, `Broken` or a full [`RepositorySnapshot`]
//! - [`BrokenReason`]: why the last refresh of a repository failed
//! - [`StatusCounters`]: the derived counts shown in summaries
//!
//! A status is always replaced as a whole; nothing mutates a snapshot in place.

use crate::core::error::FleetError;
use serde::{Deserialize, Serialize};

/// What a successful refresh learned about a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    /// `None` when HEAD is detached
    pub current_branch: Option<String>,
    pub is_detached: bool,
    pub has_remote: bool,
    pub commits_ahead: u32,
    pub commits_behind: u32,
    pub has_uncommitted_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrokenReason {
    /// The directory no longer exists
    Missing,
    /// The directory exists but is not a git working tree
    NotARepository,
    /// A git command failed, timed out or could not be spawned
    Failed { message: String },
}

impl From<&FleetError> for BrokenReason {
    fn from(error: &FleetError) -> Self {
        match error {
            FleetError::RepositoryNotFound { .. } => BrokenReason::Missing,
            FleetError::NotARepository { .. } => BrokenReason::NotARepository,
            other => BrokenReason::Failed {
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokenReason::Missing => write!(f, "directory missing"),
            BrokenReason::NotARepository => write!(f, "not a git repository"),
            BrokenReason::Failed { message } => write!(f, "{message}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// Not analyzed yet, or a refresh is in progress
    #[default]
    Unknown,
    /// The last refresh failed
    Broken { reason: BrokenReason },
    Analyzed(RepositorySnapshot),
}

impl RepositoryStatus {
    pub fn broken(reason: BrokenReason) -> Self {
        RepositoryStatus::Broken { reason }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RepositoryStatus::Unknown)
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, RepositoryStatus::Broken { .. })
    }

    pub fn snapshot(&self) -> Option<&RepositorySnapshot> {
        match self {
            RepositoryStatus::Analyzed(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// `false` only when the last refresh found the directory gone.
    pub fn exists(&self) -> bool {
        !matches!(
            self,
            RepositoryStatus::Broken {
                reason: BrokenReason::Missing
            }
        )
    }

    pub fn is_valid_repo(&self) -> bool {
        matches!(self, RepositoryStatus::Analyzed(_))
    }

    pub fn current_branch(&self) -> Option<&str> {
        self.snapshot()?.current_branch.as_deref()
    }

    pub fn has_remote(&self) -> bool {
        self.snapshot().is_some_and(|s| s.has_remote)
    }

    pub fn commits_ahead(&self) -> u32 {
        self.snapshot().map_or(0, |s| s.commits_ahead)
    }

    pub fn commits_behind(&self) -> u32 {
        self.snapshot().map_or(0, |s| s.commits_behind)
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.snapshot().is_some_and(|s| s.has_uncommitted_changes)
    }

    /// Ahead of or behind its upstream
    pub fn is_divergent(&self) -> bool {
        self.commits_ahead() > 0 || self.commits_behind() > 0
    }

    /// Dirty, broken or divergent
    pub fn needs_attention(&self) -> bool {
        self.is_broken() || self.has_uncommitted_changes() || self.is_divergent()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounters {
    pub needs_attention: usize,
    pub broken: usize,
    pub incoming_outgoing: usize,
    pub uncommitted: usize,
}

impl StatusCounters {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a RepositoryStatus>) -> Self {
        statuses
            .into_iter()
            .fold(StatusCounters::default(), |mut counters, status| {
                counters.needs_attention += usize::from(status.needs_attention());
                counters.broken += usize::from(status.is_broken());
                counters.incoming_outgoing += usize::from(status.is_divergent());
                counters.uncommitted += usize::from(status.has_uncommitted_changes());
                counters
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn analyzed(ahead: u32, behind: u32, dirty: bool) -> RepositoryStatus {
        RepositoryStatus::Analyzed(RepositorySnapshot {
            current_branch: Some("main".to_string()),
            is_detached: false,
            has_remote: true,
            commits_ahead: ahead,
            commits_behind: behind,
            has_uncommitted_changes: dirty,
        })
    }

    #[test]
    fn test_unknown_defaults() {
        let status = RepositoryStatus::default();
        assert!(status.is_unknown());
        assert!(status.exists());
        assert!(!status.is_valid_repo());
        assert_eq!(status.current_branch(), None);
        assert!(!status.needs_attention());
    }

    #[test]
    fn test_broken_reasons_from_errors() {
        let missing = FleetError::repository_not_found(PathBuf::from("/gone"));
        assert_eq!(BrokenReason::from(&missing), BrokenReason::Missing);

        let not_repo = FleetError::not_a_repository(PathBuf::from("/tmp"));
        assert_eq!(BrokenReason::from(&not_repo), BrokenReason::NotARepository);

        let failed = FleetError::command_failed(&["status"], 128, "fatal");
        assert!(matches!(
            BrokenReason::from(&failed),
            BrokenReason::Failed { .. }
        ));
    }

    #[test]
    fn test_exists_and_validity() {
        let missing = RepositoryStatus::broken(BrokenReason::Missing);
        assert!(!missing.exists());
        assert!(!missing.is_valid_repo());

        let not_repo = RepositoryStatus::broken(BrokenReason::NotARepository);
        assert!(not_repo.exists());
        assert!(!not_repo.is_valid_repo());

        assert!(analyzed(0, 0, false).is_valid_repo());
    }

    #[test]
    fn test_counters() {
        let statuses = vec![
            analyzed(0, 0, false),
            analyzed(1, 0, false),
            analyzed(0, 2, true),
            analyzed(0, 0, true),
            RepositoryStatus::broken(BrokenReason::Missing),
            RepositoryStatus::Unknown,
        ];
        let counters = StatusCounters::from_statuses(&statuses);
        assert_eq!(
            counters,
            StatusCounters {
                needs_attention: 4,
                broken: 1,
                incoming_outgoing: 2,
                uncommitted: 2,
            }
        );
    }
}
