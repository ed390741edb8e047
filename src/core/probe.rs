//! Gathering a [`RepositorySnapshot`] for one repository.
//!
//! Three git invocations are made, in order:
//! 1. `rev-parse --is-inside-work-tree` to confirm the directory is a repository
//! 2. `status --porcelain --branch` for branch, divergence and dirtiness
//! 3. `remote -v` to learn whether any remote is configured

use crate::core::command::CommandRunner;
use crate::core::error::{FleetError, Result};
use crate::core::parsers::{parse_remotes, parse_status, parse_status_header};
use crate::core::state::RepositorySnapshot;
use std::path::Path;

const IS_WORK_TREE: &[&str] = &["rev-parse", "--is-inside-work-tree"];
const STATUS: &[&str] = &["status", "--porcelain", "--branch", "--untracked-files=normal"];
const REMOTES: &[&str] = &["remote", "-v"];

pub async fn probe_repository(runner: &dyn CommandRunner, path: &Path) -> Result<RepositorySnapshot> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(FleetError::repository_not_found(path));
    }

    let work_tree = runner.run(path, IS_WORK_TREE).await?;
    if !work_tree.success() || work_tree.stdout.trim() != "true" {
        return Err(FleetError::not_a_repository(path));
    }

    let status_output = runner.run_checked(path, STATUS).await?;
    let header = parse_status_header(&status_output).unwrap_or_default();
    let files = parse_status(&status_output);

    let remotes_output = runner.run_checked(path, REMOTES).await?;
    let has_remote = !parse_remotes(&remotes_output).is_empty();

    Ok(RepositorySnapshot {
        current_branch: header.branch,
        is_detached: header.detached,
        has_remote,
        commits_ahead: header.ahead,
        commits_behind: header.behind,
        has_uncommitted_changes: files.iter().any(|f| {
            f.index_status.is_change() || f.worktree_status.is_change()
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ScriptedRunner;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_clean_repository_with_remote() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .respond(dir.path(), "rev-parse", "true\n")
            .respond(dir.path(), "status", "## main...origin/main [ahead 1]\n")
            .respond(dir.path(), "remote", "origin\t/tmp/o (fetch)\norigin\t/tmp/o (push)\n");

        let snapshot = probe_repository(&runner, dir.path()).await.unwrap();
        assert_eq!(
            snapshot,
            RepositorySnapshot {
                current_branch: Some("main".to_string()),
                is_detached: false,
                has_remote: true,
                commits_ahead: 1,
                commits_behind: 0,
                has_uncommitted_changes: false,
            }
        );
    }

    #[tokio::test]
    async fn test_probe_dirty_detached_repository() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .respond(dir.path(), "rev-parse", "true\n")
            .respond(dir.path(), "status", "## HEAD (no branch)\n?? new.txt\n")
            .respond(dir.path(), "remote", "");

        let snapshot = probe_repository(&runner, dir.path()).await.unwrap();
        assert!(snapshot.is_detached);
        assert_eq!(snapshot.current_branch, None);
        assert!(!snapshot.has_remote);
        assert!(snapshot.has_uncommitted_changes);
    }

    #[tokio::test]
    async fn test_probe_missing_directory() {
        let runner = ScriptedRunner::new();
        let err = probe_repository(&runner, Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::RepositoryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_probe_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().fail(dir.path(), "rev-parse", 128, "fatal: not a git repository");
        let err = probe_repository(&runner, dir.path()).await.unwrap_err();
        assert!(matches!(err, FleetError::NotARepository { .. }));
    }

    #[tokio::test]
    async fn test_probe_status_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .respond(dir.path(), "rev-parse", "true\n")
            .fail(dir.path(), "status", 128, "fatal: index file corrupt");
        let err = probe_repository(&runner, dir.path()).await.unwrap_err();
        assert!(matches!(err, FleetError::CommandFailed { exit_code: 128, .. }));
    }
}
