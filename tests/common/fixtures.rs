//! Test data generation utilities and predefined scenarios
//!
//! Provides repositories in specific states and isolated config locations so
//! tests never touch the user's real configuration.

#![allow(dead_code)]

use super::repository::*;
use git_fleet::core::error::{FleetError, Result};
use std::path::PathBuf;
use tempfile::TempDir;

/// Scenario: clean repository on `main` with one commit
pub fn create_clean_repo() -> Result<TestRepo> {
    setup_test_repo_with_initial_commit()
}

/// Scenario: committed repository with an untracked and a modified file
pub fn create_dirty_repo() -> Result<TestRepo> {
    let repo = setup_test_repo_with_initial_commit()?;
    create_file(&repo.path, "initial.txt", "changed\n")?;
    create_file(&repo.path, "untracked.txt", "new\n")?;
    Ok(repo)
}

/// Scenario: repository checked out on `feature` that also has `main`
pub fn create_repo_on_feature() -> Result<TestRepo> {
    let repo = setup_test_repo_with_initial_commit()?;
    create_branch(&repo.path, "feature")?;
    checkout(&repo.path, "feature")?;
    commit_file(&repo.path, "feature.txt", "feature work\n", "Feature work")?;
    Ok(repo)
}

/// Scenario: repository with an `origin` that is two commits behind local `main`
pub fn create_repo_ahead_of_origin() -> Result<(TestRepo, TempDir)> {
    let repo = setup_test_repo_with_initial_commit()?;
    let origin = add_origin(&repo)?;
    commit_file(&repo.path, "one.txt", "1\n", "One")?;
    commit_file(&repo.path, "two.txt", "2\n", "Two")?;
    Ok((repo, origin))
}

/// A directory that exists but is not a git repository
pub fn create_plain_directory() -> Result<TempDir> {
    TempDir::new().map_err(FleetError::Io)
}

/// Isolated config location: the directory must outlive the test
pub struct TestConfig {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn test_config() -> Result<TestConfig> {
    let dir = TempDir::new().map_err(FleetError::Io)?;
    let path = dir.path().join("config.yaml");
    Ok(TestConfig { dir, path })
}
