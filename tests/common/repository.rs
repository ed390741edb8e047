//! Git repository management and setup utilities
//!
//! Repositories are real: created with `git init` inside a `TempDir`, so every
//! test exercises the same git output the library parses in production.

#![allow(dead_code)]

use git_fleet::core::error::{FleetError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test repository setup result containing both the temporary directory
/// and the repository path. The TempDir must be kept alive for the duration
/// of the test to prevent cleanup.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestRepo {
    /// Get the repository path as a reference
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Run git in `repo_path`, failing on a non-zero exit, and return stdout.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .map_err(FleetError::Io)?;
    if !output.status.success() {
        return Err(FleetError::command_failed(
            args,
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Sets up a fresh git repository on an unborn `main` branch, with identity
/// configured so commits never prompt.
pub fn setup_test_repo() -> Result<TestRepo> {
    let temp_dir = TempDir::new().map_err(FleetError::Io)?;
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "-q"])?;
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    git(&repo_path, &["config", "user.name", "Test User"])?;
    git(&repo_path, &["config", "user.email", "test@example.com"])?;
    git(&repo_path, &["config", "commit.gpgsign", "false"])?;

    Ok(TestRepo {
        temp_dir,
        path: repo_path,
    })
}

/// Sets up a git repository with an initial commit containing "initial.txt"
pub fn setup_test_repo_with_initial_commit() -> Result<TestRepo> {
    let repo = setup_test_repo()?;

    create_file(&repo.path, "initial.txt", "initial content\n")?;
    git_add(&repo.path, "initial.txt")?;
    git_commit(&repo.path, "Initial commit")?;

    Ok(repo)
}

/// Creates a file with specified content in the repository
pub fn create_file(repo_path: &Path, filename: &str, content: &str) -> Result<()> {
    fs::write(repo_path.join(filename), content).map_err(FleetError::Io)?;
    Ok(())
}

/// Adds a file to the git index ("." for all files)
pub fn git_add(repo_path: &Path, filename: &str) -> Result<()> {
    git(repo_path, &["add", filename])?;
    Ok(())
}

/// Creates a git commit with the specified message
pub fn git_commit(repo_path: &Path, message: &str) -> Result<()> {
    git(repo_path, &["commit", "-q", "-m", message])?;
    Ok(())
}

/// Writes, stages and commits a single file
pub fn commit_file(repo_path: &Path, filename: &str, content: &str, message: &str) -> Result<()> {
    create_file(repo_path, filename, content)?;
    git_add(repo_path, filename)?;
    git_commit(repo_path, message)
}

/// Creates a branch at HEAD without switching to it
pub fn create_branch(repo_path: &Path, branch: &str) -> Result<()> {
    git(repo_path, &["branch", branch])?;
    Ok(())
}

pub fn checkout(repo_path: &Path, branch: &str) -> Result<()> {
    git(repo_path, &["checkout", "-q", branch])?;
    Ok(())
}

pub fn current_branch(repo_path: &Path) -> Result<String> {
    Ok(git(repo_path, &["rev-parse", "--abbrev-ref", "HEAD"])?
        .trim()
        .to_string())
}

/// Creates a bare repository to serve as `origin`, pushes `main` to it and
/// sets it as upstream. The returned TempDir holds the bare repository.
pub fn add_origin(repo: &TestRepo) -> Result<TempDir> {
    let remote_dir = TempDir::new().map_err(FleetError::Io)?;
    git(remote_dir.path(), &["init", "-q", "--bare"])?;
    let remote_url = remote_dir.path().to_string_lossy().into_owned();
    git(&repo.path, &["remote", "add", "origin", &remote_url])?;
    git(&repo.path, &["push", "-q", "-u", "origin", "main"])?;
    Ok(remote_dir)
}
