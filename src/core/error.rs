//! Domain-specific error types and error handling utilities.
//!
//! This module defines [`FleetError`] which covers every failure git-fleet can report.
//! It uses `thiserror` for ergonomic error definitions and includes constructors for
//! the common failure scenarios.
//!
//! # Public API
//! - [`FleetError`]: Main error enum covering all failure modes
//! - [`Result<T>`]: Type alias for `std::result::Result<T, FleetError>`
//!
//! # Error Categories
//! - **Repository probing**: missing directories, non-repositories, failed commands.
//!   These never escape a refresh; the orchestrator turns them into a broken status.
//! - **Configuration**: unreadable or unparsable config files, failed saves
//! - **Workspace actions**: duplicate or unknown repositories, bulk checkout failures

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Domain-specific error types for git-fleet
#[derive(Error, Debug)]
pub enum FleetError {
    // Repository probing errors
    #[error("Repository directory does not exist: {path}")]
    RepositoryNotFound { path: PathBuf },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("git executable has not been resolved yet")]
    GitExecutableUnresolved,

    #[error("git {args} exited with code {exit_code}: {stderr}")]
    CommandFailed {
        args: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("git {args} timed out after {}s", timeout.as_secs())]
    CommandTimeout { args: String, timeout: Duration },

    #[error("Failed to spawn git: {source}")]
    CommandSpawn { source: std::io::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Could not find configuration directory")]
    ConfigDirectoryNotFound,

    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize configuration: {source}")]
    ConfigSerialize { source: serde_yaml::Error },

    #[error("Failed to save config file '{path}': {source}")]
    ConfigSave {
        path: PathBuf,
        source: std::io::Error,
    },

    // Workspace errors
    #[error("Repository is already tracked: {path}")]
    RepositoryAlreadyTracked { path: PathBuf },

    #[error("Repository is not tracked: {path}")]
    RepositoryNotTracked { path: PathBuf },

    #[error("No workspace named '{name}'")]
    UnknownWorkspace { name: String },

    #[error("Branch '{branch}' is not protected; bulk checkout is only offered for protected branches")]
    BranchNotProtected { branch: String },

    #[error("Checkout of '{branch}' failed in {path}: {message}")]
    CheckoutFailed {
        path: PathBuf,
        branch: String,
        message: String,
    },

    #[error("Invalid protected branch pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    // Filesystem watch errors
    #[error("Filesystem watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results using FleetError
pub type Result<T> = std::result::Result<T, FleetError>;

impl FleetError {
    /// Create a repository not found error
    pub fn repository_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RepositoryNotFound { path: path.into() }
    }

    /// Create a not-a-repository error
    pub fn not_a_repository(path: impl Into<PathBuf>) -> Self {
        Self::NotARepository { path: path.into() }
    }

    /// Create a command failed error from the arguments that were run
    pub fn command_failed(args: &[&str], exit_code: i32, stderr: impl AsRef<str>) -> Self {
        Self::CommandFailed {
            args: args.join(" "),
            exit_code,
            stderr: stderr.as_ref().trim().to_string(),
        }
    }

    /// Create a command timeout error
    pub fn command_timeout(args: &[&str], timeout: Duration) -> Self {
        Self::CommandTimeout {
            args: args.join(" "),
            timeout,
        }
    }

    pub fn config_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }

    pub fn config_parse(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            path: path.into(),
            source,
        }
    }

    pub fn config_save(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigSave {
            path: path.into(),
            source,
        }
    }

    /// Create an already-tracked error
    pub fn repository_already_tracked(path: impl Into<PathBuf>) -> Self {
        Self::RepositoryAlreadyTracked { path: path.into() }
    }

    /// Create a not-tracked error
    pub fn repository_not_tracked(path: impl Into<PathBuf>) -> Self {
        Self::RepositoryNotTracked { path: path.into() }
    }

    pub fn unknown_workspace(name: impl Into<String>) -> Self {
        Self::UnknownWorkspace { name: name.into() }
    }

    pub fn branch_not_protected(branch: impl Into<String>) -> Self {
        Self::BranchNotProtected {
            branch: branch.into(),
        }
    }

    /// Create a checkout failed error for one repository of a bulk checkout
    pub fn checkout_failed(
        path: impl Into<PathBuf>,
        branch: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CheckoutFailed {
            path: path.into(),
            branch: branch.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::GitExecutableUnresolved;
        assert_eq!(err.to_string(), "git executable has not been resolved yet");
    }

    #[test]
    fn test_repository_not_found_error() {
        let err = FleetError::repository_not_found("/src/gone");
        assert_eq!(
            err.to_string(),
            "Repository directory does not exist: /src/gone"
        );
    }

    #[test]
    fn test_command_failed_joins_args_and_trims_stderr() {
        let err = FleetError::command_failed(&["status", "--porcelain"], 128, "fatal: bad\n");
        assert_eq!(
            err.to_string(),
            "git status --porcelain exited with code 128: fatal: bad"
        );
    }

    #[test]
    fn test_command_timeout_error() {
        let err = FleetError::command_timeout(&["fetch"], Duration::from_secs(30));
        assert_eq!(err.to_string(), "git fetch timed out after 30s");
    }

    #[test]
    fn test_config_save_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = FleetError::config_save("/etc/fleet/config.yaml", io_err);
        assert!(err.to_string().contains("/etc/fleet/config.yaml"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_config_parse_error() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: [a list").unwrap_err();
        let err = FleetError::config_parse("/tmp/config.yaml", yaml_err);
        assert!(err.to_string().contains("Failed to parse"));
        assert!(err.to_string().contains("/tmp/config.yaml"));
    }

    #[test]
    fn test_branch_not_protected_error() {
        let err = FleetError::branch_not_protected("feature/x");
        assert!(err.to_string().contains("'feature/x' is not protected"));
    }

    #[test]
    fn test_checkout_failed_error() {
        let err = FleetError::checkout_failed("/src/a", "main", "local changes");
        assert_eq!(
            err.to_string(),
            "Checkout of 'main' failed in /src/a: local changes"
        );
    }
}
