//! Running git in a repository.
//!
//! [`CommandRunner`] is the only way the rest of the crate talks to git. The
//! production implementation, [`GitCommandRunner`], spawns the executable that the
//! configuration resolved; tests substitute scripted runners.
//!
//! # Public API
//! - [`CommandOutput`]: captured stdout, stderr and exit code
//! - [`CommandRunner`]: async trait invoked with a repository path and arguments
//! - [`GitCommandRunner`]: `tokio::process` based runner with a hard timeout

use crate::core::config::ConfigLoadState;
use crate::core::constants::COMMAND_TIMEOUT;
use crate::core::error::{FleetError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Return stdout, or a [`FleetError::CommandFailed`] for a non-zero exit.
    pub fn into_stdout(self, args: &[&str]) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(FleetError::command_failed(
                args,
                self.exit_code,
                &self.stderr,
            ))
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run git with `args` inside `repo`. A non-zero exit is not an error here;
    /// only failing to run the command at all is.
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput>;

    /// Run and require a zero exit code.
    async fn run_checked(&self, repo: &Path, args: &[&str]) -> Result<String> {
        self.run(repo, args).await?.into_stdout(args)
    }
}

/// Runs the git executable published by the config store.
pub struct GitCommandRunner {
    config: watch::Receiver<ConfigLoadState>,
    timeout: Duration,
}

impl GitCommandRunner {
    pub fn new(config: watch::Receiver<ConfigLoadState>) -> Self {
        Self {
            config,
            timeout: COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for GitCommandRunner {
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput> {
        let executable = self
            .config
            .borrow()
            .git_executable()
            .map(Path::to_path_buf)
            .ok_or(FleetError::GitExecutableUnresolved)?;

        let mut cmd = Command::new(&executable);
        cmd.args(args)
            .current_dir(repo)
            // Parsers depend on untranslated output and must never block on a prompt.
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        log::debug!("Running git {} in {}", args.join(" "), repo.display());

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| FleetError::command_timeout(args, self.timeout))?
            .map_err(|source| FleetError::CommandSpawn { source })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
