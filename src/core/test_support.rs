//! Scripted [`CommandRunner`] for unit tests.

use crate::core::command::{CommandOutput, CommandRunner};
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Answers git invocations from a table keyed by repository and subcommand
/// (the first argument). Unscripted invocations exit with code 1.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<(PathBuf, String), CommandOutput>>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    delay: Option<Duration>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, repo: &Path, subcommand: &str, stdout: &str) -> Self {
        self.set(repo, subcommand, stdout);
        self
    }

    pub fn fail(self, repo: &Path, subcommand: &str, exit_code: i32, stderr: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (repo.to_path_buf(), subcommand.to_string()),
            CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code,
            },
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a healthy repository on `branch` with a remote and clean tree.
    pub fn healthy(self, repo: &Path, branch: &str) -> Self {
        self.respond(repo, "rev-parse", "true\n")
            .respond(repo, "status", &format!("## {branch}...origin/{branch}\n"))
            .respond(repo, "remote", "origin\t/tmp/origin (fetch)\norigin\t/tmp/origin (push)\n")
    }

    /// Replace a response while the runner is in use.
    pub fn set(&self, repo: &Path, subcommand: &str, stdout: &str) {
        self.responses.lock().unwrap().insert(
            (repo.to_path_buf(), subcommand.to_string()),
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            },
        );
    }

    pub fn call_count(&self, subcommand: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, args)| args.first().map(String::as_str) == Some(subcommand))
            .count()
    }

    pub fn calls_for(&self, repo: &Path) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path == repo)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push((
            repo.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = (
            repo.to_path_buf(),
            args.first().copied().unwrap_or_default().to_string(),
        );
        let response = self.responses.lock().unwrap().get(&key).cloned();
        Ok(response.unwrap_or_else(|| CommandOutput {
            stdout: String::new(),
            stderr: format!("unscripted: git {}", args.join(" ")),
            exit_code: 1,
        }))
    }
}
