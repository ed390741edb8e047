//! Refreshing cached repository status.
//!
//! [`RefreshOrchestrator`] is the only writer of the [`StatusCache`]. It refuses
//! to run while the configuration is still loading or no git executable has been
//! resolved, and it fires one full refresh as soon as the configuration becomes
//! ready, no matter whether it was built before or after that happened.

use crate::core::command::CommandRunner;
use crate::core::config::ConfigLoadState;
use crate::core::constants::SLOW_REFRESH_THRESHOLD;
use crate::core::probe::probe_repository;
use crate::core::state::{BrokenReason, RepositoryStatus};
use crate::core::status_cache::{StatusCache, StatusReader};
use futures_util::future::join_all;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub slow_refresh_threshold: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            slow_refresh_threshold: SLOW_REFRESH_THRESHOLD,
        }
    }
}

impl OrchestratorOptions {
    pub fn with_slow_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.slow_refresh_threshold = threshold;
        self
    }
}

/// Result of refreshing a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache entry was replaced with this status
    Refreshed(RepositoryStatus),
    /// Configuration not ready; the cache was not touched
    Skipped,
    /// The path is not tracked, or stopped being tracked mid-refresh
    Untracked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub broken: usize,
    pub skipped: bool,
}

pub struct RefreshOrchestrator {
    cache: StatusCache,
    runner: Arc<dyn CommandRunner>,
    config: watch::Receiver<ConfigLoadState>,
    options: OrchestratorOptions,
    startup_refreshed: AtomicBool,
    refresh_all_runs: AtomicUsize,
}

impl RefreshOrchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        config: watch::Receiver<ConfigLoadState>,
    ) -> Self {
        Self::with_options(runner, config, OrchestratorOptions::default())
    }

    pub fn with_options(
        runner: Arc<dyn CommandRunner>,
        config: watch::Receiver<ConfigLoadState>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            cache: StatusCache::new(),
            runner,
            config,
            options,
            startup_refreshed: AtomicBool::new(false),
            refresh_all_runs: AtomicUsize::new(0),
        }
    }

    pub fn reader(&self) -> StatusReader {
        self.cache.reader()
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.config.borrow().is_ready()
    }

    /// Number of `refresh_all` passes that actually ran.
    pub fn refresh_all_count(&self) -> usize {
        self.refresh_all_runs.load(Ordering::SeqCst)
    }

    pub(crate) fn track(&self, path: &Path) -> bool {
        self.cache.track(path)
    }

    pub(crate) fn untrack(&self, path: &Path) -> bool {
        self.cache.untrack(path)
    }

    pub async fn refresh_one(&self, path: &Path) -> RefreshOutcome {
        if !self.is_ready() {
            log::debug!(
                "Skipping refresh of {}: configuration not ready",
                path.display()
            );
            return RefreshOutcome::Skipped;
        }
        if !self.reader().is_tracked(path) {
            return RefreshOutcome::Untracked;
        }

        let started = Instant::now();
        let status = match probe_repository(self.runner.as_ref(), path).await {
            Ok(snapshot) => RepositoryStatus::Analyzed(snapshot),
            Err(e) => {
                let reason = BrokenReason::from(&e);
                log::warn!("Repository {} is broken: {reason}", path.display());
                RepositoryStatus::broken(reason)
            }
        };

        let elapsed = started.elapsed();
        if elapsed > self.options.slow_refresh_threshold {
            log::warn!(
                "slow refresh of {} took {} ms",
                path.display(),
                elapsed.as_millis()
            );
        }

        if self.cache.replace(path, status.clone()) {
            RefreshOutcome::Refreshed(status)
        } else {
            log::debug!("{} was untracked during refresh", path.display());
            RefreshOutcome::Untracked
        }
    }

    /// Reset every tracked repository to unknown, then refresh them all
    /// concurrently. One failing repository never affects the others.
    pub async fn refresh_all(&self) -> RefreshSummary {
        if !self.is_ready() {
            log::debug!("Skipping refresh of all repositories: configuration not ready");
            return RefreshSummary {
                skipped: true,
                ..Default::default()
            };
        }
        self.refresh_all_runs.fetch_add(1, Ordering::SeqCst);

        let started = Instant::now();
        let paths = self.cache.reset_all();
        let outcomes = join_all(paths.iter().map(|path| self.refresh_one(path))).await;

        let summary = outcomes
            .iter()
            .fold(RefreshSummary::default(), |mut summary, outcome| {
                if let RefreshOutcome::Refreshed(status) = outcome {
                    summary.refreshed += 1;
                    summary.broken += usize::from(status.is_broken());
                }
                summary
            });

        log::info!(
            "Refreshed {} repositories ({} broken) in {} ms",
            summary.refreshed,
            summary.broken,
            started.elapsed().as_millis()
        );
        summary
    }

    /// Wait until the configuration is ready, then run the startup
    /// `refresh_all`. Only the first caller runs it; later callers and callers
    /// racing with it get `None`.
    pub async fn refresh_when_config_ready(&self) -> Option<RefreshSummary> {
        let mut config = self.config.clone();
        let ready = config.wait_for(ConfigLoadState::is_ready).await.is_ok();
        if !ready {
            log::debug!("Configuration store dropped before becoming ready");
            return None;
        }
        if self.startup_refreshed.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.refresh_all().await)
    }

    pub fn spawn_startup_refresh(self: &Arc<Self>) -> JoinHandle<Option<RefreshSummary>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.refresh_when_config_ready().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ScriptedRunner;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ready() -> ConfigLoadState {
        ConfigLoadState::Loaded {
            git_executable: Some(PathBuf::from("/usr/bin/git")),
        }
    }

    fn orchestrator(
        runner: Arc<ScriptedRunner>,
        state: ConfigLoadState,
    ) -> (RefreshOrchestrator, watch::Sender<ConfigLoadState>) {
        let (tx, rx) = watch::channel(state);
        (RefreshOrchestrator::new(runner, rx), tx)
    }

    #[tokio::test]
    async fn test_refresh_one_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().healthy(dir.path(), "main"));
        let (orch, _tx) = orchestrator(runner, ready());
        orch.track(dir.path());

        let first = orch.refresh_one(dir.path()).await;
        let second = orch.refresh_one(dir.path()).await;
        assert_eq!(first, second);
        assert!(matches!(first, RefreshOutcome::Refreshed(ref s) if s.is_valid_repo()));
        assert_eq!(orch.reader().get_status(dir.path()).current_branch(), Some("main"));
    }

    #[tokio::test]
    async fn test_refresh_all_tolerates_partial_failure() {
        let good = TempDir::new().unwrap();
        let bad = TempDir::new().unwrap();
        let gone = good.path().join("deleted");
        let runner = Arc::new(
            ScriptedRunner::new()
                .healthy(good.path(), "main")
                .respond(bad.path(), "rev-parse", "true\n")
                .fail(bad.path(), "status", 128, "fatal: bad object HEAD"),
        );
        let (orch, _tx) = orchestrator(runner, ready());
        for path in [good.path(), bad.path(), gone.as_path()] {
            orch.track(path);
        }

        let summary = orch.refresh_all().await;
        assert_eq!(summary.refreshed, 3);
        assert_eq!(summary.broken, 2);

        let reader = orch.reader();
        assert!(reader.get_status(good.path()).is_valid_repo());
        assert!(matches!(
            reader.get_status(bad.path()),
            RepositoryStatus::Broken {
                reason: BrokenReason::Failed { .. }
            }
        ));
        assert!(!reader.get_status(&gone).exists());
        assert_eq!(reader.broken_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_skipped_until_git_resolved() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().healthy(dir.path(), "main"));
        let (orch, tx) = orchestrator(runner.clone(), ConfigLoadState::Loading);
        orch.track(dir.path());

        assert_eq!(orch.refresh_one(dir.path()).await, RefreshOutcome::Skipped);
        assert!(orch.refresh_all().await.skipped);

        tx.send_replace(ConfigLoadState::Loaded {
            git_executable: None,
        });
        assert_eq!(orch.refresh_one(dir.path()).await, RefreshOutcome::Skipped);

        assert_eq!(runner.call_count("status"), 0);
        assert!(orch.reader().get_status(dir.path()).is_unknown());
        assert_eq!(orch.refresh_all_count(), 0);
    }

    #[tokio::test]
    async fn test_startup_refresh_when_built_before_load() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().healthy(dir.path(), "main"));
        let (orch, tx) = orchestrator(runner, ConfigLoadState::Loading);
        let orch = Arc::new(orch);
        orch.track(dir.path());

        let handle = orch.spawn_startup_refresh();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(orch.refresh_all_count(), 0);

        tx.send_replace(ready());
        let summary = handle.await.unwrap();
        assert_eq!(summary.map(|s| s.refreshed), Some(1));
        assert_eq!(orch.refresh_when_config_ready().await, None);
        assert_eq!(orch.refresh_all_count(), 1);
    }

    #[tokio::test]
    async fn test_startup_refresh_when_built_after_load() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().healthy(dir.path(), "main"));
        let (orch, _tx) = orchestrator(runner, ready());
        let orch = Arc::new(orch);
        orch.track(dir.path());

        let first = orch.spawn_startup_refresh();
        let second = orch.spawn_startup_refresh();
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(orch.refresh_all_count(), 1);
        assert!(orch.reader().get_status(dir.path()).is_valid_repo());
    }

    #[tokio::test]
    async fn test_untrack_during_refresh_leaves_no_entry() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .healthy(dir.path(), "main")
                .with_delay(Duration::from_millis(50)),
        );
        let (orch, _tx) = orchestrator(runner, ready());
        orch.track(dir.path());

        let (outcome, _) = tokio::join!(orch.refresh_one(dir.path()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orch.untrack(dir.path())
        });

        assert_eq!(outcome, RefreshOutcome::Untracked);
        assert!(!orch.reader().is_tracked(dir.path()));
    }

    #[tokio::test]
    async fn test_refresh_untracked_path() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().healthy(dir.path(), "main"));
        let (orch, _tx) = orchestrator(runner.clone(), ready());

        assert_eq!(orch.refresh_one(dir.path()).await, RefreshOutcome::Untracked);
        assert_eq!(runner.call_count("rev-parse"), 0);
    }
}
