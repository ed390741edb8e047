//! The assembled workspace: configuration, status cache, watcher and branch
//! aggregation wired together.
//!
//! Adding and removing repositories goes through here so that the config, the
//! cache and the watcher never disagree about which repositories exist. Removal
//! persists the config first and only then drops the cache entry and the watch;
//! a failed save leaves everything as it was.

use crate::core::branch_aggregator::{BranchAggregator, GlobalBranchInfo};
use crate::core::command::{CommandRunner, GitCommandRunner};
use crate::core::config::{AppConfig, ConfigStore, RepositoryRecord, WorkspaceGroup};
use crate::core::constants::COMMAND_TIMEOUT;
use crate::core::error::{FleetError, Result};
use crate::core::protected::ProtectedBranches;
use crate::core::refresh::{OrchestratorOptions, RefreshOrchestrator, RefreshOutcome, RefreshSummary};
use crate::core::status_cache::StatusReader;
use crate::core::watcher::{WatchManager, WatchOptions};
use chrono::Utc;
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    pub refresh: OrchestratorOptions,
    pub watch: WatchOptions,
    pub command_timeout: Duration,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            refresh: OrchestratorOptions::default(),
            watch: WatchOptions::default(),
            command_timeout: COMMAND_TIMEOUT,
        }
    }
}

/// Outcome of switching one repository during a bulk checkout
#[derive(Debug)]
pub struct CheckoutResult {
    pub path: PathBuf,
    pub name: String,
    pub result: Result<()>,
}

pub struct Workspace {
    config: Arc<ConfigStore>,
    orchestrator: Arc<RefreshOrchestrator>,
    aggregator: BranchAggregator,
    watcher: OnceLock<WatchManager>,
    options: WorkspaceOptions,
}

impl Workspace {
    /// Load the configuration at `config_path` and track its repositories,
    /// running git through the resolved executable.
    pub async fn open(config_path: impl Into<PathBuf>, options: WorkspaceOptions) -> Self {
        let config = Arc::new(ConfigStore::new(config_path));
        let runner = Arc::new(
            GitCommandRunner::new(config.subscribe()).with_timeout(options.command_timeout),
        );
        let workspace = Self::with_runner(config, runner, options);
        workspace.load().await;
        workspace
    }

    /// Assemble a workspace around an existing store and runner. Nothing is
    /// loaded until [`load`](Self::load).
    pub fn with_runner(
        config: Arc<ConfigStore>,
        runner: Arc<dyn CommandRunner>,
        options: WorkspaceOptions,
    ) -> Self {
        let orchestrator = Arc::new(RefreshOrchestrator::with_options(
            runner.clone(),
            config.subscribe(),
            options.refresh.clone(),
        ));
        Self {
            config,
            orchestrator,
            aggregator: BranchAggregator::new(runner),
            watcher: OnceLock::new(),
            options,
        }
    }

    /// Load the configuration and start tracking every configured repository.
    pub async fn load(&self) -> AppConfig {
        let config = self.config.load().await;
        for record in &config.repositories {
            self.orchestrator.track(&record.path);
        }
        config
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn status_reader(&self) -> StatusReader {
        self.orchestrator.reader()
    }

    pub fn is_ready(&self) -> bool {
        self.orchestrator.is_ready()
    }

    pub async fn refresh_all(&self) -> RefreshSummary {
        self.orchestrator.refresh_all().await
    }

    pub async fn refresh_one(&self, path: &Path) -> RefreshOutcome {
        self.orchestrator.refresh_one(path).await
    }

    /// Run the one-off startup refresh in the background once the
    /// configuration is ready.
    pub fn spawn_startup_refresh(&self) -> JoinHandle<Option<RefreshSummary>> {
        self.orchestrator.spawn_startup_refresh()
    }

    /// Repositories of the selected workspace group, or all of them.
    pub fn active_repositories(&self) -> Vec<RepositoryRecord> {
        self.config.current().active_repositories()
    }

    pub async fn add_repository(&self, path: &Path) -> Result<RepositoryRecord> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| FleetError::repository_not_found(path))?;
        if self.config.current().repository(&canonical).is_some() {
            return Err(FleetError::repository_already_tracked(canonical));
        }

        let record = RepositoryRecord::new(canonical.clone());
        let added = record.clone();
        self.config
            .update(move |config| {
                if config.repository(&added.path).is_some() {
                    return;
                }
                if let Some(group) = selected_group_mut(config) {
                    if !group.contains(&added.path) {
                        group.repositories.push(added.path.clone());
                    }
                }
                config.repositories.push(added);
            })
            .await?;

        log::info!("Added repository {}", canonical.display());
        self.orchestrator.track(&canonical);
        if let Some(watcher) = self.watcher.get() {
            if let Err(e) = watcher.watch(&canonical) {
                log::warn!("Cannot watch {}: {e}", canonical.display());
            }
        }
        self.orchestrator.refresh_one(&canonical).await;
        Ok(record)
    }

    /// Forget a repository. Accepts the path as given or in canonical form,
    /// since a deleted directory can no longer be canonicalized.
    pub async fn remove_repository(&self, path: &Path) -> Result<RepositoryRecord> {
        let current = self.config.current();
        let key = match current.repository(path) {
            Some(record) => record.path.clone(),
            None => tokio::fs::canonicalize(path)
                .await
                .ok()
                .filter(|canonical| current.repository(canonical).is_some())
                .ok_or_else(|| FleetError::repository_not_tracked(path))?,
        };

        let mut removed = None;
        self.config
            .update(|config| removed = config.remove_repository(&key))
            .await?;
        let removed = removed.ok_or_else(|| FleetError::repository_not_tracked(&key))?;

        if let Some(watcher) = self.watcher.get() {
            watcher.unwatch(&key);
        }
        self.orchestrator.untrack(&key);
        log::info!("Removed repository {}", key.display());
        Ok(removed)
    }

    /// Create an empty workspace group. Returns `false` if it already exists.
    pub async fn create_workspace(&self, name: &str) -> Result<bool> {
        let mut created = false;
        self.config
            .update(|config| {
                if config.workspace(name).is_none() {
                    config.workspaces.push(WorkspaceGroup::new(name));
                    created = true;
                }
            })
            .await?;
        Ok(created)
    }

    /// Select a workspace group, or clear the selection with `None`.
    pub async fn select_workspace(&self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            if self.config.current().workspace(name).is_none() {
                return Err(FleetError::unknown_workspace(name));
            }
        }
        self.config
            .update(|config| config.selected_workspace = name.map(str::to_string))
            .await?;
        Ok(())
    }

    /// Put a tracked repository into a workspace group.
    pub async fn assign_to_workspace(&self, name: &str, path: &Path) -> Result<()> {
        let current = self.config.current();
        if current.workspace(name).is_none() {
            return Err(FleetError::unknown_workspace(name));
        }
        let key = current
            .repository(path)
            .map(|r| r.path.clone())
            .ok_or_else(|| FleetError::repository_not_tracked(path))?;

        self.config
            .update(|config| {
                if let Some(group) = config.workspaces.iter_mut().find(|w| w.name == name) {
                    if !group.contains(&key) {
                        group.repositories.push(key.clone());
                    }
                }
            })
            .await?;
        Ok(())
    }

    /// Record that a repository was just used.
    pub async fn touch_repository(&self, path: &Path) -> Result<()> {
        if self.config.current().repository(path).is_none() {
            return Err(FleetError::repository_not_tracked(path));
        }
        self.config
            .update(|config| {
                if let Some(record) = config.repository_mut(path) {
                    record.last_accessed = Utc::now();
                }
                if let Some(group) = selected_group_mut(config) {
                    if group.contains(path) {
                        group.last_selected_repository = Some(path.to_path_buf());
                    }
                }
            })
            .await?;
        Ok(())
    }

    pub fn protected_branches(&self) -> Result<ProtectedBranches> {
        ProtectedBranches::new(&self.config.current().git.protected_branches)
    }

    /// Protected branches the active repositories could switch to.
    pub async fn global_branches(&self) -> Result<Vec<GlobalBranchInfo>> {
        let protected = self.protected_branches()?;
        Ok(self
            .aggregator
            .global_branches(&self.active_repositories(), &self.status_reader(), &protected)
            .await)
    }

    pub fn aggregator(&self) -> &BranchAggregator {
        &self.aggregator
    }

    /// Switch every active repository that has `branch` but is not on it.
    /// Repositories are checked out concurrently and each is refreshed
    /// afterwards whether or not its checkout succeeded.
    pub async fn checkout_across(&self, branch: &str) -> Result<Vec<CheckoutResult>> {
        if !self.protected_branches()?.is_protected(branch) {
            return Err(FleetError::branch_not_protected(branch));
        }
        let Some(info) = self
            .global_branches()
            .await?
            .into_iter()
            .find(|info| info.branch_name == branch)
        else {
            return Ok(Vec::new());
        };

        let runner = self.orchestrator.runner();
        let results = join_all(info.switchable.into_iter().map(|repo| {
            let runner = runner.clone();
            async move {
                // `--` keeps a same-named worktree file from being read as a pathspec.
                let args = ["checkout", branch, "--"];
                let result = match runner.run(&repo.path, &args).await {
                    Ok(output) if output.success() => Ok(()),
                    Ok(output) => Err(FleetError::checkout_failed(
                        &repo.path,
                        branch,
                        output.stderr.trim(),
                    )),
                    Err(e) => Err(FleetError::checkout_failed(&repo.path, branch, e.to_string())),
                };
                self.orchestrator.refresh_one(&repo.path).await;
                CheckoutResult {
                    path: repo.path,
                    name: repo.name,
                    result,
                }
            }
        }))
        .await;

        let failed = results.iter().filter(|r| r.result.is_err()).count();
        log::info!(
            "Checked out {branch} in {} repositories ({failed} failed)",
            results.len() - failed
        );
        Ok(results)
    }

    /// Start watching every tracked repository. Directories that cannot be
    /// watched are logged and skipped. Returns how many are watched.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn enable_watching(&self) -> usize {
        let watcher = self.watcher.get_or_init(|| {
            WatchManager::new(self.orchestrator.clone(), self.options.watch.clone())
        });
        for path in self.status_reader().tracked_paths() {
            if let Err(e) = watcher.watch(&path) {
                log::warn!("Cannot watch {}: {e}", path.display());
            }
        }
        watcher.watched_paths().len()
    }

    pub fn watcher(&self) -> Option<&WatchManager> {
        self.watcher.get()
    }
}

fn selected_group_mut(config: &mut AppConfig) -> Option<&mut WorkspaceGroup> {
    let name = config.selected_workspace.clone()?;
    config.workspaces.iter_mut().find(|w| w.name == name)
}
