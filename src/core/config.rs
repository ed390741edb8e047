//! Persisted workspace configuration.
//!
//! The configuration is a human-editable YAML file holding git settings, tool
//! versions, UI preferences, the tracked repositories and named workspace groups.
//!
//! # Public API
//! - [`AppConfig`] and its sections: the in-memory model
//! - [`ConfigStore`]: load/save with atomic replacement and a serializing lock
//! - [`ConfigLoadState`]: loading signal consumed by the refresh orchestrator
//!
//! # Persistence rules
//! - **Absent file**: defaults, not an error
//! - **Corrupt file**: defaults plus a load-failure message for the UI
//! - **Save**: written to `<file>.tmp`, fsynced, then renamed over the real file.
//!   A failed save rolls the in-memory state back and returns the error.
//! - **Optional values** are always written, as `null` when absent, so "not set"
//!   and "empty string" survive a round trip.

use crate::core::constants::{DEFAULT_PROTECTED_BRANCHES, SEARCH_HISTORY_LIMIT};
use crate::core::error::{FleetError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex};

/// One tracked repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub path: PathBuf,
    pub display_name: String,
    #[serde(default)]
    pub custom_alias: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub last_accessed: DateTime<Utc>,
}

impl RepositoryRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            display_name,
            custom_alias: None,
            is_favorite: false,
            description: None,
            last_accessed: Utc::now(),
        }
    }

    /// The alias when one is set, otherwise the display name.
    pub fn effective_name(&self) -> &str {
        self.custom_alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// `None` means "find git on PATH"
    pub executable_path: Option<PathBuf>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub protected_branches: Vec<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            executable_path: None,
            user_name: None,
            user_email: None,
            protected_branches: DEFAULT_PROTECTED_BRANCHES
                .iter()
                .map(|b| b.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub git_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    pub show_hidden: bool,
    /// Most recent first
    pub search_history: Vec<String>,
}

impl UiPreferences {
    /// Move `query` to the front of the history, keeping at most
    /// [`SEARCH_HISTORY_LIMIT`] entries.
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.search_history.retain(|q| q != query);
        self.search_history.insert(0, query.to_string());
        self.search_history.truncate(SEARCH_HISTORY_LIMIT);
    }
}

/// A named grouping of repository paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceGroup {
    pub name: String,
    #[serde(default)]
    pub repositories: Vec<PathBuf>,
    #[serde(default)]
    pub last_selected_repository: Option<PathBuf>,
}

impl WorkspaceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repositories: Vec::new(),
            last_selected_repository: None,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.repositories.iter().any(|p| p == path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub git: GitSettings,
    pub tools: ToolSettings,
    pub ui: UiPreferences,
    pub repositories: Vec<RepositoryRecord>,
    pub workspaces: Vec<WorkspaceGroup>,
    pub selected_workspace: Option<String>,
}

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| FleetError::ConfigSerialize { source })
    }

    pub fn repository(&self, path: &Path) -> Option<&RepositoryRecord> {
        self.repositories.iter().find(|r| r.path == path)
    }

    pub fn repository_mut(&mut self, path: &Path) -> Option<&mut RepositoryRecord> {
        self.repositories.iter_mut().find(|r| r.path == path)
    }

    pub fn workspace(&self, name: &str) -> Option<&WorkspaceGroup> {
        self.workspaces.iter().find(|w| w.name == name)
    }

    /// Remove a repository record and every workspace reference to it.
    pub fn remove_repository(&mut self, path: &Path) -> Option<RepositoryRecord> {
        let position = self.repositories.iter().position(|r| r.path == path)?;
        for group in &mut self.workspaces {
            group.repositories.retain(|p| p != path);
            if group.last_selected_repository.as_deref() == Some(path) {
                group.last_selected_repository = None;
            }
        }
        Some(self.repositories.remove(position))
    }

    /// Repositories of the selected workspace group, or every repository when no
    /// group is selected. Records keep their configured order.
    pub fn active_repositories(&self) -> Vec<RepositoryRecord> {
        match self
            .selected_workspace
            .as_deref()
            .and_then(|name| self.workspace(name))
        {
            Some(group) => self
                .repositories
                .iter()
                .filter(|r| group.contains(&r.path))
                .cloned()
                .collect(),
            None => self.repositories.clone(),
        }
    }
}

/// Loading signal published by [`ConfigStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadState {
    Loading,
    Loaded { git_executable: Option<PathBuf> },
}

impl ConfigLoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ConfigLoadState::Loaded { .. })
    }

    pub fn git_executable(&self) -> Option<&Path> {
        match self {
            ConfigLoadState::Loaded { git_executable } => git_executable.as_deref(),
            ConfigLoadState::Loading => None,
        }
    }

    /// Loaded and the git executable is known: refreshes may run.
    pub fn is_ready(&self) -> bool {
        self.git_executable().is_some()
    }
}

/// Find git: the configured path if it exists, otherwise the first `git` on PATH.
pub fn resolve_git_executable(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!("Configured git executable {} not found", path.display());
    }

    let names: &[&str] = if cfg!(windows) {
        &["git.exe", "git"]
    } else {
        &["git"]
    };
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<AppConfig>,
    load_error: RwLock<Option<String>>,
    save_lock: Mutex<()>,
    state: watch::Sender<ConfigLoadState>,
}

impl ConfigStore {
    /// Create a store for `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (state, _) = watch::channel(ConfigLoadState::Loading);
        Self {
            path: path.into(),
            current: RwLock::new(AppConfig::default()),
            load_error: RwLock::new(None),
            save_lock: Mutex::new(()),
            state,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn subscribe(&self) -> watch::Receiver<ConfigLoadState> {
        self.state.subscribe()
    }

    pub fn load_state(&self) -> ConfigLoadState {
        self.state.borrow().clone()
    }

    /// Message describing why the last load fell back to defaults, if it did.
    pub fn load_error(&self) -> Option<String> {
        read_lock(&self.load_error).clone()
    }

    pub fn load_failed(&self) -> bool {
        self.load_error().is_some()
    }

    /// Snapshot of the in-memory configuration.
    pub fn current(&self) -> AppConfig {
        read_lock(&self.current).clone()
    }

    /// Read the config file, falling back to defaults when it is absent or
    /// unusable, then publish the loaded state.
    pub async fn load(&self) -> AppConfig {
        let (config, error) = match read_config_file(&self.path).await {
            Ok(Some(config)) => {
                log::info!("Loaded configuration from {}", self.path.display());
                (config, None)
            }
            Ok(None) => {
                log::debug!(
                    "No configuration at {}, using defaults",
                    self.path.display()
                );
                (AppConfig::default(), None)
            }
            Err(e) => {
                log::warn!("Configuration load failed, using defaults: {e}");
                (AppConfig::default(), Some(e.to_string()))
            }
        };

        *write_lock(&self.current) = config.clone();
        *write_lock(&self.load_error) = error;
        self.publish_git_executable(&config);
        config
    }

    /// Replace the configuration and persist it.
    pub async fn save(&self, config: AppConfig) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let previous = std::mem::replace(&mut *write_lock(&self.current), config.clone());

        if let Err(e) = self.persist(&config).await {
            log::error!("Failed to save configuration: {e}");
            *write_lock(&self.current) = previous;
            return Err(e);
        }
        if previous.git.executable_path != config.git.executable_path {
            self.publish_git_executable(&config);
        }
        Ok(())
    }

    /// Apply `change` to the current configuration and persist the result. The
    /// whole read-modify-write runs under the save lock, so concurrent updates
    /// never lose each other's changes.
    pub async fn update<F>(&self, change: F) -> Result<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let _guard = self.save_lock.lock().await;
        let previous = self.current();
        let mut updated = previous.clone();
        change(&mut updated);

        *write_lock(&self.current) = updated.clone();
        if let Err(e) = self.persist(&updated).await {
            log::error!("Failed to save configuration: {e}");
            *write_lock(&self.current) = previous;
            return Err(e);
        }
        if previous.git.executable_path != updated.git.executable_path {
            self.publish_git_executable(&updated);
        }
        Ok(updated)
    }

    async fn persist(&self, config: &AppConfig) -> Result<()> {
        let yaml = config.to_yaml_string()?;
        write_atomically(&self.path, yaml.as_bytes()).await?;
        log::info!(
            "Saved configuration to {} ({} repositories)",
            self.path.display(),
            config.repositories.len()
        );
        Ok(())
    }

    fn publish_git_executable(&self, config: &AppConfig) {
        let git_executable = resolve_git_executable(config.git.executable_path.as_deref());
        match &git_executable {
            Some(path) => log::debug!("Using git at {}", path.display()),
            None => log::warn!("No git executable found; repository refresh is disabled"),
        }
        self.state
            .send_replace(ConfigLoadState::Loaded { git_executable });
    }
}

async fn read_config_file(path: &Path) -> Result<Option<AppConfig>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FleetError::config_read(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    AppConfig::from_yaml_str(&content)
        .map(Some)
        .map_err(|e| FleetError::config_parse(path, e))
}

/// Write `bytes` to a sibling temp file, fsync it, then rename it over `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FleetError::config_save(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(FleetError::config_save(path, e));
    }
    Ok(())
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
