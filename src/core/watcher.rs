//! Filesystem watching with debounced per-repository refresh.
//!
//! One recursive `notify` watcher is kept per repository root. A change
//! schedules a refresh of that repository after the debounce window; a further
//! change inside the window supersedes the pending refresh. Each change bumps
//! the repository's generation and the timer task only fires if its ticket is
//! still the current generation, so an abort that loses the race to a wake-up
//! is still harmless.

use crate::core::constants::DEBOUNCE_WINDOW;
use crate::core::error::Result;
use crate::core::refresh::RefreshOrchestrator;
use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Files under `.git/` whose changes alter what a refresh would report.
const GIT_STATE_FILES: &[&str] = &["HEAD", "index", "FETCH_HEAD", "ORIG_HEAD", "MERGE_HEAD"];

/// Whatever gets refreshed once a repository settles
#[async_trait]
pub trait RefreshTarget: Send + Sync + 'static {
    async fn refresh_repository(&self, path: &Path);
}

#[async_trait]
impl RefreshTarget for RefreshOrchestrator {
    async fn refresh_repository(&self, path: &Path) {
        self.refresh_one(path).await;
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_WINDOW,
        }
    }
}

impl WatchOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[derive(Default)]
struct Debounce {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Shared {
    target: Arc<dyn RefreshTarget>,
    runtime: Handle,
    debounce: Duration,
    timers: Mutex<HashMap<PathBuf, Debounce>>,
}

impl Shared {
    fn timers(&self) -> MutexGuard<'_, HashMap<PathBuf, Debounce>> {
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_change(self: &Arc<Self>, root: &Path) {
        let mut timers = self.timers();
        let debounce = timers.entry(root.to_path_buf()).or_default();
        debounce.generation += 1;
        let ticket = debounce.generation;
        if let Some(pending) = debounce.pending.take() {
            pending.abort();
        }

        let shared = self.clone();
        let root = root.to_path_buf();
        debounce.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            if shared.claim(&root, ticket) {
                log::debug!("Changes settled in {}", root.display());
                shared.target.refresh_repository(&root).await;
            }
        }));
    }

    /// Consume the pending timer if `ticket` is still current. Once claimed, the
    /// running refresh can no longer be aborted by later changes.
    fn claim(&self, root: &Path, ticket: u64) -> bool {
        match self.timers().get_mut(root) {
            Some(debounce) if debounce.generation == ticket => {
                debounce.pending = None;
                true
            }
            _ => false,
        }
    }

    fn cancel(&self, root: &Path) {
        if let Some(debounce) = self.timers().remove(root) {
            if let Some(pending) = debounce.pending {
                pending.abort();
            }
        }
    }

    fn cancel_all(&self) {
        for (_, debounce) in self.timers().drain() {
            if let Some(pending) = debounce.pending {
                pending.abort();
            }
        }
    }
}

pub struct WatchManager {
    shared: Arc<Shared>,
    watchers: Mutex<HashMap<PathBuf, RecommendedWatcher>>,
}

impl WatchManager {
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(target: Arc<dyn RefreshTarget>, options: WatchOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                target,
                runtime: Handle::current(),
                debounce: options.debounce,
                timers: Mutex::new(HashMap::new()),
            }),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    fn watchers(&self) -> MutexGuard<'_, HashMap<PathBuf, RecommendedWatcher>> {
        self.watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start watching `root`. Returns `false` if it was already watched.
    pub fn watch(&self, root: &Path) -> Result<bool> {
        let mut watchers = self.watchers();
        if watchers.contains_key(root) {
            return Ok(false);
        }

        let shared = self.shared.clone();
        let watched_root = root.to_path_buf();
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) if is_relevant_event(&watched_root, &event) => {
                    shared.record_change(&watched_root)
                }
                Ok(_) => {}
                Err(e) => log::warn!("Watch error in {}: {e}", watched_root.display()),
            })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        log::debug!("Watching {}", root.display());
        watchers.insert(root.to_path_buf(), watcher);
        Ok(true)
    }

    /// Stop watching `root` and cancel its pending refresh.
    pub fn unwatch(&self, root: &Path) -> bool {
        let removed = self.watchers().remove(root);
        self.shared.cancel(root);
        match removed {
            Some(mut watcher) => {
                let _ = watcher.unwatch(root);
                log::debug!("Stopped watching {}", root.display());
                true
            }
            None => false,
        }
    }

    pub fn is_watching(&self, root: &Path) -> bool {
        self.watchers().contains_key(root)
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.watchers().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Feed a change for a watched root through the debounce, as if the
    /// filesystem had reported one.
    pub fn record_change(&self, root: &Path) {
        if self.is_watching(root) {
            self.shared.record_change(root);
        }
    }

    pub fn shutdown(&self) {
        let watchers: Vec<_> = self.watchers().drain().collect();
        self.shared.cancel_all();
        if !watchers.is_empty() {
            log::debug!("Stopped {} watchers", watchers.len());
        }
    }
}

impl Drop for WatchManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn is_relevant_event(root: &Path, event: &Event) -> bool {
    // Reads, including git's own while refreshing, never change status.
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| is_relevant_path(root, path))
}

/// Worktree changes always count; inside `.git/` only refs and the files
/// listed in [`GIT_STATE_FILES`] do.
fn is_relevant_path(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return true;
    };
    let mut components = relative.components();
    match components.next() {
        Some(Component::Normal(first)) if first == ".git" => {}
        _ => return true,
    }

    let inside: PathBuf = components.collect();
    if inside.extension().is_some_and(|ext| ext == "lock") {
        return false;
    }
    inside.starts_with("refs")
        || inside
            .to_str()
            .is_some_and(|name| GIT_STATE_FILES.contains(&name))
}
