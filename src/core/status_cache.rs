//! Last-known status of every tracked repository.
//!
//! The cache is an explicit keyed store with a single writer. [`StatusCache`] is
//! the writer handle and is deliberately not `Clone`: the refresh orchestrator owns
//! it. Everything else receives a [`StatusReader`], which can only read and
//! subscribe to change notifications.
//!
//! Entries are replaced whole under a write lock that is never held across an
//! `.await`, so readers cannot observe a half-updated status.

use crate::core::state::{RepositoryStatus, StatusCounters};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications emitted by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// One repository's entry was replaced
    Updated(PathBuf),
    /// Every entry was reset to unknown in a single transition
    AllReset,
    Tracked(PathBuf),
    Untracked(PathBuf),
}

struct Shared {
    entries: RwLock<HashMap<PathBuf, RepositoryStatus>>,
    events: broadcast::Sender<StatusEvent>,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, RepositoryStatus>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, RepositoryStatus>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: StatusEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Writer handle of the status cache
pub struct StatusCache {
    shared: Arc<Shared>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    pub fn reader(&self) -> StatusReader {
        StatusReader {
            shared: self.shared.clone(),
        }
    }

    /// Start tracking `path` as unknown. Returns `false` if already tracked.
    pub(crate) fn track(&self, path: &Path) -> bool {
        let inserted = {
            let mut entries = self.shared.write();
            if entries.contains_key(path) {
                false
            } else {
                entries.insert(path.to_path_buf(), RepositoryStatus::Unknown);
                true
            }
        };
        if inserted {
            log::debug!("Tracking {}", path.display());
            self.shared.emit(StatusEvent::Tracked(path.to_path_buf()));
        }
        inserted
    }

    /// Stop tracking `path`, dropping its entry.
    pub(crate) fn untrack(&self, path: &Path) -> bool {
        let removed = self.shared.write().remove(path).is_some();
        if removed {
            log::debug!("Stopped tracking {}", path.display());
            self.shared.emit(StatusEvent::Untracked(path.to_path_buf()));
        }
        removed
    }

    /// Replace the entry for `path`. Untracked paths are left alone so a refresh
    /// finishing after its repository was removed cannot resurrect an entry.
    pub(crate) fn replace(&self, path: &Path, status: RepositoryStatus) -> bool {
        let replaced = {
            let mut entries = self.shared.write();
            match entries.get_mut(path) {
                Some(entry) => {
                    *entry = status;
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.shared.emit(StatusEvent::Updated(path.to_path_buf()));
        }
        replaced
    }

    /// Set every entry to unknown in one critical section and return the
    /// tracked paths, sorted.
    pub(crate) fn reset_all(&self) -> Vec<PathBuf> {
        let paths = {
            let mut entries = self.shared.write();
            for status in entries.values_mut() {
                *status = RepositoryStatus::Unknown;
            }
            let mut paths: Vec<PathBuf> = entries.keys().cloned().collect();
            paths.sort();
            paths
        };
        self.shared.emit(StatusEvent::AllReset);
        paths
    }
}

/// Read-only view of the status cache
#[derive(Clone)]
pub struct StatusReader {
    shared: Arc<Shared>,
}

impl StatusReader {
    /// Last cached status, or unknown for untracked paths.
    pub fn get_status(&self, path: &Path) -> RepositoryStatus {
        self.shared.read().get(path).cloned().unwrap_or_default()
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.shared.read().contains_key(path)
    }

    /// Tracked paths, sorted.
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.shared.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> HashMap<PathBuf, RepositoryStatus> {
        self.shared.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.shared.events.subscribe()
    }

    pub fn counters(&self) -> StatusCounters {
        StatusCounters::from_statuses(self.shared.read().values())
    }

    pub fn needs_attention_count(&self) -> usize {
        self.counters().needs_attention
    }

    pub fn broken_count(&self) -> usize {
        self.counters().broken
    }

    pub fn incoming_outgoing_count(&self) -> usize {
        self.counters().incoming_outgoing
    }

    pub fn uncommitted_count(&self) -> usize {
        self.counters().uncommitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{BrokenReason, RepositorySnapshot};

    fn dirty() -> RepositoryStatus {
        RepositoryStatus::Analyzed(RepositorySnapshot {
            current_branch: Some("main".to_string()),
            has_uncommitted_changes: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_untracked_path_reads_unknown() {
        let cache = StatusCache::new();
        assert_eq!(
            cache.reader().get_status(Path::new("/nowhere")),
            RepositoryStatus::Unknown
        );
    }

    #[test]
    fn test_track_is_idempotent() {
        let cache = StatusCache::new();
        assert!(cache.track(Path::new("/a")));
        assert!(!cache.track(Path::new("/a")));
        assert_eq!(cache.reader().len(), 1);
    }

    #[test]
    fn test_replace_ignores_untracked_paths() {
        let cache = StatusCache::new();
        assert!(!cache.replace(Path::new("/a"), dirty()));
        assert!(cache.reader().is_empty());

        cache.track(Path::new("/a"));
        assert!(cache.replace(Path::new("/a"), dirty()));
        assert_eq!(cache.reader().get_status(Path::new("/a")), dirty());
    }

    #[test]
    fn test_untrack_removes_entry() {
        let cache = StatusCache::new();
        cache.track(Path::new("/a"));
        cache.replace(Path::new("/a"), dirty());
        assert!(cache.untrack(Path::new("/a")));
        assert!(!cache.reader().is_tracked(Path::new("/a")));
        assert!(!cache.untrack(Path::new("/a")));
    }

    #[test]
    fn test_reset_all_emits_one_event() {
        let cache = StatusCache::new();
        for path in ["/b", "/a", "/c"] {
            cache.track(Path::new(path));
            cache.replace(Path::new(path), dirty());
        }
        let mut events = cache.reader().subscribe();

        let paths = cache.reset_all();
        assert_eq!(
            paths,
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
        assert!(cache
            .reader()
            .snapshot()
            .values()
            .all(RepositoryStatus::is_unknown));
        assert_eq!(events.try_recv().unwrap(), StatusEvent::AllReset);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_counters_fold_over_cache() {
        let cache = StatusCache::new();
        cache.track(Path::new("/a"));
        cache.track(Path::new("/b"));
        cache.track(Path::new("/c"));
        cache.replace(Path::new("/a"), dirty());
        cache.replace(
            Path::new("/b"),
            RepositoryStatus::broken(BrokenReason::Missing),
        );

        let reader = cache.reader();
        assert_eq!(reader.needs_attention_count(), 2);
        assert_eq!(reader.broken_count(), 1);
        assert_eq!(reader.uncommitted_count(), 1);
        assert_eq!(reader.incoming_outgoing_count(), 0);
    }
}
