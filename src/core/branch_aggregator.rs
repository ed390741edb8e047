//! Branches shared across the repositories of the active workspace.
//!
//! For every protected branch name known to any repository, the aggregator lists
//! the repositories that have the branch but are not currently on it, which is
//! exactly the set a bulk checkout would switch.
//!
//! # Recomputation
//! Results are memoized under three md5 fingerprints: the sorted repository
//! paths, the sorted `path:current_branch` pairs, and the protected pattern list.
//! Renaming, favoriting or otherwise editing repository metadata changes none of
//! them and therefore never triggers a recompute. Display names are not part of
//! the memo; they are taken from the records passed to each call.

use crate::core::command::CommandRunner;
use crate::core::config::RepositoryRecord;
use crate::core::parsers::parse_branches;
use crate::core::protected::ProtectedBranches;
use crate::core::status_cache::StatusReader;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

const BRANCH_LISTING: &[&str] = &["branch", "-a", "-vv"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchableRepository {
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalBranchInfo {
    pub branch_name: String,
    /// Repositories that have the branch but are on something else
    pub switchable_count: usize,
    /// Size of the active subset
    pub total_repositories: usize,
    pub switchable: Vec<SwitchableRepository>,
}

/// What one repository contributes to the aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBranches {
    pub path: PathBuf,
    pub name: String,
    pub current_branch: Option<String>,
    /// Local names and remote names without their remote prefix
    pub available: BTreeSet<String>,
}

impl RepositoryBranches {
    fn has_branch(&self, name: &str) -> bool {
        self.current_branch.as_deref() == Some(name) || self.available.contains(name)
    }
}

/// Pure aggregation over already-gathered branch data.
pub fn compute_global_branches(
    repositories: &[RepositoryBranches],
    protected: &ProtectedBranches,
) -> Vec<GlobalBranchInfo> {
    let names: BTreeSet<&str> = repositories
        .iter()
        .flat_map(|repo| {
            repo.current_branch
                .as_deref()
                .into_iter()
                .chain(repo.available.iter().map(String::as_str))
        })
        .collect();

    let mut infos: Vec<GlobalBranchInfo> = names
        .into_iter()
        .filter(|name| protected.is_protected(name))
        .filter_map(|name| {
            let switchable: Vec<SwitchableRepository> = repositories
                .iter()
                .filter(|repo| repo.current_branch.as_deref() != Some(name) && repo.has_branch(name))
                .map(|repo| SwitchableRepository {
                    path: repo.path.clone(),
                    name: repo.name.clone(),
                })
                .collect();
            (!switchable.is_empty()).then(|| GlobalBranchInfo {
                branch_name: name.to_string(),
                switchable_count: switchable.len(),
                total_repositories: repositories.len(),
                switchable,
            })
        })
        .collect();

    infos.sort_by(|a, b| {
        b.switchable_count
            .cmp(&a.switchable_count)
            .then_with(|| a.branch_name.cmp(&b.branch_name))
    });
    infos
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    paths: String,
    current_branches: String,
    protected: String,
}

impl Fingerprint {
    fn new(repositories: &[RepositoryRecord], statuses: &StatusReader, protected: &ProtectedBranches) -> Self {
        let mut paths: Vec<String> = repositories
            .iter()
            .map(|r| r.path.to_string_lossy().into_owned())
            .collect();
        paths.sort();

        let mut pairs: Vec<String> = repositories
            .iter()
            .map(|r| {
                let status = statuses.get_status(&r.path);
                format!("{}:{}", r.path.display(), status.current_branch().unwrap_or_default())
            })
            .collect();
        pairs.sort();

        Fingerprint {
            paths: digest(&paths),
            current_branches: digest(&pairs),
            protected: digest(protected.patterns()),
        }
    }
}

fn digest(parts: &[String]) -> String {
    format!("{:x}", md5::compute(parts.join("\n").as_bytes()))
}

struct Memo {
    fingerprint: Fingerprint,
    result: Vec<GlobalBranchInfo>,
}

pub struct BranchAggregator {
    runner: Arc<dyn CommandRunner>,
    memo: Mutex<Option<Memo>>,
    recomputes: AtomicUsize,
}

impl BranchAggregator {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            memo: Mutex::new(None),
            recomputes: AtomicUsize::new(0),
        }
    }

    /// How many times the aggregation actually ran.
    pub fn recompute_count(&self) -> usize {
        self.recomputes.load(Ordering::SeqCst)
    }

    pub async fn global_branches(
        &self,
        repositories: &[RepositoryRecord],
        statuses: &StatusReader,
        protected: &ProtectedBranches,
    ) -> Vec<GlobalBranchInfo> {
        let fingerprint = Fingerprint::new(repositories, statuses, protected);
        let mut memo = self.memo.lock().await;
        if let Some(memo) = memo.as_ref() {
            if memo.fingerprint == fingerprint {
                return with_current_names(memo.result.clone(), repositories);
            }
        }

        self.recomputes.fetch_add(1, Ordering::SeqCst);
        let gathered = join_all(
            repositories
                .iter()
                .map(|record| self.gather(record, statuses)),
        )
        .await;
        let result = compute_global_branches(&gathered, protected);
        log::debug!(
            "Aggregated {} protected branches over {} repositories",
            result.len(),
            repositories.len()
        );

        *memo = Some(Memo {
            fingerprint,
            result: result.clone(),
        });
        result
    }

    /// Drop the memo so the next call recomputes.
    pub async fn invalidate(&self) {
        *self.memo.lock().await = None;
    }

    async fn gather(&self, record: &RepositoryRecord, statuses: &StatusReader) -> RepositoryBranches {
        let listing = self.list_branches(&record.path).await;
        // Unknown and broken entries carry no branch; the listing's `*` line still does.
        let current_branch = statuses
            .get_status(&record.path)
            .current_branch()
            .map(str::to_string)
            .or(listing.current);
        RepositoryBranches {
            path: record.path.clone(),
            name: record.effective_name().to_string(),
            current_branch,
            available: listing.available,
        }
    }

    async fn list_branches(&self, path: &Path) -> BranchListing {
        match self.runner.run_checked(path, BRANCH_LISTING).await {
            Ok(output) => {
                let branches = parse_branches(&output);
                BranchListing {
                    current: branches
                        .iter()
                        .find(|branch| branch.is_current)
                        .map(|branch| branch.name.clone()),
                    available: branches
                        .iter()
                        .map(|branch| branch.short_name().to_string())
                        .filter(|name| name != "HEAD")
                        .collect(),
                }
            }
            Err(e) => {
                log::debug!("Branch listing failed in {}: {e}", path.display());
                BranchListing::default()
            }
        }
    }
}

#[derive(Debug, Default)]
struct BranchListing {
    current: Option<String>,
    available: BTreeSet<String>,
}

fn with_current_names(
    mut infos: Vec<GlobalBranchInfo>,
    repositories: &[RepositoryRecord],
) -> Vec<GlobalBranchInfo> {
    let names: HashMap<&Path, &str> = repositories
        .iter()
        .map(|record| (record.path.as_path(), record.effective_name()))
        .collect();
    for repo in infos.iter_mut().flat_map(|info| info.switchable.iter_mut()) {
        if let Some(name) = names.get(repo.path.as_path()) {
            repo.name = name.to_string();
        }
    }
    infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{RepositorySnapshot, RepositoryStatus};
    use crate::core::status_cache::StatusCache;
    use crate::core::test_support::ScriptedRunner;

    fn repo(path: &str, current: Option<&str>, available: &[&str]) -> RepositoryBranches {
        RepositoryBranches {
            path: PathBuf::from(path),
            name: path.trim_start_matches('/').to_string(),
            current_branch: current.map(str::to_string),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn on_branch(branch: &str) -> RepositoryStatus {
        RepositoryStatus::Analyzed(RepositorySnapshot {
            current_branch: Some(branch.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_protected_branch_lists_repositories_not_on_it() {
        let repos = vec![
            repo("/r1", Some("main"), &["main"]),
            repo("/r2", Some("feature"), &["feature", "main"]),
        ];
        let protected = ProtectedBranches::new(["main"]).unwrap();

        let infos = compute_global_branches(&repos, &protected);
        assert_eq!(
            infos,
            vec![GlobalBranchInfo {
                branch_name: "main".to_string(),
                switchable_count: 1,
                total_repositories: 2,
                switchable: vec![SwitchableRepository {
                    path: PathBuf::from("/r2"),
                    name: "r2".to_string(),
                }],
            }]
        );
    }

    #[test]
    fn test_sorted_by_count_then_name() {
        let repos = vec![
            repo("/a", Some("x"), &["main", "develop", "release/2"]),
            repo("/b", Some("x"), &["main", "release/1"]),
            repo("/c", Some("x"), &["develop", "main"]),
        ];
        let protected = ProtectedBranches::new(["main", "develop", "release/*"]).unwrap();

        let names: Vec<(String, usize)> = compute_global_branches(&repos, &protected)
            .into_iter()
            .map(|info| (info.branch_name, info.switchable_count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("main".to_string(), 3),
                ("develop".to_string(), 2),
                ("release/1".to_string(), 1),
                ("release/2".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_branch_everyone_is_on_is_omitted() {
        let repos = vec![
            repo("/a", Some("main"), &["main"]),
            repo("/b", Some("main"), &["main"]),
        ];
        let protected = ProtectedBranches::new(["main"]).unwrap();
        assert!(compute_global_branches(&repos, &protected).is_empty());
    }

    #[test]
    fn test_detached_repository_is_switchable() {
        let repos = vec![repo("/a", None, &["main"])];
        let protected = ProtectedBranches::new(["main"]).unwrap();
        let infos = compute_global_branches(&repos, &protected);
        assert_eq!(infos[0].switchable_count, 1);
    }

    #[tokio::test]
    async fn test_aggregator_fetches_branch_listings() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(Path::new("/r1"), "branch", "* main abc1234 Init\n")
                .respond(
                    Path::new("/r2"),
                    "branch",
                    "* feature def5678 Work\n  remotes/origin/HEAD -> origin/main\n  remotes/origin/main abc1234 Init\n",
                ),
        );
        let cache = StatusCache::new();
        for (path, branch) in [("/r1", "main"), ("/r2", "feature")] {
            cache.track(Path::new(path));
            cache.replace(Path::new(path), on_branch(branch));
        }
        let records = vec![RepositoryRecord::new("/r1"), RepositoryRecord::new("/r2")];
        let aggregator = BranchAggregator::new(runner);
        let protected = ProtectedBranches::new(["main"]).unwrap();

        let infos = aggregator
            .global_branches(&records, &cache.reader(), &protected)
            .await;
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].branch_name, "main");
        assert_eq!(infos[0].switchable[0].path, PathBuf::from("/r2"));
    }

    #[tokio::test]
    async fn test_metadata_changes_do_not_recompute() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(Path::new("/r1"), "branch", "* main abc1234 Init\n")
                .respond(Path::new("/r2"), "branch", "* feature def5678 Work\n  main abc1234 Init\n"),
        );
        let cache = StatusCache::new();
        for (path, branch) in [("/r1", "main"), ("/r2", "feature")] {
            cache.track(Path::new(path));
            cache.replace(Path::new(path), on_branch(branch));
        }
        let mut records = vec![RepositoryRecord::new("/r1"), RepositoryRecord::new("/r2")];
        let aggregator = BranchAggregator::new(runner.clone());
        let protected = ProtectedBranches::new(["main"]).unwrap();

        aggregator.global_branches(&records, &cache.reader(), &protected).await;
        assert_eq!(aggregator.recompute_count(), 1);

        records[0].custom_alias = Some("renamed".to_string());
        records[1].is_favorite = true;
        records.reverse();
        aggregator.global_branches(&records, &cache.reader(), &protected).await;
        assert_eq!(aggregator.recompute_count(), 1);
        assert_eq!(runner.call_count("branch"), 2);

        cache.replace(Path::new("/r2"), on_branch("main"));
        let infos = aggregator.global_branches(&records, &cache.reader(), &protected).await;
        assert_eq!(aggregator.recompute_count(), 2);
        assert!(infos.is_empty());

        let wider = ProtectedBranches::new(["main", "feature"]).unwrap();
        aggregator.global_branches(&records, &cache.reader(), &wider).await;
        assert_eq!(aggregator.recompute_count(), 3);
    }

    #[tokio::test]
    async fn test_memoized_result_uses_current_names() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(Path::new("/r1"), "branch", "* main abc1234 Init\n")
                .respond(Path::new("/r2"), "branch", "* feature def5678 Work\n  main abc1234 Init\n"),
        );
        let cache = StatusCache::new();
        for (path, branch) in [("/r1", "main"), ("/r2", "feature")] {
            cache.track(Path::new(path));
            cache.replace(Path::new(path), on_branch(branch));
        }
        let mut records = vec![RepositoryRecord::new("/r1"), RepositoryRecord::new("/r2")];
        let aggregator = BranchAggregator::new(runner);
        let protected = ProtectedBranches::new(["main"]).unwrap();

        let first = aggregator.global_branches(&records, &cache.reader(), &protected).await;
        assert_eq!(first[0].switchable[0].name, "r2");

        records[1].custom_alias = Some("payments".to_string());
        let second = aggregator.global_branches(&records, &cache.reader(), &protected).await;
        assert_eq!(aggregator.recompute_count(), 1);
        assert_eq!(second[0].switchable[0].name, "payments");
    }

    #[tokio::test]
    async fn test_unknown_status_falls_back_to_listed_current_branch() {
        let runner = Arc::new(ScriptedRunner::new().respond(
            Path::new("/r1"),
            "branch",
            "* main abc1234 Init\n  develop def5678 Work\n",
        ));
        let cache = StatusCache::new();
        cache.track(Path::new("/r1"));
        let records = vec![RepositoryRecord::new("/r1")];
        let aggregator = BranchAggregator::new(runner);
        let protected = ProtectedBranches::new(["main"]).unwrap();

        let infos = aggregator
            .global_branches(&records, &cache.reader(), &protected)
            .await;
        assert!(infos.is_empty());

        let wider = ProtectedBranches::new(["main", "develop"]).unwrap();
        let infos = aggregator.global_branches(&records, &cache.reader(), &wider).await;
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].branch_name, "develop");
    }

    #[tokio::test]
    async fn test_failed_listing_contributes_current_branch() {
        let runner = Arc::new(ScriptedRunner::new().respond(
            Path::new("/r2"),
            "branch",
            "* feature def5678 Work\n  main abc1234 Init\n",
        ));
        let cache = StatusCache::new();
        for (path, branch) in [("/r1", "main"), ("/r2", "feature")] {
            cache.track(Path::new(path));
            cache.replace(Path::new(path), on_branch(branch));
        }
        let records = vec![RepositoryRecord::new("/r1"), RepositoryRecord::new("/r2")];
        let aggregator = BranchAggregator::new(runner);
        let protected = ProtectedBranches::new(["main"]).unwrap();

        let infos = aggregator
            .global_branches(&records, &cache.reader(), &protected)
            .await;
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].switchable_count, 1);
        assert_eq!(infos[0].total_repositories, 2);
    }
}
