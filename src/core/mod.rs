//! Core functionality for git-fleet.
//!
//! Leaf modules first: parsers and records, then the command runner and the
//! configuration store, then the status cache, refresh orchestration, watching
//! and branch aggregation, all assembled by [`workspace::Workspace`].

pub mod branch_aggregator;
pub mod command;
pub mod config;
pub mod constants;
pub mod dirs;
pub mod error;
pub mod git_status;
pub mod output;
pub mod parsers;
pub mod probe;
pub mod protected;
pub mod records;
pub mod refresh;
pub mod state;
pub mod status_cache;
pub mod watcher;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

// === Error handling ===
pub use error::{FleetError, Result};

// === Running git ===
pub use command::{CommandOutput, CommandRunner, GitCommandRunner};

// === Configuration ===
pub use config::{AppConfig, ConfigLoadState, ConfigStore, RepositoryRecord, WorkspaceGroup};

// === Status ===
pub use git_status::FileStatusType;
pub use state::{BrokenReason, RepositorySnapshot, RepositoryStatus, StatusCounters};
pub use status_cache::{StatusEvent, StatusReader};
pub use refresh::{OrchestratorOptions, RefreshOrchestrator, RefreshOutcome, RefreshSummary};

// === Watching ===
pub use watcher::{RefreshTarget, WatchManager, WatchOptions};

// === Cross-repository branches ===
pub use branch_aggregator::{BranchAggregator, GlobalBranchInfo, SwitchableRepository};
pub use protected::ProtectedBranches;

// === Workspace ===
pub use workspace::{CheckoutResult, Workspace, WorkspaceOptions};

// === Output formatting ===
pub use output::{print_error, print_info, print_section_header, print_success};
