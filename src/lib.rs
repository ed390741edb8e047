//! git-fleet - keeps track of many git repositories at once.
//!
//! The library discovers each repository's state by running `git` and parsing
//! its output, keeps that state fresh as files change, and answers questions
//! across repositories such as which protected branches some of them could
//! switch to.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module:
//! - [`Workspace`]: configuration, status cache, watcher and branch aggregation
//! - [`StatusReader`]: read-only view of cached repository status
//! - [`core::parsers`]: total parsers for git's text output
//! - [`FleetError`] and [`Result`]

pub mod commands;
pub mod core;

pub use core::{
    // Errors
    FleetError,
    Result,

    // Workspace
    CheckoutResult,
    Workspace,
    WorkspaceOptions,

    // Status
    RefreshOutcome,
    RefreshSummary,
    RepositoryStatus,
    StatusCounters,
    StatusReader,

    // Configuration
    AppConfig,
    ConfigStore,
    RepositoryRecord,

    // Cross-repository branches
    GlobalBranchInfo,
    ProtectedBranches,
};
