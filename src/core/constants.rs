//! Named policy constants.
//!
//! None of these values are load-bearing for correctness; each one can be
//! overridden through [`OrchestratorOptions`](crate::core::refresh::OrchestratorOptions),
//! [`WatchOptions`](crate::core::watcher::WatchOptions) or the runner builder.

use std::time::Duration;

/// Quiet period after the last filesystem event before a repository is refreshed.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Refreshes slower than this are logged as slow.
pub const SLOW_REFRESH_THRESHOLD: Duration = Duration::from_secs(2);

/// Hard limit for a single git invocation.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of search history entries kept in the UI preferences.
pub const SEARCH_HISTORY_LIMIT: usize = 20;

/// Protected branch patterns written into a fresh configuration.
pub const DEFAULT_PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop"];

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "GIT_FLEET_CONFIG";
