use crate::core::constants::{CONFIG_FILE_NAME, CONFIG_PATH_ENV};
use crate::core::error::{FleetError, Result};
use std::path::PathBuf;

pub fn get_config_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config"))),
        "macos" => dirs::home_dir().map(|home| home.join("Library/Application Support")),
        _ => dirs::config_dir(),
    };

    base.map(|dir| dir.join("git-fleet"))
        .ok_or(FleetError::ConfigDirectoryNotFound)
}

/// Location of the config file: `$GIT_FLEET_CONFIG` if set, else the platform config directory.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(get_config_directory()?.join(CONFIG_FILE_NAME))
}
