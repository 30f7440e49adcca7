//! Cross-platform path utilities for Versecast.
//!
//! Single source of truth for the well-known locations the sync subsystem
//! relies on: the shared slot file every window on a device observes, and
//! the hub daemon's config file.
//!
//! # Platform Behavior
//!
//! | Platform | Data Directory | Config Directory |
//! |----------|----------------|------------------|
//! | Linux    | `~/.local/share/versecast` | `~/.config/versecast` |
//! | macOS    | `~/Library/Application Support/versecast` | `~/Library/Application Support/versecast` |
//! | Windows  | `%APPDATA%/versecast` | `%APPDATA%/versecast` |

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;

/// Errors specific to path operations.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not determine data directory")]
    NoDataDirectory,

    #[error("Could not determine config directory")]
    NoConfigDirectory,
}

/// Application identifier used in path construction.
const APP_NAME: &str = "versecast";

/// File name of the shared projection slot. One fixed slot system-wide:
/// every process on the device reads and writes the same file.
const SLOT_FILE_NAME: &str = "projection.json";

/// File name of the hub daemon configuration.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the application data directory, creating it if needed.
///
/// Secure permissions (0o700) are applied on Unix so another user cannot
/// inject projection content.
pub fn get_data_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().ok_or(PathError::NoDataDirectory)?;
    let data_dir = base_dir.join(APP_NAME);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&data_dir, perms)
                .with_context(|| format!("Failed to set permissions on {}", data_dir.display()))?;
        }
    }

    Ok(data_dir)
}

/// Path of the shared projection slot file.
pub fn slot_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(SLOT_FILE_NAME))
}

/// Default path of the hub daemon config file. The parent directory is not
/// created here; config loading handles that on first save.
pub fn default_config_path() -> Result<PathBuf> {
    let base_dir = dirs::config_dir().ok_or(PathError::NoConfigDirectory)?;
    Ok(base_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_absolute() {
        let dir = get_data_dir().unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_slot_path() {
        let path = slot_path().unwrap();
        assert!(path.ends_with("projection.json"));
        assert!(path.is_absolute());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with("config.toml"));
        assert!(path.is_absolute());
    }
}
