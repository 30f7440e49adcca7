//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use versecast_hub::DEFAULT_HUB_PORT;

/// Hub daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Path to configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// TCP address the projection hub binds to
    pub bind_addr: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            bind_addr: format!("0.0.0.0:{}", DEFAULT_HUB_PORT),
        }
    }
}

impl HubConfig {
    /// Load configuration from file, or create default
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => versecast_paths::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let mut config: HubConfig =
                toml::from_str(&contents).context("Failed to parse config file")?;

            config.config_path = config_path;
            Ok(config)
        } else {
            let mut config = Self::default();
            config.config_path = config_path;
            config.save().context("Failed to save default config")?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&self.config_path, contents).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_well_known_port() {
        let config = HubConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:7411");
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = HubConfig::load(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.bind_addr, "0.0.0.0:7411");

        // Second load reads the file back
        let reloaded = HubConfig::load(Some(path)).unwrap();
        assert_eq!(reloaded.bind_addr, config.bind_addr);
    }
}
