//! Application configuration management.
//!
//! Configuration is stored at `~/.config/shepherd/config.json` and holds
//! the API base URL, the last email used to sign in and the devotions page
//! size. Environment variables (usually from `.env`) override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "shepherd";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://api-shepherd.jar-vis.com/api/v1";

pub const DEFAULT_DEVOTIONS_PER_PAGE: usize = 5;

pub const ENV_API_URL: &str = "SHEPHERD_API_URL";
pub const ENV_EMAIL: &str = "SHEPHERD_EMAIL";
pub const ENV_PASSWORD: &str = "SHEPHERD_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
    pub devotions_per_page: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(ENV_API_URL) {
            self.api_base_url = Some(url);
        }
        if let Some(email) = non_blank(ENV_EMAIL) {
            self.last_email = Some(email);
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn devotions_per_page(&self) -> usize {
        self.devotions_per_page
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DEVOTIONS_PER_PAGE)
    }

    /// Directory holding the session storage file
    pub fn storage_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory for rolling log files
    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.storage_dir()?.join("logs"))
    }
}

/// Password from the environment, never stored in the config file
pub fn env_password() -> Option<String> {
    std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty())
}
