//! Configuration management for aha-claude
//!
//! This module handles configuration paths and loads `config.yaml` from the
//! config directory. Every key is optional; a missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::settings::Settings;

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "aha-claude";

/// Name of the configuration file inside the config directory
const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_GITHUB_API: &str = "https://api.github.com";
const DEFAULT_EXTENSION_ID: &str = "aha-develop.claude";
const DEFAULT_FIELD_NAME: &str = "claudeIssue";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub aha: AhaConfig,
    pub github: GitHubConfig,
    pub claude: ClaudeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AhaConfig {
    /// Account subdomain (e.g., "acme" for https://acme.aha.io)
    pub domain: Option<String>,
    /// Full account URL, takes precedence over `domain`
    pub url: Option<String>,
    pub token: Option<String>,
    /// Extension owning the assignment field
    pub extension_id: String,
    /// Field the assignment is stored in
    pub field_name: String,
}

impl Default for AhaConfig {
    fn default() -> Self {
        Self {
            domain: None,
            url: None,
            token: None,
            extension_id: DEFAULT_EXTENSION_ID.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    pub repository: Option<String>,
    pub base_branch: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repository: None,
            base_branch: None,
            token: None,
            api_url: DEFAULT_GITHUB_API.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaudeConfig {
    pub agent: Option<String>,
    pub custom_instructions: Option<String>,
}

impl Config {
    /// Load the configuration from `config.yaml` in the given directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Base URL of the Aha! account
    pub fn aha_url(&self) -> Result<String> {
        if let Some(url) = self.aha.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().trim_end_matches('/').to_string());
        }

        match self.aha.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => Ok(format!("https://{}.aha.io", domain)),
            _ => Err(Error::Config(
                "Aha! account not configured. Set aha.domain or aha.url in config or AHA_DOMAIN environment variable".into(),
            )),
        }
    }

    /// The settings bundle described by this configuration
    pub fn settings(&self) -> Settings {
        Settings {
            repository: self.github.repository.clone(),
            base_branch: self.github.base_branch.clone(),
            custom_instructions: self.claude.custom_instructions.clone(),
            agent: self.claude.agent.clone(),
        }
    }
}

/// Get the configuration directory path
///
/// Returns the path to `~/.config/aha-claude/`.
pub fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| Error::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".config").join(PKG_NAME))
}

/// Ensure the configuration directory exists, creating it if necessary
pub fn ensure_config_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
