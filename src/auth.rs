//! Credential lookup for GitHub and Aha!
//!
//! GitHub tokens are resolved from, in order:
//! - the `github.token` config value
//! - `GITHUB_TOKEN` or `GH_TOKEN`
//! - `gh auth token` from the GitHub CLI
//!
//! The first token found is cached for the rest of the process.

use std::process::Command;
use std::sync::Mutex;

use lazy_static::lazy_static;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

const GITHUB_TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];
const AHA_TOKEN_VAR: &str = "AHA_TOKEN";

lazy_static! {
    static ref GITHUB_TOKEN_CACHE: Mutex<Option<String>> = Mutex::new(None);
}

/// Get a GitHub token with repository read/write access
pub fn github_token(config: &Config) -> Result<String> {
    if let Some(token) = cached_github_token() {
        debug!("using cached GitHub token");
        return Ok(token);
    }

    let token = resolve_github_token(config.github.token.as_deref(), env_token, gh_cli_token)?;

    if let Ok(mut cache) = GITHUB_TOKEN_CACHE.lock() {
        *cache = Some(token.clone());
    }
    Ok(token)
}

/// Get the Aha! API token
pub fn aha_token(config: &Config) -> Result<String> {
    non_blank(config.aha.token.as_deref())
        .or_else(|| non_blank(std::env::var(AHA_TOKEN_VAR).ok().as_deref()))
        .ok_or_else(|| {
            Error::Auth(format!(
                "Aha! token not configured. Set aha.token in config or {} environment variable",
                AHA_TOKEN_VAR
            ))
        })
}

fn cached_github_token() -> Option<String> {
    GITHUB_TOKEN_CACHE.lock().ok().and_then(|cache| cache.clone())
}

fn resolve_github_token<E, G>(configured: Option<&str>, env: E, gh: G) -> Result<String>
where
    E: Fn(&str) -> Option<String>,
    G: FnOnce() -> Result<String>,
{
    if let Some(token) = non_blank(configured) {
        debug!("using GitHub token from config");
        return Ok(token);
    }

    for var in GITHUB_TOKEN_VARS {
        if let Some(token) = non_blank(env(var).as_deref()) {
            debug!(var, "using GitHub token from environment");
            return Ok(token);
        }
    }

    gh()
}

fn env_token(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Ask the GitHub CLI for the token of the logged in user
fn gh_cli_token() -> Result<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .map_err(|e| Error::Auth(format!("No GitHub token found and gh is unavailable: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Auth(format!("GitHub CLI error: {}", stderr.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    non_blank(Some(&*stdout)).ok_or_else(|| Error::Auth("GitHub CLI returned an empty token".into()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
