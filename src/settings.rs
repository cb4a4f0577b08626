use crate::error::{Error, Result};

/// Default agent mentioned in the assignment comment
pub const DEFAULT_AGENT: &str = "claude";

/// The settings bundle an assignment runs with
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Settings {
    /// Destination repository (e.g., "owner/repo")
    pub repository: Option<String>,
    /// Branch the pull request should target
    pub base_branch: Option<String>,
    /// Free text appended to the issue body
    pub custom_instructions: Option<String>,
    /// Handle of the agent the comment addresses
    pub agent: Option<String>,
}

impl Settings {
    /// Creates new Settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository and returns self for chaining
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Sets the base branch and returns self for chaining
    pub fn with_base_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = Some(base_branch.into());
        self
    }

    /// Sets the custom instructions and returns self for chaining
    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    /// Sets the agent handle and returns self for chaining
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Whether a repository has been set at all
    pub fn is_configured(&self) -> bool {
        self.repository
            .as_deref()
            .map_or(false, |r| !r.trim().is_empty())
    }

    /// Split the repository into owner and name
    pub fn owner_and_repo(&self) -> Result<(String, String)> {
        let repository = self.repository.as_deref().map(str::trim).unwrap_or("");

        match repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(Error::ConfigurationMissing),
        }
    }

    /// Trimmed base branch, if a non-blank one is set
    pub fn base_branch(&self) -> Option<&str> {
        self.base_branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Agent handle without a leading `@`
    pub fn agent_handle(&self) -> &str {
        self.agent
            .as_deref()
            .map(|a| a.trim().trim_start_matches('@'))
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AGENT)
    }
}
