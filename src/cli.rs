use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::record::RecordKind;

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Reference code (e.g., PM-12 or PM-12-3) or id of the record
    pub record: String,

    /// Record kind, inferred from the reference code when omitted
    #[clap(short, long, value_enum)]
    pub kind: Option<RecordKind>,

    /// Destination repository (owner/repo)
    #[clap(short, long, env = "AHA_CLAUDE_REPOSITORY")]
    pub repository: Option<String>,

    /// Branch the pull request should target
    #[clap(short, long)]
    pub base_branch: Option<String>,

    /// Additional instructions appended to the issue
    #[clap(short, long)]
    pub instructions: Option<String>,

    /// Write additional instructions in $EDITOR
    #[clap(short, long, value_parser, default_value_t = false)]
    pub edit_instructions: bool,

    /// Agent to mention in the assignment comment
    #[clap(short, long)]
    pub agent: Option<String>,

    /// Aha! account subdomain
    #[clap(long, env = "AHA_DOMAIN")]
    pub aha_domain: Option<String>,

    /// Configuration directory
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Do not ask for confirmation
    #[clap(short, long, value_parser, default_value_t = false)]
    pub yes: bool,

    /// Print the issue instead of creating it
    #[clap(short, long, value_parser, default_value_t = false)]
    pub dry_run: bool,

    /// Enable debug logging
    #[clap(short, long, value_parser, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Override configuration values with the ones given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(repository) = &self.repository {
            config.github.repository = Some(repository.clone());
        }
        if let Some(base_branch) = &self.base_branch {
            config.github.base_branch = Some(base_branch.clone());
        }
        if let Some(instructions) = &self.instructions {
            config.claude.custom_instructions = Some(instructions.clone());
        }
        if let Some(agent) = &self.agent {
            config.claude.agent = Some(agent.clone());
        }
        if let Some(domain) = &self.aha_domain {
            config.aha.domain = Some(domain.clone());
        }
    }
}
