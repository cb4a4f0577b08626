//! Issue templates
//!
//! This module turns a fetched record into the title, markdown body and
//! assignment comment of a tracker issue. Everything here is pure string
//! assembly over data that has already been fetched.

use crate::record::{markdown_of, Attachment, ParentFeature, Record, RequirementSummary, Task};
use crate::settings::Settings;

/// Placeholder for child requirements without a name
const NO_NAME: &str = "No name provided";

/// An issue ready to be sent to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub title: String,
    pub body: String,
    /// Posted as the first comment, addressing the agent
    pub comment: String,
}

/// Compose title, body and comment for a record
pub fn make_issue(record: &Record, settings: &Settings) -> Issue {
    Issue {
        title: make_title(record.reference_num(), record.name()),
        body: make_body(
            record,
            settings.custom_instructions.as_deref(),
            settings.base_branch(),
        ),
        comment: make_comment(record, settings.agent_handle()),
    }
}

/// Issue title, e.g. "PM-12: Export CSV"
pub fn make_title(reference_num: &str, name: &str) -> String {
    format!("{}: {}", reference_num, name)
}

/// Generate the issue body for a record
///
/// # Arguments
/// * `record` - The fetched feature or requirement
/// * `custom_instructions` - Free text appended verbatim as the last section
/// * `base_branch` - Branch the pull request should target, listed with the instructions
///
/// # Returns
/// Markdown with one section per non-empty part of the record
pub fn make_body(record: &Record, custom_instructions: Option<&str>, base_branch: Option<&str>) -> String {
    let mut sections = vec![section("### Description", record.description_markdown())];

    match record {
        Record::Feature(feature) => {
            if !feature.requirements.is_empty() {
                sections.push(list_section(
                    "### Requirements",
                    feature.requirements.iter().map(requirement_line),
                    "\n",
                ));
            }
            if !feature.tasks.is_empty() {
                sections.push(list_section(
                    "### Todos",
                    feature.tasks.iter().map(feature_todo),
                    "\n\n",
                ));
            }
        }
        Record::Requirement(requirement) => {
            sections.push(parent_section(&requirement.feature));
            if !requirement.tasks.is_empty() {
                sections.push(list_section(
                    "### Todos",
                    requirement.tasks.iter().map(requirement_todo),
                    "\n\n",
                ));
            }
        }
    }

    sections.push(format!(
        "**Aha! Reference:** [{}]({})",
        record.reference_num(),
        record.path()
    ));

    let attachments = record.attachments();
    if !attachments.is_empty() {
        sections.push(list_section(
            "### Attachments",
            attachments.into_iter().map(attachment_line),
            "\n",
        ));
    }

    if let Some(instructions) = instructions_section(custom_instructions, base_branch) {
        sections.push(instructions);
    }

    let mut body = sections.join("\n\n");
    body.push('\n');
    body
}

/// Generate the comment that hands the issue to the agent
///
/// The reference code appears exactly twice: once for the branch name and
/// once for the PR title. Nothing user supplied goes into the comment.
pub fn make_comment(record: &Record, agent: &str) -> String {
    let reference = record.reference_num();
    let agent = agent.trim_start_matches('@');

    format!(
        "@{} please create a pull request to implement this {}.\n\n\
         **IMPORTANT - Branch and PR Naming Requirement:**\n\
         - You MUST include `{}` in the branch name\n\
         - You MUST include `{}` in the PR title\n",
        agent,
        record.kind(),
        reference,
        reference
    )
}

/// The base branch request followed by the custom instructions, as given
fn instructions_section(custom_instructions: Option<&str>, base_branch: Option<&str>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(base) = base_branch {
        parts.push(format!("Open the pull request against the `{}` branch.", base));
    }
    if let Some(instructions) = custom_instructions.filter(|i| !i.is_empty()) {
        parts.push(instructions.to_string());
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("### Additional Instructions\n\n{}", parts.join("\n\n")))
    }
}

/// A heading followed by free-form markdown, or the bare heading when empty
fn section(heading: &str, content: &str) -> String {
    if content.is_empty() {
        heading.to_string()
    } else {
        format!("{}\n\n{}", heading, content)
    }
}

fn list_section<I>(heading: &str, items: I, separator: &str) -> String
where
    I: Iterator<Item = String>,
{
    format!("{}\n{}", heading, items.collect::<Vec<_>>().join(separator))
}

fn parent_section(parent: &ParentFeature) -> String {
    section(
        &format!("## Feature {}", parent.reference_num),
        markdown_of(parent.description.as_ref()),
    )
}

fn requirement_line(requirement: &RequirementSummary) -> String {
    let name = requirement
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(NO_NAME);
    format!("- **{}**: {}", requirement.reference_num, name)
}

fn feature_todo(task: &Task) -> String {
    match task_body(task) {
        Some(body) => format!("- {}\n{}", task.name, indent(body)),
        None => format!("- {}", task.name),
    }
}

fn requirement_todo(task: &Task) -> String {
    match task_body(task) {
        Some(body) => format!("- **{}**\n\n{}", task.name, body),
        None => format!("- **{}**", task.name),
    }
}

fn task_body(task: &Task) -> Option<&str> {
    task.body.as_deref().map(str::trim).filter(|b| !b.is_empty())
}

/// Indent every non-blank line so it continues the list item above it
fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn attachment_line(attachment: &Attachment) -> String {
    format!("- [{}]({})", attachment.file_name, attachment.download_url)
}
