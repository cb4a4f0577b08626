use colored::Colorize;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{set_global_render_config, Confirm, Editor};

use crate::button::{Action, AssignButton, Status};
use crate::error::Error;
use crate::record::RecordRef;
use crate::template::Issue;

/// Initialize the global render configuration for inquire prompts
pub fn init_render_config() {
    let mut style = RenderConfig::default_colored();
    style.prompt_prefix = Styled::new(">").with_fg(Color::LightGreen);
    set_global_render_config(style);
}

/// Print the control the way it currently looks
pub fn render(button: &AssignButton) {
    let label = match button.status() {
        Status::Success | Status::Existing => button.label().bright_green(),
        Status::Error => button.label().bright_red(),
        _ => button.label().bright_cyan(),
    };
    println!("{} {}", ">".bright_green(), label);

    match button.action() {
        Action::Configure => println!(
            "  {} set github.repository in the config file or pass --repository owner/repo",
            "Configure Claude:".bright_yellow()
        ),
        Action::ViewIssue(url) => println!("  {} {}", "View issue:".bright_green(), url.bright_cyan()),
        Action::Send | Action::Disabled => {}
    }

    match button.status() {
        Status::Error => println!("  {}", button.message().red()),
        Status::Success => println!("  {}", button.message()),
        Status::Idle | Status::NotConfigured => println!("  {}", button.footer().dimmed()),
        Status::Loading | Status::Existing => {}
    }
}

/// Print a progress step while loading
pub fn progress(message: &str) {
    println!("{} {}", "+".bright_green(), message);
}

/// Print a composed issue instead of sending it
pub fn print_issue(issue: &Issue) {
    println!("{} Title: {}", ">".bright_green(), issue.title.bright_cyan());
    println!("{} Body:\n{}", ">".bright_green(), issue.body);
    println!("{} Comment:\n{}", ">".bright_green(), issue.comment);
}

/// Ask before creating the issue
pub fn confirm_send(record: &RecordRef, repository: &str) -> Result<bool, Error> {
    Confirm::new(&format!("Send {} {} to Claude in {}?", record.kind, record.id, repository))
        .with_default(true)
        .prompt()
        .map_err(Error::from)
}

/// Prompt for additional instructions using an editor
pub fn prompt_instructions(initial: Option<&str>) -> Result<String, Error> {
    Editor::new("Additional instructions for Claude:")
        .with_predefined_text(initial.unwrap_or(""))
        .with_formatter(&|x| x.to_string())
        .prompt()
        .map_err(Error::from)
}
