use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use tracing::{debug, warn};

use crate::aha::AhaClient;
use crate::auth;
use crate::button::{Action, AssignButton, Status};
use crate::cli::Args;
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::record::{Assignment, RecordRef};
use crate::settings::Settings;
use crate::template;
use crate::ui;

/// Main application entry point
///
/// Returns the final state of the control so the caller can pick an exit code.
pub fn run(args: Args) -> Result<Status> {
    ui::init_render_config();

    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => config::get_config_dir()?,
    };
    config::ensure_config_dir_exists(&config_dir)?;
    let mut config = Config::load(&config_dir)?;
    args.apply(&mut config);

    let record = RecordRef::resolve(&args.record, args.kind)?;
    let mut settings = config.settings();

    let aha = match aha_client(&config) {
        Ok(aha) => aha,
        // Nothing to read or write yet, so show the setup hint instead of failing
        Err(err) if !settings.is_configured() => {
            debug!(error = %err, "Aha! account not configured");
            let button = AssignButton::new(record.kind, &settings, None);
            ui::render(&button);
            return Ok(button.status());
        }
        Err(err) => return Err(err),
    };

    let existing = aha.existing_assignment(&record)?;
    let mut button = AssignButton::new(record.kind, &settings, existing.as_ref());
    ui::render(&button);

    if button.action() != Action::Send {
        return Ok(button.status());
    }

    if args.edit_instructions {
        let instructions = ui::prompt_instructions(settings.custom_instructions.as_deref())?;
        settings.custom_instructions = Some(instructions);
    }

    if args.dry_run {
        let fetched = aha.fetch_record(&record)?;
        ui::print_issue(&template::make_issue(&fetched, &settings));
        println!("{} Dry run - no issue created", ">".bright_green());
        return Ok(button.status());
    }

    let repository = settings.repository.clone().unwrap_or_default();
    if !args.yes && !ui::confirm_send(&record, repository.trim())? {
        return Err(Error::Cancelled);
    }

    button.begin()?;
    ui::progress(button.message());

    let result = assign(
        &aha,
        &config.github.api_url,
        || auth::github_token(&config),
        &record,
        &settings,
        |message| {
            button.progress(message);
            ui::progress(message);
        },
    );

    match result {
        Ok(assignment) => button.succeed(&assignment)?,
        Err(err) => button.fail(&err)?,
    }
    ui::render(&button);

    Ok(button.status())
}

fn aha_client(config: &Config) -> Result<AhaClient> {
    Ok(AhaClient::new(config.aha_url()?, auth::aha_token(config)?)?
        .with_field(&config.aha.extension_id, &config.aha.field_name))
}

/// Send a record to the tracker and record the assignment on it
///
/// Steps run strictly in order: fetch, compose, authenticate, create the
/// issue and its comment, record the assignment. Nothing is undone when a
/// later step fails.
pub fn assign<A, P>(
    aha: &AhaClient,
    github_api: &str,
    authenticate: A,
    record: &RecordRef,
    settings: &Settings,
    mut progress: P,
) -> Result<Assignment>
where
    A: FnOnce() -> Result<String>,
    P: FnMut(&str),
{
    let (owner, repo) = settings.owner_and_repo()?;

    let fetched = aha.fetch_record(record)?;
    let issue = template::make_issue(&fetched, settings);
    debug!(title = %issue.title, "issue composed");

    progress("Authenticating with GitHub...");
    let token = authenticate()?;

    progress("Creating GitHub Issue...");
    let github = GitHubClient::new(github_api, token)?;
    let created = github.publish_issue(&owner, &repo, &issue)?;

    let assignment = Assignment {
        issue_number: created.number,
        issue_url: created.html_url.clone(),
        assigned_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    progress("Recording assignment...");
    if let Err(err) = aha.record_assignment(&fetched, &assignment) {
        warn!(url = %created.html_url, error = %err, "issue created but assignment not recorded");
        return Err(err.after_issue_created(created.html_url));
    }

    Ok(assignment)
}
