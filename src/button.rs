//! The "Send to Claude" control
//!
//! A small state machine mirroring what the user can do with a record:
//!
//! ```text
//! not-configured
//! idle ──send──▶ loading ──▶ success
//!   ▲               │
//!   └──── error ◀───┘   (error can send again)
//! existing
//! ```
//!
//! `existing` and `success` are terminal; the only action left is viewing
//! the issue.

use std::fmt;

use crate::error::{Error, Result};
use crate::record::{Assignment, RecordKind};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotConfigured,
    Idle,
    Loading,
    Success,
    Error,
    Existing,
}

impl Status {
    /// Nothing left to do but view the issue
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Existing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::NotConfigured => "not-configured",
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Success => "success",
            Status::Error => "error",
            Status::Existing => "existing",
        })
    }
}

/// What the control offers in its current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Go set up the repository first
    Configure,
    /// Create the issue
    Send,
    /// Work in progress, nothing to do
    Disabled,
    /// Open the created issue
    ViewIssue(String),
}

#[derive(Debug, Clone)]
pub struct AssignButton {
    kind: RecordKind,
    status: Status,
    message: String,
    issue_url: Option<String>,
}

impl AssignButton {
    /// Build the control for a record, given its settings and any assignment already stored on it
    pub fn new(kind: RecordKind, settings: &Settings, existing: Option<&Assignment>) -> Self {
        let (status, message, issue_url) = match existing {
            Some(assignment) => (
                Status::Existing,
                "Assigned to Claude.".to_string(),
                Some(assignment.issue_url.clone()),
            ),
            None if settings.is_configured() => (Status::Idle, String::new(), None),
            None => (Status::NotConfigured, String::new(), None),
        };

        Self {
            kind,
            status,
            message,
            issue_url,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn issue_url(&self) -> Option<&str> {
        self.issue_url.as_deref()
    }

    pub fn action(&self) -> Action {
        match self.status {
            Status::NotConfigured => Action::Configure,
            Status::Idle | Status::Error => Action::Send,
            Status::Loading => Action::Disabled,
            Status::Success | Status::Existing => match &self.issue_url {
                Some(url) => Action::ViewIssue(url.clone()),
                None => Action::Disabled,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self.status {
            Status::NotConfigured | Status::Idle | Status::Error => "Build with Claude",
            Status::Loading => "Sending to Claude...",
            Status::Success | Status::Existing => "Assigned to Claude",
        }
    }

    /// Footer text shown under the control
    pub fn footer(&self) -> String {
        match self.status {
            Status::Loading => self.message.clone(),
            _ => format!("Share this {} with Claude to begin implementation.", self.kind),
        }
    }

    /// User asked to send the record
    pub fn begin(&mut self) -> Result<()> {
        match self.status {
            Status::Idle | Status::Error => {
                self.status = Status::Loading;
                self.message = "Loading record details...".to_string();
                self.issue_url = None;
                Ok(())
            }
            other => Err(Error::InvalidTransition {
                action: "send".into(),
                status: other.to_string(),
            }),
        }
    }

    /// Update the progress message while loading
    pub fn progress(&mut self, message: impl Into<String>) {
        if self.status == Status::Loading {
            self.message = message.into();
        }
    }

    /// The assignment was recorded
    pub fn succeed(&mut self, assignment: &Assignment) -> Result<()> {
        self.expect_loading("succeed")?;
        self.status = Status::Success;
        self.message = "GitHub Issue created and assigned to Claude.".to_string();
        self.issue_url = Some(assignment.issue_url.clone());
        Ok(())
    }

    /// Any step failed
    pub fn fail(&mut self, err: &Error) -> Result<()> {
        self.expect_loading("fail")?;
        self.status = Status::Error;
        self.message = format!("Error: {}", err);
        self.issue_url = err.orphaned_issue_url().map(String::from);
        Ok(())
    }

    fn expect_loading(&self, action: &str) -> Result<()> {
        if self.status == Status::Loading {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action: action.into(),
                status: self.status.to_string(),
            })
        }
    }
}
