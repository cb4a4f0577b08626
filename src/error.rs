use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please configure the repository setting (e.g., owner/repo)")]
    ConfigurationMissing,

    #[error("{0}")]
    Fetch(String),

    #[error("{message}")]
    TrackerApi { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to record assignment: {0}")]
    Recorder(String),

    #[error("{source}\nThe issue was created at {issue_url} but the assignment did not complete.")]
    PartiallyCompleted {
        issue_url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot {action} while {status}")]
    InvalidTransition { action: String, status: String },

    #[error("User cancelled operation")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl Error {
    /// Wraps a failure that happened after the tracker issue already existed.
    pub fn after_issue_created(self, issue_url: impl Into<String>) -> Self {
        Error::PartiallyCompleted {
            issue_url: issue_url.into(),
            source: Box::new(self),
        }
    }

    /// URL of the tracker issue left behind by a partially completed action.
    pub fn orphaned_issue_url(&self) -> Option<&str> {
        match self {
            Error::PartiallyCompleted { issue_url, .. } => Some(issue_url),
            _ => None,
        }
    }
}

impl From<inquire::error::InquireError> for Error {
    fn from(err: inquire::error::InquireError) -> Self {
        match err {
            inquire::error::InquireError::OperationCanceled => Error::Cancelled,
            inquire::error::InquireError::OperationInterrupted => Error::Cancelled,
            other => Error::Prompt(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
