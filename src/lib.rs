//! # aha-claude
//!
//! Send Aha! features and requirements to Claude as GitHub issues.

pub mod aha;
pub mod app;
pub mod auth;
pub mod button;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod record;
pub mod settings;
pub mod template;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use record::{Assignment, Record, RecordKind, RecordRef};
pub use settings::Settings;
pub use template::Issue;
