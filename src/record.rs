//! Aha! record model
//!
//! Features and requirements as fetched from Aha!, plus the assignment
//! record this tool stores back on them.

use std::fmt;

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

lazy_static! {
    static ref FEATURE_REF: Regex = Regex::new(r"^[A-Z][A-Z0-9]*-\d+$").unwrap();
    static ref REQUIREMENT_REF: Regex = Regex::new(r"^[A-Z][A-Z0-9]*-\d+-\d+$").unwrap();
}

/// The two kinds of record that can be sent to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum RecordKind {
    Feature,
    Requirement,
}

impl RecordKind {
    /// Infer the kind from a reference code (e.g., "PM-12" or "PM-12-3")
    pub fn from_reference(reference: &str) -> Option<Self> {
        if FEATURE_REF.is_match(reference) {
            Some(RecordKind::Feature)
        } else if REQUIREMENT_REF.is_match(reference) {
            Some(RecordKind::Requirement)
        } else {
            None
        }
    }

    /// Name as used by the Aha! API ("Feature", "Requirement")
    pub fn typename(&self) -> &'static str {
        match self {
            RecordKind::Feature => "Feature",
            RecordKind::Requirement => "Requirement",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.typename().to_lowercase())
    }
}

/// A reference to a record that has not been fetched yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub kind: RecordKind,
    /// Record id or reference code
    pub id: String,
}

impl RecordRef {
    pub fn new(kind: RecordKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Build a reference, inferring the kind from the reference code when not given
    pub fn resolve(id: &str, kind: Option<RecordKind>) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("record reference is empty".into()));
        }

        match kind.or_else(|| RecordKind::from_reference(id)) {
            Some(kind) => Ok(Self::new(kind, id)),
            None => Err(Error::InvalidInput(format!(
                "cannot tell whether {} is a feature or a requirement, pass --kind",
                id
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
    /// Time-limited, token-bearing download URL
    pub download_url: String,
}

/// Rich-text description of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub markdown_body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// A child requirement as listed on its feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSummary {
    pub reference_num: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Auxiliary value stored on a record by an extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionField {
    #[serde(default)]
    pub extension_identifier: Option<String>,
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub reference_num: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: Option<Note>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<RequirementSummary>,
}

/// The feature a requirement belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentFeature {
    pub reference_num: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub reference_num: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: Option<Note>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    pub feature: ParentFeature,
}

/// A fetched record snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Feature(Feature),
    Requirement(Requirement),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Feature(_) => RecordKind::Feature,
            Record::Requirement(_) => RecordKind::Requirement,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Feature(f) => &f.id,
            Record::Requirement(r) => &r.id,
        }
    }

    pub fn reference_num(&self) -> &str {
        match self {
            Record::Feature(f) => &f.reference_num,
            Record::Requirement(r) => &r.reference_num,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::Feature(f) => &f.name,
            Record::Requirement(r) => &r.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Record::Feature(f) => &f.path,
            Record::Requirement(r) => &r.path,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        match self {
            Record::Feature(f) => &f.tasks,
            Record::Requirement(r) => &r.tasks,
        }
    }

    /// Description markdown, empty when the record has none
    pub fn description_markdown(&self) -> &str {
        let note = match self {
            Record::Feature(f) => f.description.as_ref(),
            Record::Requirement(r) => r.description.as_ref(),
        };
        markdown_of(note)
    }

    /// Own attachments followed by those inherited from the parent feature
    pub fn attachments(&self) -> Vec<&Attachment> {
        match self {
            Record::Feature(f) => attachments_of(f.description.as_ref()).collect(),
            Record::Requirement(r) => attachments_of(r.description.as_ref())
                .chain(attachments_of(r.feature.description.as_ref()))
                .collect(),
        }
    }
}

/// GraphQL sends `null` for empty lists; read those as empty
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn markdown_of(note: Option<&Note>) -> &str {
    note.and_then(|n| n.markdown_body.as_deref()).unwrap_or("")
}

fn attachments_of(note: Option<&Note>) -> impl Iterator<Item = &Attachment> {
    note.into_iter().flat_map(|n| n.attachments.iter())
}

/// Back-reference written onto a record once its issue exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub issue_number: u64,
    pub issue_url: String,
    /// RFC 3339 timestamp
    pub assigned_at: String,
}

impl Assignment {
    /// Find and decode the assignment among a record's extension fields.
    ///
    /// A field belonging to another extension, or holding a value that does
    /// not decode, counts as no assignment.
    pub fn from_fields(
        fields: &[ExtensionField],
        extension_id: &str,
        field_name: &str,
    ) -> Option<Self> {
        fields
            .iter()
            .filter(|f| f.name == field_name)
            .filter(|f| {
                f.extension_identifier
                    .as_deref()
                    .map_or(true, |id| id == extension_id)
            })
            .find_map(|f| serde_json::from_value(f.value.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note(markdown: Option<&str>, files: &[&str]) -> Note {
        Note {
            markdown_body: markdown.map(String::from),
            attachments: files
                .iter()
                .map(|f| Attachment {
                    file_name: f.to_string(),
                    content_type: "image/png".into(),
                    download_url: format!("https://files.example.com/{}", f),
                })
                .collect(),
        }
    }

    #[test]
    fn test_kind_from_reference() {
        assert_eq!(RecordKind::from_reference("PM-12"), Some(RecordKind::Feature));
        assert_eq!(
            RecordKind::from_reference("PM-12-3"),
            Some(RecordKind::Requirement)
        );
        assert_eq!(RecordKind::from_reference("7012345678"), None);
        assert_eq!(RecordKind::from_reference("pm-12"), None);
    }

    #[test]
    fn test_resolve_prefers_explicit_kind() {
        let r = RecordRef::resolve(" 7012345678 ", Some(RecordKind::Requirement)).unwrap();
        assert_eq!(r, RecordRef::new(RecordKind::Requirement, "7012345678"));

        assert!(matches!(
            RecordRef::resolve("7012345678", None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(RecordRef::resolve("  ", None), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(RecordKind::Feature.to_string(), "feature");
        assert_eq!(RecordKind::Requirement.to_string(), "requirement");
        assert_eq!(RecordKind::Requirement.typename(), "Requirement");
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let requirement: Requirement = serde_json::from_value(json!({
            "id": "6912399",
            "referenceNum": "PM-12-1",
            "name": "Add button",
            "description": { "markdownBody": null, "attachments": null },
            "tasks": null,
            "feature": { "referenceNum": "PM-12", "description": null }
        }))
        .unwrap();

        let record = Record::Requirement(requirement);
        assert!(record.tasks().is_empty());
        assert!(record.attachments().is_empty());
        assert_eq!(record.description_markdown(), "");
    }

    #[test]
    fn test_requirement_attachments_include_parent_after_own() {
        let record = Record::Requirement(Requirement {
            id: "1".into(),
            reference_num: "PM-12-1".into(),
            name: "Button".into(),
            path: "/requirements/PM-12-1".into(),
            description: Some(note(Some("own"), &["a.png"])),
            tasks: vec![],
            feature: ParentFeature {
                reference_num: "PM-12".into(),
                name: None,
                description: Some(note(None, &["b.png", "c.png"])),
            },
        });

        let names: Vec<&str> = record
            .attachments()
            .iter()
            .map(|a| a.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_missing_description_is_empty_markdown() {
        let record = Record::Feature(Feature {
            id: "1".into(),
            reference_num: "PM-1".into(),
            name: "Thing".into(),
            path: String::new(),
            description: None,
            tasks: vec![],
            requirements: vec![],
        });

        assert_eq!(record.description_markdown(), "");
        assert!(record.attachments().is_empty());
    }

    #[test]
    fn test_assignment_from_fields() {
        let fields = vec![
            ExtensionField {
                extension_identifier: Some("other.ext".into()),
                name: "claudeIssue".into(),
                value: json!({"issueNumber": 1, "issueUrl": "x", "assignedAt": "t"}),
            },
            ExtensionField {
                extension_identifier: Some("aha-develop.claude".into()),
                name: "claudeIssue".into(),
                value: json!({
                    "issueNumber": 42,
                    "issueUrl": "https://github.com/o/r/issues/42",
                    "assignedAt": "2026-01-02T03:04:05.000Z"
                }),
            },
        ];

        let found = Assignment::from_fields(&fields, "aha-develop.claude", "claudeIssue").unwrap();
        assert_eq!(found.issue_number, 42);
        assert_eq!(found.issue_url, "https://github.com/o/r/issues/42");

        assert!(Assignment::from_fields(&fields, "aha-develop.claude", "other").is_none());
    }

    #[test]
    fn test_undecodable_assignment_is_ignored() {
        let fields = vec![ExtensionField {
            extension_identifier: None,
            name: "claudeIssue".into(),
            value: serde_json::Value::Null,
        }];
        assert!(Assignment::from_fields(&fields, "aha-develop.claude", "claudeIssue").is_none());
    }
}
