//! Aha! integration
//!
//! Reads features and requirements through the Aha! GraphQL API and writes
//! the assignment back onto the record as an extension field.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::{null_as_default, Assignment, ExtensionField, Feature, Record, RecordKind, RecordRef, Requirement};

const GRAPHQL_PATH: &str = "/api/v2/graphql";

// GraphQL query to get a feature with its description, todos and requirements
const FEATURE_QUERY: &str = r#"query ($id: ID!) {
  feature(id: $id) {
    id
    name
    path
    referenceNum
    description {
      markdownBody
      attachments {
        fileName
        contentType
        downloadUrl(withToken: true)
      }
    }
    tasks {
      name
      body
    }
    requirements {
      name
      referenceNum
    }
  }
}"#;

// GraphQL query to get a requirement together with its parent feature
const REQUIREMENT_QUERY: &str = r#"query ($id: ID!) {
  requirement(id: $id) {
    id
    name
    path
    referenceNum
    description {
      markdownBody
      attachments {
        fileName
        contentType
        downloadUrl(withToken: true)
      }
    }
    tasks {
      name
      body
    }
    feature {
      name
      referenceNum
      description {
        markdownBody
        attachments {
          fileName
          contentType
          downloadUrl(withToken: true)
        }
      }
    }
  }
}"#;

// GraphQL query to get only the extension fields of a record
const EXTENSION_FIELDS_QUERY: &str = r#"query ($id: ID!) {
  RECORD(id: $id) {
    extensionFields {
      extensionIdentifier
      name
      value
    }
  }
}"#;

// GraphQL mutation storing a JSON value in an extension field
const SET_EXTENSION_FIELD_MUTATION: &str = r#"mutation ($recordId: ID!, $recordType: String!, $extensionIdentifier: String!, $name: String!, $value: JSON!) {
  setExtensionField(recordId: $recordId, recordType: $recordType, extensionIdentifier: $extensionIdentifier, name: $name, value: $value) {
    extensionField {
      name
    }
  }
}"#;

// Response types for GraphQL queries

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Response<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

impl<D> Response<D> {
    fn error_messages(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Deserialize)]
struct FeatureData {
    feature: Option<Feature>,
}

#[derive(Deserialize)]
struct RequirementData {
    requirement: Option<Requirement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionFields {
    #[serde(default, deserialize_with = "null_as_default")]
    extension_fields: Vec<ExtensionField>,
}

#[derive(Deserialize)]
struct ExtensionFieldsData {
    #[serde(alias = "feature", alias = "requirement")]
    record: Option<ExtensionFields>,
}

/// Client for the Aha! GraphQL API
#[derive(Debug, Clone)]
pub struct AhaClient {
    http: Client,
    base_url: String,
    token: String,
    extension_id: String,
    field_name: String,
}

impl AhaClient {
    /// Create a client for an account URL (e.g., "https://acme.aha.io")
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            extension_id: "aha-develop.claude".to_string(),
            field_name: "claudeIssue".to_string(),
        })
    }

    /// Sets the extension field the assignment lives in
    pub fn with_field(mut self, extension_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        self.extension_id = extension_id.into();
        self.field_name = field_name.into();
        self
    }

    /// Fetch a record with everything needed to compose its issue
    pub fn fetch_record(&self, record: &RecordRef) -> Result<Record> {
        let variables = json!({ "id": record.id });

        match record.kind {
            RecordKind::Feature => {
                let response: Response<FeatureData> = self.query(FEATURE_QUERY, variables).map_err(fetch_error)?;
                let errors = response.error_messages();
                let feature = response.data.and_then(|d| d.feature);
                found_or_fetch_error(feature, errors, record.kind).map(Record::Feature)
            }
            RecordKind::Requirement => {
                let response: Response<RequirementData> =
                    self.query(REQUIREMENT_QUERY, variables).map_err(fetch_error)?;
                let errors = response.error_messages();
                let requirement = response.data.and_then(|d| d.requirement);
                found_or_fetch_error(requirement, errors, record.kind).map(Record::Requirement)
            }
        }
    }

    /// Read the assignment already stored on a record, if any
    pub fn existing_assignment(&self, record: &RecordRef) -> Result<Option<Assignment>> {
        let query = EXTENSION_FIELDS_QUERY.replace("RECORD", &record.kind.to_string());
        let response: Response<ExtensionFieldsData> = self
            .query(&query, json!({ "id": record.id }))
            .map_err(fetch_error)?;

        let errors = response.error_messages();
        let fields = found_or_fetch_error(response.data.and_then(|d| d.record), errors, record.kind)?;

        Ok(Assignment::from_fields(
            &fields.extension_fields,
            &self.extension_id,
            &self.field_name,
        ))
    }

    /// Store the assignment on the record it was created for
    pub fn record_assignment(&self, record: &Record, assignment: &Assignment) -> Result<()> {
        let variables = json!({
            "recordId": record.id(),
            "recordType": record.kind().typename(),
            "extensionIdentifier": self.extension_id,
            "name": self.field_name,
            "value": assignment,
        });

        let response: Response<Value> = self
            .query(SET_EXTENSION_FIELD_MUTATION, variables)
            .map_err(|e| Error::Recorder(e.to_string()))?;

        if let Some(messages) = response.error_messages() {
            return Err(Error::Recorder(messages));
        }
        debug!(record = record.reference_num(), "assignment recorded");
        Ok(())
    }

    fn query<D: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<Response<D>> {
        let url = format!("{}{}", self.base_url, GRAPHQL_PATH);
        debug!(%url, "Aha! GraphQL request");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&Request { query, variables })
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("Aha! rejected the token ({})", status.as_u16())));
        }
        if !status.is_success() {
            return Err(Error::Fetch(format!("Aha! API error: {}", status.as_u16())));
        }

        Ok(response.json()?)
    }
}

/// Transport failures while reading count as fetch failures, auth stays auth
fn fetch_error(err: Error) -> Error {
    match err {
        Error::Auth(_) | Error::Fetch(_) => err,
        other => Error::Fetch(other.to_string()),
    }
}

/// The requested record, or a fetch failure carrying the GraphQL errors that explain why not
fn found_or_fetch_error<T>(found: Option<T>, errors: Option<String>, kind: RecordKind) -> Result<T> {
    match (found, errors) {
        (Some(found), errors) => {
            if let Some(messages) = errors {
                debug!(%messages, "Aha! GraphQL errors");
            }
            Ok(found)
        }
        (None, Some(messages)) => Err(Error::Fetch(format!(
            "Failed to fetch {} details: {}",
            kind, messages
        ))),
        (None, None) => Err(Error::Fetch(format!("Failed to fetch {} details.", kind))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> AhaClient {
        AhaClient::new(server.url(), "aha-secret").unwrap()
    }

    fn feature_response() -> String {
        json!({
            "data": {
                "feature": {
                    "id": "6912345",
                    "name": "Export CSV",
                    "path": "https://acme.aha.io/features/PM-12",
                    "referenceNum": "PM-12",
                    "description": {
                        "markdownBody": "Add CSV export",
                        "attachments": [{
                            "fileName": "mock.png",
                            "contentType": "image/png",
                            "downloadUrl": "https://acme.aha.io/attachments/1/token/abc"
                        }]
                    },
                    "tasks": [{ "name": "Write parser", "body": null }],
                    "requirements": [{ "name": "Add button", "referenceNum": "PM-13" }]
                }
            }
        })
        .to_string()
    }

    fn feature_record() -> Record {
        let response: Response<FeatureData> = serde_json::from_str(&feature_response()).unwrap();
        Record::Feature(response.data.unwrap().feature.unwrap())
    }

    #[test]
    fn test_fetch_feature() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v2/graphql")
            .match_header("authorization", "Bearer aha-secret")
            .match_body(Matcher::PartialJson(json!({ "variables": { "id": "PM-12" } })))
            .with_status(200)
            .with_body(feature_response())
            .create();

        let record = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Feature, "PM-12"))
            .unwrap();

        mock.assert();
        assert_eq!(record.kind(), RecordKind::Feature);
        assert_eq!(record.reference_num(), "PM-12");
        assert_eq!(record.description_markdown(), "Add CSV export");
        assert_eq!(record.attachments().len(), 1);
        assert_eq!(record.tasks()[0].body, None);
        match record {
            Record::Feature(f) => assert_eq!(f.requirements[0].reference_num, "PM-13"),
            Record::Requirement(_) => panic!("expected a feature"),
        }
    }

    #[test]
    fn test_fetch_requirement_with_parent() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .match_body(Matcher::Regex("requirement\\(id: \\$id\\)".into()))
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "requirement": {
                            "id": "6912399",
                            "name": "Add button",
                            "path": "https://acme.aha.io/requirements/PM-12-1",
                            "referenceNum": "PM-12-1",
                            "description": null,
                            "tasks": [],
                            "feature": {
                                "name": "Export CSV",
                                "referenceNum": "PM-12",
                                "description": { "markdownBody": "Add CSV export", "attachments": [] }
                            }
                        }
                    }
                })
                .to_string(),
            )
            .create();

        let record = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Requirement, "PM-12-1"))
            .unwrap();

        match record {
            Record::Requirement(r) => {
                assert_eq!(r.feature.reference_num, "PM-12");
                assert!(r.description.is_none());
            }
            Record::Feature(_) => panic!("expected a requirement"),
        }
    }

    #[test]
    fn test_missing_record_is_fetch_failure() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"feature":null}}"#)
            .create();

        let err = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Feature, "PM-404"))
            .unwrap_err();

        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(err.to_string(), "Failed to fetch feature details.");
    }

    #[test]
    fn test_graphql_errors_reach_the_user() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":null,"errors":[{"message":"Field 'feature' doesn't accept argument 'idx'"},{"message":"Record not found"}]}"#,
            )
            .create();

        let err = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Feature, "PM-404"))
            .unwrap_err();

        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(
            err.to_string(),
            "Failed to fetch feature details: Field 'feature' doesn't accept argument 'idx'; Record not found"
        );

        let err = client(&server)
            .existing_assignment(&RecordRef::new(RecordKind::Requirement, "PM-12-1"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch requirement details: Field"));
    }

    #[test]
    fn test_null_lists_degrade_to_empty() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "feature": {
                            "id": "6912345",
                            "name": "Export CSV",
                            "path": "https://acme.aha.io/features/PM-12",
                            "referenceNum": "PM-12",
                            "description": { "markdownBody": "Add CSV export", "attachments": null },
                            "tasks": null,
                            "requirements": null,
                            "extensionFields": null
                        }
                    }
                })
                .to_string(),
            )
            .create();

        let record = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Feature, "PM-12"))
            .unwrap();

        assert!(record.tasks().is_empty());
        assert!(record.attachments().is_empty());
        match record {
            Record::Feature(f) => assert!(f.requirements.is_empty()),
            Record::Requirement(_) => panic!("expected a feature"),
        }

        let assignment = client(&server)
            .existing_assignment(&RecordRef::new(RecordKind::Feature, "PM-12"))
            .unwrap();
        assert!(assignment.is_none());
    }

    #[test]
    fn test_unauthorized_is_auth_failure() {
        let mut server = Server::new();
        let _mock = server.mock("POST", "/api/v2/graphql").with_status(401).create();

        let err = client(&server)
            .fetch_record(&RecordRef::new(RecordKind::Feature, "PM-12"))
            .unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_existing_assignment() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .match_body(Matcher::Regex("requirement\\(id".into()))
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "requirement": {
                            "extensionFields": [{
                                "extensionIdentifier": "aha-develop.claude",
                                "name": "claudeIssue",
                                "value": {
                                    "issueNumber": 7,
                                    "issueUrl": "https://github.com/acme/widgets/issues/7",
                                    "assignedAt": "2026-10-01T10:00:00.000Z"
                                }
                            }]
                        }
                    }
                })
                .to_string(),
            )
            .create();

        let assignment = client(&server)
            .existing_assignment(&RecordRef::new(RecordKind::Requirement, "PM-12-1"))
            .unwrap()
            .unwrap();

        assert_eq!(assignment.issue_number, 7);
    }

    #[test]
    fn test_no_existing_assignment() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"feature":{"extensionFields":[]}}}"#)
            .create();

        let assignment = client(&server)
            .existing_assignment(&RecordRef::new(RecordKind::Feature, "PM-12"))
            .unwrap();

        assert!(assignment.is_none());
    }

    #[test]
    fn test_record_assignment() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v2/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": {
                    "recordId": "6912345",
                    "recordType": "Feature",
                    "extensionIdentifier": "my.ext",
                    "name": "issue",
                    "value": {
                        "issueNumber": 7,
                        "issueUrl": "https://github.com/acme/widgets/issues/7",
                        "assignedAt": "2026-10-18T12:00:00.000Z"
                    }
                }
            })))
            .with_status(200)
            .with_body(r#"{"data":{"setExtensionField":{"extensionField":{"name":"issue"}}}}"#)
            .create();

        let record = feature_record();
        let assignment = Assignment {
            issue_number: 7,
            issue_url: "https://github.com/acme/widgets/issues/7".into(),
            assigned_at: "2026-10-18T12:00:00.000Z".into(),
        };

        client(&server)
            .with_field("my.ext", "issue")
            .record_assignment(&record, &assignment)
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_record_assignment_rejected() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/v2/graphql")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"Permission denied"}]}"#)
            .create();

        let record = feature_record();
        let assignment = Assignment {
            issue_number: 7,
            issue_url: "u".into(),
            assigned_at: "t".into(),
        };

        let err = client(&server)
            .record_assignment(&record, &assignment)
            .unwrap_err();

        assert!(matches!(err, Error::Recorder(_)));
        assert_eq!(err.to_string(), "Failed to record assignment: Permission denied");
    }
}
