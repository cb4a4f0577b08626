use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::template::Issue;

const API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";

// Request and response types for the REST API

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// An issue created on GitHub
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    /// The issue number within the repository
    pub number: u64,
    /// The global node ID of the issue
    pub node_id: String,
    /// The canonical URL of the issue
    pub html_url: String,
}

/// A comment created on a GitHub issue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedComment {
    pub id: u64,
    pub html_url: String,
}

/// Minimal client for the GitHub issues REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a client against the given API root (e.g., "https://api.github.com")
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create an issue with the given title and body
    pub fn create_issue(&self, owner: &str, repo: &str, title: &str, body: &str) -> Result<CreatedIssue> {
        self.rest_request(
            Method::POST,
            &format!("/repos/{}/{}/issues", owner, repo),
            Some(&NewIssue { title, body }),
        )
    }

    /// Post a comment on an existing issue
    pub fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> Result<CreatedComment> {
        self.rest_request(
            Method::POST,
            &format!("/repos/{}/{}/issues/{}/comments", owner, repo, issue_number),
            Some(&NewComment { body }),
        )
    }

    /// Create the issue, then post its assignment comment
    ///
    /// The issue is not removed when commenting fails; the returned error
    /// then carries the URL of the issue that was left behind.
    pub fn publish_issue(&self, owner: &str, repo: &str, issue: &Issue) -> Result<CreatedIssue> {
        let created = self.create_issue(owner, repo, &issue.title, &issue.body)?;
        debug!(number = created.number, url = %created.html_url, "issue created");

        match self.create_comment(owner, repo, created.number, &issue.comment) {
            Ok(comment) => {
                debug!(id = comment.id, "assignment comment posted");
                Ok(created)
            }
            Err(err) => {
                warn!(url = %created.html_url, error = %err, "issue created but commenting failed");
                Err(err.after_issue_created(created.html_url))
            }
        }
    }

    /// Send a JSON request and decode the JSON response
    ///
    /// Non-2xx responses fail with the upstream `message`, or the bare status
    /// when the body has none.
    fn rest_request<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.api_url, endpoint);
        debug!(%method, %url, "GitHub request");

        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_JSON)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, env!("CARGO_PKG_NAME"));
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("GitHub API error: {}", status.as_u16()));
            return Err(Error::TrackerApi {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
