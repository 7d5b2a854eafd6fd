//! # GitHub GraphQL Client
//!
//! Saved-search shortcuts live on the github.com dashboard and are only
//! reachable through its internal GraphQL endpoint, which accepts persisted
//! query ids instead of query documents.
//!
//! The client is blocking; the reconciler issues one request at a time.

use searchsync_core::{RemoteOperations, SavedSearchInput};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// ENDPOINT CONSTANTS
// =============================================================================

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://github.com/_graphql";

/// Host used when asking the `gh` CLI for a token.
pub const DEFAULT_HOST: &str = "github.com";

/// Persisted query: create a dashboard search shortcut.
pub const CREATE_PERSISTED_ID: &str = "c06c5627e09922bd28c6d34ff91d0530";

/// Persisted query: update a dashboard search shortcut.
pub const UPDATE_PERSISTED_ID: &str = "379dbe4cf68c3485e48df2f699f5ae75";

/// Persisted query: delete a dashboard search shortcut.
pub const DELETE_PERSISTED_ID: &str = "2939ea7192de2c6284da481de6737322";

/// Prefix of every shortcut id.
pub const SHORTCUT_ID_PREFIX: &str = "SSC_";

const SHORTCUT_COLOR: &str = "GRAY";
const SHORTCUT_ICON: &str = "BOOKMARK";
const SEARCH_TYPE: &str = "ISSUES";

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from the GraphQL transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No token in the environment and none from the `gh` CLI.
    #[error("no GitHub token available; set GH_TOKEN or run gh auth login")]
    MissingToken,

    /// The HTTP client could not be constructed.
    #[error("build http client: {0}")]
    Build(String),

    /// The request could not be sent or timed out.
    #[error("post graphql: {0}")]
    ConnectionFailed(String),

    /// The endpoint answered with a non-success status.
    #[error("graphql status {0}: {1}")]
    Status(u16, String),

    /// The response body is not a GraphQL response.
    #[error("parse graphql response: {0}")]
    ParseError(String),

    /// The response carried GraphQL errors.
    #[error("graphql error: {0}")]
    GraphQl(String),

    /// A create succeeded but the new id is not in the response.
    #[error("create saved search: id not found in response")]
    MissingId,
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Token and optional session cookie sent with every request.
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub cookie: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Create credentials from a token alone.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cookie: None,
        }
    }

    /// Attach a session cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Read credentials from the environment.
    ///
    /// Token: `GH_TOKEN`, then `GITHUB_TOKEN`, then `gh auth token`.
    /// Cookie: `GH_COOKIE`, then `GITHUB_COOKIE`.
    pub fn from_env() -> Result<Self, ClientError> {
        let token = env_value("GH_TOKEN")
            .or_else(|| env_value("GITHUB_TOKEN"))
            .or_else(gh_cli_token)
            .ok_or(ClientError::MissingToken)?;
        let cookie = env_value("GH_COOKIE").or_else(|| env_value("GITHUB_COOKIE"));

        Ok(Self { token, cookie })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn gh_cli_token() -> Option<String> {
    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", DEFAULT_HOST])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Blocking client for the dashboard shortcut mutations.
pub struct GraphQlClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    credentials: Credentials,
}

impl GraphQlClient {
    /// Create a client. `timeout` bounds every request.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a persisted query and return its `data` object.
    pub fn graphql(&self, persisted_id: &str, variables: Value) -> Result<Value, ClientError> {
        let payload = GraphQlRequest {
            query: persisted_id,
            variables,
        };

        let mut req = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.credentials.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("github-verified-fetch", "true")
            .header(reqwest::header::ORIGIN, "https://github.com")
            .json(&payload);
        if let Some(ref cookie) = self.credentials.cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }

        let resp = req
            .send()
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.endpoint)))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ClientError::ParseError(format!("read response: {e}")))?;

        if status.as_u16() >= 300 {
            return Err(ClientError::Status(status.as_u16(), body.trim().to_string()));
        }

        let parsed: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::ParseError(e.to_string()))?;

        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(ClientError::GraphQl(messages.join("; ")));
        }

        Ok(parsed.data)
    }
}

impl RemoteOperations for GraphQlClient {
    type Error = ClientError;

    fn create(&mut self, input: &SavedSearchInput) -> Result<String, ClientError> {
        tracing::info!(name = %input.name, "creating saved search");

        let mut fields = json!({
            "color": SHORTCUT_COLOR,
            "icon": SHORTCUT_ICON,
            "name": input.name,
            "query": input.query,
            "searchType": SEARCH_TYPE,
        });
        if let (Some(description), Some(map)) = (&input.description, fields.as_object_mut()) {
            map.insert("description".to_string(), json!(description));
        }

        let data = self.graphql(CREATE_PERSISTED_ID, json!({ "input": fields }))?;
        let id = find_shortcut_id(&data, &input.name).ok_or(ClientError::MissingId)?;

        tracing::debug!(name = %input.name, %id, "saved search created");
        Ok(id)
    }

    fn update(&mut self, id: &str, input: &SavedSearchInput) -> Result<(), ClientError> {
        tracing::info!(name = %input.name, %id, "updating saved search");

        let variables = json!({
            "input": {
                "color": SHORTCUT_COLOR,
                "description": input.description.clone().unwrap_or_default(),
                "icon": SHORTCUT_ICON,
                "name": input.name,
                "query": input.query,
                "scopingRepository": null,
                "shortcutId": id,
            }
        });

        self.graphql(UPDATE_PERSISTED_ID, variables).map(|_| ())
    }

    fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        tracing::info!(%id, "deleting saved search");

        let variables = json!({ "input": { "shortcutId": id } });
        self.graphql(DELETE_PERSISTED_ID, variables).map(|_| ())
    }
}

/// Pick the id of the created shortcut out of a create response.
///
/// The mutation returns every shortcut on the dashboard; the first one with
/// the requested name and a shortcut-shaped id wins.
#[must_use]
pub fn find_shortcut_id(data: &Value, target_name: &str) -> Option<String> {
    data.pointer("/createDashboardSearchShortcut/dashboard/shortcuts/nodes")?
        .as_array()?
        .iter()
        .filter(|node| node.get("name").and_then(Value::as_str) == Some(target_name))
        .filter_map(|node| node.get("id").and_then(Value::as_str))
        .find(|id| id.starts_with(SHORTCUT_ID_PREFIX))
        .map(str::to_string)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_response(nodes: Value) -> Value {
        json!({
            "createDashboardSearchShortcut": {
                "dashboard": { "shortcuts": { "nodes": nodes } }
            }
        })
    }

    #[test]
    fn find_shortcut_id_prefers_matching_name() {
        let data = create_response(json!([
            { "id": "SSC_1", "name": "Other" },
            { "id": "SSC_2", "name": "Target" },
        ]));

        assert_eq!(find_shortcut_id(&data, "Target").as_deref(), Some("SSC_2"));
    }

    #[test]
    fn find_shortcut_id_requires_prefix() {
        let data = create_response(json!([
            { "id": "X_1", "name": "Target" },
            { "id": "SSC_9", "name": "Target" },
        ]));

        assert_eq!(find_shortcut_id(&data, "Target").as_deref(), Some("SSC_9"));
    }

    #[test]
    fn find_shortcut_id_missing_shape() {
        assert_eq!(find_shortcut_id(&json!({}), "Target"), None);
        assert_eq!(find_shortcut_id(&create_response(json!([])), "Target"), None);
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials::new("secret-token").with_cookie("a=b");
        let rendered = format!("{creds:?}");

        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("a=b"));
    }
}
