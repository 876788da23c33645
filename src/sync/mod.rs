//! HTTP client for the remote project endpoint.
//!
//! Reads are `GET <endpoint>`; every write is a `POST <endpoint>` carrying an
//! `action` discriminator. With no endpoint configured every call succeeds
//! without touching the network.

use std::collections::HashSet;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Project;

const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response format: {0}")]
    Format(String),
    #[error("server answered '{status}'{}", message_suffix(.message))]
    Rejected {
        status: String,
        message: Option<String>,
    },
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {message}"),
        None => String::new(),
    }
}

/// Body of a write request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum WriteRequest {
    Create { data: Project },
    Update { data: Project },
    Delete { id: String },
}

impl WriteRequest {
    pub fn action(&self) -> &'static str {
        match self {
            WriteRequest::Create { .. } => "create",
            WriteRequest::Update { .. } => "update",
            WriteRequest::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FetchBody {
    Bare(Vec<Project>),
    Envelope { status: String, data: Vec<Project> },
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncClient {
    http: Client,
    endpoint: Option<String>,
}

impl SyncClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.endpoint = endpoint;
    }

    pub fn is_local(&self) -> bool {
        self.endpoint.is_none()
    }

    /// Fetches the whole collection. `Ok(None)` in local mode.
    pub async fn fetch_all(&self) -> Result<Option<Vec<Project>>, SyncError> {
        let Some(endpoint) = self.endpoint() else {
            return Ok(None);
        };

        debug!(endpoint, "fetching projects");
        let body = self
            .http
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_fetch_body(&body).map(Some)
    }

    /// Sends a write. Create and update must be acknowledged with a success
    /// status; a delete only needs to reach the server.
    pub async fn write(&self, request: &WriteRequest) -> Result<(), SyncError> {
        let Some(endpoint) = self.endpoint() else {
            return Ok(());
        };

        debug!(endpoint, action = request.action(), "sending write");
        let response = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        if matches!(request, WriteRequest::Delete { .. }) {
            return Ok(());
        }

        let body = response.text().await?;
        check_write_body(&body)
    }
}

fn parse_fetch_body(body: &str) -> Result<Vec<Project>, SyncError> {
    let projects = match serde_json::from_str::<FetchBody>(body) {
        Ok(FetchBody::Bare(projects)) => projects,
        Ok(FetchBody::Envelope { status, data }) if status == STATUS_SUCCESS => data,
        Ok(FetchBody::Envelope { status, .. }) => {
            return Err(SyncError::Format(format!(
                "envelope status '{status}' is not a success"
            )));
        }
        Err(err) => {
            warn!(error = %err, "fetch body did not match any known shape");
            return Err(SyncError::Format(
                "expected a project list or a success envelope".to_string(),
            ));
        }
    };

    if let Some(id) = first_repeated_id(&projects) {
        return Err(SyncError::Format(format!("project id {id} appears twice")));
    }
    Ok(projects)
}

fn first_repeated_id(projects: &[Project]) -> Option<String> {
    let mut seen = HashSet::with_capacity(projects.len());
    projects
        .iter()
        .find(|p| !seen.insert(p.id.as_str()))
        .map(|p| p.id.clone())
}

fn check_write_body(body: &str) -> Result<(), SyncError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| SyncError::Format(e.to_string()))?;
    if !value.is_object() {
        return Err(SyncError::Format("write reply is not a JSON object".to_string()));
    }
    let response: WriteResponse =
        serde_json::from_value(value).map_err(|e| SyncError::Format(e.to_string()))?;

    if response.status == STATUS_SUCCESS {
        Ok(())
    } else {
        Err(SyncError::Rejected {
            status: response.status,
            message: response.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project(id: &str, subject: &str) -> Project {
        let mut project = Project::with_id(id);
        project.subject = subject.to_string();
        project
    }

    #[test]
    fn write_requests_carry_action_tag() {
        let create = WriteRequest::Create {
            data: project("1", "Algo"),
        };
        let value = serde_json::to_value(&create).unwrap();
        assert_eq!(value["action"], "create");
        assert_eq!(value["data"]["subject"], "Algo");

        let delete = WriteRequest::Delete { id: "1".into() };
        assert_eq!(
            serde_json::to_value(&delete).unwrap(),
            json!({ "action": "delete", "id": "1" })
        );
    }

    #[test]
    fn fetch_body_shapes() {
        let bare = parse_fetch_body(r#"[{"id":"a","subject":"A"}]"#).unwrap();
        assert_eq!(bare, vec![project("a", "A")]);

        let wrapped =
            parse_fetch_body(r#"{"status":"success","data":[{"id":"b","subject":"B"}]}"#).unwrap();
        assert_eq!(wrapped, vec![project("b", "B")]);

        assert!(matches!(
            parse_fetch_body(r#"{"status":"error","data":[]}"#),
            Err(SyncError::Format(_))
        ));
        assert!(matches!(
            parse_fetch_body(r#"{"status":"error","message":"boom"}"#),
            Err(SyncError::Format(_))
        ));
        assert!(matches!(parse_fetch_body("<html>"), Err(SyncError::Format(_))));
    }

    #[test]
    fn write_body_status() {
        assert!(check_write_body(r#"{"status":"success"}"#).is_ok());

        let err = check_write_body(r#"{"status":"error","message":"quota"}"#).unwrap_err();
        assert_eq!(err.to_string(), "server answered 'error': quota");

        assert!(matches!(check_write_body(""), Err(SyncError::Format(_))));
        assert!(matches!(check_write_body(r#"["success"]"#), Err(SyncError::Format(_))));
    }

    #[test]
    fn repeated_ids_are_a_format_error() {
        let err = parse_fetch_body(r#"[{"id":"1","subject":"A"},{"id":"1","subject":"B"}]"#)
            .unwrap_err();
        assert!(matches!(err, SyncError::Format(_)));
    }

    #[tokio::test]
    async fn local_mode_never_calls_out() {
        let client = SyncClient::new(None);
        assert!(client.fetch_all().await.unwrap().is_none());
        client
            .write(&WriteRequest::Delete { id: "1".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fetches_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "1", "subject": "One" },
                { "id": "2", "subject": "Two" },
            ])))
            .mount(&server)
            .await;

        let client = SyncClient::new(Some(server.uri()));
        let projects = client.fetch_all().await.unwrap().unwrap();
        assert_eq!(projects, vec![project("1", "One"), project("2", "Two")]);
    }

    #[tokio::test]
    async fn posts_update_and_checks_status() {
        let server = MockServer::start().await;
        let updated = project("7", "Renamed");
        Mock::given(method("POST"))
            .and(body_json(json!({
                "action": "update",
                "data": serde_json::to_value(&updated).unwrap(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SyncClient::new(Some(server.uri()));
        client
            .write(&WriteRequest::Update { data: updated })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = SyncClient::new(Some(server.uri()));
        client
            .write(&WriteRequest::Delete { id: "7".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn http_error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = SyncClient::new(Some(server.uri()));
        let err = client
            .write(&WriteRequest::Delete { id: "7".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }
}
