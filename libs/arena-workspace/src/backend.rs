// Judge client
//
// The judge is a black box reachable over HTTP. This module only moves
// request/response bodies; interpreting them is the normalizer's job.

use arena_common::wire::{endpoint_url, RunRequest, RunResponse, SubmitRequest, SubmitResponse, RUN_PATH, SUBMIT_PATH};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::WorkspaceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The request never produced a response.
    Transport,
    /// Non-success status without a usable body.
    Status(u16),
    /// Success status but the body is not a judge response.
    Decode,
    /// Client-side timeout elapsed.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            BackendErrorKind::Timeout,
            format!("Judge did not respond within {}ms", after.as_millis()),
        )
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BackendErrorKind::Transport => write!(f, "request failed: {}", self.message),
            BackendErrorKind::Status(code) => write!(f, "judge returned HTTP {}: {}", code, self.message),
            BackendErrorKind::Decode => write!(f, "unreadable judge response: {}", self.message),
            BackendErrorKind::Timeout => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Execution service used by the controller.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse, BackendError>;
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, BackendError>;
}

/// JSON-over-HTTP judge client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            auth_token,
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.backend_url.clone(), config.auth_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        let url = endpoint_url(&self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::new(BackendErrorKind::Transport, e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::new(BackendErrorKind::Transport, e.to_string()))?;

        debug!(url = %url, status = status.as_u16(), body_bytes = text.len(), "Judge responded");

        if status.is_success() {
            return serde_json::from_str::<Resp>(&text)
                .map_err(|e| BackendError::new(BackendErrorKind::Decode, e.to_string()));
        }

        // An error status is a judge reply only when it carries a verdict or
        // results (partial payload); anything else is a plain HTTP failure.
        let code = status.as_u16();
        let mut body = match serde_json::from_str::<Value>(&text) {
            Ok(body @ Value::Object(_)) => body,
            _ => return Err(BackendError::new(BackendErrorKind::Status(code), snippet(&text))),
        };
        if !carries_judgement(&body) {
            let message = error_message(&body).unwrap_or_else(|| snippet(&text));
            return Err(BackendError::new(BackendErrorKind::Status(code), message));
        }

        warn!(url = %url, status = code, "Judge payload on error status");
        body["success"] = Value::Bool(false);
        serde_json::from_value::<Resp>(body).map_err(|e| BackendError::new(BackendErrorKind::Status(code), e.to_string()))
    }
}

fn carries_judgement(body: &Value) -> bool {
    ["verdict", "results"]
        .iter()
        .any(|key| body.get(*key).is_some_and(|v| !v.is_null()))
}

fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    let mut out: String = trimmed.chars().take(MAX).collect();
    if trimmed.chars().count() > MAX {
        out.push('…');
    }
    out
}

#[async_trait]
impl ExecutionBackend for HttpBackend {
    #[instrument(skip(self, request), fields(problem_id = %request.problem_id, language = %request.language))]
    async fn run(&self, request: &RunRequest) -> Result<RunResponse, BackendError> {
        self.post_json(RUN_PATH, request).await
    }

    #[instrument(skip(self, request), fields(problem_id = %request.problem_id, language = %request.language))]
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, BackendError> {
        self.post_json(SUBMIT_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::types::Language;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn run_request(custom_input: Option<&str>) -> RunRequest {
        RunRequest {
            problem_id: "two-sum".to_string(),
            code: "print(1)".to_string(),
            language: Language::Python,
            custom_input: custom_input.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_run_posts_camel_case_body() {
        let app = Router::new().route(
            "/api/run",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["problemId"], "two-sum");
                assert_eq!(body["customInput"], "5");
                Json(json!({
                    "success": true,
                    "verdict": "Accepted",
                    "testCasesPassed": 1,
                    "totalTestCases": 1
                }))
            }),
        );
        let backend = HttpBackend::new(serve(app).await, None);

        let response = backend.run(&run_request(Some("5"))).await.unwrap();
        assert_eq!(response.verdict.as_deref(), Some("Accepted"));
        assert_eq!(response.total_test_cases, Some(1));
    }

    #[tokio::test]
    async fn test_submit_forwards_bearer_token() {
        let app = Router::new().route(
            "/api/submit",
            post(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "success": auth == "Bearer secret", "verdict": "Accepted" }))
            }),
        );
        let backend = HttpBackend::new(serve(app).await, Some("secret".to_string()));

        let request = SubmitRequest {
            problem_id: "two-sum".to_string(),
            code: "print(1)".to_string(),
            language: Language::Python,
        };
        let response = backend.submit(&request).await.unwrap();
        assert_eq!(response.success, Some(true));
    }

    #[tokio::test]
    async fn test_error_status_with_payload_is_returned() {
        let app = Router::new().route(
            "/api/run",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "success": false, "verdict": "Runtime Error", "message": "crashed" })),
                )
            }),
        );
        let backend = HttpBackend::new(serve(app).await, None);

        let response = backend.run(&run_request(None)).await.unwrap();
        assert_eq!(response.success, Some(false));
        assert_eq!(response.verdict.as_deref(), Some("Runtime Error"));
    }

    #[tokio::test]
    async fn test_error_status_payload_is_marked_unsuccessful() {
        let app = Router::new().route(
            "/api/submit",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": true, "verdict": "Runtime Error", "results": [] })),
                )
            }),
        );
        let backend = HttpBackend::new(serve(app).await, None);

        let request = SubmitRequest {
            problem_id: "two-sum".to_string(),
            code: "print(1)".to_string(),
            language: Language::Python,
        };
        let response = backend.submit(&request).await.unwrap();
        assert_eq!(response.success, Some(false));
        assert_eq!(response.verdict.as_deref(), Some("Runtime Error"));
    }

    #[tokio::test]
    async fn test_error_status_with_message_only_is_status_error() {
        let app = Router::new().route(
            "/api/run",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
            }),
        );
        let backend = HttpBackend::new(serve(app).await, None);

        let err = backend.run(&run_request(None)).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Status(500));
        assert_eq!(err.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_error_status_without_payload() {
        let app = Router::new().route(
            "/api/run",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let backend = HttpBackend::new(serve(app).await, None);

        let err = backend.run(&run_request(None)).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Status(502));
        assert_eq!(err.message, "upstream down");
    }

    #[tokio::test]
    async fn test_unreachable_judge_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpBackend::new(format!("http://{}/api", addr), None);
        let err = backend.run(&run_request(None)).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Transport);
    }

    #[test]
    fn test_snippet_truncates() {
        assert_eq!(snippet("   "), "empty response body");
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).chars().count(), 201);
    }
}
