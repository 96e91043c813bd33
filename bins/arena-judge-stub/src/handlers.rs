// HTTP route handlers for the judge stub

use arena_common::wire::{RunRequest, SubmitRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::script::{JudgeScript, ScriptedReply};

pub struct AppState {
    pub script: JudgeScript,
}

pub fn routes(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/run", post(run_code))
        .route("/submit", post(submit_code));

    Router::new()
        .route("/status", get(health_check))
        .nest("/api", api)
        .with_state(state)
}

/// POST /api/run - Answer a run with the next scripted reply
pub async fn run_code(State(state): State<Arc<AppState>>, Json(payload): Json<RunRequest>) -> Response {
    info!(
        problem_id = %payload.problem_id,
        language = %payload.language,
        custom_input = payload.custom_input.is_some(),
        "Run received"
    );

    if payload.code.trim().is_empty() {
        return missing_code();
    }
    serve(state.script.run.next_reply()).await
}

/// POST /api/submit - Answer a submission with the next scripted reply
pub async fn submit_code(State(state): State<Arc<AppState>>, Json(payload): Json<SubmitRequest>) -> Response {
    info!(
        problem_id = %payload.problem_id,
        language = %payload.language,
        "Submission received"
    );

    if payload.code.trim().is_empty() {
        return missing_code();
    }
    serve(state.script.submit.next_reply()).await
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn missing_code() -> Response {
    warn!("Rejected request without code");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": "Code is required" })),
    )
        .into_response()
}

async fn serve(reply: Option<ScriptedReply>) -> Response {
    let Some(reply) = reply else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "No scripted reply" })),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay() {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}
