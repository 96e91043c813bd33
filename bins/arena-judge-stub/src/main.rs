mod handlers;
mod script;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::handlers::AppState;
use crate::script::JudgeScript;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Arena judge stub booting...");

    let script = match std::env::var("ARENA_STUB_SCRIPT") {
        Ok(path) => {
            let path = PathBuf::from(path);
            let script = JudgeScript::load(&path)?;
            info!(
                script = %path.display(),
                run_replies = script.run.len(),
                submit_replies = script.submit.len(),
                "Loaded judge script"
            );
            script
        }
        Err(_) => {
            info!("No ARENA_STUB_SCRIPT set; accepting everything");
            JudgeScript::accepting()
        }
    };

    let state = Arc::new(AppState { script });
    let app = handlers::routes(state);

    let addr = std::env::var("ARENA_STUB_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
