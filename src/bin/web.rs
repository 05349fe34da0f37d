//! Amigo HTTP 接口
//!
//! 启动: cargo run --bin amigo-web --features web
//! POST /api/chat  请求体 {message, chatState?, history}，返回 {response, counselor?, newState, isEmergency, showPhaseTransition}

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use amigo::core::fail_safe_response;
use amigo::session::create_orchestrator_from_path;
use amigo::{observability, ChatResponse, TriageOrchestrator};

async fn chat(
    State(orchestrator): State<Arc<TriageOrchestrator>>,
    body: String,
) -> (StatusCode, Json<ChatResponse>) {
    match orchestrator.process_raw(&body).await {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(e) => {
            tracing::error!("API Error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(fail_safe_response()))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

fn create_router(orchestrator: Arc<TriageOrchestrator>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(orchestrator)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let (cfg, orchestrator) = create_orchestrator_from_path(None);
    let app = create_router(Arc::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&cfg.web.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.web.bind))?;
    tracing::info!("Amigo web server listening on http://{}", cfg.web.bind);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
