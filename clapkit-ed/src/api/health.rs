//! Health and status endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;

use crate::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Status endpoint
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let editor = state.editor.read().await;
    let session = editor.session.as_ref();
    Json(json!({
        "service": "clapkit-ed",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "document_loaded": session.is_some(),
        "kind": session.map(|s| s.document.kind()),
        "diagnostic_count": session.map(|s| s.diagnostics.len()),
        "loaded_at": session.map(|s| s.loaded_at),
    }))
}
