//! clapkit-ed library interface
//!
//! The stage editor microservice: one in-memory editing session exposed over
//! a JSON REST API. All document logic lives in `clapkit-common`; this crate
//! is the thin shell — routing, state ownership, and error mapping.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::state::EditorState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The single editing session; handlers take the write half for
    /// mutations, the read half for queries
    pub editor: Arc<RwLock<EditorState>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            editor: Arc::new(RwLock::new(EditorState::default())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::document_routes())
        .merge(api::scene_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
