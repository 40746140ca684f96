//! Scene editing: re-segmentation, reset, whole-scene import, per-shot
//! correction requests, prompt generation
//!
//! Re-segmentation runs only on an explicit apply — never per keystroke —
//! and replaces the scene's shot list wholesale. Reset restores the shot
//! list captured when the document was loaded.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use clapkit_common::model::{Scene, Shot};
use clapkit_common::prompt::{scene_update_prompt, PromptShot};
use clapkit_common::reconcile::{reconcile_scene_text, ReconciledShot};
use clapkit_common::validate::Diagnostic;

use crate::error::{ApiError, ApiResult};
use crate::state::{EditorSession, ShotAnnotation};
use crate::AppState;

pub fn scene_routes() -> Router<AppState> {
    Router::new()
        .route("/scenes/:scene_id/text", post(apply_scene_text))
        .route("/scenes/:scene_id/reset", post(reset_scene))
        .route("/scenes/:scene_id/import", post(import_scene))
        .route("/scenes/:scene_id/prompt", get(scene_prompt))
        .route("/shots/:shot_id/request", put(set_shot_request))
}

fn session_mut<'a>(
    session: &'a mut Option<EditorSession>,
) -> ApiResult<&'a mut EditorSession> {
    session
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("no document loaded".to_string()))
}

/// POST /scenes/:scene_id/text request
#[derive(Debug, Deserialize)]
pub struct SceneTextRequest {
    pub text: String,
}

/// Response for scene mutations that re-segment the shot list
#[derive(Debug, Serialize)]
pub struct SceneUpdateResponse {
    pub scene_id: String,
    pub shots: Vec<ReconciledShot>,
    pub diagnostics: Vec<Diagnostic>,
}

/// POST /scenes/:scene_id/text
///
/// Apply freely edited scenario prose: rebuild the scene's shots, migrate
/// transient per-shot state, re-validate the document.
pub async fn apply_scene_text(
    State(state): State<AppState>,
    Path(scene_id): Path<String>,
    Json(request): Json<SceneTextRequest>,
) -> ApiResult<Json<SceneUpdateResponse>> {
    let mut editor = state.editor.write().await;
    let session = session_mut(&mut editor.session)?;

    let scene = session.document.scene(&scene_id)?;
    let reconciled = reconcile_scene_text(&scene, &request.text);

    let shots: Vec<Shot> = reconciled.iter().map(|entry| entry.shot.clone()).collect();
    session.document.replace_scene_shots(&scene_id, &shots)?;

    // Statuses are fresh each run; correction requests follow the base shot
    // into its new id
    let previous = session.annotations.clone();
    session.clear_scene_annotations(&scene_id);
    for entry in &reconciled {
        let carried_request = entry
            .base_shot_id
            .as_ref()
            .and_then(|base| previous.get(base))
            .and_then(|annotation| annotation.request.clone());
        session.annotations.insert(
            entry.shot.shot_id.clone(),
            ShotAnnotation {
                status: Some(entry.status),
                request: carried_request,
            },
        );
    }

    session.revalidate();
    info!(%scene_id, shots = reconciled.len(), "scene text applied");
    Ok(Json(SceneUpdateResponse {
        scene_id,
        shots: reconciled,
        diagnostics: session.diagnostics.clone(),
    }))
}

/// Response for reset: the restored plain shot list
#[derive(Debug, Serialize)]
pub struct SceneResetResponse {
    pub scene_id: String,
    pub shots: Vec<Shot>,
    pub diagnostics: Vec<Diagnostic>,
}

/// POST /scenes/:scene_id/reset
///
/// Restore the shot list the scene had when the document was loaded.
pub async fn reset_scene(
    State(state): State<AppState>,
    Path(scene_id): Path<String>,
) -> ApiResult<Json<SceneResetResponse>> {
    let mut editor = state.editor.write().await;
    let session = session_mut(&mut editor.session)?;

    let pristine = session
        .pristine_shots(&scene_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("scene not found: {scene_id}")))?;

    session.document.replace_scene_shots(&scene_id, &pristine)?;
    session.clear_scene_annotations(&scene_id);
    session.revalidate();

    info!(%scene_id, shots = pristine.len(), "scene reset to loaded state");
    Ok(Json(SceneResetResponse {
        scene_id,
        shots: pristine,
        diagnostics: session.diagnostics.clone(),
    }))
}

/// POST /scenes/:scene_id/import request
#[derive(Debug, Deserialize)]
pub struct SceneImportRequest {
    /// Whole-scene JSON object (`scene_id` + `shots` required)
    pub scene: Value,
    /// Must be true to overwrite when the pasted scene_id differs from the
    /// target; until then the mismatch is answered with 409
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct SceneImportResponse {
    pub scene_id: String,
    pub scene: Scene,
    pub diagnostics: Vec<Diagnostic>,
}

/// POST /scenes/:scene_id/import
pub async fn import_scene(
    State(state): State<AppState>,
    Path(scene_id): Path<String>,
    Json(request): Json<SceneImportRequest>,
) -> ApiResult<Json<SceneImportResponse>> {
    let mut editor = state.editor.write().await;
    let session = session_mut(&mut editor.session)?;

    session
        .document
        .import_scene(&scene_id, &request.scene, request.confirmed)?;
    session.clear_scene_annotations(&scene_id);
    session.revalidate();

    // A confirmed mismatched paste renames the scene in place
    let new_id = request
        .scene
        .get("scene_id")
        .and_then(Value::as_str)
        .unwrap_or(scene_id.as_str())
        .to_string();
    let scene = session.document.scene(&new_id)?;

    info!(%scene_id, %new_id, "scene imported from pasted JSON");
    Ok(Json(SceneImportResponse {
        scene_id: new_id,
        scene,
        diagnostics: session.diagnostics.clone(),
    }))
}

/// GET /scenes/:scene_id/prompt response
#[derive(Debug, Serialize)]
pub struct ScenePromptResponse {
    pub scene_id: String,
    pub prompt: String,
}

/// GET /scenes/:scene_id/prompt
///
/// The scene direction update request for the scene's current shot list,
/// including reconciliation tags and per-shot correction requests.
pub async fn scene_prompt(
    State(state): State<AppState>,
    Path(scene_id): Path<String>,
) -> ApiResult<Json<ScenePromptResponse>> {
    let editor = state.editor.read().await;
    let session = editor
        .session
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("no document loaded".to_string()))?;

    let scene = session.document.scene(&scene_id)?;
    let shots: Vec<PromptShot<'_>> = scene
        .shots
        .iter()
        .map(|shot| {
            let annotation = session.annotations.get(&shot.shot_id);
            PromptShot {
                shot_id: &shot.shot_id,
                text: &shot.shot_text,
                status: annotation.and_then(|a| a.status),
                request: annotation.and_then(|a| a.request.as_deref()),
            }
        })
        .collect();

    Ok(Json(ScenePromptResponse {
        prompt: scene_update_prompt(&scene_id, &shots),
        scene_id,
    }))
}

/// PUT /shots/:shot_id/request request body
#[derive(Debug, Deserialize)]
pub struct ShotRequestBody {
    /// New correction request; empty or absent clears it
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShotRequestResponse {
    pub shot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// PUT /shots/:shot_id/request
pub async fn set_shot_request(
    State(state): State<AppState>,
    Path(shot_id): Path<String>,
    Json(body): Json<ShotRequestBody>,
) -> ApiResult<Json<ShotRequestResponse>> {
    let mut editor = state.editor.write().await;
    let session = session_mut(&mut editor.session)?;

    let exists = session
        .document
        .scenes()?
        .iter()
        .any(|scene| scene.shots.iter().any(|shot| shot.shot_id == shot_id));
    if !exists {
        return Err(ApiError::NotFound(format!("shot not found: {shot_id}")));
    }

    let request = body.text.filter(|text| !text.trim().is_empty());
    match &request {
        Some(text) => {
            session
                .annotations
                .entry(shot_id.clone())
                .or_default()
                .request = Some(text.clone());
        }
        None => {
            if let Some(annotation) = session.annotations.get_mut(&shot_id) {
                annotation.request = None;
            }
        }
    }

    Ok(Json(ShotRequestResponse { shot_id, request }))
}
