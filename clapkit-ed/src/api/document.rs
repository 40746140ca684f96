//! Document lifecycle: paste/load, multi-file merge, fetch, export
//!
//! Loads replace the whole session. A parse failure is not an HTTP error —
//! the raw text is retained as a draft and handed back with its diagnostics,
//! exactly so the caller can put it in front of the user for repair.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use clapkit_common::collector::BatchCollector;
use clapkit_common::export::{export_filename, format_json, to_pretty_json};
use clapkit_common::merge::{merge_documents, SourceDocument};
use clapkit_common::model::{DocumentKind, VisualKind};
use clapkit_common::parse::parse_document;
use clapkit_common::prompt::{correction_prompt, format_blocks};
use clapkit_common::validate::Diagnostic;

use crate::error::{ApiError, ApiResult};
use crate::state::{Draft, EditorSession, ShotAnnotation};
use crate::AppState;

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/document", post(load_document).get(get_document))
        .route("/document/files", post(merge_files))
        .route("/document/export", get(export_document))
        .route("/prompts/correction", get(correction_prompt_for_session))
        .route("/entities/:kind/:entity_id/prompt", get(entity_prompt))
}

/// POST /document request
#[derive(Debug, Deserialize)]
pub struct LoadDocumentRequest {
    pub text: String,
}

/// POST /document and /document/files response
#[derive(Debug, Serialize)]
pub struct LoadDocumentResponse {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentKind>,
    pub auto_fixed: bool,
    pub fix_count: usize,
    /// Pretty-printed repaired text, when auto-fixing produced the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_json: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

/// POST /document
///
/// Parse pasted text, validate, and replace the session. Returns 200 with
/// `loaded: false` (and the syntax diagnostics) when the text does not parse.
pub async fn load_document(
    State(state): State<AppState>,
    Json(request): Json<LoadDocumentRequest>,
) -> ApiResult<Json<LoadDocumentResponse>> {
    let outcome = parse_document(&request.text);
    let mut editor = state.editor.write().await;

    let Some(document) = outcome.document else {
        let diagnostics = outcome.diagnostics;
        editor.replace_with_draft(Draft {
            text: request.text,
            diagnostics: diagnostics.clone(),
        });
        info!("document rejected: does not parse");
        return Ok(Json(LoadDocumentResponse {
            loaded: false,
            kind: None,
            auto_fixed: false,
            fix_count: 0,
            fixed_json: None,
            diagnostics,
            warnings: Vec::new(),
            loaded_at: Utc::now(),
        }));
    };

    let kind = document.kind();
    let mut diagnostics = outcome.diagnostics;
    diagnostics.extend(document.validate());

    let session = EditorSession::new(document, diagnostics.clone(), Vec::new(), outcome.auto_fixed)?;
    let loaded_at = session.loaded_at;
    editor.replace_with_session(session);

    info!(
        ?kind,
        auto_fixed = outcome.auto_fixed,
        diagnostics = diagnostics.len(),
        "document loaded"
    );
    Ok(Json(LoadDocumentResponse {
        loaded: true,
        kind: Some(kind),
        auto_fixed: outcome.auto_fixed,
        fix_count: outcome.fix_count,
        fixed_json: outcome.fixed_json.as_deref().map(format_json),
        diagnostics,
        warnings: Vec::new(),
        loaded_at,
    }))
}

/// POST /document/files request: the batch in selection order
#[derive(Debug, Deserialize)]
pub struct MergeFilesRequest {
    pub files: Vec<MergeFileEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MergeFileEntry {
    pub name: String,
    pub content: String,
}

/// POST /document/files
///
/// Merge a batch of files into one document, validate, and replace the
/// session. Fatal merge conflicts (empty batch, film_id mismatch) return 422
/// with no state change; per-entity conflicts come back as warnings.
pub async fn merge_files(
    State(state): State<AppState>,
    Json(request): Json<MergeFilesRequest>,
) -> ApiResult<Json<LoadDocumentResponse>> {
    // Upstream reads complete in arbitrary order; the collector pins each
    // file to its selection-order slot and releases the batch only complete.
    let mut collector = BatchCollector::new(request.files.len());
    for (slot, file) in request.files.iter().enumerate() {
        collector.insert(slot, file.name.as_str(), file.content.as_str())?;
    }
    let sources = collector
        .into_sources()
        .ok_or_else(|| ApiError::Internal("incomplete file batch".to_string()))?;

    let mut documents = Vec::with_capacity(sources.len());
    for source in &sources {
        let outcome = parse_document(&source.content);
        let Some(document) = outcome.document else {
            return Err(ApiError::Unprocessable(format!(
                "{}: file does not parse as JSON",
                source.name
            )));
        };
        documents.push(SourceDocument::new(source.name.as_str(), document));
    }

    let output = merge_documents(&documents)?;
    let diagnostics = output.document.validate();
    let kind = output.document.kind();

    let mut editor = state.editor.write().await;
    let session = EditorSession::new(
        output.document,
        diagnostics.clone(),
        output.warnings.clone(),
        false,
    )?;
    let loaded_at = session.loaded_at;
    editor.replace_with_session(session);

    info!(
        files = request.files.len(),
        warnings = output.warnings.len(),
        ?kind,
        "file batch merged"
    );
    Ok(Json(LoadDocumentResponse {
        loaded: true,
        kind: Some(kind),
        auto_fixed: false,
        fix_count: 0,
        fixed_json: None,
        diagnostics,
        warnings: output.warnings,
        loaded_at,
    }))
}

/// GET /document response
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
    pub annotations: HashMap<String, ShotAnnotation>,
    /// Raw text of a paste that failed to parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_text: Option<String>,
}

/// GET /document
pub async fn get_document(State(state): State<AppState>) -> ApiResult<Json<DocumentResponse>> {
    let editor = state.editor.read().await;

    if let Some(session) = &editor.session {
        return Ok(Json(DocumentResponse {
            loaded: true,
            kind: Some(session.document.kind()),
            document: Some(session.document.value().clone()),
            diagnostics: session.diagnostics.clone(),
            warnings: session.warnings.clone(),
            annotations: session.annotations.clone(),
            draft_text: None,
        }));
    }
    if let Some(draft) = &editor.draft {
        return Ok(Json(DocumentResponse {
            loaded: false,
            kind: None,
            document: None,
            diagnostics: draft.diagnostics.clone(),
            warnings: Vec::new(),
            annotations: HashMap::new(),
            draft_text: Some(draft.text.clone()),
        }));
    }
    Err(ApiError::NotFound("no document loaded".to_string()))
}

/// GET /document/export response
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub filename: String,
    pub json: String,
}

/// GET /document/export
pub async fn export_document(State(state): State<AppState>) -> ApiResult<Json<ExportResponse>> {
    let editor = state.editor.read().await;
    let session = editor
        .session
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("no document loaded".to_string()))?;

    Ok(Json(ExportResponse {
        filename: export_filename(&session.document),
        json: to_pretty_json(&session.document)?,
    }))
}

/// GET /entities/:kind/:entity_id/prompt response
#[derive(Debug, Serialize)]
pub struct EntityPromptResponse {
    pub kind: String,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered `KEY:VALUE;` rendering of the entity's block map
    pub prompt: String,
}

/// GET /entities/:kind/:entity_id/prompt
///
/// Concept-art prompt text for one visual-block entity of a Stage 1
/// document. `kind` is one of `characters`, `locations`, `props`.
pub async fn entity_prompt(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, String)>,
) -> ApiResult<Json<EntityPromptResponse>> {
    let editor = state.editor.read().await;
    let session = editor
        .session
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("no document loaded".to_string()))?;

    let kind = VisualKind::ALL
        .into_iter()
        .find(|k| k.key() == kind)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown entity kind: {kind}")))?;

    let entity = session
        .document
        .value()
        .get("visual_blocks")
        .and_then(|blocks| blocks.get(kind.key()))
        .and_then(Value::as_array)
        .and_then(|entities| {
            entities
                .iter()
                .find(|e| e.get("id").and_then(Value::as_str) == Some(entity_id.as_str()))
        })
        .ok_or_else(|| {
            ApiError::NotFound(format!("{} not found: {entity_id}", kind.singular()))
        })?;

    let prompt = entity
        .get("blocks")
        .and_then(Value::as_object)
        .map(format_blocks)
        .unwrap_or_default();

    Ok(Json(EntityPromptResponse {
        kind: kind.key().to_string(),
        entity_id,
        name: entity
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        prompt,
    }))
}

/// GET /prompts/correction response
#[derive(Debug, Serialize)]
pub struct CorrectionPromptResponse {
    pub prompt: String,
}

/// GET /prompts/correction
///
/// The correction request for the current diagnostics — works for a live
/// session and for a failed-parse draft alike.
pub async fn correction_prompt_for_session(
    State(state): State<AppState>,
) -> ApiResult<Json<CorrectionPromptResponse>> {
    let editor = state.editor.read().await;

    let diagnostics = if let Some(session) = &editor.session {
        &session.diagnostics
    } else if let Some(draft) = &editor.draft {
        &draft.diagnostics
    } else {
        return Err(ApiError::NotFound("no document loaded".to_string()));
    };

    Ok(Json(CorrectionPromptResponse {
        prompt: correction_prompt(diagnostics),
    }))
}
