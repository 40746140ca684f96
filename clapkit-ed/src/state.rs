//! Shared editor state
//!
//! One in-memory editing session behind a single `RwLock`: exactly one
//! logical owner of the current document at a time. Loads replace the whole
//! session; there is no partial persistence and no mid-flight abort path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use clapkit_common::model::{Document, DocumentKind, Shot};
use clapkit_common::reconcile::UpdateStatus;
use clapkit_common::validate::Diagnostic;
use clapkit_common::Result;

/// Transient per-shot edit state, keyed by shot id in a session side table.
/// Never serialized into the canonical document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShotAnnotation {
    /// Classification from the latest reconciliation run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UpdateStatus>,
    /// Free-form correction request attached by the editor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// Raw text retained after a failed parse, so nothing the user typed is lost
#[derive(Debug, Clone)]
pub struct Draft {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// One loaded document plus everything the edit session tracks around it
#[derive(Debug)]
pub struct EditorSession {
    pub document: Document,
    /// Latest diagnostics (parse info + validation), replaced wholesale on
    /// every mutation
    pub diagnostics: Vec<Diagnostic>,
    /// Merge warnings from the load, when the session came from a batch
    pub warnings: Vec<String>,
    pub auto_fixed: bool,
    pub loaded_at: DateTime<Utc>,
    /// Per-scene shot lists captured at load time; the reset target. Not
    /// touched again until a new document replaces the session.
    pristine_scenes: HashMap<String, Vec<Shot>>,
    /// Transient per-shot edit state
    pub annotations: HashMap<String, ShotAnnotation>,
}

impl EditorSession {
    pub fn new(
        document: Document,
        diagnostics: Vec<Diagnostic>,
        warnings: Vec<String>,
        auto_fixed: bool,
    ) -> Result<Self> {
        let pristine_scenes = match document.kind() {
            DocumentKind::Stage2 => document
                .scenes()?
                .into_iter()
                .map(|scene| (scene.scene_id.clone(), scene.shots))
                .collect(),
            DocumentKind::Stage1 => HashMap::new(),
        };

        Ok(EditorSession {
            document,
            diagnostics,
            warnings,
            auto_fixed,
            loaded_at: Utc::now(),
            pristine_scenes,
            annotations: HashMap::new(),
        })
    }

    /// The shot list a scene had when the document was loaded.
    pub fn pristine_shots(&self, scene_id: &str) -> Option<&Vec<Shot>> {
        self.pristine_scenes.get(scene_id)
    }

    /// Drop all annotations belonging to one scene's shots.
    ///
    /// Shot ids are scene-prefixed (`S01...`), so the scene id plus a dot
    /// identifies them regardless of how many segments follow.
    pub fn clear_scene_annotations(&mut self, scene_id: &str) {
        let prefix = format!("{scene_id}.");
        self.annotations.retain(|shot_id, _| !shot_id.starts_with(&prefix));
    }

    /// Re-run validation and replace the diagnostics wholesale.
    pub fn revalidate(&mut self) {
        self.diagnostics = self.document.validate();
    }
}

/// What the editor currently holds: a live session, a failed-parse draft, or
/// nothing
#[derive(Debug, Default)]
pub struct EditorState {
    pub session: Option<EditorSession>,
    pub draft: Option<Draft>,
}

impl EditorState {
    /// Replace everything with a freshly loaded session.
    pub fn replace_with_session(&mut self, session: EditorSession) {
        self.session = Some(session);
        self.draft = None;
    }

    /// Replace everything with an unparseable draft.
    pub fn replace_with_draft(&mut self, draft: Draft) {
        self.session = None;
        self.draft = Some(draft);
    }
}
