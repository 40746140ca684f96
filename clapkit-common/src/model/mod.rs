//! Document model
//!
//! A loaded document is a raw, order-preserving JSON value tagged with the
//! pipeline stage it belongs to. Classification happens exactly once, at
//! parse time; everything downstream dispatches on [`DocumentKind`] instead
//! of re-probing the JSON shape. The raw value stays canonical so that
//! broken or half-migrated documents can still be loaded, validated, and
//! edited — typed views ([`Scene`], [`Shot`]) are extracted only where an
//! operation needs them.

pub mod stage1;
pub mod stage2;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::validate::{self, Diagnostic};

pub use stage1::{Stage1Step, VisualKind};
pub use stage2::{CameraMovement, Scene, Shot, Stage2Step};

/// Which pipeline stage a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "stage1")]
    Stage1,
    #[serde(rename = "stage2")]
    Stage2,
}

/// A parsed pipeline document: stage tag plus raw JSON payload
#[derive(Debug, Clone)]
pub struct Document {
    kind: DocumentKind,
    value: Value,
}

impl Document {
    /// Classify a parsed JSON value into a tagged document.
    ///
    /// A document is Stage 2 when it carries a `scenes` array and a Stage 2
    /// `current_step` value; anything else is treated as Stage 1.
    pub fn classify(value: Value) -> Self {
        let has_scenes = value.get("scenes").map_or(false, Value::is_array);
        let has_stage2_step = value
            .get("current_step")
            .and_then(Value::as_str)
            .and_then(Stage2Step::parse)
            .is_some();

        let kind = if has_scenes && has_stage2_step {
            DocumentKind::Stage2
        } else {
            DocumentKind::Stage1
        };
        Document { kind, value }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn film_id(&self) -> Option<&str> {
        self.value.get("film_id").and_then(Value::as_str)
    }

    pub fn current_step(&self) -> Option<&str> {
        self.value.get("current_step").and_then(Value::as_str)
    }

    /// Run the stage-appropriate structural validator.
    pub fn validate(&self) -> Vec<Diagnostic> {
        match self.kind {
            DocumentKind::Stage1 => validate::stage1::validate(&self.value),
            DocumentKind::Stage2 => validate::stage2::validate(&self.value),
        }
    }

    /// Typed view of every scene. Stage 2 only.
    ///
    /// Extraction is lenient: a scene too malformed to deserialize (wrong
    /// field types) degrades to an id-only view rather than failing the
    /// whole document — the raw value keeps the truth and the validator
    /// reports the damage.
    pub fn scenes(&self) -> Result<Vec<Scene>> {
        match self.kind {
            DocumentKind::Stage1 => Err(Error::NotStage2),
            DocumentKind::Stage2 => Ok(self
                .value
                .get("scenes")
                .and_then(Value::as_array)
                .map(|scenes| scenes.iter().map(lenient_scene).collect())
                .unwrap_or_default()),
        }
    }

    /// Typed view of one scene. Stage 2 only; same leniency as [`scenes`].
    ///
    /// [`scenes`]: Document::scenes
    pub fn scene(&self, scene_id: &str) -> Result<Scene> {
        let scene = self
            .scene_value(scene_id)?
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?;
        Ok(lenient_scene(scene))
    }

    /// Replace one scene's shot list wholesale (reconciler output, reset).
    pub fn replace_scene_shots(&mut self, scene_id: &str, shots: &[Shot]) -> Result<()> {
        let shots = serde_json::to_value(shots)?;
        let scene = self
            .scene_value_mut(scene_id)?
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?;
        scene
            .as_object_mut()
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?
            .insert("shots".to_string(), shots);
        Ok(())
    }

    /// Replace one scene with a pasted whole-scene JSON object.
    ///
    /// The pasted object must carry a non-empty `scene_id` and a `shots`
    /// array. When its `scene_id` differs from the target scene, the caller
    /// must have confirmed the overwrite explicitly; until then the mismatch
    /// is reported as an error rather than applied.
    pub fn import_scene(
        &mut self,
        target_scene_id: &str,
        pasted: &Value,
        confirmed: bool,
    ) -> Result<()> {
        let pasted_id = pasted
            .get("scene_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidSceneJson("missing 'scene_id'".to_string()))?
            .to_string();
        if !pasted.get("shots").map_or(false, Value::is_array) {
            return Err(Error::InvalidSceneJson("missing 'shots' array".to_string()));
        }

        if pasted_id != target_scene_id && !confirmed {
            return Err(Error::SceneIdMismatch {
                pasted: pasted_id,
                target: target_scene_id.to_string(),
            });
        }

        let scene = self
            .scene_value_mut(target_scene_id)?
            .ok_or_else(|| Error::SceneNotFound(target_scene_id.to_string()))?;
        *scene = pasted.clone();
        Ok(())
    }

    fn scene_value(&self, scene_id: &str) -> Result<Option<&Value>> {
        match self.kind {
            DocumentKind::Stage1 => Err(Error::NotStage2),
            DocumentKind::Stage2 => Ok(self
                .value
                .get("scenes")
                .and_then(Value::as_array)
                .and_then(|scenes| {
                    scenes.iter().find(|scene| {
                        scene.get("scene_id").and_then(Value::as_str) == Some(scene_id)
                    })
                })),
        }
    }

    fn scene_value_mut(&mut self, scene_id: &str) -> Result<Option<&mut Value>> {
        match self.kind {
            DocumentKind::Stage1 => Err(Error::NotStage2),
            DocumentKind::Stage2 => Ok(self
                .value
                .get_mut("scenes")
                .and_then(Value::as_array_mut)
                .and_then(|scenes| {
                    scenes.iter_mut().find(|scene| {
                        scene.get("scene_id").and_then(Value::as_str) == Some(scene_id)
                    })
                })),
        }
    }
}

fn lenient_scene(raw: &Value) -> Scene {
    serde_json::from_value(raw.clone()).unwrap_or_else(|_| Scene {
        scene_id: raw
            .get("scene_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ..Scene::default()
    })
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Value {
        document.value
    }
}
