//! Stage 2 (shot division) document types
//!
//! Stage 2 documents carry the per-scene shot breakdown. Scenes and shots are
//! deserialized leniently (every field defaulted) so that documents still
//! under repair can be loaded and edited; structural complaints are the
//! validator's job, not the deserializer's. Unknown fields ride along in
//! `extra` and survive the parse → edit → export round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stage 2 pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage2Step {
    /// Shot division pass (2A)
    #[serde(rename = "shot_division_2A")]
    ShotDivision2A,
    /// Visual direction pass (2B)
    #[serde(rename = "visual_direction_2B")]
    VisualDirection2B,
}

impl Stage2Step {
    pub const ALL: [Stage2Step; 2] = [Stage2Step::ShotDivision2A, Stage2Step::VisualDirection2B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage2Step::ShotDivision2A => "shot_division_2A",
            Stage2Step::VisualDirection2B => "visual_direction_2B",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|step| step.as_str() == s)
    }
}

/// Camera movement metadata attached to a shot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraMovement {
    /// Movement type from the camera vocabulary (joined with `" + "` for
    /// merged shots)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<String>,

    /// Movement speed (joined with `" / "` for merged shots)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,

    /// Movement duration, e.g. `"4s"` (joined with `" + "` for merged shots)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Open-ended extensions (secondary movement, focus shift, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single shot within a scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shot {
    /// Shot id, pattern `S<scene>.<seq>.<seq>` (e.g. `S01.01.01`)
    #[serde(default)]
    pub shot_id: String,

    /// Always `"regular"` in well-formed documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_type: Option<String>,

    /// One line of scenario prose this shot covers
    #[serde(default)]
    pub shot_text: String,

    /// Characters appearing in the shot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_character: Option<Vec<String>>,

    /// Scene-title reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_movement: Option<CameraMovement>,

    /// Movement description block; existence is validated, shape is open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_description: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_frame: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_frame: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A scene: scenario prose plus its shot breakdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Scene id, pattern `S<nn>` (e.g. `S01`)
    #[serde(default)]
    pub scene_id: String,

    #[serde(default)]
    pub scene_title: String,

    #[serde(default)]
    pub scene_scenario: String,

    /// Concept-art references (characters/location/props); existence is
    /// validated, shape is open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_art_references: Option<Value>,

    #[serde(default)]
    pub shots: Vec<Shot>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
