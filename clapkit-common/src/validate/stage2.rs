//! Stage 2 structural rules
//!
//! Id formats, the camera-movement vocabulary, and the per-scene/per-shot
//! structure checks. Paths use bracket indexing (`scenes[2].shots[0]`) so a
//! finding can be mapped straight back to its position in the document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{truthy, Category, Diagnostic, Severity};
use crate::model::Stage2Step;

/// Camera movement type vocabulary
pub const CAMERA_MOVEMENT_TYPES: [&str; 32] = [
    "static",
    "pan",
    "tilt",
    "dolly_in",
    "dolly_out",
    "dolly_zoom",
    "track",
    "truck",
    "crane",
    "crane_up",
    "crane_down",
    "handheld",
    "steadicam",
    "zoom",
    "rack_focus",
    "arc",
    "whip_pan",
    "whip_pan_down",
    "dutch_angle",
    "overhead",
    "worm_view",
    "spiral",
    "pendulum",
    "drift",
    "snap_zoom",
    "push_in",
    "pull_out",
    "slow_push_in",
    "quick_pull_back",
    "tracking_backward",
    "tracking_left",
    "tilt_down_then_focus",
];

/// Camera movement speed vocabulary
pub const CAMERA_SPEEDS: [&str; 5] = ["very_slow", "slow", "medium", "fast", "match_subject"];

static FILM_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^FILM_\d{6}$").expect("valid regex"));
static SCENE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^S\d{2}$").expect("valid regex"));
static SHOT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S\d{2}\.\d{2}\.\d{2}$").expect("valid regex"));
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?s$").expect("valid regex"));

/// Validate a Stage 2 document value. Never fails; returns an ordered
/// diagnostics list (empty when the document is clean).
pub fn validate(doc: &Value) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    if !truthy(doc.get("film_id")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "film_id",
            "film_id is missing",
        ));
    } else if !matches_re(&FILM_ID_RE, doc.get("film_id")) {
        diags.push(Diagnostic::schema(
            Category::Schema,
            "film_id",
            "film_id format is invalid (example: FILM_123456)",
        ));
    }

    if !truthy(doc.get("current_step")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "current_step",
            "current_step is missing",
        ));
    } else {
        let valid = doc
            .get("current_step")
            .and_then(Value::as_str)
            .and_then(Stage2Step::parse)
            .is_some();
        if !valid {
            diags.push(Diagnostic::schema(
                Category::Schema,
                "current_step",
                format!("invalid current_step: {}", render(&doc["current_step"])),
            ));
        }
    }

    if !truthy(doc.get("timestamp")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "timestamp",
            "timestamp is missing",
        ));
    }

    match doc.get("scenes").and_then(Value::as_array) {
        None => diags.push(Diagnostic::schema(
            Category::Story,
            "scenes",
            "scenes array is missing",
        )),
        Some(scenes) if scenes.is_empty() => diags.push(
            Diagnostic::schema(Category::Story, "scenes", "at least one scene is required")
                .with_severity(Severity::Warning),
        ),
        Some(scenes) => {
            for (scene_idx, scene) in scenes.iter().enumerate() {
                validate_scene(scene, scene_idx, &mut diags);
            }
        }
    }

    diags
}

fn validate_scene(scene: &Value, scene_idx: usize, diags: &mut Vec<Diagnostic>) {
    let spath = format!("scenes[{scene_idx}]");

    if !truthy(scene.get("scene_id")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            format!("{spath}.scene_id"),
            "scene_id is missing",
        ));
    } else if !matches_re(&SCENE_ID_RE, scene.get("scene_id")) {
        diags.push(Diagnostic::schema(
            Category::Schema,
            format!("{spath}.scene_id"),
            "scene_id format is invalid (example: S01)",
        ));
    }

    if !truthy(scene.get("scene_title")) {
        diags.push(Diagnostic::schema(
            Category::Story,
            format!("{spath}.scene_title"),
            "scene_title is missing",
        ));
    }
    if !truthy(scene.get("scene_scenario")) {
        diags.push(Diagnostic::schema(
            Category::Story,
            format!("{spath}.scene_scenario"),
            "scene_scenario is missing",
        ));
    }

    match scene.get("concept_art_references") {
        refs if !truthy(refs) => diags.push(Diagnostic::schema(
            Category::Visual,
            format!("{spath}.concept_art_references"),
            "concept_art_references is missing",
        )),
        Some(refs) => {
            for key in ["characters", "location", "props"] {
                if !truthy(refs.get(key)) {
                    diags.push(Diagnostic::schema(
                        Category::Visual,
                        format!("{spath}.concept_art_references.{key}"),
                        format!("{key} reference is missing"),
                    ));
                }
            }
        }
        None => {}
    }

    match scene.get("shots").and_then(Value::as_array) {
        None => diags.push(Diagnostic::schema(
            Category::Story,
            format!("{spath}.shots"),
            "shots array is missing",
        )),
        Some(shots) if shots.is_empty() => diags.push(Diagnostic::schema(
            Category::Story,
            format!("{spath}.shots"),
            "at least one shot is required",
        )),
        Some(shots) => {
            for (shot_idx, shot) in shots.iter().enumerate() {
                validate_shot(shot, &format!("{spath}.shots[{shot_idx}]"), diags);
            }
        }
    }
}

fn validate_shot(shot: &Value, shot_path: &str, diags: &mut Vec<Diagnostic>) {
    if !truthy(shot.get("shot_id")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            format!("{shot_path}.shot_id"),
            "shot_id is missing",
        ));
    } else if !matches_re(&SHOT_ID_RE, shot.get("shot_id")) {
        diags.push(Diagnostic::schema(
            Category::Schema,
            format!("{shot_path}.shot_id"),
            "shot_id format is invalid (example: S01.01.01)",
        ));
    }

    if truthy(shot.get("shot_type")) && shot.get("shot_type").and_then(Value::as_str) != Some("regular") {
        diags.push(Diagnostic::schema(
            Category::Schema,
            format!("{shot_path}.shot_type"),
            format!(
                "shot_type must be 'regular' (found: {})",
                render(&shot["shot_type"])
            ),
        ));
    }

    if !truthy(shot.get("shot_text")) {
        diags.push(Diagnostic::schema(
            Category::Story,
            format!("{shot_path}.shot_text"),
            "shot_text is missing",
        ));
    }

    match shot.get("camera_movement") {
        camera if !truthy(camera) => diags.push(Diagnostic::schema(
            Category::Visual,
            format!("{shot_path}.camera_movement"),
            "camera_movement is missing",
        )),
        Some(camera) => {
            if !truthy(camera.get("type")) {
                diags.push(Diagnostic::schema(
                    Category::Schema,
                    format!("{shot_path}.camera_movement.type"),
                    "camera_movement.type is missing",
                ));
            } else {
                let known = camera
                    .get("type")
                    .and_then(Value::as_str)
                    .map_or(false, |t| CAMERA_MOVEMENT_TYPES.contains(&t));
                if !known {
                    diags.push(Diagnostic::schema(
                        Category::Schema,
                        format!("{shot_path}.camera_movement.type"),
                        format!("invalid camera type: {}", render(&camera["type"])),
                    ));
                }
            }

            if truthy(camera.get("speed")) {
                let known = camera
                    .get("speed")
                    .and_then(Value::as_str)
                    .map_or(false, |s| CAMERA_SPEEDS.contains(&s));
                if !known {
                    diags.push(Diagnostic::schema(
                        Category::Schema,
                        format!("{shot_path}.camera_movement.speed"),
                        format!("invalid camera speed: {}", render(&camera["speed"])),
                    ));
                }
            }

            if truthy(camera.get("duration")) && !matches_re(&DURATION_RE, camera.get("duration")) {
                diags.push(Diagnostic::schema(
                    Category::Schema,
                    format!("{shot_path}.camera_movement.duration"),
                    "duration format is invalid (example: 4s)",
                ));
            }
        }
        None => {}
    }

    for key in ["movement_description", "starting_frame", "ending_frame"] {
        if !truthy(shot.get(key)) {
            diags.push(Diagnostic::schema(
                Category::Visual,
                format!("{shot_path}.{key}"),
                format!("{key} is missing"),
            ));
        }
    }
}

fn matches_re(re: &Regex, value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(false, |s| re.is_match(s))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_doc() -> Value {
        json!({
            "film_id": "FILM_000314",
            "current_step": "shot_division_2A",
            "timestamp": "2025-11-01T12:00:00Z",
            "scenes": [
                {
                    "scene_id": "S01",
                    "scene_title": "Ferry Deck",
                    "scene_scenario": "Wind rattles the railing. Mira grips her ticket.",
                    "concept_art_references": {
                        "characters": ["MIRA"],
                        "location": "ferry_deck",
                        "props": ["ticket"]
                    },
                    "shots": [
                        {
                            "shot_id": "S01.01.01",
                            "shot_type": "regular",
                            "shot_text": "Wind rattles the railing.",
                            "shot_character": [],
                            "scene": "Ferry Deck",
                            "camera_movement": {"type": "static", "speed": "slow", "duration": "4s"},
                            "movement_description": {"environment_move": "wind", "mood_emotion": "tense"},
                            "starting_frame": {"camera_composition": "wide"},
                            "ending_frame": {"camera_composition": "wide"}
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_complete_document_is_clean() {
        assert!(validate(&complete_doc()).is_empty());
    }

    #[test]
    fn test_film_id_format() {
        let mut doc = complete_doc();
        doc["film_id"] = json!("FILM_12");
        let diags = validate(&doc);
        assert!(diags
            .iter()
            .any(|d| d.path == "film_id" && d.category == Category::Schema));
    }

    #[test]
    fn test_zero_scenes_is_single_story_warning() {
        let mut doc = complete_doc();
        doc["scenes"] = json!([]);
        let diags = validate(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path, "scenes");
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].category, Category::Story);
    }

    #[test]
    fn test_empty_shots_is_error() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"] = json!([]);
        let diags = validate(&doc);
        let shots = diags.iter().find(|d| d.path == "scenes[0].shots").unwrap();
        assert_eq!(shots.severity, Severity::Error);
        assert_eq!(shots.category, Category::Story);
    }

    #[test]
    fn test_shot_id_pattern() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"][0]["shot_id"] = json!("S1.1.1");
        let diags = validate(&doc);
        assert!(diags
            .iter()
            .any(|d| d.path == "scenes[0].shots[0].shot_id"
                && d.message.contains("format is invalid")));
    }

    #[test]
    fn test_camera_vocabulary() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"][0]["camera_movement"] =
            json!({"type": "barrel_roll", "speed": "warp", "duration": "4 seconds"});
        let diags = validate(&doc);
        let paths: Vec<&str> = diags.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"scenes[0].shots[0].camera_movement.type"));
        assert!(paths.contains(&"scenes[0].shots[0].camera_movement.speed"));
        assert!(paths.contains(&"scenes[0].shots[0].camera_movement.duration"));
    }

    #[test]
    fn test_missing_camera_movement_is_visual() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"][0]
            .as_object_mut()
            .unwrap()
            .remove("camera_movement");
        let diags = validate(&doc);
        let camera = diags
            .iter()
            .find(|d| d.path == "scenes[0].shots[0].camera_movement")
            .unwrap();
        assert_eq!(camera.category, Category::Visual);
    }

    #[test]
    fn test_non_regular_shot_type() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"][0]["shot_type"] = json!("insert");
        let diags = validate(&doc);
        assert!(diags
            .iter()
            .any(|d| d.path == "scenes[0].shots[0].shot_type"
                && d.message.contains("insert")));
    }

    #[test]
    fn test_concept_art_reference_keys() {
        let mut doc = complete_doc();
        doc["scenes"][0]["concept_art_references"]
            .as_object_mut()
            .unwrap()
            .remove("location");
        let diags = validate(&doc);
        assert!(diags
            .iter()
            .any(|d| d.path == "scenes[0].concept_art_references.location"));
    }

    #[test]
    fn test_frame_existence_only() {
        let mut doc = complete_doc();
        // Shape inside the frames is not checked, only existence
        doc["scenes"][0]["shots"][0]["starting_frame"] = json!({"anything": true});
        assert!(validate(&doc).is_empty());

        doc["scenes"][0]["shots"][0]
            .as_object_mut()
            .unwrap()
            .remove("starting_frame");
        let diags = validate(&doc);
        assert!(diags
            .iter()
            .any(|d| d.path == "scenes[0].shots[0].starting_frame"));
    }

    #[test]
    fn test_determinism() {
        let mut doc = complete_doc();
        doc["scenes"][0]["shots"][0]["camera_movement"]["type"] = json!("hyperzoom");
        doc["scenes"][0].as_object_mut().unwrap().remove("scene_title");
        assert_eq!(validate(&doc), validate(&doc));
    }
}
