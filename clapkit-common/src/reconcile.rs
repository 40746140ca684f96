//! Scene-to-shot re-segmentation
//!
//! After a scene's prose has been freely re-edited, the shot list must be
//! rebuilt: every non-blank line becomes one shot, matched back against the
//! prior shots so ids, camera metadata, and a change classification can be
//! carried forward. The matching cascade is heuristic by design and lives
//! here as a pure function — no session state, independently testable.
//!
//! Matching, per line: a prior shot is a candidate when (a) the normalized
//! line is contained in the normalized prior text and the line is longer
//! than 2 chars, (b) the normalized prior text is contained in the line and
//! the prior text is longer than 2 chars, or (c) token similarity exceeds
//! 0.3. Candidates are ranked by similarity (stable on ties). A line with no
//! candidates is `new`; several candidates mean prior shots were `merged`
//! into it; a single candidate claimed by multiple lines marks a `split`
//! (first line) and `split-added` (the rest); otherwise the line is
//! unchanged.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::debug;

use crate::model::{CameraMovement, Scene, Shot};
use crate::similarity::{normalize, token_similarity};

/// Similarity floor for rule (c) of the matching cascade
const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Change classification of one re-segmented shot.
///
/// Edit-session state only: recomputed on every reconciliation, never part
/// of the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    /// No prior shot matched the line
    #[serde(rename = "new")]
    New,
    /// First line claiming a prior shot that several lines matched
    #[serde(rename = "split")]
    Split,
    /// Every further line claiming that same prior shot
    #[serde(rename = "split-added")]
    SplitAdded,
    /// The line matched several prior shots at once
    #[serde(rename = "merged")]
    Merged,
    /// Exactly one prior shot, claimed by this line alone
    #[serde(rename = "none")]
    Unchanged,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::New => "new",
            UpdateStatus::Split => "split",
            UpdateStatus::SplitAdded => "split-added",
            UpdateStatus::Merged => "merged",
            UpdateStatus::Unchanged => "none",
        }
    }

    /// Tag rendered in scene update prompts; unchanged shots get none.
    pub fn prompt_tag(&self) -> Option<&'static str> {
        match self {
            UpdateStatus::New => Some("[New]"),
            UpdateStatus::Split => Some("[Split]"),
            UpdateStatus::SplitAdded => Some("[Split Added]"),
            UpdateStatus::Merged => Some("[Merged]"),
            UpdateStatus::Unchanged => None,
        }
    }
}

/// One rebuilt shot plus its classification
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledShot {
    #[serde(flatten)]
    pub shot: Shot,
    pub status: UpdateStatus,
    /// Prior shot the rebuilt one is based on (its best match), absent for
    /// brand-new lines. Lets callers migrate per-shot edit state across ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_shot_id: Option<String>,
}

/// Rebuild a scene's shot list from freely edited prose.
///
/// One shot per non-blank line; ids are reassigned positionally as
/// `<scene_id>.<NN>`. The result fully replaces the scene's shots.
pub fn reconcile_scene_text(scene: &Scene, edited_text: &str) -> Vec<ReconciledShot> {
    let prior = &scene.shots;
    let lines: Vec<&str> = edited_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    // Candidate prior shots per line, ranked by similarity
    struct LineMatch<'a> {
        line: &'a str,
        shot_id: String,
        candidates: Vec<(usize, f64)>,
    }

    let matches: Vec<LineMatch> = lines
        .iter()
        .enumerate()
        .map(|(idx, &line)| {
            let shot_id = format!("{}.{:02}", scene.scene_id, idx + 1);
            let clean_line = normalize(line);

            let mut candidates: Vec<(usize, f64)> = prior
                .iter()
                .enumerate()
                .filter(|(_, old)| {
                    let clean_old = normalize(&old.shot_text);
                    if clean_line.chars().count() > 2 && clean_old.contains(&clean_line) {
                        return true;
                    }
                    if clean_old.chars().count() > 2 && clean_line.contains(&clean_old) {
                        return true;
                    }
                    token_similarity(line, &old.shot_text) > SIMILARITY_THRESHOLD
                })
                .map(|(i, old)| (i, token_similarity(line, &old.shot_text)))
                .collect();

            // Stable sort: ties keep prior-shot order
            candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

            LineMatch {
                line,
                shot_id,
                candidates,
            }
        })
        .collect();

    // How many lines claimed each prior shot, across the whole edit
    let mut usage: HashMap<&str, usize> = HashMap::new();
    for lm in &matches {
        for &(idx, _) in &lm.candidates {
            *usage.entry(prior[idx].shot_id.as_str()).or_insert(0) += 1;
        }
    }

    // Lines claimed in order; the first claim on a split shot wins `split`
    let mut seen: HashMap<&str, usize> = HashMap::new();

    let result: Vec<ReconciledShot> = matches
        .iter()
        .map(|lm| {
            let mut camera = lm
                .candidates
                .first()
                .and_then(|&(idx, _)| prior[idx].camera_movement.clone());

            let status = if lm.candidates.is_empty() {
                UpdateStatus::New
            } else if lm.candidates.len() > 1 {
                let types = collect_camera_values(prior, &lm.candidates, |c| {
                    c.movement_type.as_ref()
                });
                let speeds = collect_camera_values(prior, &lm.candidates, |c| c.speed.as_ref());
                let durations =
                    collect_camera_values(prior, &lm.candidates, |c| c.duration.as_ref());
                if !types.is_empty() {
                    camera = Some(CameraMovement {
                        movement_type: Some(types.join(" + ")),
                        speed: join_nonempty(&speeds, " / "),
                        duration: join_nonempty(&durations, " + "),
                        extra: Map::new(),
                    });
                }
                UpdateStatus::Merged
            } else {
                let old_id = prior[lm.candidates[0].0].shot_id.as_str();
                let global_usage = usage.get(old_id).copied().unwrap_or(0);
                let seen_count = seen.get(old_id).copied().unwrap_or(0);
                *seen.entry(old_id).or_insert(0) += 1;

                if global_usage > 1 {
                    if seen_count == 0 {
                        UpdateStatus::Split
                    } else {
                        UpdateStatus::SplitAdded
                    }
                } else {
                    UpdateStatus::Unchanged
                }
            };

            let base_shot_id = lm
                .candidates
                .first()
                .map(|&(idx, _)| prior[idx].shot_id.clone());

            let shot = match lm.candidates.first() {
                Some(&(base_idx, _)) => {
                    // Carry the best match wholesale, then override identity
                    let mut shot = prior[base_idx].clone();
                    shot.shot_id = lm.shot_id.clone();
                    shot.shot_text = lm.line.to_string();
                    shot.camera_movement = camera;
                    shot
                }
                None => Shot {
                    shot_id: lm.shot_id.clone(),
                    shot_type: Some("regular".to_string()),
                    shot_text: lm.line.to_string(),
                    shot_character: Some(Vec::new()),
                    scene: Some(scene.scene_title.clone()),
                    camera_movement: None,
                    movement_description: None,
                    starting_frame: None,
                    ending_frame: None,
                    extra: Map::new(),
                },
            };

            ReconciledShot {
                shot,
                status,
                base_shot_id,
            }
        })
        .collect();

    debug!(
        scene_id = %scene.scene_id,
        prior_shots = prior.len(),
        new_shots = result.len(),
        "scene re-segmented"
    );
    result
}

/// Non-empty values of one camera field across the candidates, first-seen
/// order, deduplicated.
fn collect_camera_values<'a>(
    prior: &'a [Shot],
    candidates: &[(usize, f64)],
    field: impl Fn(&'a CameraMovement) -> Option<&'a String>,
) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for &(idx, _) in candidates {
        if let Some(camera) = &prior[idx].camera_movement {
            if let Some(value) = field(camera) {
                if !value.is_empty() && !values.iter().any(|v| v == value) {
                    values.push(value.clone());
                }
            }
        }
    }
    values
}

fn join_nonempty(values: &[String], separator: &str) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(shot_id: &str, text: &str, camera: Option<CameraMovement>) -> Shot {
        Shot {
            shot_id: shot_id.to_string(),
            shot_type: Some("regular".to_string()),
            shot_text: text.to_string(),
            camera_movement: camera,
            ..Shot::default()
        }
    }

    fn camera(movement_type: &str, speed: Option<&str>, duration: Option<&str>) -> CameraMovement {
        CameraMovement {
            movement_type: Some(movement_type.to_string()),
            speed: speed.map(str::to_string),
            duration: duration.map(str::to_string),
            extra: Map::new(),
        }
    }

    fn scene(shots: Vec<Shot>) -> Scene {
        Scene {
            scene_id: "S01".to_string(),
            scene_title: "Ferry Deck".to_string(),
            scene_scenario: String::new(),
            concept_art_references: None,
            shots,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_identical_text_is_idempotent() {
        let scene = scene(vec![
            shot(
                "S01.01.01",
                "Wind rattles the railing hard tonight.",
                Some(camera("static", Some("slow"), Some("4s"))),
            ),
            shot(
                "S01.01.02",
                "Mira grips her crumpled ticket.",
                Some(camera("push_in", None, Some("2s"))),
            ),
        ]);
        let text = "Wind rattles the railing hard tonight.\nMira grips her crumpled ticket.";

        let result = reconcile_scene_text(&scene, text);
        assert_eq!(result.len(), 2);
        for (idx, entry) in result.iter().enumerate() {
            assert_eq!(entry.status, UpdateStatus::Unchanged);
            assert_eq!(entry.shot.shot_text, scene.shots[idx].shot_text);
            assert_eq!(
                entry.shot.camera_movement.as_ref().unwrap().movement_type,
                scene.shots[idx].camera_movement.as_ref().unwrap().movement_type
            );
        }
    }

    #[test]
    fn test_ids_assigned_positionally() {
        let scene = scene(vec![]);
        let result = reconcile_scene_text(&scene, "first line here\n\n\nsecond line here");
        assert_eq!(result[0].shot.shot_id, "S01.01");
        assert_eq!(result[1].shot.shot_id, "S01.02");
    }

    #[test]
    fn test_unmatched_line_is_new() {
        let scene = scene(vec![shot("S01.01.01", "The ferry horn sounds.", None)]);
        let result = reconcile_scene_text(&scene, "A seagull lands on deck.");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, UpdateStatus::New);
        assert_eq!(result[0].base_shot_id, None);
        assert_eq!(result[0].shot.shot_type.as_deref(), Some("regular"));
        assert_eq!(result[0].shot.scene.as_deref(), Some("Ferry Deck"));
        assert_eq!(result[0].shot.shot_character.as_deref(), Some(&[][..]));
        assert!(result[0].shot.camera_movement.is_none());
    }

    #[test]
    fn test_split_detection_carries_camera() {
        let scene = scene(vec![shot(
            "S01.01.01",
            "Mira walks across the deck",
            Some(camera("track", Some("slow"), Some("6s"))),
        )]);
        // Both halves keep >0.3 similarity with the original line
        let result = reconcile_scene_text(&scene, "Mira walks across\nacross the deck");

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].status, UpdateStatus::Split);
        assert_eq!(result[1].status, UpdateStatus::SplitAdded);
        assert_eq!(result[0].base_shot_id.as_deref(), Some("S01.01.01"));
        assert_eq!(result[1].base_shot_id.as_deref(), Some("S01.01.01"));
        for entry in &result {
            let camera = entry.shot.camera_movement.as_ref().unwrap();
            assert_eq!(camera.movement_type.as_deref(), Some("track"));
            assert_eq!(camera.speed.as_deref(), Some("slow"));
            assert_eq!(camera.duration.as_deref(), Some("6s"));
        }
    }

    #[test]
    fn test_merge_detection_joins_camera_metadata() {
        let scene = scene(vec![
            shot(
                "S01.01.01",
                "The gulls scatter",
                Some(camera("pan", Some("slow"), Some("2s"))),
            ),
            shot(
                "S01.01.02",
                "the horn bellows",
                Some(camera("tilt", Some("fast"), Some("3s"))),
            ),
        ]);
        // One line containing both prior texts: substring rule hits twice
        let result = reconcile_scene_text(&scene, "The gulls scatter and the horn bellows");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, UpdateStatus::Merged);
        let camera = result[0].shot.camera_movement.as_ref().unwrap();
        assert_eq!(camera.movement_type.as_deref(), Some("pan + tilt"));
        assert_eq!(camera.speed.as_deref(), Some("slow / fast"));
        assert_eq!(camera.duration.as_deref(), Some("2s + 3s"));
    }

    #[test]
    fn test_merge_deduplicates_joined_values() {
        let scene = scene(vec![
            shot("S01.01.01", "the rope snaps loose", Some(camera("pan", Some("slow"), None))),
            shot("S01.01.02", "the crate slides aft", Some(camera("pan", Some("slow"), None))),
        ]);
        let result = reconcile_scene_text(&scene, "the rope snaps loose and the crate slides aft");

        let camera = result[0].shot.camera_movement.as_ref().unwrap();
        assert_eq!(camera.movement_type.as_deref(), Some("pan"));
        assert_eq!(camera.speed.as_deref(), Some("slow"));
        assert_eq!(camera.duration, None);
    }

    #[test]
    fn test_merge_without_camera_keeps_best_candidate_metadata() {
        // No candidate carries a movement type: the joined movement is not
        // fabricated, the best match's (absent) camera rides along instead.
        let scene = scene(vec![
            shot("S01.01.01", "the rope snaps loose", None),
            shot("S01.01.02", "the crate slides aft", None),
        ]);
        let result = reconcile_scene_text(&scene, "the rope snaps loose and the crate slides aft");
        assert_eq!(result[0].status, UpdateStatus::Merged);
        assert!(result[0].shot.camera_movement.is_none());
    }

    #[test]
    fn test_short_line_only_matches_via_similarity() {
        let scene = scene(vec![shot("S01.01.01", "go", None)]);
        // "go" normalizes to 2 chars: substring rules are off, but the
        // similarity rule still matches the identical token
        let result = reconcile_scene_text(&scene, "go");
        assert_eq!(result[0].status, UpdateStatus::Unchanged);

        // A short line buried in longer prior text matches nothing
        let scene2 = scene_with_text("the long boarding announcement plays");
        let result = reconcile_scene_text(&scene2, "he");
        assert_eq!(result[0].status, UpdateStatus::New);
    }

    fn scene_with_text(text: &str) -> Scene {
        scene(vec![shot("S01.01.01", text, None)])
    }

    #[test]
    fn test_blank_lines_dropped() {
        let scene = scene(vec![]);
        let result = reconcile_scene_text(&scene, "\n  \nonly real line\n\n");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].shot.shot_text, "only real line");
    }

    #[test]
    fn test_extra_shot_fields_survive_reconciliation() {
        let mut base = shot("S01.01.01", "Mira checks the tide tables", None);
        base.extra
            .insert("storyboard_ref".to_string(), serde_json::json!("sb-17"));
        let scene = scene(vec![base]);

        let result = reconcile_scene_text(&scene, "Mira checks the tide tables again");
        assert_eq!(result[0].shot.extra["storyboard_ref"], serde_json::json!("sb-17"));
    }
}
