//! Prompt assembly
//!
//! The editor hands work back to the generation pipeline as text prompts:
//! a correction request built from validation diagnostics, a scene direction
//! update built from a reconciled shot list, and the `KEY:VALUE;` rendering
//! of visual-block maps. Block rendering follows map insertion order — the
//! pipeline reads meaning into key order, which is why block maps are
//! order-preserving end to end.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::reconcile::UpdateStatus;
use crate::validate::{Diagnostic, Severity};

static KEY_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+_").expect("valid regex"));

/// Render an entity's block map as a `KEY:VALUE; ` list.
///
/// Keys lose any numeric ordering prefix (`1_STYLE` → `STYLE`) and are
/// uppercased; blank values are dropped. Returns an empty string when
/// nothing remains.
pub fn format_blocks(blocks: &Map<String, Value>) -> String {
    let entries: Vec<String> = blocks
        .iter()
        .filter_map(|(key, value)| {
            let text = value.as_str()?.trim();
            if text.is_empty() {
                return None;
            }
            let clean_key = KEY_PREFIX_RE.replace(key, "").to_uppercase();
            Some(format!("{clean_key}:{text}"))
        })
        .collect();

    if entries.is_empty() {
        String::new()
    } else {
        format!("{};", entries.join("; "))
    }
}

/// One shot line of a scene update prompt
#[derive(Debug, Clone)]
pub struct PromptShot<'a> {
    pub shot_id: &'a str,
    pub text: &'a str,
    /// Classification from the latest reconciliation, if any
    pub status: Option<UpdateStatus>,
    /// Free-form per-shot correction request, if any
    pub request: Option<&'a str>,
}

/// Build the scene direction update request for a re-segmented scene.
pub fn scene_update_prompt(scene_id: &str, shots: &[PromptShot<'_>]) -> String {
    let mut prompt = String::from("# Scene Direction Update Request\n\n");
    prompt.push_str(&format!(
        "Please generate the visual direction for Scene {scene_id} based on the \
         following updated shot list and specific modification requests.\n\n"
    ));

    prompt.push_str("## Updated Shot List\n");
    let list: Vec<String> = shots
        .iter()
        .map(|shot| {
            let tag = shot
                .status
                .and_then(|status| status.prompt_tag())
                .map(|tag| format!(" {tag}"))
                .unwrap_or_default();
            format!("{}:{} {}", shot.shot_id, tag, shot.text)
        })
        .collect();
    prompt.push_str(&list.join("\n"));

    let requests: Vec<String> = shots
        .iter()
        .filter_map(|shot| {
            shot.request
                .filter(|request| !request.trim().is_empty())
                .map(|request| format!("{}: {}", shot.shot_id, request))
        })
        .collect();
    if !requests.is_empty() {
        prompt.push_str("\n\n## Specific Modification Requests\n");
        prompt.push_str(&requests.join("\n"));
    }

    prompt
}

/// Build a correction request from a diagnostics list.
///
/// Error-severity findings become a numbered list; syntax context windows
/// are appended so the prompt is actionable without the caller recomputing
/// anything.
pub fn correction_prompt(diagnostics: &[Diagnostic]) -> String {
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|diag| diag.severity == Severity::Error)
        .enumerate()
        .map(|(idx, diag)| {
            if diag.path.is_empty() {
                format!("{}. {}", idx + 1, diag.message)
            } else {
                format!("{}. {}: {}", idx + 1, diag.path, diag.message)
            }
        })
        .collect();

    let contexts: Vec<&str> = diagnostics
        .iter()
        .filter_map(|diag| diag.suggestion.as_deref())
        .collect();

    let mut prompt = String::from("[JSON Correction Request]\n\n## Errors\n");
    prompt.push_str(&errors.join("\n"));
    if !contexts.is_empty() {
        prompt.push_str("\n\n## Context near the errors\n");
        prompt.push_str(&contexts.join("\n\n"));
    }
    prompt.push_str("\n\n## Request\nPlease output the complete corrected JSON again.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Category;
    use serde_json::json;

    fn blocks(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn test_format_blocks_order_and_prefix() {
        let blocks = blocks(&[
            ("1_STYLE", "ink wash"),
            ("2_outfit", "oil-skin coat"),
            ("notes", "  keeps ticket visible "),
        ]);
        assert_eq!(
            format_blocks(&blocks),
            "STYLE:ink wash; OUTFIT:oil-skin coat; NOTES:keeps ticket visible;"
        );
    }

    #[test]
    fn test_format_blocks_drops_blank_values() {
        let blocks = blocks(&[("1_STYLE", ""), ("2_MOOD", "   ")]);
        assert_eq!(format_blocks(&blocks), "");
    }

    #[test]
    fn test_format_blocks_skips_non_string_values() {
        let mut map = blocks(&[("1_STYLE", "ink wash")]);
        map.insert("weight".to_string(), json!(3));
        assert_eq!(format_blocks(&map), "STYLE:ink wash;");
    }

    #[test]
    fn test_scene_update_prompt_tags_and_requests() {
        let shots = [
            PromptShot {
                shot_id: "S01.01",
                text: "Wind rattles the railing.",
                status: Some(UpdateStatus::Unchanged),
                request: None,
            },
            PromptShot {
                shot_id: "S01.02",
                text: "Mira grips her ticket.",
                status: Some(UpdateStatus::Split),
                request: Some("hold on her hands longer"),
            },
        ];
        let prompt = scene_update_prompt("S01", &shots);

        assert!(prompt.contains("Scene S01"));
        assert!(prompt.contains("S01.01: Wind rattles the railing."));
        assert!(prompt.contains("S01.02: [Split] Mira grips her ticket."));
        assert!(prompt.contains("## Specific Modification Requests"));
        assert!(prompt.contains("S01.02: hold on her hands longer"));
    }

    #[test]
    fn test_scene_update_prompt_without_requests() {
        let shots = [PromptShot {
            shot_id: "S01.01",
            text: "text",
            status: Some(UpdateStatus::New),
            request: None,
        }];
        let prompt = scene_update_prompt("S01", &shots);
        assert!(prompt.contains("S01.01: [New] text"));
        assert!(!prompt.contains("Specific Modification Requests"));
    }

    #[test]
    fn test_correction_prompt_filters_to_errors() {
        let diags = vec![
            Diagnostic::schema(Category::Essential, "film_id", "film_id is missing"),
            Diagnostic::schema(Category::Story, "current_work.logline", "logline is missing")
                .with_severity(Severity::Warning),
        ];
        let prompt = correction_prompt(&diags);
        assert!(prompt.contains("1. film_id: film_id is missing"));
        assert!(!prompt.contains("logline"));
        assert!(prompt.contains("corrected JSON"));
    }

    #[test]
    fn test_correction_prompt_includes_syntax_context() {
        let diag = crate::parse::syntax_diagnostic("bad token at position 3", "{\n}");
        let prompt = correction_prompt(&[diag]);
        assert!(prompt.contains("## Context near the errors"));
        assert!(prompt.contains("1: {"));
    }
}
