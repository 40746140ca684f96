//! Stage 1 structural rules
//!
//! Narrative-field requirements are conditional on `current_step`: a document
//! early in the pipeline is not penalized for work it has not reached yet.
//! Two legacy step names (`logline_synopsis_development`,
//! `treatment_expansion`) still occur in older documents; they are invalid as
//! enum values (the step check flags them) but continue to trigger the story
//! checks for the phase they describe.

use serde_json::Value;

use super::{truthy, Category, Diagnostic, Severity};
use crate::model::Stage1Step;

const KNOWN_ROOT_KEYS: [&str; 6] = [
    "film_id",
    "current_step",
    "timestamp",
    "film_metadata",
    "current_work",
    "visual_blocks",
];

/// Validate a Stage 1 document value. Never fails; returns an ordered
/// diagnostics list (empty when the document is clean).
pub fn validate(doc: &Value) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    // Essential fields
    if !truthy(doc.get("film_id")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "film_id",
            "film_id is missing",
        ));
    } else if !doc["film_id"].is_string() {
        diags.push(Diagnostic::schema(
            Category::Schema,
            "film_id",
            "film_id must be a string",
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
            .and_then(Stage1Step::parse)
            .is_some();
        if !valid {
            diags.push(Diagnostic::schema(
                Category::Schema,
                "current_step",
                format!("invalid current_step: {}", render(&doc["current_step"])),
            ));
        }
    }

    if !truthy(doc.get("film_metadata")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "film_metadata",
            "film_metadata is missing",
        ));
    }

    if !truthy(doc.get("timestamp")) {
        diags.push(Diagnostic::schema(
            Category::Essential,
            "timestamp",
            "timestamp is missing",
        ));
    }

    // Story fields, gated on the step the document claims to be at
    let step = doc.get("current_step").and_then(Value::as_str).unwrap_or("");
    let work = doc.get("current_work");
    let field = |name: &str| work.and_then(|w| w.get(name));

    if matches!(step, "synopsis_planning" | "logline_synopsis_development") {
        if !truthy(field("logline")) {
            diags.push(
                Diagnostic::schema(Category::Story, "current_work.logline", "logline is missing")
                    .with_severity(Severity::Warning),
            );
        }
        if !truthy(field("synopsis")) {
            diags.push(
                Diagnostic::schema(
                    Category::Story,
                    "current_work.synopsis",
                    "synopsis is missing",
                )
                .with_severity(Severity::Warning),
            );
        }
    }

    if matches!(
        step,
        "treatment_expansion" | "scenario_development" | "concept_art_blocks_completed"
    ) {
        if !truthy(field("treatment")) {
            diags.push(
                Diagnostic::schema(
                    Category::Story,
                    "current_work.treatment",
                    "treatment object is missing",
                )
                .with_severity(Severity::Warning),
            );
        } else if !truthy(field("treatment").and_then(|t| t.get("treatment_title"))) {
            diags.push(
                Diagnostic::schema(
                    Category::Story,
                    "current_work.treatment.treatment_title",
                    "treatment_title is missing",
                )
                .with_severity(Severity::Warning),
            );
        }
    }

    if matches!(step, "scenario_development" | "concept_art_blocks_completed") {
        let scenario = field("scenario");
        if !truthy(scenario) {
            diags.push(Diagnostic::schema(
                Category::Story,
                "current_work.scenario",
                "scenario object is missing",
            ));
        } else if let Some(scenario) = scenario {
            if !truthy(scenario.get("scenario_title")) {
                diags.push(
                    Diagnostic::schema(
                        Category::Story,
                        "current_work.scenario.scenario_title",
                        "scenario_title is missing",
                    )
                    .with_severity(Severity::Warning),
                );
            }
            let scenes_ok = scenario
                .get("scenes")
                .and_then(Value::as_array)
                .map_or(false, |scenes| !scenes.is_empty());
            if !scenes_ok {
                diags.push(
                    Diagnostic::schema(
                        Category::Story,
                        "current_work.scenario.scenes",
                        "scenes array is empty or missing",
                    )
                    .with_severity(Severity::Warning),
                );
            }
        }
    }

    // Visual blocks, required once asset work has started
    if matches!(
        step,
        "asset_addition" | "concept_art_blocks_completed" | "concept_art_generation"
    ) {
        let blocks = doc.get("visual_blocks");
        if !truthy(blocks) {
            diags.push(Diagnostic::schema(
                Category::Visual,
                "visual_blocks",
                "visual_blocks object is missing at top level",
            ));
        } else if let Some(blocks) = blocks {
            for key in ["characters", "locations", "props"] {
                match blocks.get(key).and_then(Value::as_array) {
                    None => diags.push(Diagnostic::schema(
                        Category::Visual,
                        format!("visual_blocks.{key}"),
                        format!("{key} array is missing"),
                    )),
                    Some(entities) if entities.is_empty() => diags.push(
                        Diagnostic::schema(
                            Category::Visual,
                            format!("visual_blocks.{key}"),
                            format!("{key} list is empty"),
                        )
                        .with_severity(Severity::Warning),
                    ),
                    Some(_) => {}
                }
            }
        }
    }

    // Metadata type checks
    if let Some(metadata) = doc.get("film_metadata") {
        if let Some(duration) = metadata.get("duration_minutes") {
            if !duration.is_number() {
                diags.push(Diagnostic::schema(
                    Category::Schema,
                    "film_metadata.duration_minutes",
                    "duration_minutes must be a number",
                ));
            }
        }
        if truthy(metadata.get("artist")) && !metadata["artist"].is_string() {
            diags.push(Diagnostic::schema(
                Category::Schema,
                "film_metadata.artist",
                "artist must be a string",
            ));
        }
    }

    // Unexpected top-level fields
    if let Some(root) = doc.as_object() {
        for key in root.keys() {
            if !KNOWN_ROOT_KEYS.contains(&key.as_str()) {
                diags.push(
                    Diagnostic::schema(
                        Category::Other,
                        key.clone(),
                        format!("unknown top-level field: {key}"),
                    )
                    .with_severity(Severity::Info),
                );
            }
        }
    }

    diags
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
