//! Multi-file document merge
//!
//! Combines independently edited fragments of one film into a single
//! document. Identity is the batch's `film_id`: any disagreement with the
//! first file aborts the whole merge. Within a batch, entity/scene id
//! collisions are non-fatal — the later occurrence is dropped whole and a
//! warning names the file, the kind, and the id.
//!
//! The merge path is picked once from the first file's stage tag. Stage 1
//! merges visual-block entities into a chosen "main" file; Stage 2
//! concatenates scene lists and re-sorts them by id.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Document, DocumentKind, Stage1Step, VisualKind};
use crate::validate::truthy;

/// One input file of a merge batch
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Display name used in warnings (usually the filename)
    pub name: String,
    pub document: Document,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, document: Document) -> Self {
        SourceDocument {
            name: name.into(),
            document,
        }
    }
}

/// A successful merge: the combined document plus non-fatal warnings
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub document: Document,
    pub warnings: Vec<String>,
}

/// Merge a batch of parsed documents into one.
///
/// Fatal outcomes ([`Error::NoInput`], [`Error::FilmIdMismatch`]) abort with
/// no partial result; everything else degrades to warnings.
pub fn merge_documents(files: &[SourceDocument]) -> Result<MergeOutput> {
    let first = files.first().ok_or(Error::NoInput)?;

    let expected = first.document.film_id().map(str::to_string);
    let mismatched: Vec<String> = files
        .iter()
        .filter(|f| f.document.film_id() != expected.as_deref())
        .map(|f| f.name.clone())
        .collect();
    if !mismatched.is_empty() {
        return Err(Error::FilmIdMismatch {
            expected,
            files: mismatched,
        });
    }

    match first.document.kind() {
        DocumentKind::Stage1 => merge_stage1(files),
        DocumentKind::Stage2 => merge_stage2(files),
    }
}

fn merge_stage1(files: &[SourceDocument]) -> Result<MergeOutput> {
    let mut warnings = Vec::new();

    // Main-file heuristic: the first file that is at scenario_development or
    // already carries a scenario. Best-effort on purpose — it can pick a file
    // without visual blocks, and downstream behavior depends on that.
    let main_idx = files
        .iter()
        .position(|f| {
            f.document.kind() == DocumentKind::Stage1
                && (f.document.current_step() == Some(Stage1Step::ScenarioDevelopment.as_str())
                    || truthy(
                        f.document
                            .value()
                            .get("current_work")
                            .and_then(|work| work.get("scenario")),
                    ))
        })
        .unwrap_or(0);

    let mut merged = files[main_idx].document.value().clone();
    if !merged.is_object() {
        // Nothing to graft entities into; hand the base back unchanged.
        return Ok(MergeOutput {
            document: Document::classify(merged),
            warnings,
        });
    }

    ensure_visual_scaffolding(&mut merged);

    // Seed the id sets from the main file's own entities
    let mut seen: [HashSet<Option<String>>; 3] = Default::default();
    for (slot, kind) in VisualKind::ALL.iter().enumerate() {
        if let Some(entities) = entity_list(&merged, kind.key()) {
            seen[slot] = entities.iter().map(entity_key).collect();
        }
    }

    for (idx, file) in files.iter().enumerate() {
        if idx == main_idx {
            continue;
        }
        // Stages must not mix; a Stage 2 file contributes nothing here
        if file.document.kind() == DocumentKind::Stage2 {
            continue;
        }

        for (slot, kind) in VisualKind::ALL.iter().enumerate() {
            let Some(entities) = file
                .document
                .value()
                .get("visual_blocks")
                .and_then(|blocks| blocks.get(kind.key()))
                .and_then(Value::as_array)
            else {
                continue;
            };

            for entity in entities {
                let key = entity_key(entity);
                if seen[slot].contains(&key) {
                    warnings.push(format!(
                        "{}: duplicate {} id ignored: {} ({})",
                        file.name,
                        kind.singular(),
                        display_field(entity.get("id")),
                        display_field(entity.get("name")),
                    ));
                } else if let Some(target) = entity_list_mut(&mut merged, kind.key()) {
                    target.push(entity.clone());
                    seen[slot].insert(key);
                }
            }
        }
    }

    // Entities present means the asset phase is done; advance the step
    let has_visuals = VisualKind::ALL
        .iter()
        .any(|kind| entity_list(&merged, kind.key()).map_or(false, |list| !list.is_empty()));
    let completed = Stage1Step::ConceptArtBlocksCompleted.as_str();
    if has_visuals
        && merged.get("current_step").and_then(Value::as_str) != Some(completed)
    {
        if let Some(root) = merged.as_object_mut() {
            root.insert(
                "current_step".to_string(),
                Value::String(completed.to_string()),
            );
        }
    }

    debug!(
        files = files.len(),
        warnings = warnings.len(),
        "stage 1 merge complete"
    );
    Ok(MergeOutput {
        document: Document::classify(merged),
        warnings,
    })
}

fn merge_stage2(files: &[SourceDocument]) -> Result<MergeOutput> {
    let mut warnings = Vec::new();

    // The first file is the metadata base; scenes are aggregated from all
    let mut merged = files[0].document.value().clone();

    let mut scenes: Vec<Value> = Vec::new();
    let mut seen: HashSet<Option<String>> = HashSet::new();

    for file in files {
        if file.document.kind() != DocumentKind::Stage2 {
            warnings.push(format!("{}: not a stage 2 document, skipped", file.name));
            continue;
        }

        let Some(list) = file
            .document
            .value()
            .get("scenes")
            .and_then(Value::as_array)
        else {
            continue;
        };

        for scene in list {
            let key = scene.get("scene_id").map(Value::to_string);
            if seen.contains(&key) {
                warnings.push(format!(
                    "{}: duplicate scene id ignored: {}",
                    file.name,
                    display_field(scene.get("scene_id")),
                ));
            } else {
                seen.insert(key);
                scenes.push(scene.clone());
            }
        }
    }

    // Lexicographic id sort; correct for zero-padded ids (S01 < S02), known
    // to break at S100
    scenes.sort_by(|a, b| scene_sort_id(a).cmp(scene_sort_id(b)));

    if let Some(root) = merged.as_object_mut() {
        root.insert("scenes".to_string(), Value::Array(scenes));
    }

    debug!(
        files = files.len(),
        warnings = warnings.len(),
        "stage 2 merge complete"
    );
    Ok(MergeOutput {
        document: Document::classify(merged),
        warnings,
    })
}

/// Guarantee `visual_blocks.{characters,locations,props}` exist as arrays.
fn ensure_visual_scaffolding(merged: &mut Value) {
    let Some(root) = merged.as_object_mut() else {
        return;
    };
    let blocks = root
        .entry("visual_blocks".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !blocks.is_object() {
        *blocks = Value::Object(Map::new());
    }
    if let Some(blocks) = blocks.as_object_mut() {
        for kind in VisualKind::ALL {
            let list = blocks
                .entry(kind.key().to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !list.is_array() {
                *list = Value::Array(Vec::new());
            }
        }
    }
}

fn entity_list<'a>(merged: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    merged.get("visual_blocks")?.get(key)?.as_array()
}

fn entity_list_mut<'a>(merged: &'a mut Value, key: &str) -> Option<&'a mut Vec<Value>> {
    merged.get_mut("visual_blocks")?.get_mut(key)?.as_array_mut()
}

/// Dedup key for an entity id: the raw JSON rendering keeps `5` and `"5"`
/// distinct, absent ids collide with each other.
fn entity_key(entity: &Value) -> Option<String> {
    entity.get("id").map(Value::to_string)
}

fn scene_sort_id(scene: &Value) -> &str {
    scene.get("scene_id").and_then(Value::as_str).unwrap_or("")
}

fn display_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "(missing)".to_string(),
    }
}
