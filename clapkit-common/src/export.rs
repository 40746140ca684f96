//! Document export helpers
//!
//! Serialization is always 2-space indented and preserves field order (block
//! maps included). Filenames follow the pipeline convention:
//! `<film_id>_<current_step>.json` for Stage 1,
//! `<first_scene_id>_edited.json` for Stage 2.

use serde_json::Value;

use crate::error::Result;
use crate::model::{Document, DocumentKind};

/// Fallback filename when a document carries too little identity to name
const DEFAULT_FILENAME: &str = "data.json";

/// Pretty-print a document for download/save.
pub fn to_pretty_json(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document.value())?)
}

/// Filename the exported document should be saved under.
pub fn export_filename(document: &Document) -> String {
    match document.kind() {
        DocumentKind::Stage2 => {
            let stem = document
                .value()
                .get("scenes")
                .and_then(Value::as_array)
                .and_then(|scenes| scenes.first())
                .and_then(|scene| scene.get("scene_id"))
                .and_then(Value::as_str)
                .unwrap_or("stage2");
            format!("{stem}_edited.json")
        }
        DocumentKind::Stage1 => match (document.film_id(), document.current_step()) {
            (Some(film_id), Some(step)) => format!("{film_id}_{step}.json"),
            _ => DEFAULT_FILENAME.to_string(),
        },
    }
}

/// Re-indent raw JSON text; returns the input unchanged when it does not
/// parse.
pub fn format_json(input: &str) -> String {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| input.to_string()),
        Err(_) => input.to_string(),
    }
}
