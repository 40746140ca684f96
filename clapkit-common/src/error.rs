//! Common error types for CLAPKIT

use thiserror::Error;

/// Common result type for CLAPKIT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CLAPKIT crates
#[derive(Error, Debug)]
pub enum Error {
    /// Merge invoked with an empty file batch
    #[error("no files to merge")]
    NoInput,

    /// Fatal merge conflict: film ids disagree across the batch
    #[error(
        "all files must share one film_id (expected {}, mismatched: {})",
        expected.as_deref().unwrap_or("(missing)"),
        files.join(", ")
    )]
    FilmIdMismatch {
        expected: Option<String>,
        files: Vec<String>,
    },

    /// Referenced scene does not exist in the current document
    #[error("scene not found: {0}")]
    SceneNotFound(String),

    /// Pasted scene JSON is missing its required shape
    #[error("invalid scene JSON: {0}")]
    InvalidSceneJson(String),

    /// Pasted scene targets a different scene and the caller has not confirmed
    #[error("pasted scene id {pasted} does not match target scene {target}")]
    SceneIdMismatch { pasted: String, target: String },

    /// Operation requires a Stage 2 document
    #[error("operation requires a stage 2 document")]
    NotStage2,

    /// Batch collector handed a slot index outside the expected range
    #[error("file slot {slot} is out of range (expected {expected} files)")]
    SlotOutOfRange { slot: usize, expected: usize },

    /// Batch collector received the same slot twice
    #[error("file slot {0} was already filled")]
    SlotAlreadyFilled(usize),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
