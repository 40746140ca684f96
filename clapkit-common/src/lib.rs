//! # CLAPKIT Common Library
//!
//! Core of the two-stage film-production pipeline editor:
//! - Document model (Stage 1 story/assets, Stage 2 shot division)
//! - Parse pipeline with auto-fix and positioned syntax diagnostics
//! - Multi-file merge with id-collision handling
//! - Structural validators producing categorized diagnostics
//! - Scene-to-shot re-segmentation (the shot reconciler)
//! - Prompt and export helpers
//!
//! Everything here is synchronous and pure over its inputs; callers own the
//! current document and replace it wholesale after each operation.

pub mod autofix;
pub mod collector;
pub mod error;
pub mod export;
pub mod merge;
pub mod model;
pub mod parse;
pub mod prompt;
pub mod reconcile;
mod similarity;
pub mod validate;

pub use error::{Error, Result};
pub use model::{Document, DocumentKind};
