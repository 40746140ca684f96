//! Stage 1 (story/asset metadata) document types
//!
//! Stage 1 documents are open-ended: the narrative work and visual-block
//! entities carry free-form, order-sensitive maps whose keys the pipeline
//! invents as it goes. The canonical payload therefore stays a raw JSON
//! value (order-preserving), and this module contributes the closed
//! vocabulary around it: the pipeline-step enum and the visual-block kinds.

use serde::{Deserialize, Serialize};

/// Stage 1 pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage1Step {
    SynopsisPlanning,
    ScenarioDevelopment,
    AssetAddition,
    ConceptArtBlocksCompleted,
    ConceptArtGeneration,
}

impl Stage1Step {
    pub const ALL: [Stage1Step; 5] = [
        Stage1Step::SynopsisPlanning,
        Stage1Step::ScenarioDevelopment,
        Stage1Step::AssetAddition,
        Stage1Step::ConceptArtBlocksCompleted,
        Stage1Step::ConceptArtGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage1Step::SynopsisPlanning => "synopsis_planning",
            Stage1Step::ScenarioDevelopment => "scenario_development",
            Stage1Step::AssetAddition => "asset_addition",
            Stage1Step::ConceptArtBlocksCompleted => "concept_art_blocks_completed",
            Stage1Step::ConceptArtGeneration => "concept_art_generation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|step| step.as_str() == s)
    }
}

/// The three visual-block entity lists of a Stage 1 document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Characters,
    Locations,
    Props,
}

impl VisualKind {
    pub const ALL: [VisualKind; 3] =
        [VisualKind::Characters, VisualKind::Locations, VisualKind::Props];

    /// JSON key of the entity list under `visual_blocks`
    pub fn key(&self) -> &'static str {
        match self {
            VisualKind::Characters => "characters",
            VisualKind::Locations => "locations",
            VisualKind::Props => "props",
        }
    }

    /// Singular label used in merge warnings
    pub fn singular(&self) -> &'static str {
        match self {
            VisualKind::Characters => "character",
            VisualKind::Locations => "location",
            VisualKind::Props => "prop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_round_trip() {
        for step in Stage1Step::ALL {
            assert_eq!(Stage1Step::parse(step.as_str()), Some(step));
        }
        assert_eq!(Stage1Step::parse("logline_synopsis_development"), None);
    }

    #[test]
    fn test_step_serde_names() {
        let json = serde_json::to_string(&Stage1Step::ConceptArtBlocksCompleted).unwrap();
        assert_eq!(json, "\"concept_art_blocks_completed\"");
    }

    #[test]
    fn test_visual_kind_labels() {
        assert_eq!(VisualKind::Characters.key(), "characters");
        assert_eq!(VisualKind::Props.singular(), "prop");
    }
}
