//! Pipeline state and the stage state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::prompt::PromptKind;

/// Output of the validation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Quality score extracted from the feedback (fallback applied on a miss)
    pub score: u32,
    /// Raw validation text returned by the model
    pub feedback: String,
}

/// The single mutable record threaded through every stage of one run.
///
/// Created fresh per run; `final_document` is written exactly once, when the
/// run reaches `Stage::Done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub input_document: String,
    pub analysis: String,
    pub reasoning: String,
    pub draft_document: String,
    pub final_document: String,
    pub validation: Validation,
    pub needs_revision: bool,
    pub iteration_count: u32,
}

impl PipelineState {
    /// Fresh state for one run over `input_document`
    pub fn new(input_document: impl Into<String>) -> Self {
        Self {
            input_document: input_document.into(),
            ..Default::default()
        }
    }

    /// The document a caller should use: the final one if set, else the draft
    pub fn output(&self) -> &str {
        if self.final_document.is_empty() {
            &self.draft_document
        } else {
            &self.final_document
        }
    }

    /// Whether the final document came from a revision pass
    pub fn was_revised(&self) -> bool {
        self.iteration_count > 0
    }
}

/// Stages of the refinement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analyze,
    Reason,
    Generate,
    Validate,
    Revise,
    Done,
}

impl Stage {
    pub const INITIAL: Stage = Stage::Analyze;

    /// Next stage.
    ///
    /// `revise` is the gate decision and only matters after `Validate`.
    /// `revalidate` routes `Revise` back to `Validate` instead of finishing.
    pub fn next(self, revise: bool, revalidate: bool) -> Stage {
        match self {
            Stage::Analyze => Stage::Reason,
            Stage::Reason => Stage::Generate,
            Stage::Generate => Stage::Validate,
            Stage::Validate if revise => Stage::Revise,
            Stage::Validate => Stage::Done,
            Stage::Revise if revalidate => Stage::Validate,
            Stage::Revise | Stage::Done => Stage::Done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }

    /// Prompt template used by this stage; `Done` sends nothing
    pub fn prompt(&self) -> Option<PromptKind> {
        match self {
            Stage::Analyze => Some(PromptKind::Analysis),
            Stage::Reason => Some(PromptKind::Reasoning),
            Stage::Generate => Some(PromptKind::Generation),
            Stage::Validate => Some(PromptKind::Validation),
            Stage::Revise => Some(PromptKind::Revision),
            Stage::Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Reason => "reason",
            Stage::Generate => "generate",
            Stage::Validate => "validate",
            Stage::Revise => "revise",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = PipelineState::new("X");
        assert_eq!(state.input_document, "X");
        assert!(state.analysis.is_empty());
        assert!(state.reasoning.is_empty());
        assert!(state.draft_document.is_empty());
        assert!(state.final_document.is_empty());
        assert_eq!(state.validation, Validation::default());
        assert!(!state.needs_revision);
        assert_eq!(state.iteration_count, 0);
    }

    #[test]
    fn test_output_prefers_final() {
        let mut state = PipelineState::new("X");
        state.draft_document = "draft".to_string();
        assert_eq!(state.output(), "draft");

        state.final_document = "final".to_string();
        assert_eq!(state.output(), "final");
    }

    #[test]
    fn test_linear_transitions() {
        assert_eq!(Stage::INITIAL, Stage::Analyze);
        assert_eq!(Stage::Analyze.next(true, true), Stage::Reason);
        assert_eq!(Stage::Reason.next(true, true), Stage::Generate);
        assert_eq!(Stage::Generate.next(true, true), Stage::Validate);
    }

    #[test]
    fn test_validate_branches_on_gate() {
        assert_eq!(Stage::Validate.next(true, false), Stage::Revise);
        assert_eq!(Stage::Validate.next(false, false), Stage::Done);
    }

    #[test]
    fn test_revise_has_no_loop_back_by_default() {
        assert_eq!(Stage::Revise.next(true, false), Stage::Done);
        assert_eq!(Stage::Revise.next(true, true), Stage::Validate);
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(Stage::Done.is_terminal());
        assert_eq!(Stage::Done.next(true, true), Stage::Done);
        assert!(Stage::Done.prompt().is_none());
        assert!(!Stage::Validate.is_terminal());
    }

    #[test]
    fn test_stage_prompts() {
        assert_eq!(Stage::Analyze.prompt(), Some(PromptKind::Analysis));
        assert_eq!(Stage::Revise.prompt(), Some(PromptKind::Revision));
    }

    #[test]
    fn test_stage_display_and_serde() {
        assert_eq!(Stage::Reason.to_string(), "reason");
        assert_eq!(serde_json::to_string(&Stage::Validate).unwrap(), "\"validate\"");
    }

    #[test]
    fn test_state_serializes_field_names() {
        let state = PipelineState::new("doc");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["input_document"], "doc");
        assert_eq!(json["validation"]["score"], 0);
        assert_eq!(json["iteration_count"], 0);
    }
}
