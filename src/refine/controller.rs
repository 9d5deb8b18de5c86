//! Document refinement controller.
//!
//! Runs the fixed stage sequence analyze → reason → generate → validate over a
//! single `PipelineState`, applies the quality gate, and runs at most the
//! configured number of revision passes. Stages execute strictly one after
//! another; any generation failure aborts the run and is returned to the caller.
//!
//! By default a revision is not validated again, so a run performs zero or one
//! revision regardless of `max_revisions`. Setting `revalidate_after_revision`
//! routes every revision back through validation until the gate passes or the
//! revision budget is spent.

use std::sync::Arc;

use serde_json::json;

use super::gate::QualityGate;
use super::score::{RegexScoreExtractor, ScoreExtractor};
use super::state::{PipelineState, Stage, Validation};
use crate::error::{Result, SdrError};
use crate::llm::LlmClient;
use crate::prompt::PromptSet;

/// Settings for one controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementConfig {
    pub gate: QualityGate,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub revalidate_after_revision: bool,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            gate: QualityGate::default(),
            temperature: 0.3,
            max_output_tokens: 8000,
            revalidate_after_revision: false,
        }
    }
}

impl RefinementConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.gate.threshold) {
            return Err(SdrError::Configuration(format!(
                "pass threshold must be between 1 and 10, got {}",
                self.gate.threshold
            )));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(SdrError::Configuration(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(SdrError::Configuration("max output tokens must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Drives one discovery document through the refinement pipeline.
pub struct RefinementController<L: LlmClient> {
    llm: Arc<L>,
    prompts: PromptSet,
    scorer: Box<dyn ScoreExtractor>,
    config: RefinementConfig,
}

impl<L: LlmClient> RefinementController<L> {
    /// Create a controller with the built-in prompts and the regex score extractor.
    pub fn new(llm: Arc<L>, config: RefinementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            llm,
            prompts: PromptSet::builtin()?,
            scorer: Box::new(RegexScoreExtractor::default()),
            config,
        })
    }

    /// Replace the prompt templates
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replace the score extractor
    pub fn with_score_extractor(mut self, scorer: impl ScoreExtractor + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Run the whole pipeline over `input_document` and return the final state.
    pub async fn run(&self, input_document: impl Into<String>) -> Result<PipelineState> {
        let mut state = PipelineState::new(input_document);
        // Document currently under review: the draft, then each revision when revalidating
        let mut candidate = String::new();
        let mut stage = Stage::INITIAL;

        log::info!(
            "Starting BRD/SDR refinement (model={}, threshold={}, max_revisions={}, revalidate={})",
            self.llm.model(),
            self.config.gate.threshold,
            self.config.gate.max_revisions,
            self.config.revalidate_after_revision
        );

        while !stage.is_terminal() {
            let revise = match stage {
                Stage::Analyze => {
                    state.analysis = self
                        .generate(stage, &json!({ "discovery_content": state.input_document }))
                        .await?;
                    false
                }
                Stage::Reason => {
                    state.reasoning = self
                        .generate(
                            stage,
                            &json!({
                                "analysis": state.analysis,
                                "discovery_content": state.input_document,
                            }),
                        )
                        .await?;
                    false
                }
                Stage::Generate => {
                    state.draft_document = self
                        .generate(
                            stage,
                            &json!({
                                "discovery_content": state.input_document,
                                "analysis": state.analysis,
                                "reasoning": state.reasoning,
                            }),
                        )
                        .await?;
                    candidate.clone_from(&state.draft_document);
                    false
                }
                Stage::Validate => self.validate(&mut state, &candidate).await?,
                Stage::Revise => {
                    state.iteration_count += 1;
                    let revised = self
                        .generate(
                            stage,
                            &json!({
                                "brd_sdr": candidate,
                                "feedback": state.validation.feedback,
                            }),
                        )
                        .await?;
                    log::info!("Revision {} complete", state.iteration_count);
                    if self.config.revalidate_after_revision {
                        candidate = revised;
                    } else {
                        state.final_document = revised;
                    }
                    false
                }
                Stage::Done => false,
            };

            stage = stage.next(revise, self.config.revalidate_after_revision);
        }

        log::info!(
            "Refinement finished: score {}/10 after {} revision(s)",
            state.validation.score,
            state.iteration_count
        );
        Ok(state)
    }

    /// Validate `candidate`, record the result and apply the gate.
    ///
    /// Returns the gate decision. When no revision follows, the candidate
    /// becomes the final document.
    async fn validate(&self, state: &mut PipelineState, candidate: &str) -> Result<bool> {
        let feedback = self
            .generate(
                Stage::Validate,
                &json!({
                    "discovery_content": state.input_document,
                    "brd_sdr": candidate,
                }),
            )
            .await?;

        let score = self.scorer.extract_score(&feedback);
        state.validation = Validation { score, feedback };
        state.needs_revision = self.config.gate.needs_revision(score, state.iteration_count);

        log::info!(
            "Validation score {}/10 (iteration {}), revision needed: {}",
            score,
            state.iteration_count,
            state.needs_revision
        );

        if !state.needs_revision {
            state.final_document = candidate.to_string();
        }
        Ok(state.needs_revision)
    }

    /// Render the stage prompt and send it to the text generation service.
    async fn generate(&self, stage: Stage, context: &serde_json::Value) -> Result<String> {
        let kind = stage
            .prompt()
            .ok_or_else(|| SdrError::Template(format!("stage {} has no prompt", stage)))?;
        let prompt = self.prompts.render(kind, context)?;

        log::info!("Running {} stage ({} chars of prompt)", stage, prompt.len());
        let text = self
            .llm
            .generate(&prompt, self.config.temperature, self.config.max_output_tokens)
            .await
            .map_err(|source| SdrError::Generation { stage, source })?;

        if text.trim().is_empty() {
            log::warn!("{} stage returned empty text", stage);
        }
        log::info!("{} stage complete ({} chars)", stage, text.len());
        Ok(text)
    }
}
