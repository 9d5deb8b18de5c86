//! Document refinement: the stage state machine, quality gate, score
//! extraction and the controller that ties them together.

mod controller;
mod gate;
mod score;
mod state;

pub use controller::{RefinementConfig, RefinementController};
pub use gate::{DEFAULT_MAX_REVISIONS, DEFAULT_PASS_THRESHOLD, QualityGate};
pub use score::{DEFAULT_SCORE, RegexScoreExtractor, ScoreExtractor, extract_score};
pub use state::{PipelineState, Stage, Validation};
