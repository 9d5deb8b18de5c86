//! Quality score extraction from free-form validation feedback.
//!
//! A miss is never an error: the extractor falls back to a default score,
//! which with the default gate threshold counts as passing. Only ASCII digits
//! form a score; a score written in other numerals is a miss.

use std::sync::LazyLock;

use regex::Regex;

/// Score assumed when the feedback carries no recognizable score
pub const DEFAULT_SCORE: u32 = 8;

static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"quality score[:\s]+([0-9]+)").expect("valid score regex"));

/// Pulls a numeric quality score out of validation feedback.
pub trait ScoreExtractor: Send + Sync {
    fn extract_score(&self, feedback: &str) -> u32;
}

/// Matches `quality score: N` (case-insensitive) and takes the first hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexScoreExtractor {
    fallback: u32,
}

impl RegexScoreExtractor {
    pub fn new(fallback: u32) -> Self {
        Self { fallback }
    }
}

impl Default for RegexScoreExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE)
    }
}

impl ScoreExtractor for RegexScoreExtractor {
    fn extract_score(&self, feedback: &str) -> u32 {
        find_score(feedback).unwrap_or(self.fallback)
    }
}

/// Extract the score with the default fallback of 8
pub fn extract_score(feedback: &str) -> u32 {
    RegexScoreExtractor::default().extract_score(feedback)
}

fn find_score(feedback: &str) -> Option<u32> {
    let lower = feedback.to_lowercase();
    SCORE_PATTERN
        .captures(&lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
