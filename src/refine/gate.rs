//! Quality gate deciding whether a revision pass runs.

use serde::{Deserialize, Serialize};

/// Scores below this fail the gate
pub const DEFAULT_PASS_THRESHOLD: u32 = 8;

/// Upper bound on revision passes per run
pub const DEFAULT_MAX_REVISIONS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    pub threshold: u32,
    pub max_revisions: u32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PASS_THRESHOLD,
            max_revisions: DEFAULT_MAX_REVISIONS,
        }
    }
}

impl QualityGate {
    pub fn new(threshold: u32, max_revisions: u32) -> Self {
        Self {
            threshold,
            max_revisions,
        }
    }

    /// True only when the score fails and the revision budget is not spent
    pub fn needs_revision(&self, score: u32, iteration_count: u32) -> bool {
        score < self.threshold && iteration_count < self.max_revisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let gate = QualityGate::default();
        assert_eq!(gate.threshold, 8);
        assert_eq!(gate.max_revisions, 2);
    }

    #[test]
    fn test_failing_score_first_pass_revises() {
        assert!(QualityGate::default().needs_revision(7, 0));
    }

    #[test]
    fn test_passing_score_never_revises() {
        let gate = QualityGate::default();
        for iteration in 0..5 {
            assert!(!gate.needs_revision(9, iteration));
            assert!(!gate.needs_revision(8, iteration));
        }
    }

    #[test]
    fn test_budget_exhausted() {
        let gate = QualityGate::default();
        assert!(gate.needs_revision(3, 1));
        assert!(!gate.needs_revision(3, 2));
        assert!(!gate.needs_revision(3, 3));
    }

    #[test]
    fn test_custom_threshold() {
        let gate = QualityGate::new(6, 1);
        assert!(!gate.needs_revision(6, 0));
        assert!(gate.needs_revision(5, 0));
        assert!(!gate.needs_revision(5, 1));
    }
}
