//! Persisting the artifacts of a run.
//!
//! Every file of one run shares a `YYYYMMDD_HHMMSS` prefix and a numeric step
//! so a directory listing reads in pipeline order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::discovery::DiscoveryInput;
use crate::error::Result;
use crate::refine::PipelineState;

/// Paths written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRun {
    pub discovery: PathBuf,
    pub analysis: PathBuf,
    pub reasoning: PathBuf,
    pub document: PathBuf,
    pub validation: PathBuf,
}

impl SavedRun {
    pub fn paths(&self) -> [&Path; 5] {
        [
            &self.discovery,
            &self.analysis,
            &self.reasoning,
            &self.document,
            &self.validation,
        ]
    }
}

/// Writes run artifacts into a directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save a run stamped with the current local time
    pub fn save(&self, input: &DiscoveryInput, state: &PipelineState) -> Result<SavedRun> {
        self.save_at(Local::now(), input, state)
    }

    /// Save a run stamped with `at`
    pub fn save_at(&self, at: DateTime<Local>, input: &DiscoveryInput, state: &PipelineState) -> Result<SavedRun> {
        fs::create_dir_all(&self.dir)?;
        let stamp = timestamp(at);

        let discovery_ext = if input.is_structured() { "json" } else { "txt" };
        let saved = SavedRun {
            discovery: self.write(&format!("{stamp}_1_discovery_input.{discovery_ext}"), &input.to_document()?)?,
            analysis: self.write(&format!("{stamp}_2_analysis.txt"), &state.analysis)?,
            reasoning: self.write(&format!("{stamp}_3_reasoning.txt"), &state.reasoning)?,
            document: self.write(&format!("{stamp}_4_BRD_SDR_final.md"), state.output())?,
            validation: self.write(
                &format!("{stamp}_5_validation_result.json"),
                &serde_json::to_string_pretty(&state.validation)?,
            )?,
        };

        log::info!("Saved run {} to {}", stamp, self.dir.display());
        Ok(saved)
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, content)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}

/// `YYYYMMDD_HHMMSS` prefix shared by the files of one run
pub fn timestamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
