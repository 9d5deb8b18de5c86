//! Built-in stage templates and the prompt set used by the controller.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::loader::PromptLoader;
use super::render::PromptRenderer;
use crate::error::{Result, SdrError};

/// One prompt template per generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Analysis,
    Reasoning,
    Generation,
    Validation,
    Revision,
}

impl PromptKind {
    pub const ALL: [PromptKind; 5] = [
        PromptKind::Analysis,
        PromptKind::Reasoning,
        PromptKind::Generation,
        PromptKind::Validation,
        PromptKind::Revision,
    ];

    /// Template name, also the override file stem
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::Analysis => "analysis",
            PromptKind::Reasoning => "reasoning",
            PromptKind::Generation => "generation",
            PromptKind::Validation => "validation",
            PromptKind::Revision => "revision",
        }
    }

    /// The template shipped with the binary
    pub fn builtin(&self) -> &'static str {
        match self {
            PromptKind::Analysis => include_str!("builtin/analysis.md"),
            PromptKind::Reasoning => include_str!("builtin/reasoning.md"),
            PromptKind::Generation => include_str!("builtin/generation.md"),
            PromptKind::Validation => include_str!("builtin/validation.md"),
            PromptKind::Revision => include_str!("builtin/revision.md"),
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PromptKind {
    type Err = SdrError;

    fn from_str(s: &str) -> Result<Self> {
        PromptKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                SdrError::Template(format!(
                    "unknown prompt '{}', expected one of: analysis, reasoning, generation, validation, revision",
                    s
                ))
            })
    }
}

/// The five stage templates, registered once and rendered by kind.
pub struct PromptSet {
    renderer: PromptRenderer,
    sources: Vec<(PromptKind, String)>,
    overridden: Vec<PromptKind>,
}

impl PromptSet {
    /// Prompt set made only of the built-in templates
    pub fn builtin() -> Result<Self> {
        Self::build(|kind| Ok(kind.builtin().to_string()))
    }

    /// Prompt set where `<dir>/<name>.md` replaces the built-in template when present.
    ///
    /// The directory must exist. Files that name no stage are ignored with a warning.
    pub fn with_overrides(dir: impl AsRef<Path>) -> Result<Self> {
        let loader = PromptLoader::new(dir);
        let mut overridden = Vec::new();
        for name in loader.list_available()? {
            match PromptKind::ALL.into_iter().find(|k| k.name() == name) {
                Some(kind) => overridden.push(kind),
                None => log::warn!(
                    "Ignoring {}.md in {}: not a stage prompt",
                    name,
                    loader.templates_dir().display()
                ),
            }
        }

        let mut set = Self::build(|kind| {
            if overridden.contains(&kind) {
                log::info!("Using prompt override for {} from {}", kind, loader.templates_dir().display());
                loader.load(kind.name())
            } else {
                Ok(kind.builtin().to_string())
            }
        })?;
        set.overridden = overridden;
        Ok(set)
    }

    fn build(mut source: impl FnMut(PromptKind) -> Result<String>) -> Result<Self> {
        let mut renderer = PromptRenderer::new();
        let mut sources = Vec::with_capacity(PromptKind::ALL.len());
        for kind in PromptKind::ALL {
            let template = source(kind)?;
            renderer.register_template(kind.name(), &template)?;
            sources.push((kind, template));
        }
        Ok(Self {
            renderer,
            sources,
            overridden: Vec::new(),
        })
    }

    /// Render the template for `kind` with the given context
    pub fn render<T: Serialize>(&self, kind: PromptKind, context: &T) -> Result<String> {
        self.renderer.render_named(kind.name(), context)
    }

    /// Raw template text for `kind`
    pub fn source(&self, kind: PromptKind) -> &str {
        self.sources
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| s.as_str())
            .unwrap_or_else(|| kind.builtin())
    }

    /// Whether `kind` was loaded from the override directory
    pub fn is_overridden(&self, kind: PromptKind) -> bool {
        self.overridden.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_templates_reference_their_inputs() {
        assert!(PromptKind::Analysis.builtin().contains("{{discovery_content}}"));
        assert!(PromptKind::Reasoning.builtin().contains("{{analysis}}"));
        assert!(PromptKind::Reasoning.builtin().contains("{{discovery_content}}"));
        assert!(PromptKind::Generation.builtin().contains("{{reasoning}}"));
        assert!(PromptKind::Validation.builtin().contains("{{brd_sdr}}"));
        assert!(PromptKind::Revision.builtin().contains("{{feedback}}"));
    }

    #[test]
    fn test_validation_template_asks_for_score_line() {
        assert!(PromptKind::Validation.builtin().contains("Quality score: N"));
    }

    #[test]
    fn test_prompt_kind_parse() {
        assert_eq!("analysis".parse::<PromptKind>().unwrap(), PromptKind::Analysis);
        assert_eq!("REVISION".parse::<PromptKind>().unwrap(), PromptKind::Revision);
        assert!("summary".parse::<PromptKind>().is_err());
    }

    #[test]
    fn test_builtin_set_renders_every_kind() {
        let set = PromptSet::builtin().unwrap();
        for kind in PromptKind::ALL {
            let rendered = set.render(kind, &json!({})).unwrap();
            assert!(!rendered.is_empty(), "{} rendered empty", kind);
        }
    }

    #[test]
    fn test_render_substitutes_fields() {
        let set = PromptSet::builtin().unwrap();
        let rendered = set
            .render(
                PromptKind::Revision,
                &json!({ "brd_sdr": "DRAFT-BODY", "feedback": "Quality score: 5" }),
            )
            .unwrap();
        assert!(rendered.contains("DRAFT-BODY"));
        assert!(rendered.contains("Quality score: 5"));
    }

    #[test]
    fn test_overrides_replace_only_present_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("analysis.md"), "CUSTOM {{discovery_content}}").unwrap();

        let set = PromptSet::with_overrides(dir.path()).unwrap();
        let rendered = set
            .render(PromptKind::Analysis, &json!({ "discovery_content": "X" }))
            .unwrap();

        assert_eq!(rendered, "CUSTOM X");
        assert_eq!(set.source(PromptKind::Reasoning), PromptKind::Reasoning.builtin());
        assert!(set.is_overridden(PromptKind::Analysis));
        assert!(!set.is_overridden(PromptKind::Reasoning));
    }

    #[test]
    fn test_overrides_skip_unknown_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("validation.md"), "V {{brd_sdr}}").unwrap();
        std::fs::write(dir.path().join("summary.md"), "unused").unwrap();
        std::fs::write(dir.path().join("revision.txt"), "not markdown").unwrap();

        let set = PromptSet::with_overrides(dir.path()).unwrap();
        assert!(set.is_overridden(PromptKind::Validation));
        assert!(!set.is_overridden(PromptKind::Revision));
        assert_eq!(set.source(PromptKind::Revision), PromptKind::Revision.builtin());
    }

    #[test]
    fn test_overrides_missing_dir() {
        assert!(PromptSet::with_overrides("/nonexistent/sdrgen/prompts").is_err());
    }

    #[test]
    fn test_builtin_has_no_overrides() {
        let set = PromptSet::builtin().unwrap();
        assert!(PromptKind::ALL.iter().all(|k| !set.is_overridden(*k)));
    }
}
