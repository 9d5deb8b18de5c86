//! Prompt Loader - Load prompt template overrides from a directory
//!
//! Templates are `<name>.md` files; the name matches `PromptKind::name()`.

use std::path::{Path, PathBuf};

use crate::error::{Result, SdrError};

/// Loads prompt templates from a directory
pub(crate) struct PromptLoader {
    templates_dir: PathBuf,
}

impl PromptLoader {
    /// Create a new PromptLoader with the given templates directory
    pub(crate) fn new(templates_dir: impl AsRef<Path>) -> Self {
        Self {
            templates_dir: templates_dir.as_ref().to_path_buf(),
        }
    }

    /// Load a template from disk
    ///
    /// # Arguments
    /// * `name` - The template name (without .md extension)
    pub(crate) fn load(&self, name: &str) -> Result<String> {
        let path = self.template_path(name);
        std::fs::read_to_string(&path).map_err(|e| {
            SdrError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to load template '{}' from {:?}: {}", name, path, e),
            ))
        })
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(format!("{}.md", name))
    }

    /// Names of the `.md` templates in the directory, sorted
    pub(crate) fn list_available(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.templates_dir).map_err(|e| {
            SdrError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read prompt directory {}: {}", self.templates_dir.display(), e),
            ))
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Get the templates directory path
    pub(crate) fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }
}
