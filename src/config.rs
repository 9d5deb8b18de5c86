use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdrError};
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};
use crate::refine::{DEFAULT_MAX_REVISIONS, DEFAULT_PASS_THRESHOLD, DEFAULT_SCORE, QualityGate, RefinementConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of `<stage>.md` files overriding the built-in prompts
    pub prompts_dir: Option<PathBuf>,
    pub llm: LlmConfig,
    pub refinement: RefinementSettings,
    pub output: OutputConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub model_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            model_env: "OPENAI_MODEL".to_string(),
            temperature: 0.3,
            max_tokens: 8000,
            timeout_ms: 300000,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model_env", &self.model_env)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl LlmConfig {
    /// Build the client config, taking the key and model override from `lookup`.
    ///
    /// `lookup` is asked for the variables named by `api_key_env` and `model_env`;
    /// an explicit `api_key` wins over the environment.
    pub fn openai_config(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<OpenAiConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(&self.api_key_env).filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                SdrError::Configuration(format!(
                    "No API key: set llm.api_key in the config or export {}",
                    self.api_key_env
                ))
            })?;

        let model = lookup(&self.model_env)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.model.clone());

        Ok(OpenAiConfig::new(api_key)
            .with_model(model)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_millis(self.timeout_ms)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementSettings {
    pub pass_threshold: u32,
    pub default_score: u32,
    pub max_revisions: u32,
    pub revalidate_after_revision: bool,
}

impl Default for RefinementSettings {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            default_score: DEFAULT_SCORE,
            max_revisions: DEFAULT_MAX_REVISIONS,
            revalidate_after_revision: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub save: bool,
    pub preview_chars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            save: true,
            preview_chars: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompts_dir: None,
            llm: LlmConfig::default(),
            refinement: RefinementSettings::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SdrError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        self.refinement_config().validate()
    }

    /// Controller settings derived from the `llm` and `refinement` sections
    pub fn refinement_config(&self) -> RefinementConfig {
        RefinementConfig {
            gate: QualityGate::new(self.refinement.pass_threshold, self.refinement.max_revisions),
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_tokens,
            revalidate_after_revision: self.refinement.revalidate_after_revision,
        }
    }
}
