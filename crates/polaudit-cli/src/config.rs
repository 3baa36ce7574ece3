//! Configuration management for the CLI.

use crate::cli::AuditArgs;
use crate::error::{CliError, Result};
use polaudit_extractor::ExtractorConfig;
use polaudit_llm::models;
use polaudit_runner::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini
    Gemini,
    /// OpenAI
    #[serde(rename = "openai")]
    OpenAi,
}

/// Audit configuration, loaded from a TOML file and overridden by flags.
///
/// ```toml
/// provider = "gemini"
/// model = "gemini-2.5-flash"
/// rate = 8
///
/// [extractor]
/// chunk_size = 2000
/// chunk_overlap = 250
///
/// [runner]
/// workers = 4
/// identity_hash = "sha1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Model provider
    pub provider: ProviderKind,

    /// Model to start from
    pub model: String,

    /// Requests per minute before the free-tier cap
    pub rate: u32,

    /// Chunking, retry and cascade settings
    pub extractor: ExtractorConfig,

    /// Worker pool and output store settings
    pub runner: RunnerConfig,
}

impl AuditConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load the file at `path`, or the defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn apply_args(&mut self, args: &AuditArgs) {
        if let Some(provider) = args.provider {
            self.provider = provider.into();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(rate) = args.rate {
            self.rate = rate;
        }
        if let Some(parallel) = args.parallel {
            self.runner.workers = parallel;
        }
        if let Some(hash) = args.identity_hash {
            self.runner.identity_hash = hash.into();
        }
    }

    /// Check the configuration before starting a run.
    pub fn validate(&self) -> Result<()> {
        if self.rate == 0 {
            return Err(CliError::Config("rate must be at least 1 request per minute".into()));
        }
        match self.provider {
            ProviderKind::Gemini if !models::is_supported_gemini(&self.model) => {
                return Err(CliError::Config(format!(
                    "Unsupported Gemini model '{}' (expected one of: {})",
                    self.model,
                    models::GEMINI_MODELS.join(", ")
                )));
            }
            ProviderKind::OpenAi if models::is_supported_gemini(&self.model) => {
                return Err(CliError::Config(format!(
                    "Model '{}' is a Gemini model; pass an OpenAI model with --model",
                    self.model
                )));
            }
            _ => {}
        }
        self.extractor.validate().map_err(CliError::Config)?;
        self.runner.validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// Requests per minute actually allowed for the chosen model.
    pub fn effective_rpm(&self) -> u32 {
        match self.provider {
            ProviderKind::Gemini => models::effective_rpm(&self.model, self.rate),
            ProviderKind::OpenAi => self.rate,
        }
    }

    /// Extractor settings with the cascade starting at the chosen model.
    ///
    /// OpenAI runs use the chosen model alone.
    pub fn run_extractor(&self) -> ExtractorConfig {
        let config = self.extractor.clone();
        match self.provider {
            ProviderKind::Gemini => config.starting_at(&self.model),
            ProviderKind::OpenAi => ExtractorConfig {
                model_cascade: vec![self.model.clone()],
                ..config
            },
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: models::DEFAULT_CASCADE[0].to_string(),
            rate: 8,
            extractor: ExtractorConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}
