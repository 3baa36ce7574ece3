//! Configuration for the Extractor

use crate::chunking::TextChunker;
use crate::client::RetryPolicy;
use crate::error::ExtractorError;
use polaudit_llm::models::DEFAULT_CASCADE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Chunk length in words
    pub chunk_size: usize,

    /// Words shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Retry budget per chunk for transient failures
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds)
    pub backoff_base_ms: u64,

    /// Growth factor of the backoff between retries
    pub backoff_factor: f64,

    /// Upper bound of the random jitter added to each backoff (milliseconds)
    pub jitter_ms: u64,

    /// Characters of chunk text included in a prompt
    pub max_prompt_chars: usize,

    /// Try schema-constrained generation before freeform
    pub structured_output: bool,

    /// Model downgrade order, strongest tier first
    pub model_cascade: Vec<String>,

    /// Admission ceiling per trailing second
    pub requests_per_second: u32,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.max_prompt_chars == 0 {
            return Err("max_prompt_chars must be greater than 0".to_string());
        }
        if self.backoff_factor < 1.0 {
            return Err("backoff_factor must be at least 1.0".to_string());
        }
        if self.requests_per_second == 0 {
            return Err("requests_per_second must be greater than 0".to_string());
        }
        if self.model_cascade.iter().all(|m| m.trim().is_empty()) {
            return Err("model_cascade must name at least one model".to_string());
        }
        Ok(())
    }

    /// Build the chunker described by this configuration
    pub fn chunker(&self) -> Result<TextChunker, ExtractorError> {
        TextChunker::new(self.chunk_size, self.chunk_overlap)
    }

    /// Build the retry policy described by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_factor: self.backoff_factor,
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }

    /// Put `model` at the head of the cascade
    ///
    /// Tiers stronger than `model` are dropped; a model outside the cascade
    /// becomes the only tier.
    pub fn starting_at(mut self, model: &str) -> Self {
        match self.model_cascade.iter().position(|m| m == model) {
            Some(idx) => {
                self.model_cascade.drain(..idx);
            }
            None => self.model_cascade = vec![model.to_string()],
        }
        self
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 250,
            max_retries: 5,
            backoff_base_ms: 1000,
            backoff_factor: 1.5,
            jitter_ms: 1000,
            max_prompt_chars: 10_000,
            structured_output: true,
            model_cascade: DEFAULT_CASCADE.iter().map(|m| m.to_string()).collect(),
            requests_per_second: 1,
        }
    }
}
