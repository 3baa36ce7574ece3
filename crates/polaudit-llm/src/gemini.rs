//! Gemini Provider Implementation
//!
//! Talks to the Generative Language REST API (`models/{model}:generateContent`).
//! Schema-constrained calls send the schema as `responseSchema` with a JSON
//! response MIME type; freeform calls send the prompt alone. Both use
//! temperature 0.
//!
//! # Examples
//!
//! ```no_run
//! use polaudit_llm::GeminiProvider;
//! use polaudit_domain::traits::LlmProvider;
//!
//! let provider = GeminiProvider::from_env().unwrap();
//! let reply = provider.generate("gemini-2.0-flash", "Say hello").unwrap();
//! ```

use crate::LlmError;
use polaudit_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Default timeout for model requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gemini API provider
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a provider for the public endpoint, reading the key from `GOOGLE_API_KEY`
    pub fn from_env() -> Result<Self, LlmError> {
        let key = std::env::var(API_KEY_VAR)
            .map_err(|_| LlmError::Other(format!("{} is not set", API_KEY_VAR)))?;
        Self::new(DEFAULT_ENDPOINT, key)
    }

    fn call(&self, model: &str, prompt: &str, schema: Option<&Value>) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 0.0,
                response_mime_type: schema.map(|_| "application/json"),
                response_schema: schema.map(to_gemini_schema),
            },
        };

        debug!(model, structured = schema.is_some(), "Gemini request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        first_text(parsed)
    }
}

/// Text of the first part of the first candidate
fn first_text(response: GenerateResponse) -> Result<String, LlmError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("empty reply from model".into()))
}

/// Rewrite a JSON schema into the OpenAPI subset the API accepts
///
/// Type names are upper-cased; keys the API rejects are dropped.
pub fn to_gemini_schema(schema: &Value) -> Value {
    const UNSUPPORTED: [&str; 5] = ["$schema", "additionalProperties", "title", "description", "examples"];
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !UNSUPPORTED.contains(&k.as_str()))
                .map(|(k, v)| match (k.as_str(), v) {
                    ("type", Value::String(t)) => (k.clone(), Value::String(t.to_uppercase())),
                    _ => (k.clone(), to_gemini_schema(v)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

impl LlmProviderTrait for GeminiProvider {
    type Error = LlmError;

    fn generate(&self, model: &str, prompt: &str) -> Result<String, Self::Error> {
        self.call(model, prompt, None)
    }

    fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, Self::Error> {
        self.call(model, prompt, Some(schema))
    }
}
