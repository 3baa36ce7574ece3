//! OpenAI Provider Implementation
//!
//! Chat completions only. Schema-constrained calls report
//! [`LlmError::Unsupported`], which sends the extraction client straight to
//! its freeform path.

use crate::LlmError;
use polaudit_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Default timeout for model requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
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

    /// Create a provider for the public endpoint, reading the key from `OPENAI_API_KEY`
    pub fn from_env() -> Result<Self, LlmError> {
        let key = std::env::var(API_KEY_VAR)
            .map_err(|_| LlmError::Other(format!("{} is not set", API_KEY_VAR)))?;
        Self::new(DEFAULT_ENDPOINT, key)
    }
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, model: &str, prompt: &str) -> Result<String, Self::Error> {
        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        debug!(model, "OpenAI request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("empty reply from model".into()))
    }

    fn generate_structured(
        &self,
        _model: &str,
        _prompt: &str,
        _schema: &Value,
    ) -> Result<String, Self::Error> {
        Err(LlmError::Unsupported(
            "schema-constrained output is not used with OpenAI".into(),
        ))
    }
}
