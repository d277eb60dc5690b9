//! Gemini backend implementation
//!
//! HTTP client for the Gemini `generateContent` API. Every failure mode is
//! logged and collapsed into `None` so that classification degrades instead
//! of failing the pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::GatewaySettings;

use super::{ClassifyBackend, CompletionOptions};

/// Gemini classification backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(settings: &GatewaySettings, api_key: &str) -> Self {
        let http_client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables (None when GEMINI_API_KEY is unset)
    pub fn from_env(settings: &GatewaySettings) -> Option<Self> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Self::new(settings, &key)),
            _ => {
                warn!("GEMINI_API_KEY is not set, classification fallback disabled");
                None
            }
        }
    }
}

/// Request to the generateContent API
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ClassifyBackend for GeminiBackend {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Option<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let response = match self.http_client.post(&url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Gemini request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), "Gemini returned an error status");
            return None;
        }

        let body: GeminiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                error!("Gemini response was not valid JSON: {}", e);
                return None;
            }
        };

        if let Some(api_error) = body.error {
            error!("Gemini API error: {}", api_error);
            return None;
        }

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty());

        match text {
            Some(text) => {
                debug!(reply = %text, "Gemini reply");
                Some(text)
            }
            None => {
                warn!("Gemini reply was empty");
                None
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
