//! Pluggable classification gateway abstraction
//!
//! The resolver falls back to a natural-language classification call when the
//! static shop map misses. The gateway is intentionally failure-swallowing:
//! `complete` returns `None` (never an error) on missing credentials,
//! transport failure, a provider-reported error, or an empty reply, after
//! logging the cause. The resolver treats `None` exactly like an unparsable
//! reply and degrades to the fallback category.
//!
//! # Configuration
//!
//! Environment variables:
//! - `CLASSIFY_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for the gemini backend)

mod gemini;
mod mock;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use async_trait::async_trait;

use crate::config::GatewaySettings;

/// Sampling options for a classification call
///
/// Temperature stays at 0 for deterministic answers; the token budget is
/// small because only a short structured reply is expected.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 20,
        }
    }
}

/// Trait defining the interface for classification backends
#[async_trait]
pub trait ClassifyBackend: Send + Sync {
    /// Run a single-turn completion
    ///
    /// Returns `None` on any failure (credentials, transport, provider
    /// error, empty reply) after logging the cause.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Option<String>;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Concrete gateway client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum GatewayClient {
    /// Gemini backend (HTTP API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl GatewayClient {
    /// Create a gateway client from environment variables
    ///
    /// Checks `CLASSIFY_BACKEND` to determine which backend to use:
    /// - `gemini` (default): requires GEMINI_API_KEY
    /// - `mock`: canned replies for testing
    ///
    /// Returns None when the selected backend cannot be constructed (e.g.
    /// missing API key); the resolver then classifies everything as the
    /// fallback category.
    pub fn from_env(settings: &GatewaySettings) -> Option<Self> {
        let backend = std::env::var("CLASSIFY_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env(settings).map(GatewayClient::Gemini),
            "mock" => Some(GatewayClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown CLASSIFY_BACKEND, falling back to gemini");
                GeminiBackend::from_env(settings).map(GatewayClient::Gemini)
            }
        }
    }
}

#[async_trait]
impl ClassifyBackend for GatewayClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Option<String> {
        match self {
            GatewayClient::Gemini(b) => b.complete(prompt, options).await,
            GatewayClient::Mock(b) => b.complete(prompt, options).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            GatewayClient::Gemini(b) => b.model(),
            GatewayClient::Mock(b) => b.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_completes() {
        let client = GatewayClient::Mock(MockBackend::with_reply("199,0"));
        let reply = client
            .complete("prompt", &CompletionOptions::default())
            .await;
        assert_eq!(reply.as_deref(), Some("199,0"));
        assert_eq!(client.model(), "mock");
    }
}
