//! Mock backend for testing
//!
//! Returns a canned reply (or simulates an unavailable gateway) and counts
//! calls, so tests can assert both resolver behavior and that the static
//! pass never reaches the gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{ClassifyBackend, CompletionOptions};

/// Mock classification backend
#[derive(Clone, Default)]
pub struct MockBackend {
    reply: Option<String>,
    calls: Arc<AtomicU32>,
}

impl MockBackend {
    /// Mock that answers "nothing resolved" (the fallback reply shape)
    pub fn new() -> Self {
        Self::with_reply("199,0")
    }

    /// Mock with a fixed reply
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Mock simulating an unavailable gateway (always returns None)
    pub fn unavailable() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// How many times complete() has been invoked
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifyBackend for MockBackend {
    async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockBackend::with_reply("101,10101");
        assert_eq!(mock.call_count(), 0);
        mock.complete("a", &CompletionOptions::default()).await;
        mock.complete("b", &CompletionOptions::default()).await;
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let mock = MockBackend::unavailable();
        let reply = mock.complete("a", &CompletionOptions::default()).await;
        assert_eq!(reply, None);
        assert_eq!(mock.call_count(), 1);
    }
}
