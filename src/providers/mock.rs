/*!
 * Mock provider implementation for testing.
 *
 * The mock answers chat requests without any network traffic:
 * - `MockProvider::echo()` - returns the user message verbatim
 * - `MockProvider::scripted(..)` - returns canned responses in call order
 * - `MockProvider::failing(..)` - always fails with a server error
 * - `with_rate_limit_failures(n)` - first n calls fail with a 429 before
 *   the configured behavior takes over, for exercising the retry path
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::providers::{ChatChoice, ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatUsage};

/// Response generator taking the full request
type Responder = Arc<dyn Fn(&ChatRequest) -> String + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Clone)]
enum MockBehavior {
    /// Echo the user message back as the completion
    Echo,
    /// Return canned responses in call order, repeating the last one
    Scripted(Vec<String>),
    /// Always fail with a server error
    Failing(String),
    /// Delegate to a custom responder
    Custom(Responder),
}

/// Mock chat provider for testing translation behavior
pub struct MockProvider {
    behavior: MockBehavior,
    /// Calls that fail with a rate limit before the behavior applies
    rate_limit_failures: usize,
    /// Total completed call attempts
    calls: Arc<AtomicUsize>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockProvider {
    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            rate_limit_failures: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that echoes the user message back
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock that returns canned responses in call order
    pub fn scripted(responses: Vec<String>) -> Self {
        Self::new(MockBehavior::Scripted(responses))
    }

    /// Create a mock that always fails with a server error
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Failing(message.into()))
    }

    /// Create a mock with a custom response generator
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> String + Send + Sync + 'static,
    {
        Self::new(MockBehavior::Custom(Arc::new(responder)))
    }

    /// Make the first n calls fail with a rate limit error
    pub fn with_rate_limit_failures(mut self, failures: usize) -> Self {
        self.rate_limit_failures = failures;
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &ChatRequest, call_index: usize) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Echo => Ok(request.user_content().unwrap_or_default().to_string()),
            MockBehavior::Scripted(responses) => {
                let effective = call_index.saturating_sub(self.rate_limit_failures);
                responses
                    .get(effective.min(responses.len().saturating_sub(1)))
                    .cloned()
                    .ok_or_else(|| ProviderError::RequestFailed("no scripted response".to_string()))
            }
            MockBehavior::Failing(message) => Err(ProviderError::ApiError {
                status_code: 500,
                message: message.clone(),
            }),
            MockBehavior::Custom(responder) => Ok(responder(request)),
        }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);

        if call_index < self.rate_limit_failures {
            return Err(ProviderError::RateLimitExceeded {
                message: "mock rate limit".to_string(),
                retry_after_ms: None,
            });
        }

        let content = self.respond(&request, call_index)?;
        let prompt_tokens = request.user_content().map(|c| c.len() as u64 / 4).unwrap_or(0);
        let completion_tokens = content.len() as u64 / 4;

        Ok(ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
            }],
            usage: Some(ChatUsage {
                prompt_tokens,
                completion_tokens,
                prompt_cache_hit_tokens: None,
                prompt_cache_miss_tokens: Some(prompt_tokens),
            }),
        })
    }
}
