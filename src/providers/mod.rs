/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - DeepSeek: chat-completion API with prompt-cache pricing
 * - OpenAI: chat-completion API with tiered rate limits
 * - Mock: scripted in-process provider for tests
 *
 * Both hosted providers speak the OpenAI-compatible chat-completions wire
 * format, so the request and response types are shared here.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat-completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,
    /// The messages for the conversation
    messages: Vec<ChatMessage>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: u32,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The user message content, if any (used by the mock provider)
    pub fn user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// One completion choice in a chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
}

/// Token usage information.
///
/// DeepSeek splits prompt tokens into cache hits and misses; OpenAI reports
/// plain prompt/completion counts. Optional fields cover both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatUsage {
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Number of completion tokens
    #[serde(default)]
    pub completion_tokens: u64,
    /// Prompt tokens served from the provider-side cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_cache_hit_tokens: Option<u64>,
    /// Prompt tokens that missed the provider-side cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_cache_miss_tokens: Option<u64>,
}

/// Chat-completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Completion choices (the first one carries the translation)
    pub choices: Vec<ChatChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Extract the completion text from the response
    pub fn extract_text(&self) -> String {
        self.choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

/// Common trait for all chat-completion providers.
///
/// A provider performs exactly one request per call; retry, backoff and
/// usage accounting live in the translation service so every provider
/// (including the mock) shares the same recovery path.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    /// Perform one chat-completion request
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

pub mod deepseek;
pub mod openai;
pub mod mock;
