use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::error;
use reqwest::Client;

use crate::errors::ProviderError;
use crate::providers::{ChatProvider, ChatRequest, ChatResponse};

/// DeepSeek client for the chat-completion API
#[derive(Debug)]
pub struct DeepSeek {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
}

impl DeepSeek {
    /// Create a new DeepSeek client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_timeout(api_key, endpoint, 120)
    }

    /// Create a new DeepSeek client with a request timeout.
    ///
    /// Uses connection pooling for better performance with concurrent requests.
    pub fn new_with_timeout(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.deepseek.com/chat/completions".to_string()
        } else {
            format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl ChatProvider for DeepSeek {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepSeek API error ({}): {}", status, error_text);

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimitExceeded {
                    message: error_text,
                    retry_after_ms: None,
                });
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(error_text));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        // A proxy or CDN under load answers with an HTML error page instead
        // of JSON; treat it as retryable
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || body.contains("<!DOCTYPE") {
            error!("DeepSeek API returned HTML instead of JSON ({} bytes)", body.len());
            return Err(ProviderError::ParseError(
                "HTML response received instead of JSON".to_string(),
            ));
        }

        serde_json::from_str::<ChatResponse>(&body).map_err(|e| {
            error!(
                "Failed to parse DeepSeek API response: {}. Raw response (first 500 chars): {}",
                e,
                body.chars().take(500).collect::<String>()
            );
            ProviderError::ParseError(e.to_string())
        })
    }
}
