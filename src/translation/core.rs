/*!
 * Core translation service implementation.
 *
 * `TranslationService` turns one batch of unique texts into translations:
 * it selects the prompt variant, encodes the user message, dispatches to
 * the configured provider with retry and backoff, records token usage, and
 * decodes the response back into per-item strings. One instance serves one
 * job; its usage tracker is job-scoped.
 */

use std::time::Duration;

use log::{debug, warn};

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigProvider};
use crate::errors::{ProviderError, ValidationError};
use crate::providers::deepseek::DeepSeek;
use crate::providers::openai::OpenAI;
use crate::providers::{ChatProvider, ChatRequest};

use super::concurrency::{ConcurrencyController, TierProfile};
use super::decoder::decoder_for;
use super::prompts::{self, PromptPair};
use super::usage::UsageTracker;

/// Main translation service for one job
pub struct TranslationService {
    /// Provider implementation
    provider: Box<dyn ChatProvider>,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Rendered prompt pair for the job's target language
    prompts: &'static PromptPair,

    /// Job-scoped token usage counters
    pub usage: UsageTracker,

    /// Model name, resolved once
    model: String,
}

impl TranslationService {
    /// Create a service for the configured provider.
    ///
    /// Fails fast when the target language has no prompts or the provider
    /// has no API key - both are validation errors, caught before any
    /// network traffic.
    pub fn new(config: TranslationConfig, target_language: &str) -> Result<Self, ValidationError> {
        let api_key = config.get_api_key();
        if api_key.is_empty() {
            return Err(ValidationError::MissingApiKey(
                config.provider.display_name().to_string(),
            ));
        }

        let endpoint = config.get_endpoint();
        let timeout_secs = config.get_timeout_secs();
        let provider: Box<dyn ChatProvider> = match config.provider {
            ConfigProvider::DeepSeek => {
                Box::new(DeepSeek::new_with_timeout(api_key, endpoint, timeout_secs))
            }
            ConfigProvider::OpenAI => {
                Box::new(OpenAI::new_with_timeout(api_key, endpoint, timeout_secs))
            }
        };

        Self::with_provider(config, target_language, provider)
    }

    /// Create a service around an existing provider implementation.
    ///
    /// Used by tests to plug in the mock provider; validation of the target
    /// language still applies.
    pub fn with_provider(
        config: TranslationConfig,
        target_language: &str,
        provider: Box<dyn ChatProvider>,
    ) -> Result<Self, ValidationError> {
        let prompts = prompts::resolve(target_language)?;
        let usage = UsageTracker::new(config.provider);
        let model = config.get_model();

        Ok(Self { provider, config, prompts, usage, model })
    }

    /// Build the concurrency controller matching the provider's rate-limit
    /// characteristics: a plain ceiling for DeepSeek, a tier-profile ramp
    /// for OpenAI.
    pub fn concurrency_controller(&self) -> ConcurrencyController {
        match self.config.provider {
            ConfigProvider::DeepSeek => {
                ConcurrencyController::fixed(self.config.get_concurrent_requests())
            }
            ConfigProvider::OpenAI => {
                ConcurrencyController::ramping(TierProfile::for_tier(self.config.get_tier()))
            }
        }
    }

    /// Translate one batch of texts, order-preserving.
    ///
    /// Returns exactly one translation per input text. Markup batches and
    /// one-text batches go through the single-item prompt and pass-through
    /// decoding; larger batches use `[k]`-numbered encoding.
    pub async fn translate_batch(
        &self,
        texts: &[&str],
        is_markup: bool,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let single = is_markup || texts.len() == 1;
        let user_content = if single {
            texts[0].to_string()
        } else {
            texts
                .iter()
                .enumerate()
                .map(|(i, text)| format!("[{}] {}", i + 1, text))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let system_prompt = self.prompts.select(is_markup, texts.len());
        let request = ChatRequest::new(self.model.as_str(), self.config.common.max_tokens)
            .add_message("system", system_prompt)
            .add_message("user", user_content)
            .temperature(self.config.common.temperature);

        let response = self.complete_with_retry(request).await?;

        if let Some(usage) = &response.usage {
            self.usage.record(usage);
        }

        let body = response.extract_text();
        Ok(decoder_for(is_markup, texts.len()).decode(&body, texts.len()))
    }

    /// Dispatch a request, retrying transient failures with exponential
    /// backoff. A provider-supplied retry-after hint overrides the computed
    /// delay. Non-retryable errors and exhausted retries propagate to the
    /// caller, which substitutes sentinel translations at the batch level.
    async fn complete_with_retry(
        &self,
        request: ChatRequest,
    ) -> Result<crate::providers::ChatResponse, ProviderError> {
        let max_attempts = self.config.common.retry_count.max(1);
        let backoff_base_ms = self.config.common.retry_backoff_ms;
        let mut last_error = None;

        for attempt in 0..max_attempts {
            match self.provider.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(
                        "{} request failed (attempt {}/{}): {}",
                        self.config.provider.display_name(),
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    if attempt + 1 < max_attempts {
                        let delay_ms = e
                            .retry_after_ms()
                            .unwrap_or_else(|| backoff_base_ms * (1u64 << attempt));
                        debug!("Retrying in {}ms", delay_ms);
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "request failed after {} attempts",
                max_attempts
            ))
        }))
    }

    /// Lightweight connectivity check: translate a short phrase
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate_batch(&["Hello"], false).await.map(|_| ())
    }
}
