use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language code (ISO 639-1)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// CSV feed layout config
    #[serde(default)]
    pub csv: CsvConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// DeepSeek chat-completion API (prompt-cache pricing, no request quota)
    #[default]
    DeepSeek,
    /// OpenAI chat-completion API (tiered per-minute quotas)
    OpenAI,
}

impl TranslationProvider {
    /// Capitalized provider name for display
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepSeek => "DeepSeek",
            Self::OpenAI => "OpenAI",
        }
    }

    /// Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::DeepSeek => "deepseek".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }

    /// Environment variable consulted when the config has no API key
    pub fn api_key_env_var(&self) -> &str {
        match self {
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Max source characters packed into one plain-text batch
    #[serde(default = "default_max_batch_chars")]
    pub max_batch_chars: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// API usage tier (OpenAI only, 1-5); selects the ramp-up profile
    #[serde(default)]
    pub tier: Option<u8>,
}

impl ProviderConfig {
    /// Provider config with defaults for the given provider
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::DeepSeek => Self {
                provider_type: "deepseek".to_string(),
                model: default_deepseek_model(),
                api_key: String::new(),
                endpoint: default_deepseek_endpoint(),
                concurrent_requests: default_deepseek_concurrent_requests(),
                max_batch_chars: default_max_batch_chars(),
                timeout_secs: default_timeout_secs(),
                tier: None,
            },
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_batch_chars: default_max_batch_chars(),
                timeout_secs: default_timeout_secs(),
                tier: Some(default_openai_tier()),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry attempts for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation; low for consistent translations
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// CSV feed layout configuration.
///
/// Column indices are 0-based. The defaults match the Shopify translation
/// export layout: column G carries the source text, column H receives the
/// translation, and column C flags the field type (`handle` rows get slug
/// normalization).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CsvConfig {
    /// Source text column index
    #[serde(default = "default_source_column")]
    pub source_column: usize,

    /// Translated text column index
    #[serde(default = "default_target_column")]
    pub target_column: usize,

    /// Field-type column index (rows with value "handle" are slug rows)
    #[serde(default = "default_field_column")]
    pub field_column: usize,

    /// Maximum output file size in bytes before splitting into parts
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            source_column: default_source_column(),
            target_column: default_target_column(),
            field_column: default_field_column(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_concurrent_requests() -> usize {
    8
}

fn default_deepseek_concurrent_requests() -> usize {
    // DeepSeek enforces no per-minute quota; the ceiling protects local
    // memory, not the API
    300
}

fn default_max_batch_chars() -> usize {
    2000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_deepseek_endpoint() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_tier() -> u8 {
    3
}

fn default_source_column() -> usize {
    6
}

fn default_target_column() -> usize {
    7
}

fn default_field_column() -> usize {
    2
}

fn default_max_output_bytes() -> usize {
    15 * 1024 * 1024
}

impl Config {
    /// Validate the configuration for consistency and required values.
    ///
    /// Runs before any network call so a bad language or missing key fails
    /// the job immediately.
    pub fn validate(&self) -> Result<()> {
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        // Both supported providers are hosted APIs and need a key
        let api_key = self.translation.get_api_key();
        if api_key.is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (config or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var()
            ));
        }

        if self.csv.source_column == self.csv.target_column {
            return Err(anyhow!("Source and target columns must differ"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            csv: CsvConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::DeepSeek => default_deepseek_model(),
            TranslationProvider::OpenAI => default_openai_model(),
        }
    }

    /// Get the API key for the active provider, falling back to the
    /// provider's environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        std::env::var(self.provider.api_key_env_var()).unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::DeepSeek => default_deepseek_endpoint(),
            TranslationProvider::OpenAI => default_openai_endpoint(),
        }
    }

    /// Get the max characters per plain-text batch for the active provider
    pub fn get_max_batch_chars(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_batch_chars > 0 {
                return provider_config.max_batch_chars;
            }
        }

        default_max_batch_chars()
    }

    /// Get the concurrent request ceiling for the active provider
    pub fn get_concurrent_requests(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.concurrent_requests > 0 {
                return provider_config.concurrent_requests;
            }
        }

        match self.provider {
            TranslationProvider::DeepSeek => default_deepseek_concurrent_requests(),
            TranslationProvider::OpenAI => default_concurrent_requests(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        default_timeout_secs()
    }

    /// Get the OpenAI usage tier for the active provider
    pub fn get_tier(&self) -> u8 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if let Some(tier) = provider_config.tier {
                return tier;
            }
        }

        default_openai_tier()
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        config.available_providers.push(ProviderConfig::new(TranslationProvider::DeepSeek));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));

        config
    }
}
