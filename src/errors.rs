/*!
 * Error types for the feedtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails (network-level)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails (non-JSON body, proxy error page)
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting, with an optional provider retry hint
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Provider-supplied retry-after hint in milliseconds, if present
        retry_after_ms: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry with backoff can reasonably recover from this error.
    ///
    /// Rate limits, server errors, network failures and malformed bodies are
    /// retryable; client errors and authentication failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ParseError(_) => true,
            Self::RateLimitExceeded { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationError(_) => false,
        }
    }

    /// Provider-supplied retry delay hint, when one was sent.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Errors that can occur during CSV processing
#[derive(Error, Debug)]
pub enum CsvError {
    /// Error from the underlying CSV parser
    #[error("CSV parsing error: {0}")]
    Parse(#[from] csv::Error),

    /// Error generating CSV output
    #[error("CSV generation error: {0}")]
    Generate(String),
}

/// Errors that fail a job before any translation work starts
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The requested target language has no prompt support
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    /// The active provider requires an API key and none was configured
    #[error("Missing API key for provider: {0}")]
    MissingApiKey(String),

    /// No input files were supplied
    #[error("No input files to translate")]
    NoInputFiles,
}

/// Errors that abort an entire translation job
#[derive(Error, Debug)]
pub enum JobError {
    /// Input validation failed at job start
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// CSV parsing or generation failed
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The incremental or result store failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a translation job
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
