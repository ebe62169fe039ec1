/*!
 * # feedtrans - AI-powered CSV product-feed translator
 *
 * A Rust library for bulk translation of CSV product feeds using LLM
 * chat-completion APIs.
 *
 * ## Features
 *
 * - Translate a designated text column while preserving row structure
 * - HTML-aware batching: markup cells go one per request under a
 *   tag-preserving prompt, plain cells are packed to a character budget
 * - Deduplication of repeated source strings before any API call
 * - Bounded or ramping request concurrency matched to the provider's
 *   rate-limit profile (DeepSeek, OpenAI)
 * - Retry with exponential backoff and per-batch failure containment
 * - Throttled structured progress events per session
 * - Handle/slug normalization with collision-proof suffixes
 * - Incremental on-disk saves and a bounded result history
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `csv_processor`: CSV feed parsing, writing and handle normalization
 * - `translation`: The orchestration core:
 *   - `translation::dedup`: Source text deduplication
 *   - `translation::batch`: Content-aware batch planning
 *   - `translation::core`: Provider dispatch, retry, usage accounting
 *   - `translation::orchestrator`: The per-job state machine
 * - `providers`: Client implementations for the LLM providers
 * - `progress`: Session-keyed progress event publishing
 * - `storage`: Incremental JSONL store and persistent result history
 * - `app_controller`: CLI workflow controller
 * - `language_utils`: Supported target language table
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod csv_processor;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod progress;
pub mod providers;
pub mod storage;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use csv_processor::{CsvDocument, CsvProcessor, SourceItem};
pub use errors::{AppError, CsvError, JobError, ProviderError, ValidationError};
pub use progress::{ProgressEvent, ProgressReporter};
pub use translation::{InputFile, JobOrchestrator, JobRequest, JobSummary, TranslationService};
