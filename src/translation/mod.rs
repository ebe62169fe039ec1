/*!
 * Translation engine for CSV feed translation using LLM providers.
 *
 * This module contains the request-orchestration core. It is split into
 * several submodules:
 *
 * - `dedup`: collapsing repeated source strings into unique work items
 * - `batch`: content-aware batch planning (markup vs. plain text)
 * - `prompts`: per-language prompt pairs, resolved at startup
 * - `decoder`: turning free-form model output back into per-item strings
 * - `concurrency`: fixed and ramp-up request limiters
 * - `usage`: job-scoped token accounting and cost estimation
 * - `core`: the translation service (prompt selection, dispatch, retry)
 * - `orchestrator`: the per-job state machine wiring it all together
 */

// Re-export main types for easier usage
pub use self::core::TranslationService;
pub use self::orchestrator::{InputFile, JobOrchestrator, JobRequest, JobSummary, TranslatedFile};

// Submodules
pub mod batch;
pub mod concurrency;
pub mod core;
pub mod decoder;
pub mod dedup;
pub mod orchestrator;
pub mod prompts;
pub mod usage;
