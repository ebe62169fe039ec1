/*!
 * Job orchestration.
 *
 * One `JobOrchestrator::run` call is one translation job: validate, parse
 * and deduplicate every file, then per file plan batches, dispatch them
 * through the concurrency controller, append results to the incremental
 * store as they arrive, and finalize rows back into CSV output. Files are
 * processed strictly sequentially; batches within a file complete in
 * whatever order the network returns them, and row order is restored at
 * finalize time from the per-result row indices.
 *
 * A failed batch never aborts its siblings or the job: after retries are
 * exhausted every item in the batch gets a sentinel translation embedding
 * the error message, and the job completes with degraded content. Only
 * structural failures (validation, CSV, storage) fail the job.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures::future::join_all;
use log::{error, info};

use crate::app_config::Config;
use crate::csv_processor::CsvProcessor;
use crate::errors::{JobError, ValidationError};
use crate::progress::{DedupSummary, FileDescriptor, ProgressEvent, ProgressReporter, ProgressTick};
use crate::storage::{CompletedJob, IncrementalStore, ResultStore, TranslationRecord};
use crate::translation::batch::{Batch, plan_batches};
use crate::translation::core::TranslationService;
use crate::translation::dedup::{DedupResult, deduplicate};
use crate::translation::usage::UsageSnapshot;

/// One uploaded input file
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Original file name
    pub name: String,
    /// Raw CSV bytes
    pub content: Vec<u8>,
}

/// A translation run request
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Opaque session identifier keying progress and stored results
    pub session_id: String,
    /// Files to translate, processed in order
    pub files: Vec<InputFile>,
    /// Test mode: cap on source lines per file
    pub test_line_limit: Option<usize>,
}

/// One translated output file (possibly a part of a split)
#[derive(Debug, Clone)]
pub struct TranslatedFile {
    /// Name of the input file this came from
    pub original_name: String,
    /// Output file name
    pub name: String,
    /// CSV content
    pub content: String,
    /// Original lines translated
    pub lines_translated: usize,
    /// Unique texts translated
    pub unique_translated: usize,
    /// Whether this file is one part of a split
    pub is_part_of_split: bool,
}

/// Final state of a completed job
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Session identifier
    pub session_id: String,
    /// Wall-clock duration in seconds
    pub duration_secs: f64,
    /// Output files in input order
    pub files: Vec<TranslatedFile>,
    /// Final usage and cost
    pub usage: UsageSnapshot,
    /// Original source lines across the job
    pub total_lines: usize,
    /// Unique texts across the job
    pub total_unique: usize,
}

struct FileData {
    name: String,
    rows: Vec<Vec<String>>,
    dedup: DedupResult,
}

/// Drives one translation run end to end
pub struct JobOrchestrator {
    config: Config,
    service: TranslationService,
    csv: CsvProcessor,
    reporter: Arc<ProgressReporter>,
    incremental: IncrementalStore,
    results: ResultStore,
}

impl JobOrchestrator {
    /// Create an orchestrator for the configured provider.
    ///
    /// Validation (supported target language, API key present) happens
    /// here, before any job runs.
    pub fn new(config: Config, reporter: Arc<ProgressReporter>) -> Result<Self, JobError> {
        let service = TranslationService::new(config.translation.clone(), &config.target_language)
            .map_err(JobError::Validation)?;
        let incremental = IncrementalStore::in_temp_dir()?;
        let results = ResultStore::in_data_dir()?;
        Ok(Self::with_components(config, service, reporter, incremental, results))
    }

    /// Assemble an orchestrator from explicit components (tests inject a
    /// mock-backed service and temp-dir stores here)
    pub fn with_components(
        config: Config,
        service: TranslationService,
        reporter: Arc<ProgressReporter>,
        incremental: IncrementalStore,
        results: ResultStore,
    ) -> Self {
        let csv = CsvProcessor::new(&config.csv);
        Self { config, service, csv, reporter, incremental, results }
    }

    /// Run a translation job to completion or failure.
    ///
    /// Structural errors emit a terminal `error` event and clean up the
    /// incremental store; batch-level failures are contained as sentinel
    /// translations and do not reach this level.
    pub async fn run(&self, request: JobRequest) -> Result<JobSummary, JobError> {
        let start = Instant::now();

        match self.run_inner(&request, start).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("Job {} failed: {}", request.session_id, e);
                self.reporter.emit(
                    &request.session_id,
                    ProgressEvent::Error { message: e.to_string() },
                );
                let _ = self.incremental.cleanup(&request.session_id);
                Err(e)
            }
        }
    }

    async fn run_inner(&self, request: &JobRequest, start: Instant) -> Result<JobSummary, JobError> {
        if request.files.is_empty() {
            return Err(ValidationError::NoInputFiles.into());
        }

        let session_id = &request.session_id;
        self.service.usage.reset();

        // Parsing: extract and deduplicate every file up front so the init
        // event can carry job-wide totals
        let mut files_data = Vec::with_capacity(request.files.len());
        for file in &request.files {
            let document = self.csv.parse(&file.content).map_err(JobError::Csv)?;

            let mut source_texts = document.source_texts;
            if let Some(limit) = request.test_line_limit {
                source_texts.truncate(limit);
            }

            let dedup = deduplicate(&source_texts);
            info!(
                "{}: {} lines -> {} unique ({:.1}% saved)",
                file.name,
                dedup.total_original,
                dedup.total_unique,
                dedup.savings_percent()
            );

            files_data.push(FileData { name: file.name.clone(), rows: document.rows, dedup });
        }

        let total_lines: usize = files_data.iter().map(|f| f.dedup.total_original).sum();
        let total_unique: usize = files_data.iter().map(|f| f.dedup.total_unique).sum();

        self.reporter.emit(session_id, ProgressEvent::Init {
            total_files: files_data.len(),
            total_lines,
            total_unique,
            deduplication_saved: total_lines - total_unique,
        });

        // Translating + Finalizing, one file at a time: bounded peak memory
        // beats cross-file parallelism here
        let controller = self.service.concurrency_controller();
        let global_processed = AtomicUsize::new(0);
        let mut output_files = Vec::new();

        for (file_index, file_data) in files_data.iter_mut().enumerate() {
            let batches = plan_batches(
                &file_data.dedup.unique,
                self.config.translation.get_max_batch_chars(),
            );

            self.reporter.emit(session_id, ProgressEvent::FileStart {
                file_index,
                file_name: file_data.name.clone(),
                lines_to_translate: file_data.dedup.total_original,
                unique_to_translate: file_data.dedup.total_unique,
                batch_count: batches.len(),
            });

            let file_processed = AtomicUsize::new(0);

            let tasks = batches.iter().map(|batch| {
                controller.run(self.process_batch(
                    session_id,
                    file_index,
                    &file_data.name,
                    batch,
                    file_data.dedup.total_unique,
                    &file_processed,
                    &global_processed,
                    total_lines,
                    total_unique,
                ))
            });
            join_all(tasks).await;

            // Forced final tick so observers see 100% before file_complete
            self.reporter.emit_unthrottled(
                session_id,
                ProgressEvent::Progress(self.tick(
                    file_index,
                    &file_data.name,
                    file_data.dedup.total_unique,
                    file_data.dedup.total_unique,
                    global_processed.load(Ordering::SeqCst),
                    total_lines,
                    total_unique,
                )),
            );

            // Finalizing: row order is restored here from the stored row
            // indices, regardless of batch completion order
            let translations = self.incremental.load(session_id, file_index)?;
            self.csv.insert_translations(&mut file_data.rows, &translations);
            self.csv.normalize_handles(&mut file_data.rows);
            let content = self.csv.generate_csv(&file_data.rows).map_err(JobError::Csv)?;

            let translated_name = output_name(
                &file_data.name,
                &self.config.target_language,
                request.test_line_limit.is_some(),
            );
            let parts = self.csv.split_if_oversized(
                &translated_name,
                &content,
                self.config.csv.max_output_bytes,
            );
            let split = parts.len() > 1;
            for part in parts {
                output_files.push(TranslatedFile {
                    original_name: file_data.name.clone(),
                    name: part.name,
                    content: part.content,
                    lines_translated: file_data.dedup.total_original,
                    unique_translated: file_data.dedup.total_unique,
                    is_part_of_split: split,
                });
            }

            self.reporter.emit(session_id, ProgressEvent::FileComplete {
                file_index,
                file_name: file_data.name.clone(),
            });
        }

        // Completed: persist results and release per-job resources
        let duration_secs = start.elapsed().as_secs_f64();
        let usage = self.service.usage.snapshot();

        self.results.save(session_id, &CompletedJob {
            target_language: self.config.target_language.clone(),
            duration_secs,
            usage: usage.clone(),
            files: output_files
                .iter()
                .map(|f| (f.name.clone(), f.content.clone(), f.lines_translated, f.is_part_of_split))
                .collect(),
        })?;

        self.reporter.emit(session_id, ProgressEvent::Complete {
            duration_secs,
            usage: usage.clone(),
            deduplication: DedupSummary {
                original: total_lines,
                unique: total_unique,
                saved: total_lines - total_unique,
            },
            files: output_files
                .iter()
                .map(|f| FileDescriptor {
                    name: f.name.clone(),
                    size: f.content.len(),
                    lines_translated: f.lines_translated,
                })
                .collect(),
        });

        self.incremental.cleanup(session_id)?;

        info!(
            "Job {} completed in {:.1}s - {} lines, {} unique, ${:.4}",
            session_id, duration_secs, total_lines, total_unique, usage.estimated_cost
        );

        Ok(JobSummary {
            session_id: session_id.clone(),
            duration_secs,
            files: output_files,
            usage,
            total_lines,
            total_unique,
        })
    }

    /// Translate one batch and append its results.
    ///
    /// Contains its own failure handling: exhausted retries become sentinel
    /// translations for every item so row counts stay consistent.
    #[allow(clippy::too_many_arguments)]
    async fn process_batch(
        &self,
        session_id: &str,
        file_index: usize,
        file_name: &str,
        batch: &Batch,
        file_total: usize,
        file_processed: &AtomicUsize,
        global_processed: &AtomicUsize,
        total_lines: usize,
        total_unique: usize,
    ) {
        let texts = batch.texts();
        let translations = match self.service.translate_batch(&texts, batch.is_markup).await {
            Ok(translations) => translations,
            Err(e) => {
                error!("Batch failed after retries: {}", e);
                vec![format!("[ERREUR: {}]", e); batch.items.len()]
            }
        };

        for (item, translation) in batch.items.iter().zip(translations) {
            let record = TranslationRecord {
                text: item.text.clone(),
                translation,
                indices: item.row_indices.clone(),
            };
            if let Err(e) = self.incremental.append(session_id, file_index, &record) {
                // Surfaced at finalize time as a missing translation; the
                // job itself keeps going
                error!("Failed to append translation record: {}", e);
            }
        }

        let file_count = file_processed.fetch_add(batch.items.len(), Ordering::SeqCst) + batch.items.len();
        let global_count = global_processed.fetch_add(batch.items.len(), Ordering::SeqCst) + batch.items.len();

        self.reporter.emit(
            session_id,
            ProgressEvent::Progress(self.tick(
                file_index,
                file_name,
                file_count,
                file_total,
                global_count,
                total_lines,
                total_unique,
            )),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn tick(
        &self,
        file_index: usize,
        file_name: &str,
        file_processed: usize,
        file_total: usize,
        global_processed: usize,
        total_lines: usize,
        total_unique: usize,
    ) -> ProgressTick {
        let ratio = if total_unique > 0 {
            global_processed as f64 / total_unique as f64
        } else {
            1.0
        };

        ProgressTick {
            file_index,
            file_name: file_name.to_string(),
            file_processed_texts: file_processed,
            file_total_texts: file_total,
            global_processed_unique: global_processed,
            global_total_unique: total_unique,
            global_processed_lines: (ratio * total_lines as f64).round() as usize,
            global_total_lines: total_lines,
            percent_complete: (ratio * 100.0).round() as u32,
            usage: self.service.usage.snapshot(),
        }
    }
}

/// Output name for a translated file: `feed.csv` -> `feed_fr.csv`
/// (`feed_TEST_fr.csv` in test mode)
fn output_name(input_name: &str, target_language: &str, test_mode: bool) -> String {
    let suffix = if test_mode {
        format!("_TEST_{}", target_language)
    } else {
        format!("_{}", target_language)
    };

    match input_name.strip_suffix(".csv") {
        Some(stem) => format!("{}{}.csv", stem, suffix),
        None => format!("{}{}", input_name, suffix),
    }
}
