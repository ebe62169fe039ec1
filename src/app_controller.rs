use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::storage::ResultStore;
use crate::translation::core::TranslationService;
use crate::translation::orchestrator::{InputFile, JobOrchestrator, JobRequest};
use crate::translation::usage::PriceTable;

/// Main application controller for feed translation
pub struct Controller {
    /// App configuration
    config: Config,
}

/// Pre-flight cost estimate for a set of feeds
#[derive(Debug, Clone)]
pub struct EstimateReport {
    /// Number of input files
    pub total_files: usize,
    /// Source lines found
    pub total_lines: usize,
    /// Source characters found
    pub total_chars: usize,
    /// Estimated input tokens (~4 chars per token)
    pub estimated_input_tokens: u64,
    /// Estimated output tokens
    pub estimated_output_tokens: u64,
    /// Estimated cost in dollars
    pub estimated_cost: f64,
    /// Estimated duration in minutes
    pub estimated_minutes: u64,
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Run the main workflow: translate a CSV file or every CSV in a directory
    pub async fn run(
        &self,
        input_path: PathBuf,
        output_dir: PathBuf,
        test_lines: Option<usize>,
    ) -> Result<()> {
        let input_files = self.collect_input_files(&input_path)?;
        info!(
            "🚀 feedtrans: {} - {} | {} file(s) -> {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            input_files.len(),
            self.config.target_language
        );
        if let Some(limit) = test_lines {
            info!("Test mode: capped at {} lines per file", limit);
        }

        FileManager::ensure_dir(&output_dir)?;

        let mut files = Vec::with_capacity(input_files.len());
        for path in &input_files {
            let name = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "input.csv".to_string());
            files.push(InputFile { name, content: FileManager::read_bytes(path)? });
        }

        let session_id = format!("session_{}", Uuid::new_v4());
        let reporter = Arc::new(ProgressReporter::default());
        let orchestrator = JobOrchestrator::new(self.config.clone(), Arc::clone(&reporter))
            .context("Failed to initialize translation job")?;

        // Fire-and-forget connectivity check; a failure here surfaces as a
        // warning long before the first real batch fails
        let test_service = TranslationService::new(
            self.config.translation.clone(),
            &self.config.target_language,
        );
        if let Ok(service) = test_service {
            tokio::spawn(async move {
                match service.test_connection().await {
                    Ok(()) => debug!("Provider connection test succeeded"),
                    Err(e) => warn!("Provider connection test failed: {}", e),
                }
            });
        }

        // Drive an indicatif bar from the progress channel
        let receiver = reporter.attach(&session_id);
        let progress_task = tokio::spawn(consume_progress(receiver));

        let summary = orchestrator
            .run(JobRequest {
                session_id: session_id.clone(),
                files,
                test_line_limit: test_lines,
            })
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        reporter.detach(&session_id);
        let _ = progress_task.await;

        for file in &summary.files {
            let output_path = output_dir.join(&file.name);
            FileManager::write_to_file(&output_path, &file.content)?;
            info!("Success: {}", output_path.display());
        }

        let usage = &summary.usage;
        info!(
            "Done in {} - {} lines ({} unique), {} requests, {} input / {} output tokens, cache hit {:.1}%, est. ${:.4}",
            Self::format_duration(summary.duration_secs),
            summary.total_lines,
            summary.total_unique,
            usage.request_count,
            usage.input_tokens(),
            usage.output_tokens,
            usage.hit_rate,
            usage.estimated_cost
        );

        Ok(())
    }

    /// Estimate translation cost for a file or directory without translating
    pub fn estimate(&self, input_path: &Path) -> Result<EstimateReport> {
        let input_files = self.collect_input_files(input_path)?;
        let csv = crate::csv_processor::CsvProcessor::new(&self.config.csv);

        let mut total_lines = 0usize;
        let mut total_chars = 0usize;
        for path in &input_files {
            let document = csv
                .parse(&FileManager::read_bytes(path)?)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
            total_lines += document.source_texts.len();
            total_chars += document.source_texts.iter().map(|s| s.text.len()).sum::<usize>();
        }

        // ~4 characters per token for western text; output roughly mirrors
        // input for translations
        let estimated_input_tokens = (total_chars as u64).div_ceil(4);
        let estimated_output_tokens = estimated_input_tokens;

        // Assume a 70% cache hit rate once the shared prompt is warm
        let prices = PriceTable::for_provider(self.config.translation.provider);
        let hit_tokens = estimated_input_tokens as f64 * 0.7;
        let miss_tokens = estimated_input_tokens as f64 * 0.3;
        let cost = (hit_tokens / 1_000_000.0) * prices.hit_per_mtok
            + (miss_tokens / 1_000_000.0) * prices.miss_per_mtok
            + (estimated_output_tokens as f64 / 1_000_000.0) * prices.output_per_mtok;

        // Roughly 50 lines per second with full parallelism
        let estimated_seconds = (total_lines as u64).div_ceil(50);

        Ok(EstimateReport {
            total_files: input_files.len(),
            total_lines,
            total_chars,
            estimated_input_tokens,
            estimated_output_tokens,
            estimated_cost: (cost * 10_000.0).round() / 10_000.0,
            estimated_minutes: estimated_seconds.div_ceil(60),
        })
    }

    /// Print the recent translation history
    pub fn show_history(&self) -> Result<()> {
        let store = ResultStore::in_data_dir()?;
        let history = store.history()?;

        if history.is_empty() {
            info!("No saved translations");
            return Ok(());
        }

        for entry in history {
            let when = chrono::DateTime::from_timestamp_millis(entry.created_at)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            info!(
                "{} | {} -> {} | {} file(s) | {}",
                when,
                entry.session_id,
                entry.target_language,
                entry.total_files,
                Self::format_duration(entry.duration_secs)
            );
        }

        Ok(())
    }

    fn collect_input_files(&self, input_path: &Path) -> Result<Vec<PathBuf>> {
        if !input_path.exists() {
            return Err(anyhow::anyhow!("Input path does not exist: {:?}", input_path));
        }

        let files = if input_path.is_dir() {
            FileManager::find_files(input_path, "csv")?
        } else {
            vec![input_path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(anyhow::anyhow!("No CSV files found in {:?}", input_path));
        }

        Ok(files)
    }

    /// Format a duration in a human-readable form
    fn format_duration(secs: f64) -> String {
        let total_seconds = secs as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{:.1}s", secs)
        }
    }
}

/// Consume progress events, rendering a translation progress bar
async fn consume_progress(mut receiver: tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = receiver.recv().await {
        match event {
            ProgressEvent::Connected { .. } => {}
            ProgressEvent::Init { total_unique, .. } => {
                let pb = ProgressBar::new(total_unique as u64);
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} texts ({percent}%) {msg} {eta}")
                    .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                pb.set_style(style.progress_chars("█▓▒░"));
                pb.set_message("Translating");
                bar = Some(pb);
            }
            ProgressEvent::FileStart { file_name, .. } => {
                if let Some(pb) = &bar {
                    pb.set_message(file_name);
                }
            }
            ProgressEvent::Progress(tick) => {
                if let Some(pb) = &bar {
                    pb.set_position(tick.global_processed_unique as u64);
                }
            }
            ProgressEvent::FileComplete { .. } => {}
            ProgressEvent::Complete { .. } => {
                if let Some(pb) = &bar {
                    pb.finish_and_clear();
                }
            }
            ProgressEvent::Error { message } => {
                if let Some(pb) = &bar {
                    pb.abandon_with_message(message);
                }
            }
        }
    }
}
