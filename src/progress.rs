/*!
 * Progress reporting.
 *
 * Jobs publish a closed set of lifecycle events to whichever observer
 * channel is attached for their session. Progress is advisory UI state, not
 * an audit log: events without an attached channel are dropped, and rapid
 * `progress` ticks are throttled to one per interval with the latest values
 * winning. Lifecycle events and the forced final tick of each file always
 * go through, so a consumer observes 100% before `file_complete`.
 */

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::translation::usage::UsageSnapshot;

/// Default minimum interval between delivered progress ticks
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Running counts for one progress tick
#[derive(Debug, Clone, Serialize)]
pub struct ProgressTick {
    /// Index of the file being translated
    pub file_index: usize,
    /// Name of the file being translated
    pub file_name: String,
    /// Unique texts completed in this file
    pub file_processed_texts: usize,
    /// Unique texts in this file
    pub file_total_texts: usize,
    /// Unique texts completed across the job
    pub global_processed_unique: usize,
    /// Unique texts across the job
    pub global_total_unique: usize,
    /// Estimated original lines completed across the job
    pub global_processed_lines: usize,
    /// Original lines across the job
    pub global_total_lines: usize,
    /// Percent of unique texts completed
    pub percent_complete: u32,
    /// Usage and cost so far
    pub usage: UsageSnapshot,
}

/// Download descriptor for one output file, reported at job completion
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    /// Output file name
    pub name: String,
    /// Size in bytes
    pub size: usize,
    /// Original lines translated into this file
    pub lines_translated: usize,
}

/// Deduplication totals reported at job completion
#[derive(Debug, Clone, Serialize)]
pub struct DedupSummary {
    /// Original source lines
    pub original: usize,
    /// Unique texts translated
    pub unique: usize,
    /// Lines saved by deduplication
    pub saved: usize,
}

/// Lifecycle events published by a translation job
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Acknowledgment sent when an observer channel attaches
    Connected {
        /// Session this channel observes
        session_id: String,
    },
    /// Job totals, sent once after parsing and deduplication
    Init {
        /// Number of input files
        total_files: usize,
        /// Original source lines across all files
        total_lines: usize,
        /// Unique texts across all files
        total_unique: usize,
        /// Lines saved by deduplication
        deduplication_saved: usize,
    },
    /// A file entered the translating state
    FileStart {
        /// Index of the file
        file_index: usize,
        /// Name of the file
        file_name: String,
        /// Original lines to translate in this file
        lines_to_translate: usize,
        /// Unique texts to translate in this file
        unique_to_translate: usize,
        /// Number of planned batches
        batch_count: usize,
    },
    /// Running counts; throttled
    Progress(ProgressTick),
    /// A file finished translating and finalizing
    FileComplete {
        /// Index of the file
        file_index: usize,
        /// Name of the file
        file_name: String,
    },
    /// The job finished successfully
    Complete {
        /// Wall-clock duration in seconds
        duration_secs: f64,
        /// Final usage and cost
        usage: UsageSnapshot,
        /// Deduplication totals
        deduplication: DedupSummary,
        /// Download descriptors for the output files
        files: Vec<FileDescriptor>,
    },
    /// The job failed
    Error {
        /// Human-readable failure message
        message: String,
    },
}

impl ProgressEvent {
    fn is_tick(&self) -> bool {
        matches!(self, Self::Progress(_))
    }
}

/// Publishes job events to per-session observer channels
pub struct ProgressReporter {
    channels: RwLock<HashMap<String, UnboundedSender<ProgressEvent>>>,
    throttles: Mutex<HashMap<String, Instant>>,
    min_interval: Duration,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_THROTTLE_MS))
    }
}

impl ProgressReporter {
    /// Create a reporter with the given minimum tick interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            throttles: Mutex::new(HashMap::new()),
            min_interval,
        }
    }

    /// Attach an observer channel for a session, replacing any previous one.
    ///
    /// A `connected` acknowledgment is delivered immediately.
    pub fn attach(&self, session_id: &str) -> UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ProgressEvent::Connected { session_id: session_id.to_string() });
        self.channels.write().insert(session_id.to_string(), tx);
        rx
    }

    /// Detach the observer channel for a session
    pub fn detach(&self, session_id: &str) {
        self.channels.write().remove(session_id);
        self.throttles.lock().remove(session_id);
    }

    /// Publish an event. Progress ticks are throttled; everything else is
    /// delivered immediately. Best-effort: with no channel attached the
    /// event is dropped.
    pub fn emit(&self, session_id: &str, event: ProgressEvent) {
        if event.is_tick() {
            let mut throttles = self.throttles.lock();
            let now = Instant::now();
            if let Some(last) = throttles.get(session_id) {
                if now.duration_since(*last) < self.min_interval {
                    return;
                }
            }
            throttles.insert(session_id.to_string(), now);
        }

        self.send(session_id, event);
    }

    /// Publish an event bypassing the throttle; used for the final tick of
    /// each file so observers always see 100%.
    pub fn emit_unthrottled(&self, session_id: &str, event: ProgressEvent) {
        self.send(session_id, event);
    }

    fn send(&self, session_id: &str, event: ProgressEvent) {
        let channels = self.channels.read();
        if let Some(tx) = channels.get(session_id) {
            // A closed receiver is equivalent to no observer
            let _ = tx.send(event);
        }
    }
}
