/*!
 * On-disk persistence.
 *
 * Two stores back a translation run:
 *
 * - `IncrementalStore`: an append-only JSONL file per (session, file) under
 *   a temp root. Every completed batch item is appended as one
 *   self-contained line, so concurrent batch completions need no locking
 *   and a crash loses at most in-flight batches. Read back once at
 *   finalize time, then deleted.
 * - `ResultStore`: a per-session directory of translated CSVs plus
 *   `metadata.json`, with a `history.json` index capped at the most recent
 *   entries; evicted sessions are deleted from disk.
 */

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::translation::usage::UsageSnapshot;

/// Sessions kept in the history index
pub const MAX_HISTORY: usize = 10;

/// One translated unique text, fanned out to its rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Source text
    pub text: String,
    /// Translated text (or a sentinel on batch failure)
    pub translation: String,
    /// Every row this translation is written back to
    pub indices: Vec<usize>,
}

/// Append-only store for in-flight translations
#[derive(Debug, Clone)]
pub struct IncrementalStore {
    root: PathBuf,
}

impl IncrementalStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store rooted under the system temp directory
    pub fn in_temp_dir() -> std::io::Result<Self> {
        Self::new(std::env::temp_dir().join("feedtrans"))
    }

    fn file_path(&self, session_id: &str, file_index: usize) -> PathBuf {
        self.root.join(format!("{}_{}.jsonl", session_id, file_index))
    }

    /// Append one record as a single line.
    ///
    /// The line is written with one `write_all` call so concurrent appenders
    /// in append mode never interleave records.
    pub fn append(
        &self,
        session_id: &str,
        file_index: usize,
        record: &TranslationRecord,
    ) -> std::io::Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(session_id, file_index))?;
        file.write_all(line.as_bytes())
    }

    /// Read back the row-to-translation map for one file.
    ///
    /// Malformed lines (from a crash mid-append) are skipped.
    pub fn load(
        &self,
        session_id: &str,
        file_index: usize,
    ) -> std::io::Result<HashMap<usize, String>> {
        let path = self.file_path(session_id, file_index);
        let mut map = HashMap::new();

        if !path.exists() {
            return Ok(map);
        }

        let content = fs::read_to_string(&path)?;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<TranslationRecord>(line) {
                Ok(record) => {
                    for index in record.indices {
                        map.insert(index, record.translation.clone());
                    }
                }
                Err(e) => warn!("Skipping malformed store line: {}", e),
            }
        }

        Ok(map)
    }

    /// Delete every file belonging to a session
    pub fn cleanup(&self, session_id: &str) -> std::io::Result<()> {
        let prefix = format!("{}_", session_id);
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                fs::remove_file(entry.path())?;
            }
        }
        debug!("Cleaned up incremental store for session {}", session_id);
        Ok(())
    }
}

/// One saved output file in a session's metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFile {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: usize,
    /// Original lines translated into this file
    pub lines_translated: usize,
    /// Whether this file is one part of a split
    #[serde(default)]
    pub is_part_of_split: bool,
}

/// Metadata persisted for one completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Session identifier
    pub session_id: String,
    /// Target language code
    pub target_language: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Job duration in seconds
    pub duration_secs: f64,
    /// Final usage and cost
    pub usage: UsageSnapshot,
    /// Saved output files
    pub files: Vec<SavedFile>,
}

/// One entry in the history index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Session identifier
    pub session_id: String,
    /// Target language code
    pub target_language: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Job duration in seconds
    pub duration_secs: f64,
    /// Number of output files
    pub total_files: usize,
}

/// Completed results to persist
#[derive(Debug, Clone)]
pub struct CompletedJob {
    /// Target language code
    pub target_language: String,
    /// Job duration in seconds
    pub duration_secs: f64,
    /// Final usage and cost
    pub usage: UsageSnapshot,
    /// Output files: (name, content, lines translated, part-of-split)
    pub files: Vec<(String, String, usize, bool)>,
}

/// Persistent store for completed translations with a bounded history
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
    max_history: usize,
}

impl ResultStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, max_history: MAX_HISTORY })
    }

    /// Store under the platform data directory
    pub fn in_data_dir() -> std::io::Result<Self> {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("feedtrans").join("translations"))
    }

    /// Override the history cap (used by tests)
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history.max(1);
        self
    }

    fn history_path(&self) -> PathBuf {
        self.root.join("history.json")
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    /// Persist a completed session: its files, metadata, and history entry.
    ///
    /// Saving past the history cap evicts (and deletes) the oldest sessions.
    pub fn save(&self, session_id: &str, job: &CompletedJob) -> std::io::Result<SessionMetadata> {
        let session_dir = self.session_dir(session_id);
        fs::create_dir_all(&session_dir)?;

        let mut saved_files = Vec::new();
        for (name, content, lines_translated, is_part_of_split) in &job.files {
            fs::write(session_dir.join(name), content)?;
            saved_files.push(SavedFile {
                name: name.clone(),
                size: content.len(),
                lines_translated: *lines_translated,
                is_part_of_split: *is_part_of_split,
            });
        }

        let metadata = SessionMetadata {
            session_id: session_id.to_string(),
            target_language: job.target_language.clone(),
            created_at: Utc::now().timestamp_millis(),
            duration_secs: job.duration_secs,
            usage: job.usage.clone(),
            files: saved_files,
        };

        fs::write(
            session_dir.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
        )?;

        self.update_history(&metadata)?;
        debug!("Saved session {} ({} files)", session_id, metadata.files.len());
        Ok(metadata)
    }

    fn update_history(&self, metadata: &SessionMetadata) -> std::io::Result<()> {
        let mut history = self.history()?;

        history.insert(0, HistoryEntry {
            session_id: metadata.session_id.clone(),
            target_language: metadata.target_language.clone(),
            created_at: metadata.created_at,
            duration_secs: metadata.duration_secs,
            total_files: metadata.files.len(),
        });

        if history.len() > self.max_history {
            for evicted in history.split_off(self.max_history) {
                self.delete_session(&evicted.session_id)?;
            }
        }

        fs::write(
            self.history_path(),
            serde_json::to_string_pretty(&history)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
        )
    }

    /// The history index, most recent first
    pub fn history(&self) -> std::io::Result<Vec<HistoryEntry>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Metadata for one saved session, if present
    pub fn session(&self, session_id: &str) -> Option<SessionMetadata> {
        let path = self.session_dir(session_id).join("metadata.json");
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Content of one saved output file, if present
    pub fn file_content(&self, session_id: &str, file_name: &str) -> Option<String> {
        fs::read_to_string(self.session_dir(session_id).join(file_name)).ok()
    }

    /// Delete a session directory
    pub fn delete_session(&self, session_id: &str) -> std::io::Result<()> {
        let dir = self.session_dir(session_id);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
