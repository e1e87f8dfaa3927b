//! Append-only workflow history.
//!
//! Each workflow instance owns a history: an ordered list of
//! `(step, input-hash, output)` entries, one per completed activity call.
//! The orchestrator consults the history before executing a step — a
//! matching recorded entry is replayed instead of re-invoking the
//! activity, which is what makes re-running an interrupted instance both
//! safe and cheap. This replaces the hidden replay machinery of the
//! orchestration runtime the pipeline was modelled on with something a
//! reader can `cat`.
//!
//! File-backed histories are JSON Lines: one serialized [`HistoryEntry`]
//! per line, flushed on every append so a crash between steps loses at
//! most the step in flight.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// One completed activity call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: String,
    pub input_hash: String,
    pub output: Value,
}

/// Ordered record of an instance's completed steps, optionally backed by a
/// JSON Lines file.
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    path: Option<PathBuf>,
}

impl History {
    /// A history that lives only for the current process.
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            path: None,
        }
    }

    /// Open (or create) a file-backed history, loading any recorded entries.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) => parse_entries(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(PipelineError::HistoryIo {
                    path,
                    source: e,
                })
            }
        };

        if !entries.is_empty() {
            debug!(path = %path.display(), entries = entries.len(), "loaded history");
        }
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record one completed step, flushing to the backing file if any.
    pub async fn append(&mut self, entry: HistoryEntry) -> Result<(), PipelineError> {
        if let Some(ref path) = self.path {
            let line = serde_json::to_string(&entry)
                .map_err(|e| PipelineError::Internal(format!("serialize history entry: {e}")))?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PipelineError::HistoryIo {
                        path: path.clone(),
                        source: e,
                    })?;
            }
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .map_err(|e| PipelineError::HistoryIo {
                    path: path.clone(),
                    source: e,
                })?;
            file.write_all(format!("{line}\n").as_bytes())
                .await
                .map_err(|e| PipelineError::HistoryIo {
                    path: path.clone(),
                    source: e,
                })?;
            file.flush().await.map_err(|e| PipelineError::HistoryIo {
                path: path.clone(),
                source: e,
            })?;
        }

        self.entries.push(entry);
        Ok(())
    }
}

fn parse_entries(path: &Path, text: &str) -> Result<Vec<HistoryEntry>, PipelineError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| PipelineError::CorruptHistory {
                instance: path.display().to_string(),
                detail: format!("unparseable entry: {e}"),
            })
        })
        .collect()
}

/// Stable hash of an activity input.
///
/// `serde_json` orders map keys, so two `Value`s with the same contents
/// hash identically regardless of construction order.
pub fn input_hash(input: &Value) -> String {
    let canonical = input.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{digest:x}")
}
