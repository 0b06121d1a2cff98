//! Append-only activity history and context selection.
//!
//! [`ActivityLog`] owns the history for one process lifetime: it is loaded
//! once, grows through [`ActivityLog::append`], and is rewritten to disk in
//! full after every append. [`ActivityLog::context`] picks the entries that
//! ground the next prompt, optionally preferring a similarity index.

pub mod seed;
pub mod types;

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::index::SimilarityIndex;
pub use seed::{seed_entries, SEED_HISTORY};
pub use types::{ContextWindow, HistoryEntry, EMPTY_CONTEXT_PLACEHOLDER};

struct AttachedIndex {
    backend: Box<dyn SimilarityIndex>,
    seed_query: String,
}

/// Durable, append-only history backed by a JSON array on disk.
pub struct ActivityLog {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    index: Option<AttachedIndex>,
}

impl ActivityLog {
    /// Load history from `path`, falling back to [`SEED_HISTORY`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self::load_or(path, seed_entries())
    }

    /// Load history from `path`. A missing, unreadable, or malformed file
    /// yields `fallback` instead of an error.
    pub fn load_or(path: impl Into<PathBuf>, fallback: Vec<HistoryEntry>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(Some(entries)) => {
                debug!(path = %path.display(), count = entries.len(), "history loaded");
                entries
            }
            Ok(None) => {
                info!(
                    path = %path.display(),
                    seeded = fallback.len(),
                    "no history file yet, starting from seed"
                );
                fallback
            }
            Err(e) => {
                warn!(error = %e, "history unreadable, treating as no history");
                fallback
            }
        };

        Self {
            path,
            entries,
            index: None,
        }
    }

    /// Attach a similarity index and bring it in line with the history.
    ///
    /// The JSON log is the source of truth: entries past the index's document
    /// count are indexed here, which repairs a run that crashed between the
    /// file write and the index write. An index that no longer matches the log
    /// (longer than it, or holding a different entry at the log's position) is
    /// rebuilt from scratch.
    pub fn with_index(
        self,
        index: Box<dyn SimilarityIndex>,
        seed_query: impl Into<String>,
    ) -> Self {
        let mut log = self.inspect_with_index(index, seed_query);
        log.catch_up_index();
        log
    }

    /// Attach a similarity index as-is, for commands that only read.
    pub fn inspect_with_index(
        mut self,
        index: Box<dyn SimilarityIndex>,
        seed_query: impl Into<String>,
    ) -> Self {
        self.index = Some(AttachedIndex {
            backend: index,
            seed_query: seed_query.into(),
        });
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
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

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Append a pre-formatted entry and rewrite the history file.
    ///
    /// The in-memory log only keeps the entry if the write succeeds. With an
    /// index attached the entry is then indexed best-effort.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), StorageError> {
        let for_index = self.index.is_some().then(|| entry.clone());
        self.entries.push(entry);

        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }

        if let Some(entry) = for_index {
            self.index_for_similarity(&entry);
        }
        Ok(())
    }

    /// Stamp `text` with the current local time and append it.
    pub fn log_activity(&mut self, text: &str) -> Result<HistoryEntry, StorageError> {
        let entry = HistoryEntry::stamped(text, Local::now());
        self.append(entry.clone())?;
        Ok(entry)
    }

    /// The context text for the next prompt. Never fails.
    pub fn context(&self, window: usize) -> String {
        self.context_window(window).render()
    }

    /// Choose the context: similarity results when available, otherwise the
    /// last `window` entries, or the placeholder for an empty log.
    pub fn context_window(&self, window: usize) -> ContextWindow {
        if self.entries.is_empty() {
            return ContextWindow::Placeholder;
        }

        if let Some(documents) = self.similar(window) {
            return ContextWindow::Similar(documents);
        }

        let start = self.entries.len().saturating_sub(window);
        ContextWindow::Recent(
            self.entries[start..]
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
        )
    }

    /// Add `entry` to the attached index under the current sequence length.
    pub fn index_for_similarity(&mut self, entry: &HistoryEntry) {
        let id = self.entries.len().to_string();
        let Some(attached) = self.index.as_mut() else {
            return;
        };

        match attached.backend.add(&id, entry.as_str()) {
            Ok(true) => debug!(id = %id, "entry indexed"),
            Ok(false) => debug!(id = %id, "entry already indexed"),
            Err(e) => warn!(
                error = %e,
                id = %id,
                "failed to index entry; context falls back to recent history"
            ),
        }
    }

    fn similar(&self, window: usize) -> Option<Vec<String>> {
        let attached = self.index.as_ref()?;
        if window == 0 {
            return None;
        }

        match attached.backend.document_count() {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "similarity index unavailable");
                return None;
            }
        }

        match attached.backend.query(&attached.seed_query, window) {
            Ok(documents) if !documents.is_empty() => Some(documents),
            Ok(_) => {
                debug!("similarity query returned nothing");
                None
            }
            Err(e) => {
                warn!(error = %e, "similarity query failed");
                None
            }
        }
    }

    fn catch_up_index(&mut self) {
        let Some(attached) = self.index.as_mut() else {
            return;
        };

        let indexed = match attached.backend.document_count() {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "cannot read index size, skipping catch-up");
                return;
            }
        };

        let stale = match indexed {
            0 => false,
            n if n > self.entries.len() => true,
            n => match attached.backend.document(&n.to_string()) {
                Ok(stored) => stored.as_deref() != Some(self.entries[n - 1].as_str()),
                Err(e) => {
                    warn!(error = %e, "cannot read index, skipping catch-up");
                    return;
                }
            },
        };

        let indexed = if stale {
            warn!(
                indexed,
                logged = self.entries.len(),
                "index does not match the history file, rebuilding"
            );
            if let Err(e) = attached.backend.clear() {
                warn!(error = %e, "failed to clear stale index");
                return;
            }
            0
        } else {
            indexed
        };

        for (position, entry) in self.entries.iter().enumerate().skip(indexed) {
            let id = (position + 1).to_string();
            if let Err(e) = attached.backend.add(&id, entry.as_str()) {
                warn!(error = %e, id = %id, "index catch-up stopped");
                return;
            }
        }

        let replayed = self.entries.len() - indexed;
        if replayed > 0 {
            info!(replayed, "indexed history entries missing from the index");
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, json).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Read the history file. `Ok(None)` when it does not exist.
pub fn read_entries(path: &Path) -> Result<Option<Vec<HistoryEntry>>, StorageError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}
