//! Session persistence: the buffer text and last results, saved after every
//! pass so a crashed or closed session can be restored.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::result::LineResult;

/// Distinct buffer snapshots kept in [`Snapshot::history`].
pub const HISTORY_LIMIT: usize = 50;

/// What a persisted line result keeps: rendered text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SavedResult {
    Empty,
    #[serde(rename_all = "camelCase")]
    Value { display: String, copy_text: String },
    Error { line: usize, message: String },
    Plot { expression: String },
}

impl From<&LineResult> for SavedResult {
    fn from(result: &LineResult) -> Self {
        match result {
            LineResult::Empty => SavedResult::Empty,
            LineResult::Value {
                display, copy_text, ..
            } => SavedResult::Value {
                display: display.clone(),
                copy_text: copy_text.clone(),
            },
            LineResult::Error { line, message } => SavedResult::Error {
                line: *line,
                message: message.clone(),
            },
            LineResult::Plot { expression } => SavedResult::Plot {
                expression: expression.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub buffer_text: String,
    pub results: Vec<SavedResult>,
    /// Most recent last.
    pub history: Vec<String>,
}

impl Snapshot {
    pub fn new(buffer_text: String, results: &[LineResult], history: Vec<String>) -> Self {
        Snapshot {
            buffer_text,
            results: results.iter().map(SavedResult::from).collect(),
            history,
        }
    }
}

/// Append `text` unless blank or equal to the latest entry; keep at most
/// [`HISTORY_LIMIT`] entries.
pub fn push_history(history: &mut Vec<String>, text: &str) {
    if text.trim().is_empty() || history.last().is_some_and(|last| last == text) {
        return;
    }
    history.retain(|entry| entry != text);
    history.push(text.to_string());
    if history.len() > HISTORY_LIMIT {
        let excess = history.len() - HISTORY_LIMIT;
        history.drain(..excess);
    }
}

pub trait SessionStore {
    fn persist(&self, snapshot: &Snapshot) -> EngineResult<()>;

    fn restore(&self) -> EngineResult<Option<Snapshot>>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn persist(&self, snapshot: &Snapshot) -> EngineResult<()> {
        (**self).persist(snapshot)
    }

    fn restore(&self) -> EngineResult<Option<Snapshot>> {
        (**self).restore()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn persist(&self, snapshot: &Snapshot) -> EngineResult<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(snapshot.clone());
        Ok(())
    }

    fn restore(&self) -> EngineResult<Option<Snapshot>> {
        let slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        Ok(slot.clone())
    }
}

/// JSON file, replaced atomically on every persist.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn persist(&self, snapshot: &Snapshot) -> EngineResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| EngineError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }

    fn restore(&self) -> EngineResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}
