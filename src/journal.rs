/// Operation journal for undo support.
///
/// Every completed move is appended to an in-memory journal that is written to
/// the target directory as pretty-printed JSON once the run finishes. The undo
/// engine later replays the journal in reverse. The journal format is a bare
/// array of operation records so it stays greppable and hand-editable.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing the journal file.
#[derive(Debug)]
pub enum JournalError {
    /// No journal file exists at the given path.
    NotFound(PathBuf),
    /// The journal file could not be read.
    ReadFailed { path: PathBuf, source: std::io::Error },
    /// The journal file could not be written.
    WriteFailed { path: PathBuf, source: std::io::Error },
    /// The journal file could not be deleted.
    DeleteFailed { path: PathBuf, source: std::io::Error },
    /// The journal contents are not valid operation records.
    InvalidFormat { reason: String },
}

impl std::fmt::Display for JournalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalError::NotFound(path) => {
                write!(f, "Journal file not found: '{}'", path.display())
            }
            JournalError::ReadFailed { path, source } => {
                write!(f, "Failed to read journal '{}': {}", path.display(), source)
            }
            JournalError::WriteFailed { path, source } => {
                write!(f, "Failed to write journal '{}': {}", path.display(), source)
            }
            JournalError::DeleteFailed { path, source } => {
                write!(f, "Failed to delete journal '{}': {}", path.display(), source)
            }
            JournalError::InvalidFormat { reason } => {
                write!(f, "Journal format is invalid: {}", reason)
            }
        }
    }
}

impl std::error::Error for JournalError {}

pub type JournalResult<T> = Result<T, JournalError>;

/// Kind of a journaled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
}

/// A single recorded file operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub operation: OperationKind,
    pub timestamp: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

impl Operation {
    /// Builds a move record timestamped with the current UTC time.
    pub fn moved(
        source: PathBuf,
        destination: PathBuf,
        size_bytes: u64,
        file_hash: Option<String>,
    ) -> Self {
        Self {
            source,
            destination,
            operation: OperationKind::Move,
            timestamp: Utc::now().to_rfc3339(),
            size_bytes,
            file_hash,
        }
    }
}

/// An append-only log of operations for one organization run.
#[derive(Debug, Default)]
pub struct Journal {
    operations: Vec<Operation>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Writes the journal as a pretty JSON array.
    pub fn save(&self, path: &Path) -> JournalResult<()> {
        let json = serde_json::to_string_pretty(&self.operations)
            .map_err(|e| JournalError::InvalidFormat {
                reason: e.to_string(),
            })?;
        fs::write(path, json).map_err(|e| JournalError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads a journal from disk. Returns `None` when no file exists.
    pub fn load(path: &Path) -> JournalResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| JournalError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let operations: Vec<Operation> =
            serde_json::from_str(&content).map_err(|e| JournalError::InvalidFormat {
                reason: e.to_string(),
            })?;
        Ok(Some(Self { operations }))
    }

    /// Removes the journal file, typically after a complete undo.
    pub fn delete(path: &Path) -> JournalResult<()> {
        fs::remove_file(path).map_err(|e| JournalError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
