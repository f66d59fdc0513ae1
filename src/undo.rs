/// Undo functionality for reverting an organization run.
///
/// This module replays the operation journal in reverse, moving files back to
/// where they came from. Original folders are recreated when the cleanup sweep
/// removed them. A file already sitting at an original location is never
/// overwritten; the restore is skipped and reported instead.
use crate::engine::transfer;
use crate::journal::{Journal, JournalError, JournalResult, Operation};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// Number of files successfully moved back.
    pub undone: usize,
    /// Files that could not be restored, with the failure reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Files that were skipped, e.g. missing or with an occupied original spot.
    pub skipped: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn new() -> Self {
        Self {
            undone: 0,
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.undone + self.failed.len() + self.skipped.len()
    }

    /// Returns true if every journaled operation was undone.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum RestoreOutcome {
    Restored,
    Skipped(PathBuf, String),
    Failed(PathBuf, String),
}

/// Reverts organization runs from their journals.
pub struct UndoEngine;

impl UndoEngine {
    /// Undoes the organization run journaled in the target directory.
    ///
    /// Operations are replayed newest first, so files renamed during collision
    /// handling unwind in the right order. The journal file is deleted only
    /// when every operation was undone; after a partial undo it is kept so
    /// the remaining moves stay on record.
    ///
    /// # Arguments
    ///
    /// * `target_dir` - The target directory of the organization run
    /// * `journal_file` - The journal filename inside the target directory
    ///
    /// # Returns
    ///
    /// Returns an `UndoReport` describing what was restored, what failed,
    /// and what was skipped. Returns an error if the journal is missing or
    /// unreadable.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: the destination vanished since the run; skipped
    /// * **Occupied original location**: never overwritten; skipped
    /// * **Removed original folder**: recreated before moving back
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filetidy::undo::UndoEngine;
    /// use std::path::Path;
    ///
    /// let result = UndoEngine::undo(Path::new("/home/user/Organized"), ".filetidy_journal.json");
    /// match result {
    ///     Ok(report) => println!("Restored {} files", report.undone),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(target_dir: &Path, journal_file: &str) -> JournalResult<UndoReport> {
        let journal_path = target_dir.join(journal_file);
        let journal = Journal::load(&journal_path)?
            .ok_or_else(|| JournalError::NotFound(journal_path.clone()))?;

        let mut report = UndoReport::new();
        for operation in journal.operations().iter().rev() {
            match Self::restore_file(operation) {
                RestoreOutcome::Restored => report.undone += 1,
                RestoreOutcome::Skipped(path, reason) => report.skipped.push((path, reason)),
                RestoreOutcome::Failed(path, reason) => report.failed.push((path, reason)),
            }
        }

        // Only delete the journal when nothing is left to undo.
        if report.is_complete_success()
            && let Err(e) = Journal::delete(&journal_path)
        {
            warn!("Could not delete journal file: {}", e);
        }

        Ok(report)
    }

    /// Moves a single file back to its original location.
    fn restore_file(operation: &Operation) -> RestoreOutcome {
        if !operation.destination.exists() {
            return RestoreOutcome::Skipped(
                operation.destination.clone(),
                "File not found at expected location".to_string(),
            );
        }

        if operation.source.exists() {
            return RestoreOutcome::Skipped(
                operation.source.clone(),
                "Original location is already occupied".to_string(),
            );
        }

        if let Some(parent) = operation.source.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            return RestoreOutcome::Failed(
                operation.source.clone(),
                format!("Could not recreate original folder: {}", e),
            );
        }

        if let Err(e) = transfer(&operation.destination, &operation.source) {
            return RestoreOutcome::Failed(
                operation.destination.clone(),
                format!("Failed to restore file: {}", e),
            );
        }

        RestoreOutcome::Restored
    }
}
