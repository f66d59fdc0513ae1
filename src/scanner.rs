//! Recursive source directory scanning.
//!
//! The scanner walks each source tree and produces one [`FileRecord`] per
//! organizable file. Protected directories are pruned before descent, engine
//! artifacts from earlier runs are skipped by name, and configured exclusion
//! rules drop individual files. Unreadable entries become report errors
//! instead of aborting the walk.

use crate::config::ScanFilters;
use crate::guard::PathGuard;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// A file found during scanning, with the metadata classification needs.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
    /// Lowercased extension without the leading dot, if any.
    pub extension: Option<String>,
    /// Sniffed MIME type, filled during analysis when needed.
    pub mime: Option<String>,
}

/// A non-fatal problem encountered while scanning.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to scan '{}': {}", self.path.display(), self.reason)
    }
}

/// Result of scanning one source tree.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<FileRecord>,
    pub errors: Vec<ScanError>,
    /// Protected entries pruned from the walk.
    pub protected_skipped: u64,
}

/// Walks source trees and collects organizable files.
pub struct Scanner<'a> {
    guard: &'a PathGuard,
    filters: &'a ScanFilters,
    /// Filenames the engine itself writes, skipped at any depth.
    artifact_names: Vec<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        guard: &'a PathGuard,
        filters: &'a ScanFilters,
        artifact_names: Vec<String>,
    ) -> Self {
        Self {
            guard,
            filters,
            artifact_names,
        }
    }

    /// Scans one source tree, pruning protected entries before descent.
    pub fn scan(&self, root: &Path) -> ScanReport {
        let mut report = ScanReport::default();
        let pruned = Cell::new(0u64);

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                // Vetoing a directory here prunes its whole subtree.
                if self.guard.is_protected(entry.path()) {
                    pruned.set(pruned.get() + 1);
                    false
                } else {
                    true
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    report.errors.push(ScanError {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if self.artifact_names.iter().any(|name| *name == file_name) {
                continue;
            }
            if self.filters.is_excluded(entry.path()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    report.errors.push(ScanError {
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.into_path();
            let extension = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase());
            report.records.push(FileRecord {
                size_bytes: metadata.len(),
                modified: metadata.modified().unwrap_or(UNIX_EPOCH),
                extension,
                mime: None,
                path,
            });
        }

        report.protected_skipped = pruned.get();
        report
    }
}
