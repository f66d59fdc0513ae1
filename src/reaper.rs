//! Empty directory cleanup after organization.
//!
//! Directories are swept bottom-up so that removing an empty leaf can make its
//! parent removable within the same pass. A directory counts as empty when it
//! holds nothing but hidden files and already-empty subdirectories; it is only
//! actually removed after a strict re-check finds zero entries, so a folder
//! kept alive by a hidden file is left in place. Scan roots themselves and
//! protected paths are never removed.

use crate::guard::PathGuard;
use log::warn;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of one cleanup invocation.
#[derive(Debug, Clone, Default)]
pub struct ReapReport {
    /// Directories removed across all passes.
    pub removed: u64,
    /// Removal attempts that failed.
    pub errors: u64,
    /// Passes executed, including the final pass that removed nothing.
    pub passes: u32,
}

/// Sweeps empty directories under the given roots.
///
/// Repeats until a pass removes nothing or `max_passes` is reached.
pub fn reap(roots: &[PathBuf], guard: &PathGuard, max_passes: u32) -> ReapReport {
    let mut report = ReapReport::default();

    for _ in 0..max_passes {
        report.passes += 1;
        let candidates = collect_candidates(roots, guard);

        let mut removed_this_pass = 0u64;
        for dir in candidates {
            // Strict re-check: hidden files make a candidate non-removable.
            match fs::read_dir(&dir) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        continue;
                    }
                }
                Err(_) => continue,
            }
            match fs::remove_dir(&dir) {
                Ok(()) => removed_this_pass += 1,
                Err(e) => {
                    warn!("Cannot remove empty folder {}: {}", dir.display(), e);
                    report.errors += 1;
                }
            }
        }

        report.removed += removed_this_pass;
        if removed_this_pass == 0 {
            break;
        }
    }

    report
}

/// Collects removable directories, deepest first.
fn collect_candidates(roots: &[PathBuf], guard: &PathGuard) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for root in roots {
        if guard.is_protected(root) {
            continue;
        }

        // Children are visited before parents, so a parent whose only
        // subdirectories are already marked empty becomes a candidate too.
        let mut known_empty: HashSet<PathBuf> = HashSet::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .contents_first(true)
            .into_iter()
            .filter_entry(|entry| !guard.is_protected(entry.path()));

        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_dir() || entry.depth() == 0 {
                continue;
            }
            let path = entry.into_path();
            if dir_has_real_content(&path, &known_empty) {
                continue;
            }
            known_empty.insert(path.clone());
            candidates.push(path);
        }
    }

    candidates.sort_by_key(|path| Reverse(path.components().count()));
    candidates
}

/// True when the directory holds anything besides hidden files and
/// known-empty subdirectories.
fn dir_has_real_content(dir: &Path, known_empty: &HashSet<PathBuf>) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        // Unreadable directories are left alone.
        return true;
    };

    for entry in entries.flatten() {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            if !known_empty.contains(&entry.path()) {
                return true;
            }
        } else {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && !name.starts_with('~') {
                return true;
            }
        }
    }
    false
}
