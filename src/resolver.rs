//! Destination collision resolution.
//!
//! When a file's computed destination already exists, the configured policy
//! decides what happens: probe for a free renamed slot, skip the file, replace
//! the occupant, or divert into a `Duplicates` folder next to the occupant.
//! Resolution is pure path arithmetic plus existence probes; directories are
//! created later by the mover, for the final path only.

use chrono::Local;
use std::path::{Path, PathBuf};

/// How many " (n)" suffixes to try before falling back to a timestamp name.
const MAX_RENAME_PROBES: u32 = 1000;

/// Policy applied when a destination path is already occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateHandling {
    /// Find a free name by appending " (n)", then a timestamp.
    Rename,
    /// Leave the source file where it is.
    Skip,
    /// Overwrite the existing destination.
    Replace,
    /// Divert into a `Duplicates` folder beside the occupant.
    MergeToDuplicates,
}

/// Outcome of resolving a candidate destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Move the file to this path.
    Final(PathBuf),
    /// Do not move the file.
    Skip,
}

/// Resolves a candidate destination against the collision policy.
///
/// An unoccupied candidate is always returned as-is. For `MergeToDuplicates`,
/// a collision inside the `Duplicates` folder itself is overwritten, so
/// repeated merges of a same-named file keep the latest copy.
pub fn resolve(candidate: &Path, policy: DuplicateHandling) -> Resolution {
    if !candidate.exists() {
        return Resolution::Final(candidate.to_path_buf());
    }

    match policy {
        DuplicateHandling::Rename => Resolution::Final(unique_destination(candidate)),
        DuplicateHandling::Skip => Resolution::Skip,
        DuplicateHandling::Replace => Resolution::Final(candidate.to_path_buf()),
        DuplicateHandling::MergeToDuplicates => {
            let parent = candidate.parent().unwrap_or_else(|| Path::new(""));
            let name = candidate.file_name().unwrap_or_default();
            Resolution::Final(parent.join("Duplicates").join(name))
        }
    }
}

/// Finds an unoccupied variant of an occupied path.
///
/// Tries `name (1).ext` through `name (1000).ext`, then gives up on counters
/// and appends a `%Y%m%d_%H%M%S` timestamp to the stem instead.
fn unique_destination(occupied: &Path) -> PathBuf {
    let parent = occupied.parent().unwrap_or_else(|| Path::new(""));
    let stem = occupied
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = occupied.extension().map(|e| e.to_string_lossy().into_owned());

    for counter in 1..=MAX_RENAME_PROBES {
        let name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let probe = parent.join(name);
        if !probe.exists() {
            return probe;
        }
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = match &extension {
        Some(ext) => format!("{}_{}.{}", stem, timestamp, ext),
        None => format!("{}_{}", stem, timestamp),
    };
    parent.join(name)
}
