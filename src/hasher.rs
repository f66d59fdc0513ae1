//! Content hashing and duplicate bookkeeping.
//!
//! Files are hashed with BLAKE3 through a fixed-size buffered reader so large
//! files never load fully into memory. The resulting hex digests feed a
//! [`DuplicateMap`] that groups destination paths by content and persists the
//! groups alongside the organized tree.

use log::warn;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

const HASH_BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB

/// Computes the BLAKE3 hash of a file, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Hashes each path and groups those sharing identical content.
///
/// Unreadable files are logged and left out. A hash carried by a single path
/// is not a duplicate and does not appear in the result.
pub fn group_by_hash(paths: &[PathBuf]) -> HashMap<String, Vec<PathBuf>> {
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for path in paths {
        match hash_file(path) {
            Ok(hash) => groups.entry(hash).or_default().push(path.clone()),
            Err(e) => warn!("Could not hash {}: {}", path.display(), e),
        }
    }
    groups.retain(|_, group| group.len() > 1);
    groups
}

/// Destination paths grouped by content hash.
///
/// Every moved file is recorded here; only groups holding more than one path
/// are duplicates, and only those are written to disk.
#[derive(Debug, Default)]
pub struct DuplicateMap {
    groups: HashMap<String, Vec<PathBuf>>,
}

impl DuplicateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a moved file under its hash.
    ///
    /// Returns true when the group now holds more than one path, i.e. this
    /// file duplicated an earlier one.
    pub fn record(&mut self, hash: String, destination: PathBuf) -> bool {
        let group = self.groups.entry(hash).or_default();
        group.push(destination);
        group.len() > 1
    }

    /// Groups with at least two paths, in no particular order.
    pub fn duplicate_groups(&self) -> Vec<(&String, &Vec<PathBuf>)> {
        self.groups
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.duplicate_groups().is_empty()
    }

    /// Writes the duplicate groups as pretty JSON, omitting singletons.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let filtered: HashMap<&String, &Vec<PathBuf>> = self
            .groups
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .collect();
        let json = serde_json::to_string_pretty(&filtered)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    /// Loads a previously saved map. Returns `None` when no map exists.
    pub fn load(path: &Path) -> io::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let groups: HashMap<String, Vec<PathBuf>> = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(Self { groups }))
    }
}
