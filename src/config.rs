//! Engine configuration loaded from TOML files.
//!
//! Configuration covers three concerns: extra protected directory names,
//! exclusion rules applied while scanning, and run settings such as the junk
//! threshold and worker count. Every field has a default, so an absent or
//! partial file still yields a working configuration. Dotfiles are organized
//! like any other file; exclusions are always explicit.
//!
//! # Configuration File Format
//!
//! ```toml
//! [protected]
//! extra = ["Backups"]
//!
//! [scan]
//! exclude_filenames = ["Thumbs.db", "desktop.ini"]
//! exclude_patterns = ["*.part", "node_modules/**"]
//! exclude_extensions = ["crdownload"]
//! exclude_regex = []
//!
//! [run]
//! junk_threshold_kb = 10
//! max_workers = 4
//! max_reap_passes = 10
//! progress_update_interval = 50
//! journal_file = ".filetidy_journal.json"
//! duplicate_map_file = ".filetidy_duplicates.json"
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Extra protected directory names, on top of the built-in list.
    #[serde(default)]
    pub protected: ProtectedRules,

    /// Exclusion rules applied while scanning source directories.
    #[serde(default)]
    pub scan: ScanRules,

    /// Settings that shape a single organization run.
    #[serde(default)]
    pub run: RunSettings,
}

/// Additional protected directory names from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectedRules {
    #[serde(default)]
    pub extra: Vec<String>,
}

/// Rules for excluding files from a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub exclude_filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part", "node_modules/**").
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// File extensions to exclude (e.g., "crdownload").
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Regex patterns matched against filenames.
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

/// Settings that shape a single organization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Files smaller than this many kilobytes are routed to Junk. Zero disables.
    #[serde(default = "default_junk_threshold_kb")]
    pub junk_threshold_kb: u64,

    /// Number of parallel analysis workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Upper bound on empty-folder cleanup passes.
    #[serde(default = "default_max_reap_passes")]
    pub max_reap_passes: u32,

    /// Emit a progress update every N files.
    #[serde(default = "default_progress_update_interval")]
    pub progress_update_interval: usize,

    /// Journal filename, created inside the target directory.
    #[serde(default = "default_journal_file")]
    pub journal_file: String,

    /// Duplicate map filename, created inside the target directory.
    #[serde(default = "default_duplicate_map_file")]
    pub duplicate_map_file: String,
}

fn default_junk_threshold_kb() -> u64 {
    10
}

fn default_max_workers() -> usize {
    4
}

fn default_max_reap_passes() -> u32 {
    10
}

fn default_progress_update_interval() -> usize {
    50
}

fn default_journal_file() -> String {
    ".filetidy_journal.json".to_string()
}

fn default_duplicate_map_file() -> String {
    ".filetidy_duplicates.json".to_string()
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            junk_threshold_kb: default_junk_threshold_kb(),
            max_workers: default_max_workers(),
            max_reap_passes: default_max_reap_passes(),
            progress_update_interval: default_progress_update_interval(),
            journal_file: default_journal_file(),
            duplicate_map_file: default_duplicate_map_file(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `filetidy.toml` in the current directory
    /// 3. Look for `~/.config/filetidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from("filetidy.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl ScanRules {
    /// Compile the rules into matcher structures for the scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<ScanFilters, ConfigError> {
        let exclude_patterns = self
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = self
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScanFilters {
            exclude_filenames: self.exclude_filenames.iter().cloned().collect(),
            exclude_extensions: self
                .exclude_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }
}

/// Pre-compiled exclusion matchers for efficient per-file checks.
pub struct ScanFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl ScanFilters {
    /// Check if a file is excluded from organization.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Exact filename match
    /// 2. File extension match (case-insensitive)
    /// 3. Glob pattern match against the full path
    /// 4. Regex pattern match against the filename
    pub fn is_excluded(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return true;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return true;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return true;
        }

        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
