/// Organization engine that runs the scan, analyze, and move pipeline.
///
/// A run walks the source trees, classifies and hashes the files on a bounded
/// worker pool, then moves them one by one into the categorized target tree.
/// All moves are journaled for undo, duplicate contents are tracked by hash,
/// and emptied source folders are swept afterwards. A cooperative cancel flag
/// stops the run between files, never in the middle of one.
use crate::categories::{CategoryTable, sniff_mime};
use crate::classifier::{JUNK_CATEGORY, OrganizationMode, classify, needs_mime_sniff};
use crate::config::{ConfigError, EngineConfig, RunSettings, ScanFilters};
use crate::guard::PathGuard;
use crate::hasher::{DuplicateMap, hash_file};
use crate::journal::{Journal, JournalError, Operation};
use crate::reaper;
use crate::resolver::{DuplicateHandling, Resolution, resolve};
use crate::scanner::{FileRecord, ScanError, Scanner};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Errors that abort an organization run outright.
///
/// Per-file problems never abort a run; they are counted in the statistics
/// and logged instead.
#[derive(Debug)]
pub enum EngineError {
    /// Configuration could not be compiled into a working engine.
    Config(ConfigError),
    /// Every requested source directory was missing or protected.
    NoUsableSources,
    /// The target directory is protected or could not be created.
    TargetUnavailable { path: PathBuf, source: io::Error },
    /// The operation journal could not be written.
    JournalPersist(JournalError),
    /// The duplicate map could not be written.
    DuplicateMapPersist { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "{}", e),
            EngineError::NoUsableSources => {
                write!(f, "No usable source directories to organize")
            }
            EngineError::TargetUnavailable { path, source } => {
                write!(
                    f,
                    "Target directory '{}' is unavailable: {}",
                    path.display(),
                    source
                )
            }
            EngineError::JournalPersist(e) => write!(f, "{}", e),
            EngineError::DuplicateMapPersist { path, source } => {
                write!(
                    f,
                    "Failed to write duplicate map '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Counters accumulated over one organization run.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Files moved into the target tree.
    pub moved: u64,
    /// Bytes carried by the moved files.
    pub total_bytes: u64,
    /// Files left in place, e.g. by the skip policy.
    pub skipped: u64,
    /// Moved files whose content duplicated an earlier file.
    pub duplicates: u64,
    /// Moved files that classified as junk.
    pub junk: u64,
    /// Files whose move failed. Scan and hash problems are reported
    /// separately and do not count here.
    pub errors: u64,
    /// Protected entries pruned from sources and scans.
    pub protected_skipped: u64,
    /// Empty source folders removed after moving.
    pub empty_dirs_removed: u64,
}

/// What to organize, where to, and how.
#[derive(Debug, Clone)]
pub struct OrganizePlan {
    pub sources: Vec<PathBuf>,
    pub target: PathBuf,
    pub mode: OrganizationMode,
    pub duplicate_handling: DuplicateHandling,
    /// Overrides the configured junk threshold when set.
    pub junk_threshold_kb: Option<u64>,
}

/// Pipeline stage a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Analyzing,
    Moving,
}

impl std::fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStage::Analyzing => write!(f, "Analyzing"),
            ProgressStage::Moving => write!(f, "Moving"),
        }
    }
}

/// A progress snapshot handed to the registered callback.
#[derive(Debug)]
pub struct ProgressUpdate<'a> {
    pub current: usize,
    pub total: usize,
    pub path: &'a Path,
    pub stage: ProgressStage,
}

type ProgressCallback = Box<dyn Fn(&ProgressUpdate<'_>) + Send + Sync>;

/// Outcome of one organization run.
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStatistics,
    pub scan_errors: Vec<ScanError>,
    pub journal_path: PathBuf,
    pub duplicate_map_path: PathBuf,
    /// True when the run stopped early on the cancel flag.
    pub cancelled: bool,
    /// Files moved per destination path, keyed like "Images/JPEG".
    pub category_counts: BTreeMap<String, u64>,
}

/// Read-only summary of what a run would do.
#[derive(Debug)]
pub struct PreviewReport {
    pub total_files: u64,
    pub total_bytes: u64,
    pub junk_files: u64,
    pub protected_skipped: u64,
    pub category_counts: BTreeMap<String, u64>,
    /// The largest files found, up to ten, biggest first.
    pub largest: Vec<(PathBuf, u64)>,
    pub scan_errors: Vec<ScanError>,
}

/// A file that passed analysis and is ready to move.
struct AnalyzedFile {
    record: FileRecord,
    segments: Vec<String>,
    /// Missing when the file could not be read for hashing.
    hash: Option<String>,
}

enum MoveOutcome {
    Moved(Operation),
    /// The skip policy left the file in place.
    Skipped,
    Failed(MoveError),
}

#[derive(Debug)]
enum MoveError {
    /// The file vanished between scanning and moving.
    SourceVanished {
        path: PathBuf,
    },
    DirectoryCreation {
        path: PathBuf,
        source: io::Error,
    },
    Transfer {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::SourceVanished { path } => {
                write!(f, "Source file vanished before move: {}", path.display())
            }
            MoveError::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            MoveError::Transfer {
                source_path,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source_path.display(),
                    destination.display(),
                    source
                )
            }
        }
    }
}

/// Runs organization pipelines against a fixed configuration.
///
/// One organizer can run several plans; the category table, path guard,
/// exclusion filters, and worker pool are built once.
pub struct Organizer {
    table: CategoryTable,
    guard: PathGuard,
    filters: ScanFilters,
    settings: RunSettings,
    pool: rayon::ThreadPool,
    cancel_flag: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl Organizer {
    /// Builds an organizer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when exclusion patterns do not compile or the worker
    /// pool cannot be created.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let filters = config.scan.compile().map_err(EngineError::Config)?;
        let guard = PathGuard::with_extra(&config.protected.extra);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.run.max_workers.max(1))
            .build()
            .map_err(|e| {
                EngineError::Config(ConfigError::ConfigInvalid(format!(
                    "cannot build worker pool: {}",
                    e
                )))
            })?;

        Ok(Self {
            table: CategoryTable::standard(),
            guard,
            filters,
            settings: config.run,
            pool,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            progress: None,
        })
    }

    /// Replaces the built-in category table.
    pub fn with_category_table(mut self, table: CategoryTable) -> Self {
        self.table = table;
        self
    }

    /// The flag that requests cooperative cancellation when set.
    ///
    /// The run finishes the file in flight, skips the cleanup sweep, and
    /// still persists the journal so completed moves stay undoable.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Registers a callback for periodic progress updates.
    pub fn on_progress<F>(&mut self, callback: F)
    where
        F: Fn(&ProgressUpdate<'_>) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
    }

    /// Organizes files from the plan's sources into its target tree.
    ///
    /// The sources are scanned up front, so moving files never feeds the scan.
    /// The journal and duplicate map are written into the target even when the
    /// run is cancelled or moves nothing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filetidy::classifier::OrganizationMode;
    /// use filetidy::config::EngineConfig;
    /// use filetidy::engine::{OrganizePlan, Organizer};
    /// use filetidy::resolver::DuplicateHandling;
    /// use std::path::PathBuf;
    ///
    /// let organizer = Organizer::new(EngineConfig::default())?;
    /// let plan = OrganizePlan {
    ///     sources: vec![PathBuf::from("/home/user/Downloads")],
    ///     target: PathBuf::from("/home/user/Organized"),
    ///     mode: OrganizationMode::ByType,
    ///     duplicate_handling: DuplicateHandling::Rename,
    ///     junk_threshold_kb: None,
    /// };
    /// let report = organizer.organize(&plan)?;
    /// println!("Moved {} files", report.stats.moved);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn organize(&self, plan: &OrganizePlan) -> EngineResult<RunReport> {
        let (sources, sources_protected) = self.usable_sources(&plan.sources)?;

        if self.guard.is_protected(&plan.target) {
            return Err(EngineError::TargetUnavailable {
                path: plan.target.clone(),
                source: io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "target is a protected system path",
                ),
            });
        }
        fs::create_dir_all(&plan.target).map_err(|e| EngineError::TargetUnavailable {
            path: plan.target.clone(),
            source: e,
        })?;

        let mut stats = RunStatistics {
            protected_skipped: sources_protected,
            ..Default::default()
        };

        let (records, scan_errors) = self.scan_sources(&sources, &mut stats);

        let analyzed = self.analyze(records, plan);

        let mut journal = Journal::new();
        let mut duplicate_map = DuplicateMap::new();
        let mut category_counts: BTreeMap<String, u64> = BTreeMap::new();
        let interval = self.settings.progress_update_interval.max(1);
        let move_total = analyzed.len();

        for (index, file) in analyzed.iter().enumerate() {
            if self.cancel_flag.load(Ordering::Relaxed) {
                warn!("Cancellation requested, stopping with moves pending");
                break;
            }
            let done = index + 1;
            if done % interval == 0 || done == move_total {
                self.report_progress(done, move_total, &file.record.path, ProgressStage::Moving);
            }

            match self.move_into_place(&plan.target, file, plan.duplicate_handling) {
                MoveOutcome::Moved(operation) => {
                    debug!(
                        "Moved {} -> {}",
                        operation.source.display(),
                        operation.destination.display()
                    );
                    if let Some(hash) = &file.hash
                        && duplicate_map.record(hash.clone(), operation.destination.clone())
                    {
                        stats.duplicates += 1;
                    }
                    if file.segments == [JUNK_CATEGORY] {
                        stats.junk += 1;
                    }
                    stats.moved += 1;
                    stats.total_bytes += file.record.size_bytes;
                    *category_counts.entry(file.segments.join("/")).or_insert(0) += 1;
                    journal.push(operation);
                }
                MoveOutcome::Skipped => {
                    info!("Skipping {}: destination occupied", file.record.path.display());
                    stats.skipped += 1;
                }
                MoveOutcome::Failed(e) => {
                    warn!("{}", e);
                    stats.errors += 1;
                }
            }
        }

        let cancelled = self.cancel_flag.load(Ordering::Relaxed);

        if !cancelled {
            let reap_report = reaper::reap(&sources, &self.guard, self.settings.max_reap_passes);
            stats.empty_dirs_removed = reap_report.removed;
            if reap_report.errors > 0 {
                warn!("{} empty folders could not be removed", reap_report.errors);
            }
        }

        let journal_path = plan.target.join(&self.settings.journal_file);
        journal
            .save(&journal_path)
            .map_err(EngineError::JournalPersist)?;

        let duplicate_map_path = plan.target.join(&self.settings.duplicate_map_file);
        duplicate_map
            .save(&duplicate_map_path)
            .map_err(|e| EngineError::DuplicateMapPersist {
                path: duplicate_map_path.clone(),
                source: e,
            })?;

        info!(
            "Organized {} files into {} ({} skipped, {} errors)",
            stats.moved,
            plan.target.display(),
            stats.skipped,
            stats.errors
        );

        Ok(RunReport {
            stats,
            scan_errors,
            journal_path,
            duplicate_map_path,
            cancelled,
            category_counts,
        })
    }

    /// Computes what a run would do without touching any file.
    pub fn preview(&self, plan: &OrganizePlan) -> EngineResult<PreviewReport> {
        let (sources, sources_protected) = self.usable_sources(&plan.sources)?;

        let mut stats = RunStatistics {
            protected_skipped: sources_protected,
            ..Default::default()
        };
        let (records, scan_errors) = self.scan_sources(&sources, &mut stats);

        let junk_threshold = plan
            .junk_threshold_kb
            .unwrap_or(self.settings.junk_threshold_kb);
        let classified: Vec<(FileRecord, Vec<String>)> = self.pool.install(|| {
            records
                .into_par_iter()
                .map(|mut record| {
                    if plan.mode == OrganizationMode::ByType
                        && needs_mime_sniff(&record, &self.table)
                    {
                        record.mime = sniff_mime(&record.path);
                    }
                    let segments = classify(&record, plan.mode, junk_threshold, &self.table);
                    (record, segments)
                })
                .collect()
        });

        let mut report = PreviewReport {
            total_files: classified.len() as u64,
            total_bytes: 0,
            junk_files: 0,
            protected_skipped: stats.protected_skipped,
            category_counts: BTreeMap::new(),
            largest: Vec::new(),
            scan_errors,
        };

        let mut sizes: Vec<(PathBuf, u64)> = Vec::with_capacity(classified.len());
        for (record, segments) in classified {
            report.total_bytes += record.size_bytes;
            if segments == [JUNK_CATEGORY] {
                report.junk_files += 1;
            }
            *report.category_counts.entry(segments.join("/")).or_insert(0) += 1;
            sizes.push((record.path, record.size_bytes));
        }
        sizes.sort_by_key(|(_, size)| Reverse(*size));
        sizes.truncate(10);
        report.largest = sizes;

        Ok(report)
    }

    /// Drops missing and protected sources, erroring when none remain.
    fn usable_sources(&self, sources: &[PathBuf]) -> EngineResult<(Vec<PathBuf>, u64)> {
        let mut usable = Vec::new();
        let mut protected = 0u64;

        for source in sources {
            if !source.exists() {
                warn!("Source directory not found, skipping: {}", source.display());
                continue;
            }
            if self.guard.is_protected(source) {
                warn!(
                    "Source directory is protected, skipping: {}",
                    source.display()
                );
                protected += 1;
                continue;
            }
            usable.push(source.clone());
        }

        if usable.is_empty() {
            return Err(EngineError::NoUsableSources);
        }
        Ok((usable, protected))
    }

    fn scan_sources(
        &self,
        sources: &[PathBuf],
        stats: &mut RunStatistics,
    ) -> (Vec<FileRecord>, Vec<ScanError>) {
        let artifact_names = vec![
            self.settings.journal_file.clone(),
            self.settings.duplicate_map_file.clone(),
        ];
        let scanner = Scanner::new(&self.guard, &self.filters, artifact_names);

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for source in sources {
            let report = scanner.scan(source);
            records.extend(report.records);
            errors.extend(report.errors);
            stats.protected_skipped += report.protected_skipped;
        }
        (records, errors)
    }

    /// Classifies and hashes the scanned files on the worker pool.
    ///
    /// Files that cannot be hashed are logged and stay out of duplicate
    /// tracking, but still move. Cancellation drops the remaining files
    /// without counting them.
    fn analyze(&self, records: Vec<FileRecord>, plan: &OrganizePlan) -> Vec<AnalyzedFile> {
        let junk_threshold = plan
            .junk_threshold_kb
            .unwrap_or(self.settings.junk_threshold_kb);
        let interval = self.settings.progress_update_interval.max(1);
        let total = records.len();
        let counter = AtomicUsize::new(0);

        self.pool.install(|| {
            records
                .into_par_iter()
                .filter_map(|mut record| {
                    if self.cancel_flag.load(Ordering::Relaxed) {
                        return None;
                    }
                    let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % interval == 0 || done == total {
                        self.report_progress(done, total, &record.path, ProgressStage::Analyzing);
                    }

                    if plan.mode == OrganizationMode::ByType
                        && needs_mime_sniff(&record, &self.table)
                    {
                        record.mime = sniff_mime(&record.path);
                    }
                    let segments = classify(&record, plan.mode, junk_threshold, &self.table);

                    let hash = match hash_file(&record.path) {
                        Ok(hash) => Some(hash),
                        Err(e) => {
                            warn!("Cannot hash {}: {}", record.path.display(), e);
                            None
                        }
                    };

                    Some(AnalyzedFile {
                        record,
                        segments,
                        hash,
                    })
                })
                .collect()
        })
    }

    /// Moves one analyzed file under the target, applying the collision policy.
    fn move_into_place(
        &self,
        target: &Path,
        file: &AnalyzedFile,
        policy: DuplicateHandling,
    ) -> MoveOutcome {
        let source_path = &file.record.path;
        if !source_path.exists() {
            return MoveOutcome::Failed(MoveError::SourceVanished {
                path: source_path.clone(),
            });
        }
        let Some(file_name) = source_path.file_name() else {
            return MoveOutcome::Failed(MoveError::Transfer {
                source_path: source_path.clone(),
                destination: target.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            });
        };

        let mut candidate = target.to_path_buf();
        for segment in &file.segments {
            candidate.push(segment);
        }
        candidate.push(file_name);

        let destination = match resolve(&candidate, policy) {
            Resolution::Final(path) => path,
            Resolution::Skip => return MoveOutcome::Skipped,
        };

        if let Some(parent) = destination.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            return MoveOutcome::Failed(MoveError::DirectoryCreation {
                path: parent.to_path_buf(),
                source: e,
            });
        }

        if let Err(e) = transfer(source_path, &destination) {
            return MoveOutcome::Failed(MoveError::Transfer {
                source_path: source_path.clone(),
                destination,
                source: e,
            });
        }

        MoveOutcome::Moved(Operation::moved(
            source_path.clone(),
            destination,
            file.record.size_bytes,
            file.hash.clone(),
        ))
    }

    fn report_progress(&self, current: usize, total: usize, path: &Path, stage: ProgressStage) {
        if let Some(callback) = &self.progress {
            callback(&ProgressUpdate {
                current,
                total,
                path,
                stage,
            });
        }
    }
}

/// Moves a file, falling back to copy-then-delete across filesystems.
///
/// On any failure the destination copy is removed, so a file is never left
/// half-moved in both places.
pub(crate) fn transfer(source: &Path, destination: &Path) -> io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    if let Err(e) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}
