use chrono::{DateTime, Local};
use filetidy::categories::CategoryTable;
use filetidy::classifier::OrganizationMode;
use filetidy::config::EngineConfig;
use filetidy::engine::{EngineError, OrganizePlan, Organizer, ProgressStage};
use filetidy::hasher::DuplicateMap;
use filetidy::journal::{Journal, JournalError};
use filetidy::resolver::DuplicateHandling;
use filetidy::undo::UndoEngine;
/// Integration tests for filetidy
///
/// These tests drive the complete pipeline end to end: scanning source
/// directories, classifying files, moving them into the target tree,
/// duplicate tracking, empty-folder cleanup, journaling, and undo.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Junk routing
/// 3. Organization modes
/// 4. Content-based detection
/// 5. Collision policies
/// 6. Duplicate tracking
/// 7. Undo
/// 8. Safety rails
/// 9. Cancellation and progress
/// 10. Preview mode
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture with separate source and target directories, mirroring the
/// two trees an organization run works across.
struct TestFixture {
    source_dir: TempDir,
    target_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with empty source and target directories.
    fn new() -> Self {
        let source_dir = TempDir::new().expect("Failed to create temp directory");
        let target_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture {
            source_dir,
            target_dir,
        }
    }

    /// Get the path to the source directory.
    fn source(&self) -> &Path {
        self.source_dir.path()
    }

    /// Get the path to the target directory.
    fn target(&self) -> &Path {
        self.target_dir.path()
    }

    fn source_path(&self, rel_path: &str) -> PathBuf {
        self.source_dir.path().join(rel_path)
    }

    fn target_path(&self, rel_path: &str) -> PathBuf {
        self.target_dir.path().join(rel_path)
    }

    /// Create a file under the source directory, creating parent folders as
    /// needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.source_path(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create a file under the target directory, creating parent folders as
    /// needed.
    fn create_target_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.target_path(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create an empty subdirectory chain under the source directory.
    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.source_path(rel_path)).expect("Failed to create subdirectory");
    }

    /// Build a plan organizing the fixture's source into its target.
    fn plan(&self, mode: OrganizationMode) -> OrganizePlan {
        OrganizePlan {
            sources: vec![self.source().to_path_buf()],
            target: self.target().to_path_buf(),
            mode,
            duplicate_handling: DuplicateHandling::Rename,
            junk_threshold_kb: None,
        }
    }

    /// Assert that a file exists under the target directory.
    fn assert_target_file_exists(&self, rel_path: &str) {
        let path = self.target_path(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that a file does NOT exist under the target directory.
    fn assert_target_file_not_exists(&self, rel_path: &str) {
        let path = self.target_path(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Assert that a file exists under the source directory.
    fn assert_source_file_exists(&self, rel_path: &str) {
        let path = self.source_path(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that a file does NOT exist under the source directory.
    fn assert_source_file_not_exists(&self, rel_path: &str) {
        let path = self.source_path(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// List all files under the source directory recursively.
    fn source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(&self.source().to_path_buf(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &PathBuf, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

/// Build an organizer from default configuration.
fn organizer() -> Organizer {
    Organizer::new(EngineConfig::default()).expect("Failed to build organizer")
}

// ============================================================================
// Test Data
// ============================================================================

/// Size for ordinary test files, above the default 10 KB junk threshold.
const BULK_SIZE: usize = 12 * 1024;

/// Build `len` bytes of content starting with `tag`, so files meant to be
/// distinct never hash alike.
fn filler(tag: &str, len: usize) -> Vec<u8> {
    let mut content = tag.as_bytes().to_vec();
    content.resize(len, b'.');
    content
}

/// PNG file header (minimal, just enough to be detected as PNG)
const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 image
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, // bit depth, color
    0xDE,
];

/// PNG content padded past the junk threshold.
fn png_payload() -> Vec<u8> {
    let mut content = PNG_HEADER.to_vec();
    content.resize(BULK_SIZE, 0);
    content
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_source() {
    let fixture = TestFixture::new();

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 0);
    assert!(!report.cancelled);

    // Even an empty run persists its journal and duplicate map.
    let journal = Journal::load(&report.journal_path)
        .expect("Failed to read journal")
        .expect("Journal file missing");
    assert!(journal.is_empty());
    assert!(report.duplicate_map_path.exists());
}

#[test]
fn test_organize_single_image() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", &filler("photo", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    assert_eq!(report.stats.total_bytes, BULK_SIZE as u64);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.category_counts.get("Images/JPEG"), Some(&1));
    fixture.assert_target_file_exists("Images/JPEG/photo.jpg");
    fixture.assert_source_file_not_exists("photo.jpg");
}

#[test]
fn test_organize_mixed_file_types() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", &filler("photo", BULK_SIZE));
    fixture.create_file("song.mp3", &filler("song", BULK_SIZE));
    fixture.create_file("bundle.zip", &filler("bundle", BULK_SIZE));
    fixture.create_file("paper.pdf", &filler("paper", BULK_SIZE));
    fixture.create_file("clip.mkv", &filler("clip", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 5);
    let journal = Journal::load(&report.journal_path)
        .expect("Failed to read journal")
        .expect("Journal should exist");
    assert_eq!(journal.len() as u64, report.stats.moved);
    fixture.assert_target_file_exists("Images/JPEG/photo.jpg");
    fixture.assert_target_file_exists("Audio/MP3/song.mp3");
    fixture.assert_target_file_exists("Compressed/ZIP/bundle.zip");
    fixture.assert_target_file_exists("Documents/PDF/paper.pdf");
    fixture.assert_target_file_exists("Videos/MKV/clip.mkv");

    assert!(
        fixture.source_files().is_empty(),
        "All source files should be moved"
    );
}

#[test]
fn test_custom_category_table_routes_files() {
    let fixture = TestFixture::new();
    fixture.create_file("save.dat", &filler("save", BULK_SIZE));

    let table = CategoryTable::from_groups(vec![(
        "Games".to_string(),
        vec![("Saves".to_string(), vec!["dat".to_string()])],
    )]);
    let organizer = organizer().with_category_table(table);
    let report = organizer
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Games/Saves/save.dat");
}

#[test]
fn test_nested_sources_are_flattened_and_swept() {
    let fixture = TestFixture::new();
    fixture.create_file("media/clips/video.mp4", &filler("video", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Videos/MP4/video.mp4");

    // The emptied folder chain is swept, the source root itself stays.
    assert_eq!(report.stats.empty_dirs_removed, 2);
    assert!(!fixture.source_path("media").exists());
    assert!(fixture.source().exists());
}

#[test]
fn test_empty_folders_swept_without_moves() {
    let fixture = TestFixture::new();
    fixture.create_subdir("hollow/inner");

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 0);
    assert_eq!(report.stats.empty_dirs_removed, 2);
    assert!(!fixture.source_path("hollow").exists());
    assert!(fixture.source().exists());
}

#[test]
fn test_run_artifacts_are_not_organized() {
    let fixture = TestFixture::new();
    fixture.create_file(".filetidy_journal.json", &filler("old journal", BULK_SIZE));
    fixture.create_file("report.txt", &filler("report", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Documents/Text/report.txt");
    fixture.assert_source_file_exists(".filetidy_journal.json");
}

// ============================================================================
// Test Suite 2: Junk Routing
// ============================================================================

#[test]
fn test_small_files_collect_in_junk() {
    let fixture = TestFixture::new();
    fixture.create_file("scrap.txt", &filler("scrap", 2 * 1024));
    fixture.create_file("report.txt", &filler("report", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 2);
    assert_eq!(report.stats.junk, 1);
    assert_eq!(report.category_counts.get("Junk"), Some(&1));
    fixture.assert_target_file_exists("Junk/scrap.txt");
    fixture.assert_target_file_exists("Documents/Text/report.txt");
}

#[test]
fn test_junk_threshold_can_be_disabled() {
    let fixture = TestFixture::new();
    fixture.create_file("scrap.txt", &filler("scrap", 2 * 1024));

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.junk_threshold_kb = Some(0);
    let report = organizer().organize(&plan).expect("Organize failed");

    assert_eq!(report.stats.junk, 0);
    fixture.assert_target_file_exists("Documents/Text/scrap.txt");
}

// ============================================================================
// Test Suite 3: Organization Modes
// ============================================================================

#[test]
fn test_organize_by_date_uses_modification_time() {
    let fixture = TestFixture::new();
    fixture.create_file("letter.txt", &filler("letter", BULK_SIZE));

    let modified: DateTime<Local> = fs::metadata(fixture.source_path("letter.txt"))
        .expect("Failed to read metadata")
        .modified()
        .expect("Failed to read modification time")
        .into();

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByDate))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists(&format!(
        "By Date/{}/{}/letter.txt",
        modified.format("%Y"),
        modified.format("%m-%B")
    ));
}

#[test]
fn test_organize_by_size_bins() {
    let fixture = TestFixture::new();
    fixture.create_file("small.bin", &filler("small", BULK_SIZE));
    fixture.create_file("medium.bin", &filler("medium", 2 * 1024 * 1024));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::BySize))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 2);
    fixture.assert_target_file_exists("By Size/Small (< 1MB)/small.bin");
    fixture.assert_target_file_exists("By Size/Medium (1-10MB)/medium.bin");
}

#[test]
fn test_organize_by_extension() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.TXT", &filler("notes", BULK_SIZE));
    fixture.create_file("README", &filler("readme", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByExtension))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 2);
    fixture.assert_target_file_exists("By Extension/TXT/notes.TXT");
    fixture.assert_target_file_exists("By Extension/NO_EXTENSION/README");
}

// ============================================================================
// Test Suite 4: Content-Based Detection
// ============================================================================

#[test]
fn test_extensionless_image_detected_by_content() {
    let fixture = TestFixture::new();
    fixture.create_file("snapshot", &png_payload());

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Images/Png/snapshot");
}

#[test]
fn test_unknown_extension_goes_to_uncategorized() {
    let fixture = TestFixture::new();
    fixture.create_file("data.zzz", &filler("data", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Others/Uncategorized/data.zzz");
}

#[test]
fn test_extensionless_undetectable_goes_to_unknown() {
    let fixture = TestFixture::new();
    fixture.create_file("MYSTERY", &filler("mystery", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Others/Unknown/MYSTERY");
}

// ============================================================================
// Test Suite 5: Collision Policies
// ============================================================================

#[test]
fn test_rename_policy_numbers_collisions() {
    let fixture = TestFixture::new();
    fixture.create_file("batch1/report.txt", &filler("first", BULK_SIZE));
    fixture.create_file("batch2/report.txt", &filler("second", BULK_SIZE));
    fixture.create_file("batch3/report.txt", &filler("third", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    // Scan order decides which file keeps the plain name, but the set of
    // destination names is fixed.
    assert_eq!(report.stats.moved, 3);
    fixture.assert_target_file_exists("Documents/Text/report.txt");
    fixture.assert_target_file_exists("Documents/Text/report (1).txt");
    fixture.assert_target_file_exists("Documents/Text/report (2).txt");
}

#[test]
fn test_skip_policy_leaves_source_in_place() {
    let fixture = TestFixture::new();
    fixture.create_target_file("Documents/Text/report.txt", b"already here");
    fixture.create_file("report.txt", &filler("incoming", BULK_SIZE));

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.duplicate_handling = DuplicateHandling::Skip;
    let report = organizer().organize(&plan).expect("Organize failed");

    assert_eq!(report.stats.moved, 0);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.total_bytes, 0);
    fixture.assert_source_file_exists("report.txt");
    assert_eq!(
        fs::read(fixture.target_path("Documents/Text/report.txt"))
            .expect("Failed to read target file"),
        b"already here"
    );
}

#[test]
fn test_replace_policy_overwrites_destination() {
    let fixture = TestFixture::new();
    fixture.create_target_file("Documents/Text/report.txt", b"stale copy");
    fixture.create_file("report.txt", &filler("fresh", BULK_SIZE));

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.duplicate_handling = DuplicateHandling::Replace;
    let report = organizer().organize(&plan).expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_source_file_not_exists("report.txt");
    assert_eq!(
        fs::read(fixture.target_path("Documents/Text/report.txt"))
            .expect("Failed to read target file"),
        filler("fresh", BULK_SIZE)
    );
}

#[test]
fn test_merge_policy_diverts_to_duplicates_folder() {
    let fixture = TestFixture::new();
    fixture.create_target_file("Documents/Text/report.txt", b"first arrival");
    fixture.create_file("report.txt", &filler("latecomer", BULK_SIZE));

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.duplicate_handling = DuplicateHandling::MergeToDuplicates;
    let report = organizer().organize(&plan).expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    fixture.assert_target_file_exists("Documents/Text/Duplicates/report.txt");
    assert_eq!(
        fs::read(fixture.target_path("Documents/Text/report.txt"))
            .expect("Failed to read target file"),
        b"first arrival"
    );
}

// ============================================================================
// Test Suite 6: Duplicate Tracking
// ============================================================================

#[test]
fn test_duplicate_contents_are_recorded() {
    let fixture = TestFixture::new();
    fixture.create_file("copy_a.txt", &filler("twin", BULK_SIZE));
    fixture.create_file("copy_b.txt", &filler("twin", BULK_SIZE));
    fixture.create_file("poem.txt", &filler("poem", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 3);
    assert_eq!(report.stats.duplicates, 1);

    let map = DuplicateMap::load(&report.duplicate_map_path)
        .expect("Failed to read duplicate map")
        .expect("Duplicate map missing");
    let groups = map.duplicate_groups();
    assert_eq!(groups.len(), 1, "Only the twin contents form a group");
    assert_eq!(groups[0].1.len(), 2);
}

// ============================================================================
// Test Suite 7: Undo
// ============================================================================

#[test]
fn test_undo_restores_moved_files() {
    let fixture = TestFixture::new();
    fixture.create_file("letter.txt", &filler("letter", BULK_SIZE));
    fixture.create_file("notes/memo.txt", &filler("memo", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");
    assert_eq!(report.stats.moved, 2);
    assert!(!fixture.source_path("notes").exists());

    let journal = Journal::load(&report.journal_path)
        .expect("Failed to read journal")
        .expect("Journal file missing");
    assert_eq!(journal.len(), 2);

    let undo_report =
        UndoEngine::undo(fixture.target(), ".filetidy_journal.json").expect("Undo failed");

    assert_eq!(undo_report.undone, 2);
    assert!(undo_report.is_complete_success());

    // Files are back where they started, including the recreated folder.
    fixture.assert_source_file_exists("letter.txt");
    fixture.assert_source_file_exists("notes/memo.txt");
    assert_eq!(
        fs::read(fixture.source_path("notes/memo.txt")).expect("Failed to read restored file"),
        filler("memo", BULK_SIZE)
    );
    fixture.assert_target_file_not_exists("Documents/Text/letter.txt");
    assert!(
        !report.journal_path.exists(),
        "Journal should be deleted after a complete undo"
    );
}

#[test]
fn test_undo_never_clobbers_occupied_location() {
    let fixture = TestFixture::new();
    fixture.create_file("report.txt", &filler("original", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");
    assert_eq!(report.stats.moved, 1);

    // A new file appears at the original location before the undo.
    fixture.create_file("report.txt", b"written after organizing");

    let undo_report =
        UndoEngine::undo(fixture.target(), ".filetidy_journal.json").expect("Undo failed");

    assert_eq!(undo_report.undone, 0);
    assert_eq!(undo_report.skipped.len(), 1);
    assert!(!undo_report.is_complete_success());

    assert_eq!(
        fs::read(fixture.source_path("report.txt")).expect("Failed to read source file"),
        b"written after organizing"
    );
    fixture.assert_target_file_exists("Documents/Text/report.txt");
    assert!(
        report.journal_path.exists(),
        "Journal should survive an incomplete undo"
    );
}

#[test]
fn test_undo_without_journal_fails() {
    let fixture = TestFixture::new();

    let result = UndoEngine::undo(fixture.target(), ".filetidy_journal.json");

    assert!(matches!(result, Err(JournalError::NotFound(_))));
}

// ============================================================================
// Test Suite 8: Safety Rails
// ============================================================================

#[test]
fn test_protected_folders_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_file("Windows/driver.dll", &filler("driver", BULK_SIZE));
    fixture.create_file("photo.jpg", &filler("photo", BULK_SIZE));

    let report = organizer()
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 1);
    assert!(report.stats.protected_skipped >= 1);
    fixture.assert_source_file_exists("Windows/driver.dll");
    fixture.assert_target_file_exists("Images/JPEG/photo.jpg");
}

#[test]
fn test_protected_target_is_rejected() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", &filler("photo", BULK_SIZE));

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.target = fixture.target_path("Windows");
    let result = organizer().organize(&plan);

    assert!(matches!(result, Err(EngineError::TargetUnavailable { .. })));
    fixture.assert_source_file_exists("photo.jpg");
}

#[test]
fn test_vanished_source_counts_as_error() {
    let fixture = TestFixture::new();
    fixture.create_file("ghost.txt", &filler("ghost", BULK_SIZE));

    let mut config = EngineConfig::default();
    config.run.progress_update_interval = 1;
    let mut organizer = Organizer::new(config).expect("Failed to build organizer");
    // Remove the file after analysis, right before the engine moves it.
    organizer.on_progress(|update| {
        if update.stage == ProgressStage::Moving {
            let _ = fs::remove_file(update.path);
        }
    });

    let report = organizer
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 0);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(
        report.stats.skipped, 0,
        "A vanished source is a failed move, not a policy skip"
    );

    // Nothing journaled for the failed move.
    let journal = Journal::load(&report.journal_path)
        .expect("Failed to read journal")
        .expect("Journal file missing");
    assert!(journal.is_empty());
}

#[test]
fn test_hash_failure_adds_no_extra_error() {
    let fixture = TestFixture::new();
    fixture.create_file("ghost.txt", &filler("ghost", BULK_SIZE));

    let mut config = EngineConfig::default();
    config.run.progress_update_interval = 1;
    let mut organizer = Organizer::new(config).expect("Failed to build organizer");
    // Remove the file before hashing. The failed hash is only logged; the
    // single error comes from the move that then finds no source.
    organizer.on_progress(|update| {
        if update.stage == ProgressStage::Analyzing {
            let _ = fs::remove_file(update.path);
        }
    });

    let report = organizer
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 0);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.duplicates, 0);
}

#[test]
fn test_missing_sources_fail_the_run() {
    let fixture = TestFixture::new();

    let mut plan = fixture.plan(OrganizationMode::ByType);
    plan.sources = vec![fixture.source_path("nowhere")];
    let result = organizer().organize(&plan);

    assert!(matches!(result, Err(EngineError::NoUsableSources)));
}

// ============================================================================
// Test Suite 9: Cancellation and Progress
// ============================================================================

#[test]
fn test_cancellation_stops_before_moving() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", &filler("photo", BULK_SIZE));

    let organizer = organizer();
    organizer.cancel_flag().store(true, Ordering::Relaxed);
    let report = organizer
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert!(report.cancelled);
    assert_eq!(report.stats.moved, 0);
    fixture.assert_source_file_exists("photo.jpg");

    // The journal is persisted even for a cancelled run.
    assert!(report.journal_path.exists());
}

#[test]
fn test_progress_updates_cover_both_stages() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", &filler("a", BULK_SIZE));
    fixture.create_file("b.txt", &filler("b", BULK_SIZE));
    fixture.create_file("c.txt", &filler("c", BULK_SIZE));

    let mut config = EngineConfig::default();
    config.run.progress_update_interval = 1;
    let mut organizer = Organizer::new(config).expect("Failed to build organizer");

    let updates = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&updates);
    organizer.on_progress(move |_| {
        seen.fetch_add(1, Ordering::Relaxed);
    });

    let report = organizer
        .organize(&fixture.plan(OrganizationMode::ByType))
        .expect("Organize failed");

    assert_eq!(report.stats.moved, 3);
    // One update per file in the analysis stage, one per file in the move stage.
    assert_eq!(updates.load(Ordering::Relaxed), 6);
}

// ============================================================================
// Test Suite 10: Preview Mode
// ============================================================================

#[test]
fn test_preview_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("report.txt", &filler("report", BULK_SIZE));
    fixture.create_file("scrap.txt", &filler("scrap", 2 * 1024));

    let preview = organizer()
        .preview(&fixture.plan(OrganizationMode::ByType))
        .expect("Preview failed");

    assert_eq!(preview.total_files, 2);
    assert_eq!(preview.total_bytes, (BULK_SIZE + 2 * 1024) as u64);
    assert_eq!(preview.junk_files, 1);
    assert_eq!(preview.category_counts.get("Documents/Text"), Some(&1));
    assert_eq!(preview.category_counts.get("Junk"), Some(&1));

    fixture.assert_source_file_exists("report.txt");
    fixture.assert_source_file_exists("scrap.txt");
    assert_eq!(
        fs::read_dir(fixture.target())
            .expect("Failed to read target directory")
            .count(),
        0,
        "Preview should write nothing into the target"
    );
}

#[test]
fn test_preview_ranks_largest_files() {
    let fixture = TestFixture::new();
    fixture.create_file("big.bin", &filler("big", 64 * 1024));
    fixture.create_file("mid.bin", &filler("mid", 32 * 1024));
    fixture.create_file("wee.bin", &filler("wee", 16 * 1024));

    let preview = organizer()
        .preview(&fixture.plan(OrganizationMode::ByType))
        .expect("Preview failed");

    assert_eq!(preview.largest.len(), 3);
    assert!(preview.largest[0].0.ends_with("big.bin"));
    assert_eq!(preview.largest[0].1, 64 * 1024);
    assert!(preview.largest[2].0.ends_with("wee.bin"));
}
