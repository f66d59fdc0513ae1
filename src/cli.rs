//! Command-line interface module for filetidy.
//!
//! This module owns the clap command definitions and the orchestration between
//! parsed arguments and the library: building the engine from configuration,
//! wiring Ctrl-C to the cancel flag, feeding progress into a bar, and routing
//! each subcommand to its runner.

use crate::categories::CategoryTable;
use crate::classifier::OrganizationMode;
use crate::config::EngineConfig;
use crate::engine::{OrganizePlan, Organizer, ProgressUpdate};
use crate::guard::PathGuard;
use crate::hasher::DuplicateMap;
use crate::output::OutputFormatter;
use crate::reaper;
use crate::resolver::DuplicateHandling;
use crate::undo::UndoEngine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// Top-level command line arguments.
#[derive(Debug, Parser)]
#[command(name = "filetidy")]
#[command(about = "Organize files from source directories into a categorized target tree")]
pub struct Cli {
    /// Path to a configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize files from source directories into the target tree.
    Organize(OrganizeArgs),
    /// Move files back to where the last run took them from.
    Undo {
        /// Target directory holding the journal.
        #[arg(long, value_name = "DIR")]
        target: PathBuf,
    },
    /// Remove empty folders under the given directories.
    Cleanup {
        /// Directories to sweep.
        #[arg(required = true, value_name = "DIR")]
        dirs: Vec<PathBuf>,
    },
    /// Show duplicate groups recorded by the last run.
    Duplicates {
        /// Target directory holding the duplicate map.
        #[arg(long, value_name = "DIR")]
        target: PathBuf,
    },
    /// List the supported categories and extensions.
    Types,
}

/// Arguments for the organize subcommand.
#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Source directories to organize.
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Target directory for the organized tree.
    #[arg(short, long, value_name = "DIR")]
    pub target: PathBuf,

    /// How to shape the target tree.
    #[arg(long, value_enum, default_value_t = ModeArg::ByType)]
    pub mode: ModeArg,

    /// What to do when a destination name is already taken.
    #[arg(long = "duplicates", value_enum, default_value_t = DuplicatesArg::Rename)]
    pub duplicate_handling: DuplicatesArg,

    /// Override the junk size threshold in kilobytes (0 disables).
    #[arg(long, value_name = "KB")]
    pub junk_threshold_kb: Option<u64>,

    /// Analyze and report without moving anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Organization mode as it appears on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    ByType,
    ByDate,
    BySize,
    ByExtension,
}

impl From<ModeArg> for OrganizationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ByType => OrganizationMode::ByType,
            ModeArg::ByDate => OrganizationMode::ByDate,
            ModeArg::BySize => OrganizationMode::BySize,
            ModeArg::ByExtension => OrganizationMode::ByExtension,
        }
    }
}

/// Collision policy as it appears on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DuplicatesArg {
    Rename,
    Skip,
    Replace,
    Merge,
}

impl From<DuplicatesArg> for DuplicateHandling {
    fn from(policy: DuplicatesArg) -> Self {
        match policy {
            DuplicatesArg::Rename => DuplicateHandling::Rename,
            DuplicatesArg::Skip => DuplicateHandling::Skip,
            DuplicatesArg::Replace => DuplicateHandling::Replace,
            DuplicatesArg::Merge => DuplicateHandling::MergeToDuplicates,
        }
    }
}

/// Runs the parsed command line to completion.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use filetidy::cli::{Cli, run};
///
/// let cli = Cli::parse();
/// if let Err(e) = run(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(cli: Cli) -> Result<(), String> {
    let config = EngineConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    match cli.command {
        Command::Organize(args) => run_organize(args, config),
        Command::Undo { target } => run_undo(&target, &config),
        Command::Cleanup { dirs } => run_cleanup(&dirs, &config),
        Command::Duplicates { target } => run_duplicates(&target, &config),
        Command::Types => {
            OutputFormatter::types_listing(&CategoryTable::standard());
            Ok(())
        }
    }
}

/// Organizes (or previews) according to the parsed arguments.
fn run_organize(args: OrganizeArgs, config: EngineConfig) -> Result<(), String> {
    if args.sources.iter().any(|source| *source == args.target) {
        return Err("Target directory cannot be one of the sources".to_string());
    }

    let mut organizer = Organizer::new(config).map_err(|e| e.to_string())?;
    let plan = OrganizePlan {
        sources: args.sources,
        target: args.target,
        mode: args.mode.into(),
        duplicate_handling: args.duplicate_handling.into(),
        junk_threshold_kb: args.junk_threshold_kb,
    };

    if args.dry_run {
        let report = organizer.preview(&plan).map_err(|e| e.to_string())?;
        OutputFormatter::preview_summary(&report);
        return Ok(());
    }

    install_cancel_handler(&organizer);

    let progress = OutputFormatter::create_progress_bar(0);
    let pb = progress.clone();
    organizer.on_progress(move |update: &ProgressUpdate<'_>| {
        pb.set_length(update.total as u64);
        pb.set_position(update.current as u64);
        let name = update
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(format!("{} {}", update.stage, name));
    });

    OutputFormatter::info(&format!("Organizing into {}", plan.target.display()));
    let result = organizer.organize(&plan);
    progress.finish_and_clear();

    match result {
        Ok(report) => {
            OutputFormatter::run_summary(&report);
            OutputFormatter::success("Organization complete");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Routes Ctrl-C into the organizer's cancel flag.
fn install_cancel_handler(organizer: &Organizer) {
    let flag = organizer.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }
}

fn run_undo(target: &Path, config: &EngineConfig) -> Result<(), String> {
    match UndoEngine::undo(target, &config.run.journal_file) {
        Ok(report) => {
            OutputFormatter::undo_summary(&report);
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn run_cleanup(dirs: &[PathBuf], config: &EngineConfig) -> Result<(), String> {
    let guard = PathGuard::with_extra(&config.protected.extra);
    for dir in dirs {
        if !dir.exists() {
            return Err(format!("Directory not found: {}", dir.display()));
        }
        if guard.is_protected(dir) {
            return Err(format!("Directory is protected: {}", dir.display()));
        }
    }

    let report = reaper::reap(dirs, &guard, config.run.max_reap_passes);
    if report.errors > 0 {
        OutputFormatter::warning(&format!("{} folders could not be removed", report.errors));
    }
    OutputFormatter::success(&format!("Removed {} empty folders", report.removed));
    Ok(())
}

fn run_duplicates(target: &Path, config: &EngineConfig) -> Result<(), String> {
    let map_path = target.join(&config.run.duplicate_map_file);
    match DuplicateMap::load(&map_path) {
        Ok(Some(map)) => {
            OutputFormatter::duplicate_listing(&map);
            Ok(())
        }
        Ok(None) => Err(format!(
            "No duplicate map found at {}. Run organize first.",
            map_path.display()
        )),
        Err(e) => Err(format!("Failed to read duplicate map: {}", e)),
    }
}
