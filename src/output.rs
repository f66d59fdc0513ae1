//! Output formatting and styling module.
//!
//! Centralizes all CLI output: colored status lines, progress bars, and the
//! summary views for organization runs, previews, undo, and duplicate
//! listings. Keeping the rendering here means the engine stays silent and
//! testable.

use crate::categories::CategoryTable;
use crate::engine::{PreviewReport, RunReport};
use crate::hasher::DuplicateMap;
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filetidy::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filetidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the full summary of a completed organization run.
    pub fn run_summary(report: &RunReport) {
        let stats = &report.stats;
        Self::summary_table(&report.category_counts, stats.moved);

        Self::header("RUN STATISTICS");
        println!("  Moved:                {}", stats.moved.to_string().green());
        println!("  Bytes moved:          {}", format_size(stats.total_bytes));
        println!("  Skipped:              {}", stats.skipped);
        println!("  Duplicates:           {}", stats.duplicates);
        println!("  Junk files:           {}", stats.junk);
        println!("  Protected skipped:    {}", stats.protected_skipped);
        println!("  Empty folders removed: {}", stats.empty_dirs_removed);
        if stats.errors > 0 {
            println!("  Errors:               {}", stats.errors.to_string().red());
        } else {
            println!("  Errors:               0");
        }

        if !report.scan_errors.is_empty() {
            Self::warning(&format!(
                "{} paths could not be scanned:",
                report.scan_errors.len()
            ));
            for error in report.scan_errors.iter().take(5) {
                Self::plain(&format!("    {}", error));
            }
            if report.scan_errors.len() > 5 {
                Self::plain(&format!("    ... and {} more", report.scan_errors.len() - 5));
            }
        }

        if report.cancelled {
            Self::warning("Run cancelled: remaining files were left in place");
        }
        Self::plain(&format!(
            "Journal written to {}",
            report.journal_path.display()
        ));
    }

    /// Prints what an organization run would do, without having done it.
    pub fn preview_summary(report: &PreviewReport) {
        Self::dry_run_notice("No files will be moved");

        Self::header("PREVIEW");
        println!("  Files found:       {}", report.total_files.to_string().green());
        println!("  Total size:        {}", format_size(report.total_bytes));
        println!("  Junk files:        {}", report.junk_files);
        println!("  Protected skipped: {}", report.protected_skipped);

        Self::summary_table(&report.category_counts, report.total_files);

        if !report.largest.is_empty() {
            Self::header("LARGEST FILES");
            for (path, size) in &report.largest {
                println!("  {:>10}  {}", format_size(*size), path.display());
            }
        }

        if !report.scan_errors.is_empty() {
            Self::warning(&format!(
                "{} paths could not be scanned",
                report.scan_errors.len()
            ));
        }
    }

    /// Prints the outcome of an undo run, listing anything not restored.
    pub fn undo_summary(report: &UndoReport) {
        if report.is_complete_success() {
            Self::success(&format!("Restored {} files", report.undone));
            return;
        }

        Self::warning(&format!(
            "Restored {} of {} files",
            report.undone,
            report.total_processed()
        ));
        for (path, reason) in &report.skipped {
            Self::plain(&format!("  skipped {}: {}", path.display(), reason));
        }
        for (path, reason) in &report.failed {
            Self::plain(&format!("  failed  {}: {}", path.display(), reason));
        }
    }

    /// Prints the duplicate groups recorded by the last run, biggest first.
    pub fn duplicate_listing(map: &DuplicateMap) {
        let mut groups = map.duplicate_groups();
        if groups.is_empty() {
            Self::info("No duplicates recorded in the last run");
            return;
        }
        groups.sort_by_key(|(_, paths)| Reverse(paths.len()));

        Self::header("DUPLICATE GROUPS");
        for (hash, paths) in groups.iter().take(10) {
            let short_hash = &hash[..hash.len().min(12)];
            println!("{}  {} copies", short_hash.yellow(), paths.len());
            for path in paths.iter().take(3) {
                println!("    {}", path.display());
            }
            if paths.len() > 3 {
                println!("    ... and {} more", paths.len() - 3);
            }
        }
        if groups.len() > 10 {
            Self::plain(&format!("... and {} more groups", groups.len() - 10));
        }
    }

    /// Prints every category, subcategory, and extension the table supports.
    pub fn types_listing(table: &CategoryTable) {
        Self::header("SUPPORTED FILE TYPES");
        for (category, subcategories) in table.groups() {
            println!("{}", category.bold());
            for (subcategory, extensions) in subcategories {
                println!("  {:<14} {}", subcategory, extensions.join(", "));
            }
        }
        Self::plain(&format!(
            "\n{} extensions across {} categories",
            table.extension_count(),
            table.groups().len()
        ));
    }

    /// Prints a table of destination folders and how many files each received.
    pub fn summary_table(category_counts: &BTreeMap<String, u64>, total_files: u64) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            let file_word = if *count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }
}

/// Renders a byte count with a binary unit, e.g. "1.5 MB".
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
