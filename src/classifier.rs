//! File classification into destination category paths.
//!
//! A classification is the list of directory segments a file lands in under
//! the target, such as `["Images", "JPEG"]` or `["By Date", "2024", "03-March"]`.
//! The junk check runs first in every mode, so tiny files always collect in
//! one flat `Junk` folder regardless of how the rest of the tree is shaped.

use crate::categories::{CategoryTable, OTHERS_CATEGORY, classify_mime};
use crate::scanner::FileRecord;
use chrono::{DateTime, Local};

/// Folder that collects files below the junk size threshold.
pub const JUNK_CATEGORY: &str = "Junk";

/// How the target tree is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationMode {
    /// Category/Subcategory folders from the extension table.
    ByType,
    /// Year and month folders from the modification time.
    ByDate,
    /// Size-bin folders.
    BySize,
    /// One folder per uppercased extension.
    ByExtension,
}

/// Computes the destination segments for a file.
///
/// Files smaller than `junk_threshold_kb` kilobytes classify as junk in every
/// mode; a threshold of zero disables the check.
pub fn classify(
    record: &FileRecord,
    mode: OrganizationMode,
    junk_threshold_kb: u64,
    table: &CategoryTable,
) -> Vec<String> {
    if junk_threshold_kb > 0 && record.size_bytes < junk_threshold_kb * 1024 {
        return vec![JUNK_CATEGORY.to_string()];
    }

    match mode {
        OrganizationMode::ByType => classify_by_type(record, table),
        OrganizationMode::ByDate => classify_by_date(record),
        OrganizationMode::BySize => classify_by_size(record),
        OrganizationMode::ByExtension => classify_by_extension(record),
    }
}

/// True when by-type classification would consult the MIME type.
///
/// Lets the analysis stage sniff file headers only for the files whose
/// extension cannot settle the category.
pub fn needs_mime_sniff(record: &FileRecord, table: &CategoryTable) -> bool {
    match record.extension.as_deref() {
        None => true,
        Some(ext) => table.lookup_extension(ext).is_none(),
    }
}

fn classify_by_type(record: &FileRecord, table: &CategoryTable) -> Vec<String> {
    let Some(ext) = record.extension.as_deref() else {
        // No extension at all: the MIME type is the only signal.
        let (category, subcategory) = classify_mime(record.mime.as_deref());
        return vec![category, subcategory];
    };

    if let Some((category, subcategory)) = table.lookup_extension(ext) {
        return vec![category.to_string(), subcategory.to_string()];
    }

    // Unknown extension: trust a recognized MIME type, otherwise file the
    // oddball under a dedicated folder instead of the generic unknown bucket.
    let (category, subcategory) = classify_mime(record.mime.as_deref());
    if category != OTHERS_CATEGORY {
        vec![category, subcategory]
    } else {
        vec![OTHERS_CATEGORY.to_string(), "Uncategorized".to_string()]
    }
}

fn classify_by_date(record: &FileRecord) -> Vec<String> {
    let modified: DateTime<Local> = record.modified.into();
    vec![
        "By Date".to_string(),
        modified.format("%Y").to_string(),
        modified.format("%m-%B").to_string(),
    ]
}

fn classify_by_size(record: &FileRecord) -> Vec<String> {
    let mb = record.size_bytes as f64 / (1024.0 * 1024.0);
    let bin = if mb < 1.0 {
        "Small (< 1MB)"
    } else if mb < 10.0 {
        "Medium (1-10MB)"
    } else if mb < 100.0 {
        "Large (10-100MB)"
    } else {
        "Very Large (> 100MB)"
    };
    vec!["By Size".to_string(), bin.to_string()]
}

fn classify_by_extension(record: &FileRecord) -> Vec<String> {
    let folder = match record.extension.as_deref() {
        Some(ext) => ext.to_uppercase(),
        None => "NO_EXTENSION".to_string(),
    };
    vec!["By Extension".to_string(), folder]
}
