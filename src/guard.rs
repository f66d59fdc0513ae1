//! Protected system path detection.
//!
//! Every path that the scanner, the mover, and the cleanup pass touch is first
//! checked against a guard so that system directories are never organized,
//! moved into, or swept for empty folders.

use std::path::Path;

/// Path component names that are never touched, compared case-insensitively.
const PROTECTED_NAMES: &[&str] = &[
    "windows",
    "windows.old",
    "android",
    "program files",
    "program files (x86)",
    "system32",
    "system volume information",
    "programdata",
    "recovery",
    "boot",
    "$recycle.bin",
    "hiberfil.sys",
    "pagefile.sys",
    "swapfile.sys",
];

/// Substrings that mark a component as system territory even when the full
/// name is not in the protected list (e.g. "windows-backup").
const SYSTEM_INDICATORS: &[&str] =
    &["system", "windows", "program files", "programdata", "recovery"];

/// Decides whether a path may be organized, scanned, or cleaned.
///
/// A path is protected when any of its components matches a protected name
/// exactly or contains a system indicator substring. Matching is
/// case-insensitive. Additional names can be supplied from configuration.
///
/// # Examples
///
/// ```
/// use filetidy::guard::PathGuard;
/// use std::path::Path;
///
/// let guard = PathGuard::new();
/// assert!(guard.is_protected(Path::new("C:/Windows/System32")));
/// assert!(guard.is_protected(Path::new("/mnt/data/ProgramData/app")));
/// assert!(!guard.is_protected(Path::new("/home/user/Downloads")));
/// ```
#[derive(Debug, Clone)]
pub struct PathGuard {
    protected_names: Vec<String>,
}

impl PathGuard {
    /// Creates a guard with the built-in protected names.
    pub fn new() -> Self {
        Self {
            protected_names: PROTECTED_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Creates a guard with the built-in names plus extra ones from config.
    pub fn with_extra(extra: &[String]) -> Self {
        let mut guard = Self::new();
        guard
            .protected_names
            .extend(extra.iter().map(|name| name.to_lowercase()));
        guard
    }

    /// Returns true when the path must not be touched.
    pub fn is_protected(&self, path: &Path) -> bool {
        for component in path.components() {
            let name = component.as_os_str().to_string_lossy().to_lowercase();
            if self.protected_names.iter().any(|p| *p == name) {
                return true;
            }
            if SYSTEM_INDICATORS
                .iter()
                .any(|indicator| name.contains(indicator))
            {
                return true;
            }
        }
        false
    }
}

impl Default for PathGuard {
    fn default() -> Self {
        Self::new()
    }
}
