//! Category registry for type-based organization.
//!
//! This module owns the nested category table (category, subcategory, extensions)
//! used by the by-type organization mode, plus the MIME fallback used when an
//! extension is missing or unrecognized. Extension lookups are resolved in table
//! order, so an extension claimed by two groups always lands in the one declared
//! first.
//!
//! # Examples
//!
//! ```
//! use filetidy::categories::CategoryTable;
//!
//! let table = CategoryTable::standard();
//! assert_eq!(table.lookup_extension("jpg"), Some(("Images", "JPEG")));
//! assert_eq!(table.lookup_extension("pdf"), Some(("Documents", "PDF")));
//! assert_eq!(table.lookup_extension("zzz"), None);
//! ```

use log::warn;
use std::collections::HashMap;
use std::path::Path;

/// The built-in category table: (category, [(subcategory, [extensions])]).
///
/// Order matters. Extensions are matched first-come-first-served, so "py"
/// resolves to Executables/Scripts even though Code/Python also lists it.
const STANDARD_TABLE: &[(&str, &[(&str, &[&str])])] = &[
    (
        "Documents",
        &[
            ("PDF", &["pdf"]),
            ("Word", &["doc", "docx", "dot", "dotx", "docm"]),
            ("PowerPoint", &["ppt", "pptx", "pps", "ppsx", "odp", "potx"]),
            ("Excel", &["xls", "xlsx", "xlsm", "csv", "ods", "xlsb"]),
            ("Text", &["txt", "rtf", "md", "tex", "log", "readme", "rst"]),
            ("eBooks", &["epub", "mobi", "azw3", "djvu", "fb2", "lit"]),
            ("XPS", &["xps", "oxps"]),
            ("OtherDocs", &["odt", "abw", "pages", "wpd", "wps", "gdoc"]),
        ],
    ),
    (
        "Images",
        &[
            ("JPEG", &["jpg", "jpeg", "jpe", "jfif"]),
            ("PNG", &["png"]),
            ("GIF", &["gif"]),
            ("WebP", &["webp"]),
            ("BMP", &["bmp", "dib"]),
            ("TIFF", &["tif", "tiff"]),
            ("HEIC", &["heic", "heif"]),
            ("RAW", &["raw", "cr2", "nef", "arw", "orf", "sr2", "dng", "rw2"]),
            ("SVG", &["svg", "svgz"]),
            (
                "OtherImages",
                &["ico", "icns", "ppm", "pgm", "pbm", "psd", "xcf", "ai"],
            ),
        ],
    ),
    (
        "Videos",
        &[
            ("MP4", &["mp4", "m4v"]),
            ("MKV", &["mkv"]),
            ("AVI", &["avi"]),
            ("MOV", &["mov", "qt"]),
            ("WMV", &["wmv", "asf"]),
            ("FLV", &["flv", "f4v"]),
            ("WebM", &["webm"]),
            ("MTS", &["mts", "m2ts", "ts"]),
            ("3GP", &["3gp", "3g2"]),
            (
                "OtherVideos",
                &["vob", "mpg", "mpeg", "ogv", "rmvb", "divx", "m2v"],
            ),
        ],
    ),
    (
        "Audio",
        &[
            ("MP3", &["mp3"]),
            ("WAV", &["wav"]),
            ("FLAC", &["flac"]),
            ("AAC", &["aac", "m4a"]),
            ("OGG", &["ogg", "oga"]),
            ("WMA", &["wma"]),
            ("MIDI", &["mid", "midi"]),
            ("OtherAudio", &["opus", "amr", "aiff", "au", "ra", "ac3", "dts"]),
        ],
    ),
    (
        "Compressed",
        &[
            ("ZIP", &["zip", "zipx"]),
            ("RAR", &["rar", "r00", "r01", "r02"]),
            ("7Z", &["7z"]),
            // Compound suffixes like "tar.gz" surface as their final
            // extension, so those files land in the GZ bucket.
            ("TAR", &["tar", "tgz"]),
            ("GZ", &["gz", "bz2", "xz", "lz", "lzma"]),
            ("ISO", &["iso", "img", "bin", "cue", "mdf"]),
            ("DMG", &["dmg"]),
            ("OtherArchives", &["cab", "ace", "z", "sit", "sitx", "pak"]),
        ],
    ),
    (
        "Executables",
        &[
            ("Windows", &["exe", "msi", "scr", "com", "bat", "cmd"]),
            ("Linux", &["deb", "rpm", "run", "sh", "appimage", "snap"]),
            ("Mac", &["pkg", "dmg", "app"]),
            ("Scripts", &["ps1", "vbs", "py", "pl", "rb"]),
            ("OtherBins", &["bin", "out", "elf", "so", "dll"]),
        ],
    ),
    (
        "MobileApps",
        &[("Android", &["apk", "xapk", "apks", "aab"]), ("iOS", &["ipa"])],
    ),
    (
        "Code",
        &[
            ("Python", &["py", "pyw", "pyx", "pyi", "ipynb"]),
            (
                "Web",
                &["html", "htm", "css", "js", "ts", "jsx", "tsx", "vue", "svelte"],
            ),
            ("Java", &["java", "jar", "class", "scala", "kt"]),
            ("C_CPP", &["c", "cpp", "cc", "cxx", "h", "hpp", "hxx"]),
            ("Scripts", &["sh", "bash", "zsh", "fish", "csh", "tcsh"]),
            ("Data", &["json", "xml", "yml", "yaml", "toml", "ini", "cfg"]),
            ("PHP", &["php", "phtml"]),
            ("SQL", &["sql", "db", "sqlite", "sqlite3"]),
            (
                "Other",
                &["rs", "go", "pl", "rb", "lua", "cs", "swift", "dart", "r"],
            ),
        ],
    ),
    (
        "System",
        &[
            ("Logs", &["log", "trace", "out"]),
            ("Config", &["ini", "cfg", "conf", "reg", "plist", "settings"]),
            (
                "Cache",
                &["tmp", "temp", "bak", "old", "swp", "swo", "orig", "cache"],
            ),
        ],
    ),
    (
        "Fonts",
        &[
            ("TrueType", &["ttf", "ttc"]),
            ("OpenType", &["otf"]),
            ("Other", &["woff", "woff2", "eot", "pfb", "pfm"]),
        ],
    ),
    (
        "3D_Models",
        &[
            ("Common", &["obj", "fbx", "dae", "3ds", "blend", "max", "ma", "mb"]),
            ("CAD", &["dwg", "dxf", "step", "stp", "iges", "igs"]),
            ("STL", &["stl", "ply"]),
        ],
    ),
];

/// Category name used for files that cannot be classified.
pub const OTHERS_CATEGORY: &str = "Others";

/// Maps file extensions to (category, subcategory) pairs.
///
/// The table is declared as an ordered list of categories, each with an
/// ordered list of subcategories. When the same extension appears in more
/// than one group, the first declaration wins. Custom tables can be supplied
/// through [`CategoryTable::from_groups`].
#[derive(Debug, Clone)]
pub struct CategoryTable {
    groups: Vec<(String, Vec<(String, Vec<String>)>)>,
    extension_index: HashMap<String, (String, String)>,
}

impl CategoryTable {
    /// Creates a table with the built-in categories.
    pub fn standard() -> Self {
        let groups = STANDARD_TABLE
            .iter()
            .map(|(category, subcategories)| {
                let subcategories = subcategories
                    .iter()
                    .map(|(name, extensions)| {
                        let extensions =
                            extensions.iter().map(|ext| ext.to_string()).collect();
                        (name.to_string(), extensions)
                    })
                    .collect();
                (category.to_string(), subcategories)
            })
            .collect();
        Self::from_groups(groups)
    }

    /// Creates a table from custom groups, preserving declaration order.
    pub fn from_groups(groups: Vec<(String, Vec<(String, Vec<String>)>)>) -> Self {
        let mut extension_index = HashMap::new();
        for (category, subcategories) in &groups {
            for (subcategory, extensions) in subcategories {
                for ext in extensions {
                    // First declaration wins for shared extensions.
                    extension_index
                        .entry(ext.to_lowercase())
                        .or_insert_with(|| (category.clone(), subcategory.clone()));
                }
            }
        }
        Self {
            groups,
            extension_index,
        }
    }

    /// Looks up the (category, subcategory) pair for a file extension.
    ///
    /// The extension is matched case-insensitively and without a leading dot.
    /// Returns `None` when no group lists the extension.
    pub fn lookup_extension(&self, ext: &str) -> Option<(&str, &str)> {
        self.extension_index
            .get(&ext.to_lowercase())
            .map(|(category, subcategory)| (category.as_str(), subcategory.as_str()))
    }

    /// Returns the ordered category groups, for listing supported types.
    pub fn groups(&self) -> &[(String, Vec<(String, Vec<String>)>)] {
        &self.groups
    }

    /// Total number of extensions across all groups, counting repeats.
    pub fn extension_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|(_, subcategories)| subcategories.iter())
            .map(|(_, extensions)| extensions.len())
            .sum()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derives a (category, subcategory) pair from a MIME type.
///
/// Top-level MIME types map onto the broad categories; the subcategory is the
/// title-cased MIME subtype. A missing MIME type yields `Others/Unknown`.
///
/// # Examples
///
/// ```
/// use filetidy::categories::classify_mime;
///
/// assert_eq!(
///     classify_mime(Some("image/png")),
///     ("Images".to_string(), "Png".to_string())
/// );
/// assert_eq!(
///     classify_mime(None),
///     ("Others".to_string(), "Unknown".to_string())
/// );
/// ```
pub fn classify_mime(mime: Option<&str>) -> (String, String) {
    let Some(mime) = mime else {
        return (OTHERS_CATEGORY.to_string(), "Unknown".to_string());
    };

    let (main_type, sub_type) = mime.split_once('/').unwrap_or((mime, ""));
    let category = match main_type {
        "text" => "Documents",
        "image" => "Images",
        "video" => "Videos",
        "audio" => "Audio",
        // Most application/* payloads are document-like.
        "application" => "Documents",
        _ => OTHERS_CATEGORY,
    };

    (category.to_string(), title_case(sub_type))
}

/// Detects a MIME type by sniffing the file header with `infer`.
///
/// Reads only the short prefix `infer` needs, never the whole file. Read
/// failures are logged and reported as an unrecognized type.
pub fn sniff_mime(path: &Path) -> Option<String> {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => Some(kind.mime_type().to_string()),
        Ok(None) => None,
        Err(e) => {
            warn!("Cannot sniff MIME type of {}: {}", path.display(), e);
            None
        }
    }
}

/// Uppercases the first letter of each alphabetic run: "x-msvideo" -> "X-Msvideo".
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    if out.is_empty() {
        out.push_str("Unknown");
    }
    out
}
