//! File categories and classification.
//!
//! The category set is fixed: it is seeded into the store once at
//! initialization and never changes afterwards. Classification uses the
//! `infer` crate to detect the content type from the file header (magic
//! bytes), falling back to the file extension for formats without a
//! signature such as plain text.

use infer::MatcherType;
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;

/// Reserved category for directory entries. Never counted in `total`.
pub const DIR: &str = "dir";

/// Synthetic category key summing every non-`dir` category.
pub const TOTAL: &str = "total";

/// Category for content that could not be identified.
pub const UNKNOWN: &str = "unknown";

/// Number of header bytes read for magic-byte detection.
const HEADER_LEN: u64 = 8192;

const FIXED_CATEGORIES: &[&str] = &[
    "app", "archive", "audio", "book", DIR, "doc", "font", "image", "text", UNKNOWN, "video",
];

/// Extensions recognized when the header carries no known signature.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "csv", "tsv", "log", "json", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "rs", "go", "py", "c", "h", "cpp", "hpp", "java", "js", "ts", "sh", "sql",
];
const DOC_EXTENSIONS: &[&str] = &["odt", "ods", "odp", "tex", "org"];

/// The full, ordered set of category names.
pub fn fixed_category_set() -> &'static [&'static str] {
    FIXED_CATEGORIES
}

pub fn is_known_category(name: &str) -> bool {
    FIXED_CATEGORIES.contains(&name)
}

/// Assigns one label from [`fixed_category_set`] to a filesystem entry.
pub trait Classify: Send + Sync {
    fn classify(&self, path: &Path, meta: &Metadata) -> String;
}

/// Default classifier: `dir` for directories, magic bytes for files,
/// extension table as fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicClassifier;

impl Classify for MagicClassifier {
    fn classify(&self, path: &Path, meta: &Metadata) -> String {
        if meta.is_dir() {
            return DIR.to_string();
        }
        let header = match read_header(path) {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!("Cannot read header of {}: {}", path.display(), e);
                Vec::new()
            }
        };
        classify_header(&header)
            .or_else(|| classify_extension(path))
            .unwrap_or(UNKNOWN)
            .to_string()
    }
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
    Ok(header)
}

/// Map the detected content type of a file header to a category.
pub fn classify_header(header: &[u8]) -> Option<&'static str> {
    let kind = infer::get(header)?;
    let category = match kind.matcher_type() {
        MatcherType::App => "app",
        MatcherType::Archive => "archive",
        MatcherType::Audio => "audio",
        MatcherType::Book => "book",
        MatcherType::Doc => "doc",
        MatcherType::Font => "font",
        MatcherType::Image => "image",
        MatcherType::Text => "text",
        MatcherType::Video => "video",
        MatcherType::Custom => UNKNOWN,
    };
    Some(category)
}

pub fn classify_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some("text")
    } else if DOC_EXTENSIONS.contains(&ext.as_str()) {
        Some("doc")
    } else {
        None
    }
}

/// Classify a path on disk with the default classifier.
pub fn classify_path(path: &Path) -> io::Result<String> {
    let meta = fs::symlink_metadata(path)?;
    Ok(MagicClassifier.classify(path, &meta))
}
