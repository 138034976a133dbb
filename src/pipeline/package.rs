//! Naming and packaging of the converted PNG.

use crate::config::PNG_MIME;
use crate::output::NamedFile;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_PDF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// `resume.pdf` → `resume.png`, `CV.PDF` → `CV.png`.
///
/// Only one trailing `.pdf` is stripped; names without it simply gain
/// `.png`.
pub fn output_file_name(original: &str) -> String {
    format!("{}.png", RE_PDF_SUFFIX.replace(original, ""))
}

/// Package encoded bytes as the `image/png` artifact for `original_name`.
pub fn package_png(original_name: &str, png: Vec<u8>) -> NamedFile {
    NamedFile::new(output_file_name(original_name), png, PNG_MIME)
}
