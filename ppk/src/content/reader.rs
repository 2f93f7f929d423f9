//! Best-effort text decoding of included files
//!
//! Known text extensions decode as UTF-8 with a windows-1252 fallback.
//! Office/PDF extensions go to the document extractor. Everything else gets
//! a lossy UTF-8 decode guarded by a replacement-character heuristic so raw
//! binaries never land in the assembled prompt.

use std::path::Path;

use eyre::{Context, Result};
use tracing::debug;

use super::extract::{DocumentExtractor, is_office_extension};

/// Extensions read directly as text
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "csv", "json", "xml", "js", "ts", "tsx", "html", "css", "md", "ppk", "log", "yaml", "yml", "ini", "cfg",
    "conf", "sh", "bat", "ps1", "py", "rb", "php", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs", "swift", "kt",
];

/// Read a file and return its content as text.
///
/// IO failures propagate; decode problems degrade to explanatory bracketed
/// strings rather than errors.
pub async fn read_to_text(path: &Path, extractor: &dyn DocumentExtractor) -> Result<String> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if is_office_extension(&ext) {
        debug!(%name, %ext, "read_to_text: delegating to document extractor");
        return Ok(extractor.extract(path));
    }

    let bytes = tokio::fs::read(path)
        .await
        .context(format!("failed to read {}", path.display()))?;

    if TEXT_EXTENSIONS.contains(&ext.as_str()) || ext.is_empty() {
        return Ok(decode_text(bytes, &name));
    }

    Ok(decode_unknown(&bytes, &name, &ext))
}

/// UTF-8 first, windows-1252 second. The fallback cannot fail: every byte
/// maps to some character.
fn decode_text(bytes: Vec<u8>, name: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(%name, "decode_text: not UTF-8, falling back to windows-1252");
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Lossy decode for unknown extensions, with a binary heuristic: when more
/// than 10% of characters (and more than 5 in absolute terms) came out as
/// the replacement character over 100+ chars, the content is treated as
/// binary and replaced with a placeholder.
fn decode_unknown(bytes: &[u8], name: &str, ext: &str) -> String {
    let text = String::from_utf8_lossy(bytes).into_owned();

    let total = text.chars().count();
    let replacements = text.chars().filter(|c| *c == '\u{FFFD}').count();
    if total > 100 && replacements > 5 && replacements * 10 > total {
        debug!(%name, %ext, replacements, total, "decode_unknown: looks binary");
        return format!("[Content of binary file {} (ext: {}) is not displayed]", name, ext);
    }

    if text.trim().is_empty() {
        return format!("[Content of file {} could not be extracted or is empty (type: {})]", name, ext);
    }

    text
}
