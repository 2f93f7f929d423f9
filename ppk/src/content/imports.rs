//! Import-statement stripping for TypeScript sources
//!
//! Removes single-line ES-module imports (including `import type`) so
//! included sources spend their tokens on logic instead of plumbing.
//! Side-effect imports (`import './x.css'`) and `require(...)` calls stay.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Extensions the stripper applies to; everything else is a no-op.
const STRIPPABLE_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// A static import with a `from` clause. The `[^'"]+?` segment rejects
/// side-effect imports, where a quote follows `import` immediately.
fn import_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*import\s+(?:type\s+)?[^'"]+?\s+from\s+['"][^'"]+['"]"#).unwrap())
}

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// True when the stripper applies to this path's extension.
pub fn applies_to(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STRIPPABLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Drop whole import lines, collapse runs of 3+ newlines to a single blank
/// line, and trim leading whitespace. Idempotent.
pub fn strip(content: &str) -> String {
    // split keeps the trailing empty segment so a final newline survives
    let kept: Vec<&str> = content.split('\n').filter(|line| !import_line().is_match(line)).collect();
    let joined = kept.join("\n");
    let collapsed = blank_runs().replace_all(&joined, "\n\n");
    collapsed.trim_start().to_string()
}
