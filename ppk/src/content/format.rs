//! Chunk formatting and diagnostic labels
//!
//! The default representation wraps each resolved resource in a
//! `===== label =====` header block; the `clean` modifier emits raw content
//! with no wrapper. Labels double as the keys of the included-resource
//! token table, so their exact shapes matter for downstream tooling.

use crate::IGNORE_BELOW_MARKER;

/// Wrap content in the standard header block.
pub fn wrap(label: &str, content: &str) -> String {
    format!("===== {} =====\n{}\n\n", label, content)
}

/// Label for a file chunk: `rel`, with `(imports removed)` when stripping
/// changed it and a `(clean ...)` wrapper when emitted without the header.
pub fn file_label(rel: &str, imports_removed: bool, clean: bool) -> String {
    let inner = if imports_removed { " (imports removed)" } else { "" };
    if clean {
        format!("{} (clean{})", rel, inner)
    } else {
        format!("{}{}", rel, inner)
    }
}

/// Header label for a rendered directory tree.
pub fn directory_header(resource: &str) -> String {
    format!("Directory Structure: {}", resource)
}

/// Token-table label for a rendered directory tree.
pub fn directory_label(resource: &str) -> String {
    format!("{} (directory tree)", resource)
}

/// Label for fetched web content.
pub fn web_label(url: &str, clean: bool) -> String {
    if clean {
        format!("{} (web page, clean)", url)
    } else {
        format!("{} (web page)", url)
    }
}

/// Truncate content at the first ignore-below marker line.
///
/// A marker line is the marker token on its own line, optionally behind a
/// `//` or `\\` comment lead-in. The marker line, everything after it, and
/// the line break before it are dropped.
pub fn truncate_below_marker(content: &str) -> String {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if is_marker_line(line) {
            let head = &content[..offset];
            let head = head.strip_suffix('\n').unwrap_or(head);
            let head = head.strip_suffix('\r').unwrap_or(head);
            return head.to_string();
        }
        offset += line.len();
    }
    content.to_string()
}

fn is_marker_line(line: &str) -> bool {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix("\\\\"))
        .unwrap_or(trimmed)
        .trim_start();
    rest.starts_with(IGNORE_BELOW_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_shape() {
        assert_eq!(wrap("src/a.ts", "body"), "===== src/a.ts =====\nbody\n\n");
    }

    #[test]
    fn test_file_labels() {
        assert_eq!(file_label("src/main.ts", false, false), "src/main.ts");
        assert_eq!(file_label("src/main.ts", true, false), "src/main.ts (imports removed)");
        assert_eq!(file_label("src/utils.js", false, true), "src/utils.js (clean)");
        assert_eq!(file_label("src/main.ts", true, true), "src/main.ts (clean (imports removed))");
    }

    #[test]
    fn test_directory_and_web_labels() {
        assert_eq!(directory_header("src"), "Directory Structure: src");
        assert_eq!(directory_label("src"), "src (directory tree)");
        assert_eq!(web_label("https://example.com", false), "https://example.com (web page)");
        assert_eq!(web_label("https://example.com", true), "https://example.com (web page, clean)");
    }

    #[test]
    fn test_truncate_with_slash_comment() {
        let content = format!("fn top() {{}}\n// {}\nfn bottom() {{}}\n", IGNORE_BELOW_MARKER);
        assert_eq!(truncate_below_marker(&content), "fn top() {}");
    }

    #[test]
    fn test_truncate_with_backslash_comment() {
        let content = format!("fn top() {{}}\n\\\\ {}\nfn bottom() {{}}\n", IGNORE_BELOW_MARKER);
        assert_eq!(truncate_below_marker(&content), "fn top() {}");
    }

    #[test]
    fn test_truncate_bare_marker() {
        let content = format!("keep\n{}\ndrop", IGNORE_BELOW_MARKER);
        assert_eq!(truncate_below_marker(&content), "keep");
    }

    #[test]
    fn test_no_marker_passes_through() {
        assert_eq!(truncate_below_marker("a\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn test_marker_on_first_line_empties_content() {
        let content = format!("// {}\nrest", IGNORE_BELOW_MARKER);
        assert_eq!(truncate_below_marker(&content), "");
    }
}
