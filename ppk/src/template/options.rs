//! Placeholder options: parsing and conflict resolution
//!
//! The option list after the resource is a comma-separated mix of keywords
//! (`dir`, `eval`, `clean`, `remove-imports`) and include/exclude patterns.
//! Conflicts resolve here, as a pure pass that returns the normalized
//! options together with the warnings it produced.

use tracing::debug;

use crate::distance;

/// Recognized option keywords
pub const OPTION_KEYWORDS: &[&str] = &["dir", "eval", "clean", "remove-imports"];

/// What a placeholder resolves to. At most one primary type wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    File,
    Directory,
    Eval,
    Web,
}

/// Normalized options for one placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderOptions {
    pub kind: PlaceholderKind,
    pub clean: bool,
    pub remove_imports: bool,
    /// `+`-prefixed patterns: keep only matching files
    pub include_patterns: Vec<String>,
    /// bare, `-`-prefixed, or wildcard patterns: drop matching files
    pub ignore_patterns: Vec<String>,
}

impl PlaceholderOptions {
    fn with_kind(kind: PlaceholderKind) -> Self {
        Self {
            kind,
            clean: false,
            remove_imports: false,
            include_patterns: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Parse and normalize the options of one placeholder.
///
/// Resolution rules:
/// - resources starting with `http://`/`https://` are Web regardless of
///   `dir`/`eval` (warning when one was requested)
/// - of `dir` and `eval`, the first seen wins (warning for the loser)
/// - Directory and Eval clear `clean`/`remove-imports` (warning per flag)
/// - unknown tokens warn (with a close-match suggestion) and are dropped
pub fn parse(resource: &str, options_str: Option<&str>) -> (PlaceholderOptions, Vec<String>) {
    let is_url = resource.starts_with("http://") || resource.starts_with("https://");
    let mut options = PlaceholderOptions::with_kind(if is_url {
        PlaceholderKind::Web
    } else {
        PlaceholderKind::File
    });
    let mut warnings = Vec::new();
    let mut primary: Option<&str> = None;

    for token in options_str.unwrap_or_default().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token {
            "dir" | "eval" => match primary {
                None => primary = Some(if token == "dir" { "dir" } else { "eval" }),
                Some(first) => {
                    warnings.push(format!("Warning: ':{}' is ignored with ':{}'", token, first));
                }
            },
            "clean" => options.clean = true,
            "remove-imports" => options.remove_imports = true,
            _ if token.starts_with('+') => options.include_patterns.push(token[1..].to_string()),
            _ if token.starts_with('-') => options.ignore_patterns.push(token[1..].to_string()),
            _ if token.contains('*') => options.ignore_patterns.push(token.to_string()),
            _ => {
                debug!(%token, "options::parse: unknown option token");
                let warning = match distance::suggest(token, OPTION_KEYWORDS) {
                    Some(candidate) => {
                        format!("Warning: Unknown option ':{}' (did you mean ':{}'?)", token, candidate)
                    }
                    None => format!("Warning: Unknown option ':{}'", token),
                };
                warnings.push(warning);
            }
        }
    }

    match primary {
        Some(requested) if is_url => {
            warnings.push(format!("Warning: ':{}' is ignored for URL resources", requested));
        }
        Some("dir") => options.kind = PlaceholderKind::Directory,
        Some("eval") => options.kind = PlaceholderKind::Eval,
        _ => {}
    }

    // tree rendering and nested evaluation have no per-file content to modify
    if matches!(options.kind, PlaceholderKind::Directory | PlaceholderKind::Eval) {
        let primary_name = if options.kind == PlaceholderKind::Directory { "dir" } else { "eval" };
        if options.clean {
            options.clean = false;
            warnings.push(format!("Warning: ':clean' is ignored with ':{}'", primary_name));
        }
        if options.remove_imports {
            options.remove_imports = false;
            warnings.push(format!("Warning: ':remove-imports' is ignored with ':{}'", primary_name));
        }
    }

    (options, warnings)
}
