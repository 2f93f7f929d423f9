//! Resource selection: expand a file or directory into the files to include
//!
//! Directories are enumerated through git (tracked + untracked-not-ignored)
//! when the path sits inside a worktree, with a recursive filesystem walk as
//! the fallback. Candidates then pass through include/exclude pattern
//! filtering before the absolute paths are returned in traversal order.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::git;

/// Errors from resource selection
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to list {path}: {message}")]
    List { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Select the files a placeholder resolves to.
///
/// `include` keeps only matching candidates when non-empty; `exclude` then
/// drops matches. Patterns are matched against the POSIX-style path relative
/// to `base_path` (see [`matches_pattern`] for the pattern classes).
pub async fn select(base_path: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>, SelectError> {
    if !base_path.exists() {
        return Err(SelectError::NotFound(base_path.to_path_buf()));
    }

    let candidates = if base_path.is_file() {
        vec![base_path.to_path_buf()]
    } else {
        enumerate_directory(base_path).await?
    };

    debug!(count = candidates.len(), ?base_path, "select: candidates enumerated");

    let mut selected = Vec::new();
    for abs in candidates {
        let rel = relative_posix(&abs, base_path);
        let base_name = abs.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();

        if !include.is_empty() && !include.iter().any(|p| matches_pattern(p, &rel, &base_name)) {
            continue;
        }
        if exclude.iter().any(|p| matches_pattern(p, &rel, &base_name)) {
            continue;
        }
        selected.push(abs);
    }

    debug!(count = selected.len(), "select: candidates after filtering");
    Ok(selected)
}

/// Enumerate files under a directory: git view first, walk fallback.
async fn enumerate_directory(dir: &Path) -> Result<Vec<PathBuf>, SelectError> {
    if git::is_work_tree(dir).await {
        debug!(?dir, "enumerate_directory: using git ls-files");
        let listed = git::list_files(dir).await.map_err(|e| SelectError::List {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        // ls-files keeps deleted-but-tracked entries; drop anything not on disk
        return Ok(listed.into_iter().map(|rel| dir.join(rel)).filter(|p| p.is_file()).collect());
    }

    debug!(?dir, "enumerate_directory: walking filesystem");
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| SelectError::List {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// POSIX-style path of `abs` relative to `base`.
fn relative_posix(abs: &Path, base: &Path) -> String {
    let rel = abs.strip_prefix(base).unwrap_or(abs);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Match one pattern against a candidate.
///
/// Three pattern classes, checked in order:
/// - the literal `.*` means "any path segment starting with a dot"
/// - patterns containing `*` or `/` are shell globs over the relative path
///   (dot-files included; a slash-free glob also matches the base name, so
///   `*.js` hits anywhere in the tree)
/// - patterns starting with `.` are exact extension matches; anything else
///   is an exact base-name match
pub fn matches_pattern(pattern: &str, rel_posix: &str, base_name: &str) -> bool {
    if pattern == ".*" {
        return rel_posix.split('/').any(|seg| seg.starts_with('.'));
    }

    if pattern.contains('*') || pattern.contains('/') {
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        return match glob::Pattern::new(pattern) {
            Ok(p) => {
                p.matches_with(rel_posix, options)
                    || (!pattern.contains('/') && p.matches_with(base_name, options))
            }
            Err(e) => {
                debug!(%pattern, %e, "matches_pattern: invalid glob, treating as non-match");
                false
            }
        };
    }

    if let Some(ext) = pattern.strip_prefix('.') {
        return Path::new(base_name).extension().and_then(|e| e.to_str()) == Some(ext);
    }

    base_name == pattern
}
