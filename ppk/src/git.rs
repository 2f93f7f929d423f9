//! Git-backed file enumeration
//!
//! When a directory lives inside a git worktree, the selector prefers the
//! repository's own view of the tree: tracked files plus untracked files
//! that are not ignored. Everything shells out to the `git` binary.

use std::path::Path;

use eyre::{Result, eyre};
use tokio::process::Command;
use tracing::debug;

/// True when `dir` is inside a git worktree.
pub async fn is_work_tree(dir: &Path) -> bool {
    let output = Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .await;

    match output {
        Ok(out) => out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "true",
        Err(e) => {
            debug!(%e, "git::is_work_tree: git unavailable");
            false
        }
    }
}

/// List files under `dir` as git sees them: tracked plus untracked-but-not-
/// ignored, restricted to the subtree. Paths come back relative to `dir`.
pub async fn list_files(dir: &Path) -> Result<Vec<String>> {
    let output = Command::new("git")
        .args(["ls-files", "-co", "--exclude-standard"])
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| eyre!("failed to run git ls-files: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!("git ls-files failed: {}", stderr.trim()));
    }

    let files = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();

    Ok(files)
}
