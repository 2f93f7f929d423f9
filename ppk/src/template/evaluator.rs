//! Template evaluation
//!
//! Walks the parsed node list in source order, expands each placeholder by
//! its resolved kind, and folds the results into a fresh output buffer.
//! Problems with a single placeholder become warnings (plus, for failures
//! mid-resolution, an inline error marker); they never abort the template.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result, eyre};
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info};

use crate::content::extract::{DocumentExtractor, UnavailableExtractor};
use crate::content::{format, imports, reader};
use crate::files::{SelectError, selector, tree};
use crate::template::options::{PlaceholderKind, PlaceholderOptions};
use crate::template::parser::{self, TemplateNode};
use crate::tokens;
use crate::web::{self, WebFetcher};

/// Nesting cap for eval placeholders; covers cycles and runaway chains alike
pub const MAX_EVAL_DEPTH: usize = 10;

/// Result of expanding one template
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// The assembled prompt text
    pub content: String,
    /// Every recoverable problem, in discovery order
    pub warnings: Vec<String>,
    /// Diagnostic label -> token count for each included resource.
    /// Labels are not unique keys; collisions overwrite.
    pub included_files: BTreeMap<String, usize>,
    /// Token count of `content`, recomputed from the final text
    pub total_tokens: usize,
}

struct EvalOutput {
    content: String,
    included: BTreeMap<String, usize>,
}

/// Expands templates against a base directory.
pub struct Evaluator {
    /// Exclude patterns merged into every selection
    global_excludes: Vec<String>,
    fetcher: WebFetcher,
    extractor: Arc<dyn DocumentExtractor>,
}

impl Evaluator {
    pub fn new(global_excludes: Vec<String>) -> Self {
        Self {
            global_excludes,
            fetcher: WebFetcher::new(),
            extractor: Arc::new(UnavailableExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Expand a template file. Failure to read the file itself is the one
    /// fatal error; everything downstream degrades to warnings.
    pub async fn process_file(&self, template_path: &Path) -> Result<ProcessResult> {
        let raw = tokio::fs::read_to_string(template_path)
            .await
            .context(format!("failed to read template {}", template_path.display()))?;

        let base = template_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        self.process_text(&raw, base).await
    }

    /// Expand raw template text against a base directory.
    pub async fn process_text(&self, template: &str, base_path: &Path) -> Result<ProcessResult> {
        let mut warnings = Vec::new();
        let output = self.evaluate(template, base_path, 0, &mut warnings).await?;

        // the total is taken from the final text, so it matches what a
        // consumer gets by tokenizing the returned string; the per-resource
        // counts stay piecewise
        let total_tokens = tokens::count(&output.content);

        info!(
            total_tokens,
            included = output.included.len(),
            warnings = warnings.len(),
            "process_text: template expanded"
        );

        Ok(ProcessResult {
            content: output.content,
            warnings,
            included_files: output.included,
            total_tokens,
        })
    }

    fn evaluate<'a>(
        &'a self,
        template: &'a str,
        base_path: &'a Path,
        depth: usize,
        warnings: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<EvalOutput>> {
        Box::pin(async move {
            let nodes = parser::parse(template, warnings);
            let mut content = String::new();
            let mut included = BTreeMap::new();

            for node in nodes {
                match node {
                    TemplateNode::Text { content: text } => content.push_str(&text),
                    TemplateNode::Placeholder { resource, options, .. } => {
                        let expanded = self
                            .expand_placeholder(&resource, &options, base_path, depth, warnings, &mut included)
                            .await;
                        match expanded {
                            Ok(replacement) => content.push_str(&replacement),
                            Err(e) => {
                                debug!(%resource, %e, "evaluate: placeholder failed");
                                warnings.push(format!("Warning: Error processing placeholder: {} - {}", resource, e));
                                content.push_str(&format!("[Error processing placeholder: {} - {}]", resource, e));
                            }
                        }
                    }
                }
            }

            Ok(EvalOutput { content, included })
        })
    }

    async fn expand_placeholder(
        &self,
        resource: &str,
        options: &PlaceholderOptions,
        base_path: &Path,
        depth: usize,
        warnings: &mut Vec<String>,
        included: &mut BTreeMap<String, usize>,
    ) -> Result<String> {
        debug!(%resource, kind = ?options.kind, depth, "expand_placeholder: called");
        match options.kind {
            PlaceholderKind::File => self.expand_files(resource, options, base_path, warnings, included).await,
            PlaceholderKind::Directory => self.expand_directory(resource, options, base_path, warnings, included).await,
            PlaceholderKind::Eval => self.expand_eval(resource, base_path, depth, warnings, included).await,
            PlaceholderKind::Web => self.expand_web(resource, options, included).await,
        }
    }

    async fn expand_files(
        &self,
        resource: &str,
        options: &PlaceholderOptions,
        base_path: &Path,
        warnings: &mut Vec<String>,
        included: &mut BTreeMap<String, usize>,
    ) -> Result<String> {
        let target = base_path.join(resource);
        let files = match self.select(&target, options).await {
            Ok(files) => files,
            Err(SelectError::NotFound(_)) => {
                warnings.push(format!("Warning: Error processing placeholder: {} - path not found", resource));
                return Ok(String::new());
            }
            Err(e) => return Err(eyre!(e)),
        };

        if files.is_empty() {
            warnings.push(format!(
                "Warning: Error processing placeholder: {} - no files matched the given patterns",
                resource
            ));
            return Ok(String::new());
        }

        let mut chunks = String::new();
        for file in &files {
            let text = match reader::read_to_text(file, &*self.extractor).await {
                Ok(text) => text,
                Err(e) => {
                    warnings.push(format!("Warning: Error reading {}: {}", file.display(), e));
                    continue;
                }
            };
            let text = format::truncate_below_marker(&text);

            let (text, stripped) = if options.remove_imports && imports::applies_to(file) {
                let stripped_text = imports::strip(&text);
                let changed = stripped_text != text;
                (stripped_text, changed)
            } else {
                (text, false)
            };

            let rel = display_rel(file, base_path, &target, resource);
            let label = format::file_label(&rel, stripped, options.clean);
            let chunk = if options.clean {
                text
            } else {
                format::wrap(&label, &text)
            };

            included.insert(label, tokens::count(&chunk));
            chunks.push_str(&chunk);
        }

        if options.clean && files.len() > 1 {
            warnings.push(format!(
                "Warning: ':clean' flattened {} files from '{}' with no separators",
                files.len(),
                resource
            ));
        }

        Ok(chunks)
    }

    async fn expand_directory(
        &self,
        resource: &str,
        options: &PlaceholderOptions,
        base_path: &Path,
        warnings: &mut Vec<String>,
        included: &mut BTreeMap<String, usize>,
    ) -> Result<String> {
        let target = base_path.join(resource);
        let files = match self.select(&target, options).await {
            Ok(files) => files,
            Err(SelectError::NotFound(_)) => {
                warnings.push(format!("Warning: Error processing placeholder: {} - path not found", resource));
                return Ok(String::new());
            }
            Err(e) => return Err(eyre!(e)),
        };

        // an empty selection still renders the bare root; only missing paths warn
        let rels: Vec<String> = files.iter().map(|f| posix_rel(f, &target)).collect();

        let root_name = target
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| resource.to_string());

        let rendered = tree::render(&root_name, &rels);
        let chunk = format::wrap(&format::directory_header(resource), &rendered);
        included.insert(format::directory_label(resource), tokens::count(&chunk));
        Ok(chunk)
    }

    async fn expand_eval(
        &self,
        resource: &str,
        base_path: &Path,
        depth: usize,
        warnings: &mut Vec<String>,
        included: &mut BTreeMap<String, usize>,
    ) -> Result<String> {
        if depth >= MAX_EVAL_DEPTH {
            return Err(eyre!("eval nesting deeper than {} levels", MAX_EVAL_DEPTH));
        }

        let target = base_path.join(resource);
        let raw = tokio::fs::read_to_string(&target)
            .await
            .context(format!("failed to read template {}", target.display()))?;

        let child_base = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!(%resource, depth, "expand_eval: recursing");
        let child = self.evaluate(&raw, &child_base, depth + 1, warnings).await?;

        included.insert(format!("eval:{}", resource), tokens::count(&child.content));
        for (label, count) in child.included {
            included.insert(format!("eval:{}:{}", resource, label), count);
        }

        Ok(child.content)
    }

    async fn expand_web(
        &self,
        resource: &str,
        options: &PlaceholderOptions,
        included: &mut BTreeMap<String, usize>,
    ) -> Result<String> {
        let page = self.fetcher.fetch(resource).await?;
        let text = web::page_to_text(&page, resource);

        let label = format::web_label(resource, options.clean);
        let chunk = if options.clean {
            text
        } else {
            format::wrap(&label, &text)
        };

        included.insert(label, tokens::count(&chunk));
        Ok(chunk)
    }

    async fn select(&self, target: &Path, options: &PlaceholderOptions) -> Result<Vec<PathBuf>, SelectError> {
        let mut excludes = options.ignore_patterns.clone();
        excludes.extend(self.global_excludes.iter().cloned());
        selector::select(target, &options.include_patterns, &excludes).await
    }
}

fn posix_rel(file: &Path, base: &Path) -> String {
    let rel = file.strip_prefix(base).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path shown in wrappers and labels: relative to the template's base
/// directory when possible, otherwise re-rooted at the written resource.
fn display_rel(file: &Path, base_path: &Path, target: &Path, resource: &str) -> String {
    if let Ok(rel) = file.strip_prefix(base_path) {
        return rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
    }
    let rel = posix_rel(file, target);
    if rel.is_empty() {
        resource.to_string()
    } else {
        format!("{}/{}", resource.trim_end_matches('/'), rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(Vec::new())
    }

    #[tokio::test]
    async fn test_plain_template_is_identity() {
        let temp = tempdir().unwrap();
        let template = "Nothing to expand here.\nJust text.";

        let result = evaluator().process_text(template, temp.path()).await.unwrap();

        assert_eq!(result.content, template);
        assert!(result.warnings.is_empty());
        assert!(result.included_files.is_empty());
        assert_eq!(result.total_tokens, tokens::count(template));
    }

    #[tokio::test]
    async fn test_single_file_placeholder() {
        let temp = tempdir().unwrap();
        write(temp.path(), "file1.js", "console.log(\"Hello\");");

        let result = evaluator()
            .process_text("Intro.\n{{@file1.js}}\nEnd.", temp.path())
            .await
            .unwrap();

        assert_eq!(
            result.content,
            "Intro.\n===== file1.js =====\nconsole.log(\"Hello\");\n\n\nEnd."
        );
        assert!(result.warnings.is_empty());
        let expected_chunk = "===== file1.js =====\nconsole.log(\"Hello\");\n\n";
        assert_eq!(result.included_files["file1.js"], tokens::count(expected_chunk));
    }

    #[tokio::test]
    async fn test_nested_file_keeps_base_relative_path() {
        let temp = tempdir().unwrap();
        write(temp.path(), "subdir/file3.txt", "Nested file content");

        let result = evaluator()
            .process_text("Folder contents:\n{{@subdir}}\nEnd.", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== subdir/file3.txt =====\nNested file content\n\n"));
        assert!(result.included_files.contains_key("subdir/file3.txt"));
    }

    #[tokio::test]
    async fn test_missing_resource_warns_and_vanishes() {
        let temp = tempdir().unwrap();

        let result = evaluator()
            .process_text("A\n{{@missing.txt}}\nB", temp.path())
            .await
            .unwrap();

        assert_eq!(result.content, "A\n\nB");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("missing.txt"));
    }

    #[tokio::test]
    async fn test_include_pattern_restricts_selection() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.js", "js content");
        write(temp.path(), "b.md", "md content");

        let result = evaluator().process_text("{{@.:+*.js}}", temp.path()).await.unwrap();

        assert!(result.content.contains("a.js ====="));
        assert!(result.content.contains("js content"));
        assert!(!result.content.contains("b.md"));
        assert!(!result.content.contains("md content"));
    }

    #[tokio::test]
    async fn test_include_and_exclude_combine_as_difference() {
        let temp = tempdir().unwrap();
        write(temp.path(), "keep.js", "keep");
        write(temp.path(), "subdir/drop.js", "drop");

        let result = evaluator()
            .process_text("{{@.:+*.js,-**/subdir/**}}", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("keep.js"));
        assert!(!result.content.contains("drop.js"));
    }

    #[tokio::test]
    async fn test_no_files_after_filtering_is_one_warning() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.md", "# md");

        let result = evaluator()
            .process_text("No files here:\n{{@.:+*.nonexistent}}\nEnd.", temp.path())
            .await
            .unwrap();

        assert!(!result.content.contains("====="));
        assert!(result.content.contains("No files here:"));
        assert!(result.content.contains("End."));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Error processing placeholder"));
    }

    #[tokio::test]
    async fn test_directory_tree_rendering() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/index.js", "root");
        write(temp.path(), "src/components/Button.js", "b");
        write(temp.path(), "src/components/Card.js", "c");

        let result = evaluator().process_text("{{@src:dir}}", temp.path()).await.unwrap();

        assert!(result.content.contains("===== Directory Structure: src =====\n"));
        assert!(result.content.contains("src/\n"));
        assert!(result.content.contains("├── components/\n"));
        assert!(result.content.contains("│   ├── Button.js\n"));
        assert!(result.content.contains("│   └── Card.js\n"));
        assert!(result.content.contains("└── index.js"));
        assert!(result.included_files.contains_key("src (directory tree)"));
    }

    #[tokio::test]
    async fn test_directory_tree_hides_emptied_directories() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/components/Button.js", "b");
        write(temp.path(), "src/docs/readme.md", "r");

        let result = evaluator().process_text("{{@src:dir,*.js}}", temp.path()).await.unwrap();

        // components only held a .js file, so it disappears with it
        assert!(!result.content.contains("components/"));
        assert!(!result.content.contains("Button.js"));
        assert!(result.content.contains("docs/"));
        assert!(result.content.contains("readme.md"));
    }

    #[tokio::test]
    async fn test_modifier_cleared_with_dir_warns() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/main.ts", "import { A } from 'a';\nlet x = 1;\n");

        let result = evaluator()
            .process_text("{{@src:remove-imports,dir}}", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== Directory Structure: src ====="));
        assert!(result.content.contains("main.ts"));
        assert_eq!(result.warnings, vec!["Warning: ':remove-imports' is ignored with ':dir'"]);
        assert!(result.included_files.contains_key("src (directory tree)"));
    }

    #[tokio::test]
    async fn test_remove_imports_on_single_file() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "src/main.ts",
            "import { Component } from '@angular/core';\nimport './keep.css';\n\nconsole.log('hi');\n",
        );

        let result = evaluator()
            .process_text("{{@src/main.ts:remove-imports}}", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== src/main.ts (imports removed) =====\n"));
        assert!(!result.content.contains("@angular/core"));
        assert!(result.content.contains("import './keep.css';"));
        assert!(result.included_files.contains_key("src/main.ts (imports removed)"));
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_remove_imports_is_noop_for_other_extensions() {
        let temp = tempdir().unwrap();
        write(temp.path(), "utils.js", "const fs = require('fs');\n");

        let result = evaluator()
            .process_text("{{@utils.js:remove-imports}}", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== utils.js =====\n"));
        assert!(result.content.contains("require('fs')"));
        assert!(result.warnings.is_empty());
        assert!(result.included_files.contains_key("utils.js"));
    }

    #[tokio::test]
    async fn test_clean_concatenates_with_warning() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.txt", "alpha\n");
        write(temp.path(), "b.txt", "beta\n");

        let result = evaluator().process_text("{{@.:clean}}", temp.path()).await.unwrap();

        assert_eq!(result.content, "alpha\nbeta\n");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("flattened 2 files"));
        assert!(result.included_files.contains_key("a.txt (clean)"));
        assert!(result.included_files.contains_key("b.txt (clean)"));
    }

    #[tokio::test]
    async fn test_clean_single_file_no_warning() {
        let temp = tempdir().unwrap();
        write(temp.path(), "only.txt", "raw body");

        let result = evaluator().process_text("X {{@only.txt:clean}} Y", temp.path()).await.unwrap();

        assert_eq!(result.content, "X raw body Y");
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_file_content_truncated_at_marker() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "snippet.rs",
            &format!("fn top() {{}}\n// {}\nfn bottom() {{}}\n", crate::IGNORE_BELOW_MARKER),
        );

        let result = evaluator()
            .process_text("Rust:\n{{@snippet.rs}}\nEnd.", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== snippet.rs =====\nfn top() {}\n\n"));
        assert!(!result.content.contains("fn bottom"));
        assert!(result.content.contains("End."));
    }

    #[tokio::test]
    async fn test_eval_of_plain_template() {
        let temp = tempdir().unwrap();
        write(temp.path(), "nested.ppk", "just literal text");

        let result = evaluator()
            .process_text("Outer: {{@nested.ppk:eval}}", temp.path())
            .await
            .unwrap();

        assert_eq!(result.content, "Outer: just literal text");
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.included_files["eval:nested.ppk"],
            tokens::count("just literal text")
        );
    }

    #[tokio::test]
    async fn test_eval_rekeys_child_resources() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/main.ts", "let x = 1;\n");
        write(temp.path(), "nested.ppk", "Nested content:\n{{@src/main.ts}}");

        let result = evaluator()
            .process_text("Evaluated template:\n{{@nested.ppk:eval}}", temp.path())
            .await
            .unwrap();

        let expected_nested = "Nested content:\n===== src/main.ts =====\nlet x = 1;\n\n\n";
        assert_eq!(result.content, format!("Evaluated template:\n{}", expected_nested));
        assert!(result.included_files.contains_key("eval:nested.ppk:src/main.ts"));
        assert_eq!(
            result.included_files["eval:nested.ppk:src/main.ts"],
            tokens::count("===== src/main.ts =====\nlet x = 1;\n\n\n")
        );
    }

    #[tokio::test]
    async fn test_eval_uses_target_directory_as_base() {
        let temp = tempdir().unwrap();
        write(temp.path(), "sub/inner.txt", "inner body");
        write(temp.path(), "sub/tpl.ppk", "{{@inner.txt}}");

        let result = evaluator()
            .process_text("{{@sub/tpl.ppk:eval}}", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("===== inner.txt =====\ninner body\n\n"));
    }

    #[tokio::test]
    async fn test_eval_recursion_is_capped() {
        let temp = tempdir().unwrap();
        write(temp.path(), "loop.ppk", "{{@loop.ppk:eval}}");

        let result = evaluator().process_file(&temp.path().join("loop.ppk")).await.unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("eval nesting"));
        assert!(result.content.contains("[Error processing placeholder: loop.ppk"));
    }

    #[tokio::test]
    async fn test_unreadable_eval_target_leaves_marker() {
        let temp = tempdir().unwrap();

        let result = evaluator()
            .process_text("before {{@gone.ppk:eval}} after", temp.path())
            .await
            .unwrap();

        assert!(result.content.starts_with("before [Error processing placeholder: gone.ppk"));
        assert!(result.content.ends_with("] after"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_fenced_placeholder_expands_inside_fence() {
        let temp = tempdir().unwrap();
        write(temp.path(), "file1.js", "console.log(1);");

        let result = evaluator()
            .process_text("Intro.\n {{{@file1.js}}} End.", temp.path())
            .await
            .unwrap();

        assert!(result.content.contains("```\n===== file1.js =====\nconsole.log(1);\n\n\n```"));
        assert!(result.content.starts_with("Intro.\n "));
        assert!(result.content.ends_with(" End."));
    }

    #[tokio::test]
    async fn test_global_excludes_apply_everywhere() {
        let temp = tempdir().unwrap();
        write(temp.path(), "keep.txt", "keep");
        write(temp.path(), "secret.pem", "nope");

        let evaluator = Evaluator::new(vec!["*.pem".to_string()]);
        let result = evaluator.process_text("{{@.}}", temp.path()).await.unwrap();

        assert!(result.content.contains("keep.txt"));
        assert!(!result.content.contains("secret.pem"));
    }

    #[tokio::test]
    async fn test_total_tokens_match_final_content() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.txt", "alpha");

        let result = evaluator().process_text("X {{@a.txt}} Y", temp.path()).await.unwrap();

        assert_eq!(result.total_tokens, tokens::count(&result.content));
    }

    #[tokio::test]
    async fn test_process_file_reads_relative_to_template() {
        let temp = tempdir().unwrap();
        write(temp.path(), "file1.js", "console.log(1);");
        write(temp.path(), "prompt.txt", "Begin\n{{@file1.js}}\nDone");

        let result = evaluator().process_file(&temp.path().join("prompt.txt")).await.unwrap();

        assert!(result.content.contains("===== file1.js ====="));
        assert!(result.content.contains("console.log(1);"));
    }

    #[tokio::test]
    async fn test_missing_top_level_template_is_fatal() {
        let temp = tempdir().unwrap();
        let result = evaluator().process_file(&temp.path().join("absent.txt")).await;
        assert!(result.is_err());
    }
}
