//! Template parsing: raw text to an ordered node list
//!
//! A template is literal text interleaved with `{{@resource:options}}`
//! placeholders. Before node splitting, three rewrites run over the raw
//! text: `{{{ ... }}}` spans become code-fenced blocks, an ignore-below
//! marker truncates the remaining template, and `{{!...}}` comment
//! directives are stripped.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::IGNORE_BELOW_MARKER;
use crate::template::options::{self, PlaceholderOptions};

/// One parsed template node
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Text {
        content: String,
    },
    Placeholder {
        /// The placeholder exactly as written, delimiters included
        original: String,
        resource: String,
        options: PlaceholderOptions,
    },
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{@(.+?)\}\}").unwrap())
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{\{(.*?)\}\}\}").unwrap())
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{![^{}\n]*\}\}").unwrap())
}

/// Parse a template into nodes, accumulating warnings for option problems.
pub fn parse(template: &str, warnings: &mut Vec<String>) -> Vec<TemplateNode> {
    let fenced = rewrite_fences(template);
    let truncated = truncate_template(&fenced);
    let stripped = comment_re().replace_all(truncated, "");
    let stripped: &str = stripped.as_ref();

    let mut nodes = Vec::new();
    let mut cursor = 0;

    for captures in placeholder_re().captures_iter(&stripped) {
        let matched = captures.get(0).unwrap();
        let body = captures.get(1).unwrap().as_str();

        if body.trim().is_empty() {
            // empty placeholder bodies stay literal text
            continue;
        }

        if matched.start() > cursor {
            nodes.push(TemplateNode::Text {
                content: stripped[cursor..matched.start()].to_string(),
            });
        }
        cursor = matched.end();

        let (resource, options_str) = split_resource_options(body);
        let (parsed, option_warnings) = options::parse(resource, options_str);
        warnings.extend(option_warnings);

        nodes.push(TemplateNode::Placeholder {
            original: matched.as_str().to_string(),
            resource: resource.to_string(),
            options: parsed,
        });
    }

    if cursor < stripped.len() {
        nodes.push(TemplateNode::Text {
            content: stripped[cursor..].to_string(),
        });
    }

    debug!(node_count = nodes.len(), "parse: template tokenized");
    nodes
}

/// Rewrite `{{{ ... }}}` spans into code-fenced blocks. `{{{@res}}}` is
/// shorthand for a fenced placeholder.
fn rewrite_fences(template: &str) -> String {
    fence_re()
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let inner = captures[1].trim();
            if inner.starts_with('@') {
                format!("```\n{{{{{}}}}}\n```", inner)
            } else {
                format!("```\n{}\n```", inner)
            }
        })
        .into_owned()
}

/// Cut the template at the ignore-below marker: the marker's line and
/// everything after it are dropped.
fn truncate_template(template: &str) -> &str {
    match template.find(IGNORE_BELOW_MARKER) {
        Some(idx) => {
            let line_start = template[..idx].rfind('\n').map(|i| i + 1).unwrap_or(0);
            &template[..line_start]
        }
        None => template,
    }
}

/// Split a placeholder body into resource and options on the last `:` that
/// is not a URL scheme separator.
fn split_resource_options(body: &str) -> (&str, Option<&str>) {
    let mut split_at = None;
    for (idx, _) in body.match_indices(':') {
        if body[idx..].starts_with("://") {
            continue;
        }
        split_at = Some(idx);
    }

    match split_at {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    }
}
