//! promptpack - prompt template expander
//!
//! Assembles human-authored prompt templates into a single text blob ready
//! to paste into an LLM conversation. `{{@resource:options}}` placeholders
//! substitute file contents, directory trees, recursively evaluated
//! sub-templates, or fetched web text; problems accumulate as warnings
//! instead of failing the whole expansion.
//!
//! # Placeholder syntax
//!
//! ```text
//! {{@src/main.ts}}                 file content, wrapped in a header
//! {{@src:+*.ts,-*.test.ts}}        directory, filtered by patterns
//! {{@src:dir}}                     rendered directory tree
//! {{@other.ppk:eval}}              nested template, evaluated in place
//! {{@https://example.com:clean}}   fetched page, raw
//! ```
//!
//! # Example
//!
//! ```ignore
//! use promptpack::{Config, Evaluator};
//!
//! let config = Config::load(None)?;
//! let evaluator = Evaluator::new(config.exclude_patterns());
//! let result = evaluator.process_file(Path::new("prompt.ppk")).await?;
//! println!("{}", result.content);
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod distance;
pub mod files;
pub mod git;
pub mod template;
pub mod tokens;
pub mod web;

pub use config::Config;
pub use content::{DocumentExtractor, UnavailableExtractor};
pub use files::{SelectError, select};
pub use template::{Evaluator, MAX_EVAL_DEPTH, PlaceholderKind, PlaceholderOptions, ProcessResult, TemplateNode};
pub use web::{FetchedPage, WebError, WebFetcher};

/// Marker that truncates a template, or an included file, from its line on
pub const IGNORE_BELOW_MARKER: &str = "{{!IGNORE_BELOW}}";
