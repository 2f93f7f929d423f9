//! promptpack - prompt template expander
//!
//! CLI entry point: expands a template file and prints the assembled prompt
//! on stdout, with warnings and the token summary on stderr.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use promptpack::cli::{Cli, OutputFormat};
use promptpack::config::Config;
use promptpack::template::Evaluator;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (WARN)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        }
    } else {
        tracing::Level::WARN
    };

    // stdout carries the expanded prompt; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(template = ?cli.template, "expanding template");

    let evaluator = Evaluator::new(config.exclude_patterns());
    let result = evaluator.process_file(&cli.template).await?;

    for warning in &result.warnings {
        eprintln!("{}", warning.yellow());
    }

    match cli.format {
        OutputFormat::Json => {
            debug!("main: emitting JSON result");
            let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
            emit(cli.output.as_ref(), &json)?;
        }
        OutputFormat::Text => {
            debug!("main: emitting expanded text");
            emit(cli.output.as_ref(), &result.content)?;
        }
    }

    if cli.verbose {
        eprintln!();
        eprintln!("{}", "Included resources:".bold());
        for (label, count) in &result.included_files {
            eprintln!("  {:>8}  {}", count, label);
        }
    }
    eprintln!("{}", format!("Total tokens: {}", result.total_tokens).bold());

    Ok(())
}

/// Write the expanded prompt to the chosen sink.
fn emit(output: Option<&PathBuf>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).context(format!("Failed to write {}", path.display()))?;
            eprintln!("Expanded prompt written to {}", path.display());
        }
        None => {
            print!("{}", text);
        }
    }
    Ok(())
}
