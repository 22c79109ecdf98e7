//! litner - literature acquisition and entity annotation
//!
//! Fetches PubMed records in weekly windows into CSV artifacts, then tags
//! biomedical entities in each record's title and abstract.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "litner")]
#[command(about = "Literature acquisition and entity annotation pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./litner.toml or ~/.config/litner/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch PubMed records into weekly CSV artifacts
    Fetch(cmd::fetch::FetchArgs),
    /// Annotate fetched artifacts with entity mentions
    Annotate(cmd::annotate::AnnotateArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(litner_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug
    //   non-TTY: info unless --debug
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    litner_core::init_logging(quiet, cli.debug, multi).context("Failed to initialize logging")?;

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Annotate(args) => cmd::annotate::run(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Output directory",
                &config.output.dir.display().to_string(),
            ]);
            table.add_row(vec!["E-utilities URL", &config.eutils.base_url]);
            table.add_row(vec![
                "API key",
                if config.eutils.api_key.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec![
                "Contact email",
                config.eutils.email.as_deref().unwrap_or("not set"),
            ]);
            table.add_row(vec!["Tool", &config.eutils.tool]);
            table.add_row(vec![
                "Request delay",
                &format!("{}ms", config.eutils.request_delay_ms),
            ]);
            table.add_row(vec![
                "Timeout",
                &format!("{}s", config.eutils.timeout_secs),
            ]);
            table.add_row(vec!["Page size", &config.fetch.page_size.to_string()]);
            table.add_row(vec!["Artifact prefix", &config.fetch.prefix]);
            table.add_row(vec![
                "Lexicon",
                &config
                    .annotate
                    .lexicon
                    .as_ref()
                    .map_or_else(|| "not set".to_string(), |p| p.display().to_string()),
            ]);
            table.add_row(vec![
                "Chunk size",
                &config
                    .annotate
                    .chunk_size
                    .map_or_else(|| "whole artifact".to_string(), |n| n.to_string()),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
