//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bulk::BulkCommands, completions::CompletionsArgs, config::ConfigCommands,
    export::ExportArgs, import::ImportArgs, init::InitArgs, item::ItemCommands,
    stats::StatsArgs, tin::TinCommands,
};

#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about = "Pipe tobacco collection manager")]
#[command(long_about = "Track blends and tins in a local database, and import collections from arbitrary CSV spreadsheets.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .cellar/)
    #[arg(long, global = true, env = "CELLAR_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cellar project
    Init(InitArgs),

    /// Import items and tins from a CSV file
    Import(ImportArgs),

    /// Export items or tins as CSV
    Export(ExportArgs),

    /// Item (blend) management
    #[command(subcommand)]
    Item(ItemCommands),

    /// Tin management
    #[command(subcommand)]
    Tin(TinCommands),

    /// Show collection statistics
    Stats(StatsArgs),

    /// Change one field on many items at once
    #[command(subcommand)]
    Bulk(BulkCommands),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for lists)
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(OutputFormat::Tsv)
    }
}
