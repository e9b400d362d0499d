//! `cellar export` command - Write items or tins as CSV

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;
use crate::core::store::ItemFilter;
use crate::export::{write_items, write_tins};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// What to export
    #[arg(value_enum)]
    pub what: ExportKind,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Include finished tins
    #[arg(long)]
    pub include_finished: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// One row per item
    Items,
    /// One row per tin, with its item's brand and blend
    Tins,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, store) = open_store(global)?;
    let filter = ItemFilter::default();

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).into_diagnostic()?)),
        None => Box::new(io::stdout().lock()),
    };

    let count = match args.what {
        ExportKind::Items => {
            let items = store.list_items(&filter).map_err(|e| miette::miette!("{}", e))?;
            write_items(writer, &items).into_diagnostic()?
        }
        ExportKind::Tins => {
            let rows = store
                .list_tins(&filter, args.include_finished)
                .map_err(|e| miette::miette!("{}", e))?;
            write_tins(writer, &rows).into_diagnostic()?
        }
    };

    if let Some(path) = &args.output {
        if !global.quiet {
            println!(
                "{} Exported {} row(s) to {}",
                style("✓").green(),
                style(count).cyan(),
                style(path.display()).cyan()
            );
        }
    }

    Ok(())
}
