//! `cellar import` command - Import items and tins from a CSV file

use clap::ValueEnum;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{confirm, open_store, output_format, print_json, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::import::{
    read_csv_file, ColumnMapping, CsvTable, DateFormat, Field, ImportOptions, ImportPlan,
    ImportSession, ImportSummary, MergePolicy, OverwriteSet,
};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Show the header and first record, then exit without importing
    #[arg(long)]
    pub preview: bool,

    /// YAML file describing the column mapping
    #[arg(long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Start from the mapping for a `cellar export` file
    #[arg(long, value_enum, conflicts_with = "mapping")]
    pub preset: Option<Preset>,

    /// Map a field to a column, e.g. --map brand=Manufacturer (repeatable)
    #[arg(long = "map", value_name = "FIELD=COLUMN", value_parser = parse_map_entry)]
    pub map: Vec<(Field, String)>,

    /// The file has no header row; columns are named "Column 1", "Column 2", ...
    #[arg(long)]
    pub no_header: bool,

    /// Create one tin per row, grouping rows that share a brand and blend
    #[arg(long)]
    pub collate: bool,

    /// Recompute item quantity from tin contents
    #[arg(long)]
    pub sync_tins: bool,

    /// Date layout of the tin date columns (e.g. MM/YY, DD/MM/YY, "Month D, YYYY")
    #[arg(long, value_parser = parse_date_format)]
    pub date_format: Option<DateFormat>,

    /// Maximum of the file's rating scale (required when rating is mapped)
    #[arg(long)]
    pub rating_max: Option<f64>,

    /// What to do with items that already exist (skip, update, overwrite)
    #[arg(long, default_value = "skip")]
    pub merge: MergePolicy,

    /// Fields overwrite may replace: comma separated, or "all" (default: all)
    #[arg(long, value_name = "FIELDS")]
    pub overwrite: Option<OverwriteSet>,

    /// Reconcile and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask before replacing existing tins
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Mapping presets matching the export layouts
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// `cellar export items`
    Items,
    /// `cellar export tins`
    Tins,
}

fn parse_map_entry(s: &str) -> std::result::Result<(Field, String), String> {
    let (field, column) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=COLUMN, got '{}'", s))?;
    Ok((field.parse()?, column.trim().to_string()))
}

fn parse_date_format(s: &str) -> std::result::Result<DateFormat, String> {
    s.parse()
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let table = read_csv_file(&args.file)?;

    if args.preview {
        print_preview(&table, !args.no_header);
        return Ok(());
    }

    let (project, mut store) = open_store(global)?;
    let config = Config::load(Some(&project));
    let format = output_format(global, &config);

    let mapping = build_mapping(&args, &config)?;
    let mut options = ImportOptions::new(args.merge);
    options.conversion = config.conversion();
    if args.merge == MergePolicy::Overwrite {
        options.overwrite = args.overwrite.clone().unwrap_or_else(OverwriteSet::all);
    } else if args.overwrite.is_some() {
        log::warn!("--overwrite has no effect unless --merge overwrite is used");
    }

    if !global.quiet && format != OutputFormat::Json {
        println!(
            "{} Importing {} ({} merge){}",
            style("→").blue(),
            style(args.file.display()).yellow(),
            style(args.merge).cyan(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
    }

    let mut session = ImportSession::new(mapping, options);
    let plan = session.plan(&store, &table)?;

    if plan.replaces_tins() {
        warn_tin_replacement(&plan);
        if !args.dry_run
            && !confirm("Replace the existing tins of these items?", args.yes)?
        {
            session.cancel();
            if format == OutputFormat::Json {
                return print_json(session.status());
            }
            println!("{}", style("Import cancelled. Nothing was changed.").yellow());
            return Ok(());
        }
    }

    let summary = if args.dry_run {
        session.preview(&plan)
    } else {
        session.commit(&mut store, &plan)?
    };

    if format == OutputFormat::Json {
        return print_json(&summary);
    }

    if !global.quiet {
        print_summary(&summary, plan.discarded);
    }

    if args.dry_run {
        println!();
        println!("{}", style("Dry run complete. Nothing was written.").yellow());
    }

    Ok(())
}

/// Combine the mapping file or preset with command-line overrides
fn build_mapping(args: &ImportArgs, config: &Config) -> Result<ColumnMapping> {
    let mut mapping = if let Some(path) = &args.mapping {
        crate::yaml::load_file::<ColumnMapping>(path)?
    } else {
        match args.preset {
            Some(Preset::Items) => ColumnMapping::item_export(),
            Some(Preset::Tins) => ColumnMapping::tin_export(),
            None => ColumnMapping::new(),
        }
    };

    for (field, column) in &args.map {
        mapping.set(*field, column.clone());
    }
    if args.no_header {
        mapping.has_header = false;
    }
    if args.collate {
        mapping.collate_tins = true;
    }
    if args.sync_tins {
        mapping.sync_tins = true;
    }
    if let Some(max) = args.rating_max {
        mapping.rating_max = Some(max);
    }
    if let Some(fmt) = args.date_format {
        mapping.date_format = Some(fmt);
    } else if mapping.date_format.is_none() {
        mapping.date_format = config.date_format();
    }

    log::debug!("column mapping: {:?}", mapping);
    Ok(mapping)
}

fn print_preview(table: &CsvTable, has_header: bool) {
    let labels = table.column_labels(has_header);
    let first = table.first_record(has_header);

    println!(
        "{} {} column(s), {} record(s)",
        style("→").blue(),
        style(table.column_count()).cyan(),
        style(table.record_count(has_header)).cyan()
    );
    println!();
    println!(
        "{:<4} {:<28} {}",
        style("#").bold().dim(),
        style("Column").bold(),
        style("First record").bold()
    );
    println!("{}", "-".repeat(60));

    for (i, label) in labels.iter().enumerate() {
        let value = first.and_then(|r| r.get(i)).unwrap_or("");
        println!(
            "{:<4} {:<28} {}",
            style(i + 1).dim(),
            style(truncate_str(label, 26)).cyan(),
            truncate_str(value, 40)
        );
    }

    println!();
    println!(
        "Map columns with {}",
        style("--map brand=<column> --map blend=<column> ...").yellow()
    );
    let fields: Vec<&str> = Field::ALL.iter().map(|f| f.key()).collect();
    println!("{} {}", style("Fields:").dim(), style(fields.join(", ")).dim());
}

fn warn_tin_replacement(plan: &ImportPlan) {
    eprintln!(
        "{} Overwrite with collated tins deletes the existing tins of:",
        style("!").yellow()
    );
    for update in plan.tin_replacements() {
        eprintln!(
            "  {} {} ({} tin(s) removed, {} added)",
            style("*").dim(),
            style(update.item.display_name()).cyan(),
            update.existing_tins,
            update.tins.len()
        );
    }
}

fn print_summary(summary: &ImportSummary, discarded: usize) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Records read:     {}", style(summary.total_records).cyan());
    if discarded > 0 {
        println!(
            "  Discarded:        {} {}",
            style(discarded).dim(),
            style("(blank brand or blend)").dim()
        );
    }
    println!("  Conversions:      {}", style(summary.conversions).cyan());
    println!("  Items inserted:   {}", style(summary.insertions).green());
    if summary.any_updates() {
        println!("  Items updated:    {}", style(summary.updates).yellow());
    }
    if summary.tins > 0 {
        println!(
            "  Tins created:     {}{}",
            style(summary.tins).green(),
            if summary.tins_collated {
                style(" (collated)").dim().to_string()
            } else {
                String::new()
            }
        );
    }
}
