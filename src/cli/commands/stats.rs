//! `cellar stats` command - Collection statistics

use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_rating, open_store, output_format, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::CellarStats;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Leave out the per-type breakdown
    #[arg(long)]
    pub no_types: bool,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load(Some(&project));
    let stats = store.stats().map_err(|e| miette::miette!("{}", e))?;

    let format = output_format(global, &config);
    if format == OutputFormat::Json {
        return print_json(&stats);
    }

    let markdown = format == OutputFormat::Md;
    if !markdown && !global.quiet {
        println!("{}", style("Collection").bold());
    }
    println!("{}", render_summary(&stats, markdown));

    if !args.no_types && stats.items > 0 {
        println!();
        if !markdown && !global.quiet {
            println!("{}", style("By type").bold());
        }
        println!("{}", render_types(&stats, markdown));
    }

    Ok(())
}

fn render_summary(stats: &CellarStats, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    builder.push_record(["Items".to_string(), stats.items.to_string()]);
    builder.push_record(["Brands".to_string(), stats.brands.to_string()]);
    builder.push_record(["Total quantity".to_string(), stats.total_quantity.to_string()]);
    builder.push_record(["Favorites".to_string(), stats.favorites.to_string()]);
    builder.push_record(["Disliked".to_string(), stats.disliked.to_string()]);
    builder.push_record([
        "Out of production".to_string(),
        stats.out_of_production.to_string(),
    ]);
    builder.push_record(["Tins".to_string(), stats.tins.to_string()]);
    builder.push_record(["Tins opened".to_string(), stats.tins_opened.to_string()]);
    builder.push_record(["Tins finished".to_string(), stats.tins_finished.to_string()]);
    let average = format_rating(stats.average_rating);
    builder.push_record([
        "Average rating".to_string(),
        if average.is_empty() { "-".to_string() } else { average },
    ]);
    finish(builder, markdown)
}

fn render_types(stats: &CellarStats, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Type", "Items"]);
    for (blend_type, count) in &stats.by_type {
        builder.push_record([blend_type.clone(), count.to_string()]);
    }
    finish(builder, markdown)
}

fn finish(builder: Builder, markdown: bool) -> String {
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}
