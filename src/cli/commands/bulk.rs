//! `cellar bulk` command - Batch edits across many items
//!
//! Targets are either explicit IDs or the items matching the same filters
//! `cellar item list` accepts. Every edit runs in one transaction.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::item::{select_items, FilterArgs};
use crate::cli::helpers::{open_store, parse_flag};
use crate::cli::GlobalOpts;
use crate::core::store::{BulkEdit, CellarStore};
use crate::entities::{BlendType, Item};

#[derive(Subcommand, Debug)]
pub enum BulkCommands {
    /// Set (or clear) the blend type
    SetType(SetTypeArgs),

    /// Set the favorite flag (true clears disliked)
    SetFavorite(SetFlagArgs),

    /// Set the disliked flag (true clears favorite)
    SetDisliked(SetFlagArgs),

    /// Set whether items are still in production
    SetProduction(SetFlagArgs),
}

/// Which items a bulk edit applies to
#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Item IDs, comma separated
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub ids: Vec<i64>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Apply to every item in the collection
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,

    /// List the items that would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetTypeArgs {
    /// New blend type
    #[arg(required_unless_present = "clear")]
    pub blend_type: Option<BlendType>,

    /// Remove the blend type instead
    #[arg(long, conflicts_with = "blend_type")]
    pub clear: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(clap::Args, Debug)]
pub struct SetFlagArgs {
    /// true or false
    #[arg(action = clap::ArgAction::Set, value_parser = parse_flag)]
    pub value: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

pub fn run(cmd: BulkCommands, global: &GlobalOpts) -> Result<()> {
    let (edit, target) = match cmd {
        BulkCommands::SetType(args) => (
            BulkEdit::SetType(if args.clear { None } else { args.blend_type }),
            args.target,
        ),
        BulkCommands::SetFavorite(args) => (BulkEdit::SetFavorite(args.value), args.target),
        BulkCommands::SetDisliked(args) => (BulkEdit::SetDisliked(args.value), args.target),
        BulkCommands::SetProduction(args) => (BulkEdit::SetProduction(args.value), args.target),
    };

    let (_project, mut store) = open_store(global)?;
    let items = resolve_targets(&store, &target)?;

    if items.is_empty() {
        println!("{}", style("No matching items.").dim());
        return Ok(());
    }

    if target.dry_run {
        println!(
            "{} Would set {} on {} item(s):",
            style("→").blue(),
            style(edit.describe()).cyan(),
            style(items.len()).cyan()
        );
        for item in &items {
            println!(
                "  {} {}",
                style(item.id.unwrap_or_default()).dim(),
                item.display_name()
            );
        }
        println!();
        println!("{}", style("Dry run complete. Nothing was written.").yellow());
        return Ok(());
    }

    let ids: Vec<i64> = items.iter().filter_map(|i| i.id).collect();
    let changed = store
        .bulk_update(&ids, edit)
        .map_err(|e| miette::miette!("{}", e))?;
    log::info!("bulk edit {} changed {} of {} items", edit.describe(), changed, ids.len());

    if global.quiet {
        println!("{}", changed);
    } else {
        println!(
            "{} Set {} on {} item(s) ({} already matched)",
            style("✓").green(),
            style(edit.describe()).cyan(),
            style(changed).green(),
            ids.len() - changed
        );
    }
    Ok(())
}

/// Items selected by explicit IDs, filters, or `--all`
fn resolve_targets(store: &CellarStore, target: &TargetArgs) -> Result<Vec<Item>> {
    if !target.ids.is_empty() {
        let mut items = Vec::with_capacity(target.ids.len());
        for &id in &target.ids {
            items.push(store.get_item(id).map_err(|e| miette::miette!("{}", e))?);
        }
        if !target.filter.is_empty() {
            let matching = select_items(store, &target.filter.to_filter())?;
            items.retain(|i| matching.iter().any(|m| m.id == i.id));
        }
        return Ok(items);
    }

    if target.filter.is_empty() && !target.all {
        return Err(miette::miette!(
            help = "Pass --ids, a filter such as --brand, or --all",
            "No items selected"
        ));
    }

    select_items(store, &target.filter.to_filter())
}
