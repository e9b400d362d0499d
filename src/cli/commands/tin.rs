//! `cellar tin` command - Tin management

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::item::FilterArgs;
use crate::cli::helpers::{confirm, open_store, output_format, print_json};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::{StoreError, TinRow};
use crate::core::Config;
use crate::entities::{Tin, TinUnit};

#[derive(Subcommand, Debug)]
pub enum TinCommands {
    /// Add a tin to an item
    Add(AddArgs),

    /// List tins with filtering
    List(ListArgs),

    /// Mark a tin as finished
    Finish(FinishArgs),

    /// Delete a tin
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// ID of the owning item
    pub item: i64,

    /// Tin label (default: next free "Lot N")
    #[arg(long, short = 'l')]
    pub label: Option<String>,

    /// Container description (tin, jar, pouch, ...)
    #[arg(long)]
    pub container: Option<String>,

    /// Amount of tobacco in the tin
    #[arg(long)]
    pub quantity: Option<f64>,

    /// Unit of the amount (oz, lbs, grams)
    #[arg(long, requires = "quantity")]
    pub unit: Option<TinUnit>,

    /// Manufacture date (YYYY-MM-DD)
    #[arg(long)]
    pub manufactured: Option<NaiveDate>,

    /// Cellar date (YYYY-MM-DD)
    #[arg(long)]
    pub cellared: Option<NaiveDate>,

    /// Open date (YYYY-MM-DD)
    #[arg(long)]
    pub opened: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only tins of this item
    #[arg(long, short = 'i', conflicts_with_all = ["brand", "of_type", "favorites", "disliked_only", "out_of_production", "in_stock", "search"])]
    pub item: Option<i64>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Include finished tins
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct FinishArgs {
    /// Tin ID
    pub id: i64,

    /// Mark the tin as not finished
    #[arg(long)]
    pub undo: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Tin ID
    pub id: i64,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const TIN_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("brand", "BRAND", 20),
    ColumnDef::new("blend", "BLEND", 26),
    ColumnDef::new("label", "LABEL", 10),
    ColumnDef::new("amount", "AMOUNT", 10),
    ColumnDef::new("container", "CONTAINER", 12),
    ColumnDef::new("cellared", "CELLARED", 12),
    ColumnDef::new("opened", "OPENED", 12),
];

pub fn run(cmd: TinCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TinCommands::Add(args) => run_add(args, global),
        TinCommands::List(args) => run_list(args, global),
        TinCommands::Finish(args) => run_finish(args, global),
        TinCommands::Delete(args) => run_delete(args, global),
    }
}

fn store_err(e: StoreError) -> miette::Report {
    miette::miette!("{}", e)
}

/// First "Lot N" label not already used by `tins`
fn next_lot_label(tins: &[Tin]) -> String {
    (1..)
        .map(Tin::lot_label)
        .find(|label| tins.iter().all(|t| &t.label != label))
        .unwrap_or_else(|| Tin::lot_label(tins.len() + 1))
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let item = store.get_item(args.item).map_err(store_err)?;
    let existing = store.tins_for_item(args.item).map_err(store_err)?;

    let label = match args.label.as_deref().map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => next_lot_label(&existing),
    };

    if let Some(q) = args.quantity {
        if q < 0.0 {
            return Err(miette::miette!("Tin quantity cannot be negative"));
        }
    }

    let mut tin = Tin::new(label);
    tin.container = args.container.unwrap_or_default().trim().to_string();
    tin.quantity = args.quantity;
    tin.unit = args.unit;
    tin.manufacture_date = args.manufactured;
    tin.cellar_date = args.cellared;
    tin.open_date = args.opened;

    let id = store.insert_tin(args.item, &tin).map_err(store_err)?;

    if global.quiet {
        println!("{}", id);
    } else {
        println!(
            "{} Added {} to {} {}",
            style("✓").green(),
            style(&tin.label).yellow(),
            style(item.display_name()).cyan(),
            style(format!("(tin id {})", id)).dim()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load(Some(&project));

    let rows: Vec<TinRow> = match args.item {
        Some(item_id) => {
            let item = store.get_item(item_id).map_err(store_err)?;
            store
                .tins_for_item(item_id)
                .map_err(store_err)?
                .into_iter()
                .filter(|t| args.all || !t.finished)
                .map(|tin| TinRow {
                    brand: item.brand.clone(),
                    blend: item.blend.clone(),
                    tin,
                })
                .collect()
        }
        None => store
            .list_tins(&args.filter.to_filter(), args.all)
            .map_err(store_err)?,
    };

    let format = output_format(global, &config);
    if format == OutputFormat::Json {
        let tins: Vec<&Tin> = rows.iter().map(|r| &r.tin).collect();
        return print_json(&tins);
    }

    let table_rows = rows.iter().filter_map(|row| {
        let tin = &row.tin;
        let amount = tin.quantity_display();
        Some(
            TableRow::new(tin.id?)
                .cell("brand", CellValue::Text(row.brand.clone()))
                .cell("blend", CellValue::Text(row.blend.clone()))
                .cell("label", CellValue::Text(tin.label.clone()))
                .cell(
                    "amount",
                    if amount.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(amount)
                    },
                )
                .cell("container", CellValue::Text(tin.container.clone()))
                .cell("cellared", CellValue::Date(tin.cellar_date))
                .cell("opened", CellValue::Date(tin.open_date)),
        )
    });

    TableFormatter::new(TIN_COLUMNS, "tin")
        .quiet(global.quiet)
        .output(table_rows, format);
    Ok(())
}

fn run_finish(args: FinishArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let tin = store.get_tin(args.id).map_err(store_err)?;
    store
        .set_tin_finished(args.id, !args.undo)
        .map_err(store_err)?;

    if !global.quiet {
        let verb = if args.undo { "Reopened" } else { "Finished" };
        println!(
            "{} {} {}",
            style("✓").green(),
            verb,
            style(&tin.label).yellow()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let tin = store.get_tin(args.id).map_err(store_err)?;

    if !confirm(&format!("Delete tin '{}'?", tin.label), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    store.delete_tin(args.id).map_err(store_err)?;
    if !global.quiet {
        println!(
            "{} Deleted tin {}",
            style("✓").green(),
            style(&tin.label).yellow()
        );
    }
    Ok(())
}
