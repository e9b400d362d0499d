//! `cellar item` command - Item (blend) management

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{confirm, format_rating, open_store, output_format, print_json};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::{CellarStore, ItemFilter, ItemSort, StoreError};
use crate::core::Config;
use crate::entities::item::{round_rating, RATING_SCALE};
use crate::entities::{BlendType, Item, Tin};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item
    Add(AddArgs),

    /// Show an item and its tins
    Show(ShowArgs),

    /// Change fields of an item
    Edit(EditArgs),

    /// Delete an item and all of its tins
    Delete(DeleteArgs),

    /// List items with filtering
    List(ListArgs),
}

/// Descriptive fields shared by add and edit
#[derive(clap::Args, Debug, Default)]
pub struct ItemFields {
    /// Blend type (aromatic, english, burley, virginia, other)
    #[arg(long = "type", short = 't')]
    pub blend_type: Option<BlendType>,

    #[arg(long)]
    pub subgenre: Option<String>,

    #[arg(long)]
    pub cut: Option<String>,

    #[arg(long)]
    pub components: Option<String>,

    #[arg(long)]
    pub flavoring: Option<String>,

    /// Number of tins on hand
    #[arg(long)]
    pub quantity: Option<i64>,

    /// Rating from 0 to 5
    #[arg(long)]
    pub rating: Option<f64>,

    /// Mark as favorite (clears disliked)
    #[arg(long)]
    pub favorite: bool,

    /// Mark as disliked (clears favorite)
    #[arg(long, conflicts_with = "favorite")]
    pub disliked: bool,

    /// Mark as no longer produced
    #[arg(long)]
    pub discontinued: bool,

    #[arg(long)]
    pub notes: Option<String>,
}

impl ItemFields {
    fn apply(&self, item: &mut Item) -> Result<()> {
        if let Some(t) = self.blend_type {
            item.blend_type = Some(t);
        }
        for (value, slot) in [
            (&self.subgenre, &mut item.subgenre),
            (&self.cut, &mut item.cut),
            (&self.components, &mut item.components),
            (&self.flavoring, &mut item.flavoring),
            (&self.notes, &mut item.notes),
        ] {
            if let Some(v) = value {
                *slot = v.trim().to_string();
            }
        }
        if let Some(q) = self.quantity {
            if q < 0 {
                return Err(miette::miette!("Quantity cannot be negative"));
            }
            item.quantity = q;
        }
        if let Some(r) = self.rating {
            if !(0.0..=RATING_SCALE).contains(&r) {
                return Err(miette::miette!("Rating must be between 0 and {}", RATING_SCALE));
            }
            item.rating = Some(round_rating(r));
        }
        if self.favorite {
            item.set_favorite(true);
        }
        if self.disliked {
            item.set_disliked(true);
        }
        if self.discontinued {
            item.in_production = false;
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    pub brand: String,

    pub blend: String,

    #[command(flatten)]
    pub fields: ItemFields,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Item ID
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Item ID
    pub id: i64,

    #[command(flatten)]
    pub fields: ItemFields,

    /// Clear the rating
    #[arg(long, conflicts_with = "rating")]
    pub unrate: bool,

    /// Clear favorite and disliked
    #[arg(long, conflicts_with_all = ["favorite", "disliked"])]
    pub neutral: bool,

    /// Mark as in production again
    #[arg(long, conflicts_with = "discontinued")]
    pub in_production: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Item ID
    pub id: i64,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Item selection shared by `item list` and `bulk`
#[derive(clap::Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Brand contains this text (case-insensitive)
    #[arg(long)]
    pub brand: Option<String>,

    /// Only this blend type
    #[arg(long = "of-type")]
    pub of_type: Option<BlendType>,

    /// Only favorites
    #[arg(long = "favorites")]
    pub favorites: bool,

    /// Only disliked items
    #[arg(long = "disliked-only")]
    pub disliked_only: bool,

    /// Only items no longer produced
    #[arg(long = "out-of-production")]
    pub out_of_production: bool,

    /// Only items with a quantity above zero
    #[arg(long)]
    pub in_stock: bool,

    /// Search brand, blend and notes
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.of_type.is_none()
            && !self.favorites
            && !self.disliked_only
            && !self.out_of_production
            && !self.in_stock
            && self.search.is_none()
    }

    pub fn to_filter(&self) -> ItemFilter {
        ItemFilter {
            brand: self.brand.clone(),
            blend_type: self.of_type,
            favorite: self.favorites.then_some(true),
            disliked: self.disliked_only.then_some(true),
            in_production: self.out_of_production.then_some(false),
            in_stock: self.in_stock,
            search: self.search.clone(),
            ..Default::default()
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort by brand, blend, rating or quantity
    #[arg(long, default_value = "brand")]
    pub sort: ItemSort,

    /// Show at most this many items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

const ITEM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("brand", "BRAND", 24),
    ColumnDef::new("blend", "BLEND", 30),
    ColumnDef::new("type", "TYPE", 10),
    ColumnDef::new("qty", "QTY", 5),
    ColumnDef::new("rating", "RATING", 8),
    ColumnDef::new("mark", "♥", 3),
    ColumnDef::new("production", "MADE", 5),
];

pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::Add(args) => run_add(args, global),
        ItemCommands::Show(args) => run_show(args, global),
        ItemCommands::Edit(args) => run_edit(args, global),
        ItemCommands::Delete(args) => run_delete(args, global),
        ItemCommands::List(args) => run_list(args, global),
    }
}

fn store_err(e: StoreError) -> miette::Report {
    miette::miette!("{}", e)
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;

    let brand = args.brand.trim();
    let blend = args.blend.trim();
    if brand.is_empty() || blend.is_empty() {
        return Err(miette::miette!("Brand and blend must not be blank"));
    }

    let mut item = Item::new(brand, blend);
    args.fields.apply(&mut item)?;
    let id = store.insert_item(&item).map_err(store_err)?;

    if global.quiet {
        println!("{}", id);
    } else {
        println!(
            "{} Added {} {}",
            style("✓").green(),
            style(item.display_name()).cyan(),
            style(format!("(id {})", id)).dim()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ItemDetail<'a> {
    #[serde(flatten)]
    item: &'a Item,
    tins: &'a [Tin],
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load(Some(&project));
    let item = store.get_item(args.id).map_err(store_err)?;
    let tins = store.tins_for_item(args.id).map_err(store_err)?;

    if output_format(global, &config) == OutputFormat::Json {
        return print_json(&ItemDetail {
            item: &item,
            tins: &tins,
        });
    }

    print_item(&item, &tins);
    Ok(())
}

fn print_item(item: &Item, tins: &[Tin]) {
    println!("{}", style(item.display_name()).bold());
    println!("{}", style("─".repeat(50)).dim());

    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("  {:<12} {}", style(label).dim(), value);
        }
    };
    field("Type", item.blend_type.map(|t| t.as_str()).unwrap_or(""));
    field("Subgenre", &item.subgenre);
    field("Cut", &item.cut);
    field("Components", &item.components);
    field("Flavoring", &item.flavoring);
    field("Quantity", &item.quantity.to_string());
    field("Rating", &format_rating(item.rating));
    if item.favorite {
        field("Favorite", "yes");
    }
    if item.disliked {
        field("Disliked", "yes");
    }
    field("Production", if item.in_production { "yes" } else { "no" });
    field("Notes", &item.notes);

    if tins.is_empty() {
        return;
    }
    println!();
    println!("{}", style(format!("Tins ({})", tins.len())).bold());
    for tin in tins {
        let mut parts = vec![tin.quantity_display()];
        if !tin.container.is_empty() {
            parts.push(tin.container.clone());
        }
        if let Some(d) = tin.cellar_date {
            parts.push(format!("cellared {}", d));
        }
        if let Some(d) = tin.open_date {
            parts.push(format!("opened {}", d));
        }
        parts.retain(|p| !p.is_empty());
        println!(
            "  {} {:<10} {}{}",
            style(tin.id.unwrap_or_default()).cyan(),
            tin.label,
            parts.join(", "),
            if tin.finished {
                style(" (finished)").dim().to_string()
            } else {
                String::new()
            }
        );
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let mut item = store.get_item(args.id).map_err(store_err)?;
    let before = item.clone();

    args.fields.apply(&mut item)?;
    if args.unrate {
        item.rating = None;
    }
    if args.neutral {
        item.favorite = false;
        item.disliked = false;
    }
    if args.in_production {
        item.in_production = true;
    }

    if item == before {
        println!("{}", style("No changes.").dim());
        return Ok(());
    }

    store.update_item(&item).map_err(store_err)?;
    if !global.quiet {
        println!(
            "{} Updated {}",
            style("✓").green(),
            style(item.display_name()).cyan()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let item = store.get_item(args.id).map_err(store_err)?;
    let tin_count = store.tins_for_item(args.id).map_err(store_err)?.len();

    let prompt = format!("Delete {} and its {} tin(s)?", item.display_name(), tin_count);
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    store.delete_item(args.id).map_err(store_err)?;
    if !global.quiet {
        println!(
            "{} Deleted {}",
            style("✓").green(),
            style(item.display_name()).cyan()
        );
    }
    Ok(())
}

/// Items matching a filter, in listing order
pub fn select_items(store: &CellarStore, filter: &ItemFilter) -> Result<Vec<Item>> {
    store.list_items(filter).map_err(store_err)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load(Some(&project));

    let mut filter = args.filter.to_filter();
    filter.sort = args.sort;
    filter.limit = args.limit;
    let items = select_items(&store, &filter)?;

    let format = output_format(global, &config);
    if format == OutputFormat::Json {
        return print_json(&items);
    }

    let rows = items.iter().filter_map(|item| {
        Some(
            TableRow::new(item.id?)
                .cell("brand", CellValue::Text(item.brand.clone()))
                .cell("blend", CellValue::Text(item.blend.clone()))
                .cell("type", CellValue::Type(item.blend_type))
                .cell("qty", CellValue::Number(item.quantity))
                .cell("rating", CellValue::Rating(item.rating))
                .cell(
                    "mark",
                    CellValue::Sentiment {
                        favorite: item.favorite,
                        disliked: item.disliked,
                    },
                )
                .cell("production", CellValue::Flag(item.in_production)),
        )
    });

    TableFormatter::new(ITEM_COLUMNS, "item")
        .quiet(global.quiet)
        .output(rows, format);
    Ok(())
}
