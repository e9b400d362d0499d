//! Reconciliation of CSV records against the existing collection
//!
//! Planning is separated from persistence: [`plan_import`] reads through a
//! [`Catalog`] and decides what to insert, patch or replace, and the store
//! commits the resulting [`ImportPlan`] in a single transaction.
//!
//! Records sharing a (brand, blend) key are grouped in file order. Only the
//! first record of a group contributes item fields; the others contribute
//! tins when collating and are otherwise ignored.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;

use super::coerce::{
    parse_blend_type, parse_bool, parse_quantity, parse_rating, parse_tin_quantity,
};
use super::mapping::{ColumnMapping, Field, OverwriteSet, ResolvedColumns};
use super::reader::CsvTable;
use super::ImportError;
use crate::core::store::StoreError;
use crate::entities::item::DEFAULT_QUANTITY;
use crate::entities::{synced_quantity, Item, Tin, TinConversion};

/// Read access to the existing collection
pub trait Catalog {
    /// Point lookup by natural key
    fn find_item(&self, brand: &str, blend: &str) -> Result<Option<Item>, StoreError>;

    /// Tins currently attached to an item
    fn tins_for_item(&self, item_id: i64) -> Result<Vec<Tin>, StoreError>;
}

/// How CSV data reconciles with an item that already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Leave existing items untouched
    #[default]
    Skip,
    /// Fill only blank/default fields
    Update,
    /// Replace the selected fields unconditionally
    Overwrite,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Skip => "skip",
            MergePolicy::Update => "update",
            MergePolicy::Overwrite => "overwrite",
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(MergePolicy::Skip),
            "update" => Ok(MergePolicy::Update),
            "overwrite" => Ok(MergePolicy::Overwrite),
            _ => Err(format!(
                "Invalid merge policy: {}. Use skip, update, or overwrite",
                s
            )),
        }
    }
}

/// Options for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub policy: MergePolicy,
    /// Fields Overwrite may replace
    pub overwrite: OverwriteSet,
    pub conversion: TinConversion,
    /// Anchor for two-digit years
    pub today: NaiveDate,
}

impl ImportOptions {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            overwrite: OverwriteSet::default(),
            conversion: TinConversion::default(),
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// What happens to the tins of a matched item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TinAction {
    Keep,
    Append,
    /// Delete every existing tin, then insert the planned ones
    Replace,
}

/// A new item and its tins
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInsert {
    pub item: Item,
    pub tins: Vec<Tin>,
}

/// A change to an existing item
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    /// Item after merging, carrying its database id
    pub item: Item,
    /// Whether any item field differs from the stored row
    pub changed: bool,
    pub tin_action: TinAction,
    pub tins: Vec<Tin>,
    /// Tins present before the import (for Replace warnings)
    pub existing_tins: usize,
}

/// Everything an import will write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
    pub total_records: usize,
    /// Records dropped for a blank brand or blend
    pub discarded: usize,
    /// Distinct keys that matched an existing item
    pub matched: usize,
    pub collate: bool,
    pub inserts: Vec<PlannedInsert>,
    pub updates: Vec<PlannedUpdate>,
}

impl ImportPlan {
    /// Updates that delete existing tins
    pub fn tin_replacements(&self) -> impl Iterator<Item = &PlannedUpdate> {
        self.updates
            .iter()
            .filter(|u| u.tin_action == TinAction::Replace && u.existing_tins > 0)
    }

    pub fn replaces_tins(&self) -> bool {
        self.tin_replacements().next().is_some()
    }

    /// Summary of what committing this plan would do
    pub fn preview(&self) -> ImportSummary {
        let tins = self.inserts.iter().map(|i| i.tins.len()).sum::<usize>()
            + self.updates.iter().map(|u| u.tins.len()).sum::<usize>();
        ImportSummary {
            total_records: self.total_records,
            conversions: self.inserts.len() + self.matched,
            insertions: self.inserts.len(),
            updates: self.updates.iter().filter(|u| u.changed).count(),
            tins,
            tins_collated: self.collate && tins > 0,
        }
    }
}

/// Counters reported after an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total_records: usize,
    /// New plus matched distinct keys
    pub conversions: usize,
    pub insertions: usize,
    /// Existing items whose stored fields changed
    pub updates: usize,
    pub tins: usize,
    pub tins_collated: bool,
}

impl ImportSummary {
    pub fn any_updates(&self) -> bool {
        self.updates > 0
    }
}

/// Records sharing one natural key, in file order
struct RecordGroup<'r> {
    brand: String,
    blend: String,
    rows: Vec<&'r StringRecord>,
}

fn group_records<'r>(
    records: &'r [StringRecord],
    columns: &ResolvedColumns,
) -> (Vec<RecordGroup<'r>>, usize) {
    let mut groups: Vec<RecordGroup<'r>> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut discarded = 0;

    for (row_idx, record) in records.iter().enumerate() {
        let brand = columns.cell(record, Field::Brand);
        let blend = columns.cell(record, Field::Blend);
        if brand.is_empty() || blend.is_empty() {
            log::debug!("record {}: blank brand or blend, discarded", row_idx + 1);
            discarded += 1;
            continue;
        }

        let key = (brand.to_string(), blend.to_string());
        match index.get(&key) {
            Some(&i) => groups[i].rows.push(record),
            None => {
                index.insert(key, groups.len());
                groups.push(RecordGroup {
                    brand: brand.to_string(),
                    blend: blend.to_string(),
                    rows: vec![record],
                });
            }
        }
    }

    (groups, discarded)
}

/// Plan an import without writing anything
pub fn plan_import<C: Catalog + ?Sized>(
    catalog: &C,
    table: &CsvTable,
    mapping: &ColumnMapping,
    options: &ImportOptions,
) -> Result<ImportPlan, ImportError> {
    mapping.validate()?;
    let columns = mapping.resolve(&table.column_labels(mapping.has_header))?;

    let maps_dates = [Field::ManufactureDate, Field::CellarDate, Field::OpenDate]
        .iter()
        .any(|f| columns.is_mapped(*f));
    if maps_dates && mapping.date_format.is_none() {
        log::warn!("date columns are mapped but no date format is set; dates will be left blank");
    }

    let records = table.records(mapping.has_header);
    let (groups, discarded) = group_records(records, &columns);
    let rows = RowMapper {
        columns: &columns,
        mapping,
        options,
    };

    let mut plan = ImportPlan {
        total_records: records.len(),
        discarded,
        collate: mapping.collate_tins,
        ..Default::default()
    };

    for group in groups {
        let first = group.rows[0];

        let existing = match catalog.find_item(&group.brand, &group.blend)? {
            Some(existing) => existing,
            None => {
                let mut item = rows.build_item(&group.brand, &group.blend, first);
                let tins = rows.build_tins(&group.rows);
                if mapping.sync_tins && !tins.is_empty() {
                    item.quantity = synced_quantity(&tins, &options.conversion);
                }
                log::debug!(
                    "{}: new item with {} tin(s)",
                    item.display_name(),
                    tins.len()
                );
                plan.inserts.push(PlannedInsert { item, tins });
                continue;
            }
        };

        plan.matched += 1;
        let Some(item_id) = existing.id else {
            log::warn!("{}: matched item has no id, skipped", existing.display_name());
            continue;
        };

        let mut item = match options.policy {
            MergePolicy::Skip => {
                log::debug!("{}: exists, skipped", existing.display_name());
                continue;
            }
            MergePolicy::Update => rows.update_item(existing.clone(), first),
            MergePolicy::Overwrite => rows.overwrite_item(existing.clone(), first, &options.overwrite),
        };

        let existing_tins = catalog.tins_for_item(item_id)?;
        let (tin_action, tins) =
            if options.policy == MergePolicy::Overwrite && mapping.collate_tins {
                (TinAction::Replace, rows.build_tins(&group.rows))
            } else if existing_tins.is_empty() {
                let tins = rows.build_tins(&group.rows);
                let action = if tins.is_empty() {
                    TinAction::Keep
                } else {
                    TinAction::Append
                };
                (action, tins)
            } else {
                (TinAction::Keep, Vec::new())
            };

        if mapping.sync_tins {
            let effective: Vec<&Tin> = match tin_action {
                TinAction::Replace => tins.iter().collect(),
                _ => existing_tins.iter().chain(tins.iter()).collect(),
            };
            if !effective.is_empty() {
                item.quantity = synced_quantity(effective, &options.conversion);
            }
        }

        let changed = item != existing;
        log::debug!(
            "{}: {} (changed: {}, tins: {:?} x{})",
            item.display_name(),
            options.policy,
            changed,
            tin_action,
            tins.len()
        );

        if changed || tin_action != TinAction::Keep {
            plan.updates.push(PlannedUpdate {
                item,
                changed,
                tin_action,
                tins,
                existing_tins: existing_tins.len(),
            });
        }
    }

    Ok(plan)
}

/// Coerces the cells of one record into item and tin values
struct RowMapper<'a> {
    columns: &'a ResolvedColumns,
    mapping: &'a ColumnMapping,
    options: &'a ImportOptions,
}

/// Free-text item fields
const TEXT_FIELDS: [Field; 5] = [
    Field::Subgenre,
    Field::Cut,
    Field::Components,
    Field::Flavoring,
    Field::Notes,
];

fn text_field_mut(item: &mut Item, field: Field) -> Option<&mut String> {
    match field {
        Field::Subgenre => Some(&mut item.subgenre),
        Field::Cut => Some(&mut item.cut),
        Field::Components => Some(&mut item.components),
        Field::Flavoring => Some(&mut item.flavoring),
        Field::Notes => Some(&mut item.notes),
        _ => None,
    }
}

impl RowMapper<'_> {
    fn cell<'r>(&self, record: &'r StringRecord, field: Field) -> Option<&'r str> {
        if self.columns.is_mapped(field) {
            Some(self.columns.cell(record, field))
        } else {
            None
        }
    }

    fn rating(&self, raw: &str) -> Option<f64> {
        parse_rating(raw, self.mapping.rating_max.unwrap_or(0.0))
    }

    /// New item from every mapped field
    fn build_item(&self, brand: &str, blend: &str, record: &StringRecord) -> Item {
        let mut item = Item::new(brand, blend);

        if let Some(raw) = self.cell(record, Field::Type) {
            item.blend_type = parse_blend_type(raw);
        }
        for field in TEXT_FIELDS {
            if let (Some(raw), Some(slot)) = (self.cell(record, field), text_field_mut(&mut item, field)) {
                *slot = raw.to_string();
            }
        }
        if let Some(raw) = self.cell(record, Field::Quantity) {
            item.quantity = parse_quantity(raw).unwrap_or(DEFAULT_QUANTITY);
        }
        if let Some(raw) = self.cell(record, Field::Rating) {
            item.rating = self.rating(raw);
        }
        if let Some(raw) = self.cell(record, Field::Disliked) {
            item.set_disliked(parse_bool(raw));
        }
        if let Some(raw) = self.cell(record, Field::Favorite) {
            if parse_bool(raw) {
                item.set_favorite(true);
            }
        }
        if let Some(raw) = self.cell(record, Field::Production) {
            item.in_production = parse_bool(raw);
        }

        item
    }

    /// Fill only fields that are still blank or default
    fn update_item(&self, mut item: Item, record: &StringRecord) -> Item {
        if let Some(raw) = self.cell(record, Field::Type) {
            if item.blend_type.is_none() {
                item.blend_type = parse_blend_type(raw);
            }
        }
        for field in TEXT_FIELDS {
            if let (Some(raw), Some(slot)) = (self.cell(record, field), text_field_mut(&mut item, field)) {
                if slot.is_empty() && !raw.is_empty() {
                    *slot = raw.to_string();
                }
            }
        }
        if let Some(raw) = self.cell(record, Field::Quantity) {
            if item.quantity == DEFAULT_QUANTITY {
                if let Some(q) = parse_quantity(raw) {
                    item.quantity = q;
                }
            }
        }
        if let Some(raw) = self.cell(record, Field::Rating) {
            if item.rating.is_none() {
                item.rating = self.rating(raw);
            }
        }
        if item.is_neutral() {
            let favorite = self.cell(record, Field::Favorite).is_some_and(parse_bool);
            let disliked = self.cell(record, Field::Disliked).is_some_and(parse_bool);
            if favorite {
                item.set_favorite(true);
            } else if disliked {
                item.set_disliked(true);
            }
        }
        if let Some(raw) = self.cell(record, Field::Production) {
            if item.in_production && !raw.is_empty() {
                item.in_production = parse_bool(raw);
            }
        }

        item
    }

    /// Replace every selected, mapped field with the CSV value
    fn overwrite_item(&self, mut item: Item, record: &StringRecord, allowed: &OverwriteSet) -> Item {
        for field in allowed.iter() {
            let Some(raw) = self.cell(record, field) else {
                continue;
            };
            match field {
                Field::Type => item.blend_type = parse_blend_type(raw),
                Field::Quantity => {
                    if let Some(q) = parse_quantity(raw) {
                        item.quantity = q;
                    }
                }
                Field::Rating => item.rating = self.rating(raw),
                Field::Favorite => item.favorite = parse_bool(raw),
                Field::Disliked => item.disliked = parse_bool(raw),
                Field::Production => item.in_production = parse_bool(raw),
                _ => {
                    if let Some(slot) = text_field_mut(&mut item, field) {
                        *slot = raw.to_string();
                    }
                }
            }
        }

        if item.favorite && item.disliked {
            item.disliked = false;
        }

        item
    }

    /// Tins for a group: one per record when collating, otherwise at most one
    fn build_tins(&self, rows: &[&StringRecord]) -> Vec<Tin> {
        let records: &[&StringRecord] = if self.mapping.collate_tins {
            rows
        } else {
            match rows.first() {
                Some(first)
                    if Field::TIN_FIELDS
                        .iter()
                        .any(|f| !self.columns.cell(first, *f).is_empty()) =>
                {
                    &rows[..1]
                }
                _ => return Vec::new(),
            }
        };

        let mut taken = HashSet::new();
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let label = self.tin_label(record, i + 1, &taken);
                taken.insert(label.clone());
                self.build_tin(record, label)
            })
            .collect()
    }

    /// Mapped label when present, else "Lot N"; never one already taken in the group
    fn tin_label(&self, record: &StringRecord, lot: usize, taken: &HashSet<String>) -> String {
        let wanted = self.columns.cell(record, Field::Label);
        if wanted.is_empty() {
            return (lot..)
                .map(Tin::lot_label)
                .find(|l| !taken.contains(l))
                .unwrap_or_default();
        }
        if !taken.contains(wanted) {
            return wanted.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", wanted, n))
            .find(|l| !taken.contains(l))
            .unwrap_or_default()
    }

    fn build_tin(&self, record: &StringRecord, label: String) -> Tin {
        let mut tin = Tin::new(label);
        tin.container = self.columns.cell(record, Field::Container).to_string();

        let amount = parse_tin_quantity(self.columns.cell(record, Field::TinQuantity));
        tin.quantity = amount.amount;
        tin.unit = amount.unit;

        if let Some(format) = self.mapping.date_format {
            let date = |field| format.parse(self.columns.cell(record, field), self.options.today);
            tin.manufacture_date = date(Field::ManufactureDate);
            tin.cellar_date = date(Field::CellarDate);
            tin.open_date = date(Field::OpenDate);
        }

        tin.finished = parse_bool(self.columns.cell(record, Field::Finished));
        tin
    }
}

#[cfg(test)]
mod tests;
