//! CSV export of items and tins
//!
//! Header names double as the column names of the re-import presets in
//! [`ColumnMapping::item_export`](crate::import::ColumnMapping::item_export)
//! and [`ColumnMapping::tin_export`](crate::import::ColumnMapping::tin_export).

use std::io::Write;

use chrono::NaiveDate;
use csv::Writer;

use crate::core::store::TinRow;
use crate::entities::Item;
use crate::import::Field;

/// Item columns, in output order
pub const ITEM_HEADERS: &[(Field, &str)] = &[
    (Field::Brand, "Brand"),
    (Field::Blend, "Blend"),
    (Field::Type, "Type"),
    (Field::Subgenre, "Subgenre"),
    (Field::Cut, "Cut"),
    (Field::Components, "Components"),
    (Field::Flavoring, "Flavoring"),
    (Field::Quantity, "Quantity"),
    (Field::Rating, "Rating"),
    (Field::Favorite, "Favorite"),
    (Field::Disliked, "Disliked"),
    (Field::Production, "Production"),
    (Field::Notes, "Notes"),
];

/// Tin columns, in output order
pub const TIN_HEADERS: &[(Field, &str)] = &[
    (Field::Brand, "Brand"),
    (Field::Blend, "Blend"),
    (Field::Label, "Label"),
    (Field::Container, "Container"),
    (Field::TinQuantity, "Quantity"),
    (Field::ManufactureDate, "Manufacture Date"),
    (Field::CellarDate, "Cellar Date"),
    (Field::OpenDate, "Open Date"),
    (Field::Finished, "Finished"),
];

const EXPORT_DATE_FORMAT: &str = "%m/%d/%Y";

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(EXPORT_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Write items as CSV, returning the number of rows written
pub fn write_items<W: Write>(writer: W, items: &[Item]) -> csv::Result<usize> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(ITEM_HEADERS.iter().map(|(_, h)| *h))?;

    for item in items {
        let quantity = item.quantity.to_string();
        let rating = item.rating.map(|r| r.to_string()).unwrap_or_default();
        wtr.write_record([
            item.brand.as_str(),
            item.blend.as_str(),
            item.blend_type.map(|t| t.as_str()).unwrap_or(""),
            item.subgenre.as_str(),
            item.cut.as_str(),
            item.components.as_str(),
            item.flavoring.as_str(),
            quantity.as_str(),
            rating.as_str(),
            bool_cell(item.favorite),
            bool_cell(item.disliked),
            bool_cell(item.in_production),
            item.notes.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(items.len())
}

/// Write tins with their item keys as CSV, returning the number of rows written
pub fn write_tins<W: Write>(writer: W, rows: &[TinRow]) -> csv::Result<usize> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(TIN_HEADERS.iter().map(|(_, h)| *h))?;

    for row in rows {
        let tin = &row.tin;
        wtr.write_record([
            row.brand.clone(),
            row.blend.clone(),
            tin.label.clone(),
            tin.container.clone(),
            tin.quantity_display(),
            date_cell(tin.manufacture_date),
            date_cell(tin.cellar_date),
            date_cell(tin.open_date),
            bool_cell(tin.finished).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{CellarStore, ItemFilter};
    use crate::entities::{BlendType, Tin, TinUnit};
    use crate::import::{plan_import, read_csv, ColumnMapping, ImportOptions, MergePolicy};

    fn sample_item() -> Item {
        let mut item = Item::new("Acme", "Red, Ribbon");
        item.blend_type = Some(BlendType::English);
        item.rating = Some(3.5);
        item.quantity = 4;
        item.favorite = true;
        item.notes = "smoky".to_string();
        item
    }

    #[test]
    fn test_write_items() {
        let mut out = Vec::new();
        let count = write_items(&mut out, &[sample_item()]).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Brand,Blend,Type,Subgenre,Cut,Components,Flavoring,Quantity,Rating,Favorite,Disliked,Production,Notes")
        );
        assert_eq!(
            lines.next(),
            Some("Acme,\"Red, Ribbon\",English,,,,,4,3.5,true,false,true,smoky")
        );
    }

    #[test]
    fn test_write_tins() {
        let mut tin = Tin::new("Lot 1");
        tin.quantity = Some(12.0);
        tin.unit = Some(TinUnit::Oz);
        tin.cellar_date = NaiveDate::from_ymd_opt(2021, 3, 4);
        let rows = vec![TinRow {
            brand: "Acme".to_string(),
            blend: "Red".to_string(),
            tin,
        }];

        let mut out = Vec::new();
        write_tins(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Acme,Red,Lot 1,,12 oz,,03/04/2021,,false"));
    }

    #[test]
    fn test_item_export_reimports() {
        let mut source = CellarStore::open_in_memory().unwrap();
        source.insert_item(&sample_item()).unwrap();
        let items = source.list_items(&ItemFilter::default()).unwrap();

        let mut out = Vec::new();
        write_items(&mut out, &items).unwrap();

        let mut target = CellarStore::open_in_memory().unwrap();
        let table = read_csv(out.as_slice()).unwrap();
        let plan = plan_import(
            &target,
            &table,
            &ColumnMapping::item_export(),
            &ImportOptions::new(MergePolicy::Skip),
        )
        .unwrap();
        target.apply_import(&plan).unwrap();

        let mut restored = target.find_item("Acme", "Red, Ribbon").unwrap().unwrap();
        restored.id = None;
        assert_eq!(restored, sample_item());
    }

    #[test]
    fn test_tin_export_reimports() {
        let mut source = CellarStore::open_in_memory().unwrap();
        let id = source.insert_item(&Item::new("Acme", "Red")).unwrap();
        let mut tin = Tin::new("Spare");
        tin.quantity = Some(50.0);
        tin.unit = Some(TinUnit::Grams);
        tin.open_date = NaiveDate::from_ymd_opt(2019, 11, 30);
        source.insert_tin(id, &tin).unwrap();
        source.insert_tin(id, &Tin::new("Gift 2019")).unwrap();

        let rows = source.list_tins(&ItemFilter::default(), true).unwrap();
        let mut out = Vec::new();
        write_tins(&mut out, &rows).unwrap();

        let mut target = CellarStore::open_in_memory().unwrap();
        let table = read_csv(out.as_slice()).unwrap();
        let plan = plan_import(
            &target,
            &table,
            &ColumnMapping::tin_export(),
            &ImportOptions::new(MergePolicy::Skip),
        )
        .unwrap();
        let summary = target.apply_import(&plan).unwrap();
        assert_eq!(summary.insertions, 1);
        assert_eq!(summary.tins, 2);

        let red = target.find_item("Acme", "Red").unwrap().unwrap();
        let tins = target.tins_for_item(red.id.unwrap()).unwrap();
        let labels: Vec<_> = tins.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Spare", "Gift 2019"]);
        assert_eq!(tins[0].unit, Some(TinUnit::Grams));
        assert_eq!(tins[0].open_date, NaiveDate::from_ymd_opt(2019, 11, 30));
    }
}
