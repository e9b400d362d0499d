use super::*;
use crate::core::store::CellarStore;
use crate::entities::{BlendType, TinUnit};
use crate::import::{read_csv, DateFormat, MappingError};

fn store() -> CellarStore {
    CellarStore::open_in_memory().unwrap()
}

fn table(csv: &str) -> CsvTable {
    read_csv(csv.as_bytes()).unwrap()
}

fn base_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with(Field::Brand, "Brand")
        .with(Field::Blend, "Blend")
}

fn options(policy: MergePolicy) -> ImportOptions {
    ImportOptions {
        today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        ..ImportOptions::new(policy)
    }
}

fn import(
    store: &mut CellarStore,
    csv: &str,
    mapping: &ColumnMapping,
    opts: &ImportOptions,
) -> ImportSummary {
    let plan = plan_import(store, &table(csv), mapping, opts).unwrap();
    store.apply_import(&plan).unwrap()
}

// =========================================================================
// Grouping and validation
// =========================================================================

#[test]
fn test_blank_key_records_are_discarded() {
    let store = store();
    let csv = "Brand,Blend\nAcme,Red\n,Blue\nAcme,\n  ,  \nBolt,Gold\n";
    let plan = plan_import(&store, &table(csv), &base_mapping(), &options(MergePolicy::Skip)).unwrap();

    assert_eq!(plan.total_records, 4);
    assert_eq!(plan.discarded, 2);
    assert_eq!(plan.inserts.len(), 2);
}

#[test]
fn test_missing_required_mapping_fails() {
    let store = store();
    let mapping = ColumnMapping::new().with(Field::Brand, "Brand");
    let err = plan_import(&store, &table("Brand,Blend\nA,B\n"), &mapping, &options(MergePolicy::Skip))
        .unwrap_err();
    assert!(matches!(err, ImportError::Mapping(MappingError::MissingRequired)));
}

#[test]
fn test_unknown_column_fails() {
    let store = store();
    let mapping = base_mapping().with(Field::Notes, "Remarks");
    let err = plan_import(&store, &table("Brand,Blend\nA,B\n"), &mapping, &options(MergePolicy::Skip))
        .unwrap_err();
    assert!(matches!(err, ImportError::Mapping(MappingError::UnknownColumn { .. })));
}

#[test]
fn test_headerless_file_uses_column_labels() {
    let mut store = store();
    let mut mapping = ColumnMapping::new()
        .with(Field::Brand, "Column 1")
        .with(Field::Blend, "Column 2");
    mapping.has_header = false;

    let summary = import(&mut store, "Acme,Red\nAcme,Blue\n", &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.insertions, 2);
}

#[test]
fn test_first_record_wins_within_batch() {
    let mut store = store();
    let mapping = base_mapping().with(Field::Type, "Type");
    let csv = "Brand,Blend,Type\nAcme,Red,english\nAcme,Red,virginia\n";

    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.insertions, 1);
    assert_eq!(summary.conversions, 1);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.blend_type, Some(BlendType::English));
}

// =========================================================================
// New items
// =========================================================================

#[test]
fn test_new_item_coerces_fields() {
    let mut store = store();
    let mut mapping = base_mapping()
        .with(Field::Type, "Type")
        .with(Field::Quantity, "Qty")
        .with(Field::Rating, "Score")
        .with(Field::Favorite, "Fav")
        .with(Field::Disliked, "Bad")
        .with(Field::Production, "Made")
        .with(Field::Notes, "Notes");
    mapping.rating_max = Some(10.0);

    let csv = "Brand,Blend,Type,Qty,Score,Fav,Bad,Made,Notes\n\
               Acme,Red,Aromatic,150,8,yes,x,,sweet\n\
               Acme,Blue,bogus,abc,,no,,y,\n";
    import(&mut store, csv, &mapping, &options(MergePolicy::Skip));

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.blend_type, Some(BlendType::Aromatic));
    assert_eq!(red.quantity, 0);
    assert_eq!(red.rating, Some(4.0));
    assert!(red.favorite);
    assert!(!red.disliked);
    assert!(!red.in_production);
    assert_eq!(red.notes, "sweet");

    let blue = store.find_item("Acme", "Blue").unwrap().unwrap();
    assert_eq!(blue.blend_type, None);
    assert_eq!(blue.quantity, 1);
    assert_eq!(blue.rating, None);
    assert!(blue.in_production);
}

#[test]
fn test_unmapped_production_defaults_true() {
    let mut store = store();
    import(&mut store, "Brand,Blend\nAcme,Red\n", &base_mapping(), &options(MergePolicy::Skip));
    assert!(store.find_item("Acme", "Red").unwrap().unwrap().in_production);
}

// =========================================================================
// Merge policies
// =========================================================================

#[test]
fn test_skip_is_idempotent() {
    let mut store = store();
    let mapping = base_mapping().with(Field::Notes, "Notes");
    let csv = "Brand,Blend,Notes\nAcme,Red,first\nBolt,Gold,\n";

    let first = import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(first.insertions, 2);

    let changed = "Brand,Blend,Notes\nAcme,Red,second\nBolt,Gold,new\n";
    let second = import(&mut store, changed, &mapping, &options(MergePolicy::Skip));
    assert_eq!(second.insertions, 0);
    assert_eq!(second.updates, 0);
    assert_eq!(second.conversions, 2);
    assert!(!second.any_updates());

    assert_eq!(store.find_item("Acme", "Red").unwrap().unwrap().notes, "first");
    assert_eq!(store.stats().unwrap().items, 2);
}

#[test]
fn test_update_fills_blanks_only() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.notes = "keep me".to_string();
    red.quantity = 5;
    red.blend_type = Some(BlendType::Virginia);
    store.insert_item(&red).unwrap();

    let mapping = base_mapping()
        .with(Field::Type, "Type")
        .with(Field::Notes, "Notes")
        .with(Field::Cut, "Cut")
        .with(Field::Quantity, "Qty");
    let csv = "Brand,Blend,Type,Notes,Cut,Qty\nAcme,Red,English,replace,Flake,9\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Update));
    assert_eq!(summary.updates, 1);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.notes, "keep me");
    assert_eq!(red.quantity, 5);
    assert_eq!(red.blend_type, Some(BlendType::Virginia));
    assert_eq!(red.cut, "Flake");
}

#[test]
fn test_update_fills_default_quantity() {
    let mut store = store();
    store.insert_item(&Item::new("Acme", "Red")).unwrap();

    let mapping = base_mapping().with(Field::Quantity, "Qty");
    import(&mut store, "Brand,Blend,Qty\nAcme,Red,4\n", &mapping, &options(MergePolicy::Update));
    assert_eq!(store.find_item("Acme", "Red").unwrap().unwrap().quantity, 4);
}

#[test]
fn test_update_without_changes_counts_nothing() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.notes = "set".to_string();
    store.insert_item(&red).unwrap();

    let mapping = base_mapping().with(Field::Notes, "Notes");
    let summary = import(&mut store, "Brand,Blend,Notes\nAcme,Red,other\n", &mapping, &options(MergePolicy::Update));
    assert_eq!(summary.updates, 0);
    assert_eq!(summary.conversions, 1);
}

#[test]
fn test_update_type_scenario() {
    // Acme/Red exists without a type; english then bogus fills English once
    let mut store = store();
    store.insert_item(&Item::new("Acme", "Red")).unwrap();

    let mapping = base_mapping().with(Field::Type, "Type");
    let csv = "Brand,Blend,Type\nAcme,Red,english\nAcme,Red,bogus\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Update));

    assert_eq!(summary.updates, 1);
    assert_eq!(store.stats().unwrap().items, 1);
    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.blend_type, Some(BlendType::English));
}

#[test]
fn test_update_flags_only_when_neutral() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.disliked = true;
    store.insert_item(&red).unwrap();
    store.insert_item(&Item::new("Acme", "Blue")).unwrap();

    let mapping = base_mapping().with(Field::Favorite, "Fav");
    let csv = "Brand,Blend,Fav\nAcme,Red,yes\nAcme,Blue,yes\n";
    import(&mut store, csv, &mapping, &options(MergePolicy::Update));

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert!(!red.favorite);
    assert!(red.disliked);
    assert!(store.find_item("Acme", "Blue").unwrap().unwrap().favorite);
}

#[test]
fn test_overwrite_respects_selection() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.notes = "old".to_string();
    red.cut = "Ribbon".to_string();
    store.insert_item(&red).unwrap();

    let mapping = base_mapping()
        .with(Field::Notes, "Notes")
        .with(Field::Cut, "Cut");
    let mut opts = options(MergePolicy::Overwrite);
    opts.overwrite = "notes".parse().unwrap();

    let csv = "Brand,Blend,Notes,Cut\nAcme,Red,new,Flake\n";
    let summary = import(&mut store, csv, &mapping, &opts);
    assert_eq!(summary.updates, 1);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.notes, "new");
    assert_eq!(red.cut, "Ribbon");
}

#[test]
fn test_overwrite_blank_clears_text_and_keeps_quantity() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.notes = "old".to_string();
    red.quantity = 7;
    store.insert_item(&red).unwrap();

    let mapping = base_mapping()
        .with(Field::Notes, "Notes")
        .with(Field::Quantity, "Qty");
    let mut opts = options(MergePolicy::Overwrite);
    opts.overwrite = OverwriteSet::all();

    import(&mut store, "Brand,Blend,Notes,Qty\nAcme,Red,,\n", &mapping, &opts);
    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert_eq!(red.notes, "");
    assert_eq!(red.quantity, 7);
}

#[test]
fn test_overwrite_favorite_wins_over_disliked() {
    let mut store = store();
    store.insert_item(&Item::new("Acme", "Red")).unwrap();

    let mapping = base_mapping()
        .with(Field::Favorite, "Fav")
        .with(Field::Disliked, "Bad");
    let mut opts = options(MergePolicy::Overwrite);
    opts.overwrite = OverwriteSet::all();

    import(&mut store, "Brand,Blend,Fav,Bad\nAcme,Red,1,1\n", &mapping, &opts);
    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    assert!(red.favorite);
    assert!(!red.disliked);
}

// =========================================================================
// Tins
// =========================================================================

fn tin_mapping() -> ColumnMapping {
    let mut mapping = base_mapping()
        .with(Field::TinQuantity, "Amount")
        .with(Field::CellarDate, "Cellared");
    mapping.date_format = Some(DateFormat::MonthYear);
    mapping
}

#[test]
fn test_collate_creates_one_tin_per_row() {
    let mut store = store();
    let mut mapping = tin_mapping();
    mapping.collate_tins = true;

    let csv = "Brand,Blend,Amount,Cellared\n\
               Acme,Red,1.75 oz,03/21\n\
               Acme,Red,50g,12/99\n\
               Acme,Red,,\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.insertions, 1);
    assert_eq!(summary.tins, 3);
    assert!(summary.tins_collated);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    let tins = store.tins_for_item(red.id.unwrap()).unwrap();
    let labels: Vec<_> = tins.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["Lot 1", "Lot 2", "Lot 3"]);
    assert_eq!(tins[0].unit, Some(TinUnit::Oz));
    assert_eq!(tins[0].cellar_date, NaiveDate::from_ymd_opt(2021, 3, 1));
    assert_eq!(tins[1].unit, Some(TinUnit::Grams));
    assert_eq!(tins[1].cellar_date, NaiveDate::from_ymd_opt(1999, 12, 1));
    assert_eq!(tins[2].quantity, None);
}

#[test]
fn test_without_collate_at_most_one_tin() {
    let mut store = store();
    let csv = "Brand,Blend,Amount,Cellared\nAcme,Red,2 oz,\nAcme,Red,4 oz,\nBolt,Gold,,\n";
    let summary = import(&mut store, csv, &tin_mapping(), &options(MergePolicy::Skip));
    assert_eq!(summary.tins, 1);
    assert!(!summary.tins_collated);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    let tins = store.tins_for_item(red.id.unwrap()).unwrap();
    assert_eq!(tins.len(), 1);
    assert_eq!(tins[0].quantity, Some(2.0));
}

#[test]
fn test_mapped_labels_are_kept_and_made_unique() {
    let mut store = store();
    let mut mapping = tin_mapping().with(Field::Label, "Label");
    mapping.collate_tins = true;

    let csv = "Brand,Blend,Label,Amount,Cellared\n\
               Acme,Red,Spare,2 oz,\n\
               Acme,Red,,1 oz,\n\
               Acme,Red,Spare,,\n\
               Acme,Red,Lot 4,,\n\
               Acme,Red,,,\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.tins, 5);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    let tins = store.tins_for_item(red.id.unwrap()).unwrap();
    let labels: Vec<_> = tins.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["Spare", "Lot 2", "Spare (2)", "Lot 4", "Lot 5"]);
}

#[test]
fn test_label_alone_creates_a_tin() {
    let mut store = store();
    let mapping = tin_mapping().with(Field::Label, "Label");
    let csv = "Brand,Blend,Label,Amount,Cellared\nAcme,Red,Gift,,\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.tins, 1);

    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    let tins = store.tins_for_item(red.id.unwrap()).unwrap();
    assert_eq!(tins[0].label, "Gift");
}

#[test]
fn test_dates_blank_without_format() {
    let mut store = store();
    let mut mapping = tin_mapping();
    mapping.date_format = None;

    import(&mut store, "Brand,Blend,Amount,Cellared\nAcme,Red,2 oz,03/21\n", &mapping, &options(MergePolicy::Skip));
    let red = store.find_item("Acme", "Red").unwrap().unwrap();
    let tins = store.tins_for_item(red.id.unwrap()).unwrap();
    assert_eq!(tins[0].cellar_date, None);
}

#[test]
fn test_skip_never_adds_tins() {
    let mut store = store();
    store.insert_item(&Item::new("Acme", "Red")).unwrap();

    let mut mapping = tin_mapping();
    mapping.collate_tins = true;
    let summary = import(&mut store, "Brand,Blend,Amount,Cellared\nAcme,Red,2 oz,\n", &mapping, &options(MergePolicy::Skip));
    assert_eq!(summary.tins, 0);
}

#[test]
fn test_update_adds_tins_only_when_none_exist() {
    let mut store = store();
    let empty = store.insert_item(&Item::new("Acme", "Red")).unwrap();
    let stocked = store.insert_item(&Item::new("Acme", "Blue")).unwrap();
    store.insert_tin(stocked, &Tin::new("Mine")).unwrap();

    let mut mapping = tin_mapping();
    mapping.collate_tins = true;
    let csv = "Brand,Blend,Amount,Cellared\nAcme,Red,2 oz,\nAcme,Blue,2 oz,\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Update));

    assert_eq!(summary.tins, 1);
    assert_eq!(store.tins_for_item(empty).unwrap().len(), 1);
    let blue = store.tins_for_item(stocked).unwrap();
    assert_eq!(blue.len(), 1);
    assert_eq!(blue[0].label, "Mine");
}

#[test]
fn test_overwrite_collate_replaces_tins() {
    let mut store = store();
    let id = store.insert_item(&Item::new("Acme", "Red")).unwrap();
    for label in ["A", "B", "C", "D"] {
        store.insert_tin(id, &Tin::new(label)).unwrap();
    }

    let mut mapping = tin_mapping();
    mapping.collate_tins = true;
    let csv = "Brand,Blend,Amount,Cellared\nAcme,Red,1 oz,\nAcme,Red,2 oz,\n";
    let plan = plan_import(&store, &table(csv), &mapping, &options(MergePolicy::Overwrite)).unwrap();
    assert!(plan.replaces_tins());
    assert_eq!(plan.tin_replacements().count(), 1);

    let summary = store.apply_import(&plan).unwrap();
    assert_eq!(summary.tins, 2);
    let tins = store.tins_for_item(id).unwrap();
    let labels: Vec<_> = tins.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["Lot 1", "Lot 2"]);
}

#[test]
fn test_sync_recomputes_quantity() {
    let mut store = store();
    let mut mapping = tin_mapping();
    mapping.collate_tins = true;
    mapping.sync_tins = true;

    // 3.5 oz + 100 g + 1 lb = 2 + 2 + 9.14 tins
    let csv = "Brand,Blend,Amount,Cellared\nAcme,Red,3.5 oz,\nAcme,Red,100 grams,\nAcme,Red,1 lb,\n";
    import(&mut store, csv, &mapping, &options(MergePolicy::Skip));
    assert_eq!(store.find_item("Acme", "Red").unwrap().unwrap().quantity, 13);
}

#[test]
fn test_sync_on_update_counts_existing_tins() {
    let mut store = store();
    let mut red = Item::new("Acme", "Red");
    red.quantity = 9;
    let id = store.insert_item(&red).unwrap();

    let mut mapping = tin_mapping();
    mapping.collate_tins = true;
    mapping.sync_tins = true;
    let csv = "Brand,Blend,Amount,Cellared\nAcme,Red,3.5 oz,\n";
    let summary = import(&mut store, csv, &mapping, &options(MergePolicy::Update));

    assert_eq!(summary.updates, 1);
    assert_eq!(store.tins_for_item(id).unwrap().len(), 1);
    assert_eq!(store.get_item(id).unwrap().quantity, 2);
}

#[test]
fn test_preview_matches_commit() {
    let mut store = store();
    store.insert_item(&Item::new("Acme", "Red")).unwrap();

    let mapping = base_mapping().with(Field::Notes, "Notes");
    let csv = "Brand,Blend,Notes\nAcme,Red,hi\nBolt,Gold,\n";
    let plan = plan_import(&store, &table(csv), &mapping, &options(MergePolicy::Update)).unwrap();
    let preview = plan.preview();
    let summary = store.apply_import(&plan).unwrap();
    assert_eq!(preview, summary);
    assert_eq!(summary.conversions, 2);
    assert_eq!(summary.insertions, 1);
    assert_eq!(summary.updates, 1);
}

#[test]
fn test_failed_commit_leaves_store_untouched() {
    let mut store = store();
    let plan = ImportPlan {
        total_records: 2,
        inserts: vec![
            PlannedInsert {
                item: Item::new("Acme", "Red"),
                tins: vec![],
            },
            PlannedInsert {
                item: Item::new("Acme", "Red"),
                tins: vec![],
            },
        ],
        ..Default::default()
    };

    assert!(store.apply_import(&plan).is_err());
    assert!(store.find_item("Acme", "Red").unwrap().is_none());
}

#[test]
fn test_merge_policy_parse() {
    assert_eq!("Update".parse::<MergePolicy>().unwrap(), MergePolicy::Update);
    assert_eq!(MergePolicy::default(), MergePolicy::Skip);
    assert!("merge".parse::<MergePolicy>().is_err());
}
