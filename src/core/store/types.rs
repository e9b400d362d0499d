//! Store type definitions
//!
//! Filters, bulk edits and statistics used by store queries.

use std::collections::BTreeMap;

use crate::entities::BlendType;

/// Sort order for item listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemSort {
    #[default]
    Brand,
    Blend,
    Rating,
    Quantity,
}

impl ItemSort {
    pub(super) fn order_clause(&self) -> &'static str {
        match self {
            ItemSort::Brand => "brand COLLATE NOCASE, blend COLLATE NOCASE",
            ItemSort::Blend => "blend COLLATE NOCASE, brand COLLATE NOCASE",
            ItemSort::Rating => "rating IS NULL, rating DESC, brand COLLATE NOCASE",
            ItemSort::Quantity => "quantity DESC, brand COLLATE NOCASE",
        }
    }
}

impl std::str::FromStr for ItemSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brand" => Ok(ItemSort::Brand),
            "blend" => Ok(ItemSort::Blend),
            "rating" => Ok(ItemSort::Rating),
            "quantity" | "qty" => Ok(ItemSort::Quantity),
            _ => Err(format!(
                "Invalid sort key: {}. Use brand, blend, rating, or quantity",
                s
            )),
        }
    }
}

/// Filter for listing items
#[derive(Debug, Default, Clone)]
pub struct ItemFilter {
    /// Brand substring (case-insensitive)
    pub brand: Option<String>,
    pub blend_type: Option<BlendType>,
    pub favorite: Option<bool>,
    pub disliked: Option<bool>,
    pub in_production: Option<bool>,
    /// Only items with quantity > 0
    pub in_stock: bool,
    /// Free text matched against brand, blend and notes
    pub search: Option<String>,
    pub sort: ItemSort,
    pub limit: Option<usize>,
}

/// A single field change applied to many items at once
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulkEdit {
    SetType(Option<BlendType>),
    SetFavorite(bool),
    SetDisliked(bool),
    SetProduction(bool),
}

impl BulkEdit {
    pub fn describe(&self) -> String {
        match self {
            BulkEdit::SetType(Some(t)) => format!("type = {}", t),
            BulkEdit::SetType(None) => "type = (none)".to_string(),
            BulkEdit::SetFavorite(v) => format!("favorite = {}", v),
            BulkEdit::SetDisliked(v) => format!("disliked = {}", v),
            BulkEdit::SetProduction(v) => format!("in production = {}", v),
        }
    }
}

/// Collection statistics
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CellarStats {
    pub items: usize,
    pub brands: usize,
    pub total_quantity: i64,
    pub favorites: usize,
    pub disliked: usize,
    pub out_of_production: usize,
    /// Items per blend type; untyped items are counted under "(none)"
    pub by_type: BTreeMap<String, usize>,
    pub tins: usize,
    pub tins_opened: usize,
    pub tins_finished: usize,
    pub average_rating: Option<f64>,
}

/// A tin together with the key of its owning item
#[derive(Debug, Clone, PartialEq)]
pub struct TinRow {
    pub brand: String,
    pub blend: String,
    pub tin: crate::entities::Tin,
}
