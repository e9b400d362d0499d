//! Tin entity - an individual container belonging to an item

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unit of a tin's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TinUnit {
    Oz,
    Lbs,
    Grams,
}

impl TinUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TinUnit::Oz => "oz",
            TinUnit::Lbs => "lbs",
            TinUnit::Grams => "grams",
        }
    }
}

impl std::fmt::Display for TinUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TinUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('.').to_lowercase().as_str() {
            "oz" | "ozs" | "ounce" | "ounces" => Ok(TinUnit::Oz),
            "lb" | "lbs" | "pound" | "pounds" => Ok(TinUnit::Lbs),
            "g" | "gr" | "gs" | "gram" | "grams" => Ok(TinUnit::Grams),
            _ => Err(format!("Invalid tin unit: {}. Use oz, lbs, or grams", s)),
        }
    }
}

/// A single container of a blend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Owning item (None until the item is persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,

    /// Label, unique among the tins of one item
    pub label: String,

    #[serde(default)]
    pub container: String,

    pub quantity: Option<f64>,
    pub unit: Option<TinUnit>,

    pub manufacture_date: Option<NaiveDate>,
    pub cellar_date: Option<NaiveDate>,
    pub open_date: Option<NaiveDate>,

    #[serde(default)]
    pub finished: bool,
}

impl Tin {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            item_id: None,
            label: label.into(),
            container: String::new(),
            quantity: None,
            unit: None,
            manufacture_date: None,
            cellar_date: None,
            open_date: None,
            finished: false,
        }
    }

    /// Label used for generated tins: "Lot N" (1-based)
    pub fn lot_label(n: usize) -> String {
        format!("Lot {}", n)
    }

    /// Amount and unit formatted as "12 oz", or empty
    pub fn quantity_display(&self) -> String {
        match (self.quantity, self.unit) {
            (Some(q), Some(u)) => format!("{} {}", format_amount(q), u),
            (Some(q), None) => format_amount(q),
            _ => String::new(),
        }
    }

    pub fn is_opened(&self) -> bool {
        self.open_date.is_some()
    }

    /// This tin's contents expressed as a number of standard tins
    pub fn tin_equivalent(&self, rates: &TinConversion) -> f64 {
        match (self.quantity, self.unit) {
            (Some(q), Some(TinUnit::Oz)) => q / rates.oz_per_tin,
            (Some(q), Some(TinUnit::Lbs)) => q * 16.0 / rates.oz_per_tin,
            (Some(q), Some(TinUnit::Grams)) => q / rates.grams_per_tin,
            _ => 0.0,
        }
    }
}

fn format_amount(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{}", q as i64)
    } else {
        format!("{}", q)
    }
}

/// Conversion rates from container contents to a tin count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinConversion {
    pub oz_per_tin: f64,
    pub grams_per_tin: f64,
}

impl Default for TinConversion {
    fn default() -> Self {
        Self {
            oz_per_tin: 1.75,
            grams_per_tin: 50.0,
        }
    }
}

/// Quantity of an item recomputed from its tins, rounded to whole tins
pub fn synced_quantity<'a>(tins: impl IntoIterator<Item = &'a Tin>, rates: &TinConversion) -> i64 {
    let total: f64 = tins.into_iter().map(|t| t.tin_equivalent(rates)).sum();
    total.round() as i64
}
