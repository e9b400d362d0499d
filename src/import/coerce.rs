//! Conversion of raw CSV cells into typed field values
//!
//! Every coercion here is total: unparsable input falls back to a default
//! instead of failing the record.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::item::{round_rating, RATING_SCALE};
use crate::entities::{BlendType, TinUnit};

/// Largest quantity accepted from a CSV cell; larger values become 0
pub const MAX_IMPORT_QUANTITY: i64 = 99;

/// Boolean cell: true/yes/y/1/x, anything else is false
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x"
    )
}

/// Integer quantity cell.
///
/// Blank, negative or unparsable input gives `None`; values above
/// [`MAX_IMPORT_QUANTITY`] are clamped to 0.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let value: i64 = raw.trim().parse().ok()?;
    if value < 0 {
        None
    } else if value > MAX_IMPORT_QUANTITY {
        Some(0)
    } else {
        Some(value)
    }
}

/// Blend type cell; anything outside the known set is dropped
pub fn parse_blend_type(raw: &str) -> Option<BlendType> {
    raw.parse().ok()
}

/// Rating cell rescaled from `0..=max` onto the app's 0-5 scale
pub fn parse_rating(raw: &str, max: f64) -> Option<f64> {
    if max <= 0.0 {
        return None;
    }
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let scaled = (value / max * RATING_SCALE).clamp(0.0, RATING_SCALE);
    Some(round_rating(scaled))
}

/// Amount and unit split out of a tin quantity cell
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TinAmount {
    pub amount: Option<f64>,
    pub unit: Option<TinUnit>,
}

/// Split "12 oz", "1.5lbs" or "50,0 g" into amount and unit
pub fn parse_tin_quantity(raw: &str) -> TinAmount {
    let raw = raw.trim();
    let split = raw
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == ','))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());

    let (number, rest) = raw.split_at(split);
    let amount = number.replace(',', ".").parse::<f64>().ok();
    let unit = rest.trim().parse::<TinUnit>().ok();

    TinAmount { amount, unit }
}

/// Resolve a one or two digit year against the current year.
///
/// Years after the current two-digit year belong to the previous century.
pub fn resolve_two_digit_year(yy: i32, current_year: i32) -> i32 {
    let century = current_year - current_year.rem_euclid(100);
    if yy > current_year.rem_euclid(100) {
        century - 100 + yy
    } else {
        century + yy
    }
}

/// Date layouts supported by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "MM/YY")]
    MonthYear,
    #[serde(rename = "YY/MM")]
    YearMonth,
    #[serde(rename = "MM/DD/YY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YY")]
    DayMonthYear,
    #[serde(rename = "YY/MM/DD")]
    YearMonthDay,
    #[serde(rename = "Month D, YYYY")]
    MonthNameDayYear,
    #[serde(rename = "D Month, YYYY")]
    DayMonthNameYear,
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

impl DateFormat {
    pub const ALL: [DateFormat; 7] = [
        DateFormat::MonthYear,
        DateFormat::YearMonth,
        DateFormat::MonthDayYear,
        DateFormat::DayMonthYear,
        DateFormat::YearMonthDay,
        DateFormat::MonthNameDayYear,
        DateFormat::DayMonthNameYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::MonthYear => "MM/YY",
            DateFormat::YearMonth => "YY/MM",
            DateFormat::MonthDayYear => "MM/DD/YY",
            DateFormat::DayMonthYear => "DD/MM/YY",
            DateFormat::YearMonthDay => "YY/MM/DD",
            DateFormat::MonthNameDayYear => "Month D, YYYY",
            DateFormat::DayMonthNameYear => "D Month, YYYY",
        }
    }

    /// Parse a date cell. `today` anchors two-digit years.
    pub fn parse(&self, raw: &str, today: NaiveDate) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (year, month, day) = match self {
            DateFormat::MonthNameDayYear | DateFormat::DayMonthNameYear => {
                let cleaned: String = raw
                    .chars()
                    .map(|c| if matches!(c, ',' | '.' | '-' | '/') { ' ' } else { c })
                    .collect();
                let parts: Vec<&str> = cleaned.split_whitespace().collect();
                if parts.len() != 3 {
                    return None;
                }
                let (month, day) = if *self == DateFormat::MonthNameDayYear {
                    (month_from_name(parts[0])?, parts[1].parse().ok()?)
                } else {
                    (month_from_name(parts[1])?, parts[0].parse().ok()?)
                };
                (parse_year(parts[2], today)?, month, day)
            }
            _ => {
                let parts: Vec<&str> = raw.split(['/', '-', '.']).map(str::trim).collect();
                let num = |s: &str| s.parse::<u32>().ok();
                match (self, parts.as_slice()) {
                    (DateFormat::MonthYear, &[m, y]) => (parse_year(y, today)?, num(m)?, 1),
                    (DateFormat::YearMonth, &[y, m]) => (parse_year(y, today)?, num(m)?, 1),
                    (DateFormat::MonthDayYear, &[m, d, y]) => {
                        (parse_year(y, today)?, num(m)?, num(d)?)
                    }
                    (DateFormat::DayMonthYear, &[d, m, y]) => {
                        (parse_year(y, today)?, num(m)?, num(d)?)
                    }
                    (DateFormat::YearMonthDay, &[y, m, d]) => {
                        (parse_year(y, today)?, num(m)?, num(d)?)
                    }
                    _ => return None,
                }
            }
        };

        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Year token: one or two digits resolve against today, longer ones are literal
fn parse_year(raw: &str, today: NaiveDate) -> Option<i32> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i32 = raw.parse().ok()?;
    if raw.len() <= 2 {
        Some(resolve_two_digit_year(value, today.year()))
    } else {
        Some(value)
    }
}

/// Full or abbreviated (3+ letters) month name
fn month_from_name(raw: &str) -> Option<u32> {
    let name = raw.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&name))
        .map(|i| i as u32 + 1)
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', '.'], "/");
        DateFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().to_uppercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid date format: {}. Use one of: {}",
                    s,
                    DateFormat::ALL
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}
