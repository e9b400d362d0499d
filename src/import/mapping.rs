//! Column mapping: which CSV column feeds which logical field

use std::collections::{BTreeMap, BTreeSet};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::coerce::DateFormat;

/// Logical fields an import can populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Brand,
    Blend,
    Type,
    Subgenre,
    Cut,
    Components,
    Flavoring,
    Quantity,
    Rating,
    Favorite,
    Disliked,
    Production,
    Notes,
    // Tin fields
    Label,
    Container,
    TinQuantity,
    ManufactureDate,
    CellarDate,
    OpenDate,
    Finished,
}

impl Field {
    pub const COUNT: usize = 20;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Brand,
        Field::Blend,
        Field::Type,
        Field::Subgenre,
        Field::Cut,
        Field::Components,
        Field::Flavoring,
        Field::Quantity,
        Field::Rating,
        Field::Favorite,
        Field::Disliked,
        Field::Production,
        Field::Notes,
        Field::Label,
        Field::Container,
        Field::TinQuantity,
        Field::ManufactureDate,
        Field::CellarDate,
        Field::OpenDate,
        Field::Finished,
    ];

    /// Item fields that Overwrite may replace
    pub const OVERWRITABLE: [Field; 11] = [
        Field::Type,
        Field::Subgenre,
        Field::Cut,
        Field::Components,
        Field::Flavoring,
        Field::Quantity,
        Field::Rating,
        Field::Favorite,
        Field::Disliked,
        Field::Production,
        Field::Notes,
    ];

    pub const TIN_FIELDS: [Field; 7] = [
        Field::Label,
        Field::Container,
        Field::TinQuantity,
        Field::ManufactureDate,
        Field::CellarDate,
        Field::OpenDate,
        Field::Finished,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Brand => "brand",
            Field::Blend => "blend",
            Field::Type => "type",
            Field::Subgenre => "subgenre",
            Field::Cut => "cut",
            Field::Components => "components",
            Field::Flavoring => "flavoring",
            Field::Quantity => "quantity",
            Field::Rating => "rating",
            Field::Favorite => "favorite",
            Field::Disliked => "disliked",
            Field::Production => "production",
            Field::Notes => "notes",
            Field::Label => "label",
            Field::Container => "container",
            Field::TinQuantity => "tin_quantity",
            Field::ManufactureDate => "manufacture_date",
            Field::CellarDate => "cellar_date",
            Field::OpenDate => "open_date",
            Field::Finished => "finished",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn is_tin_field(&self) -> bool {
        Field::TIN_FIELDS.contains(self)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "blend_type" => return Ok(Field::Type),
            "in_production" => return Ok(Field::Production),
            "tin_qty" | "amount" => return Ok(Field::TinQuantity),
            "qty" => return Ok(Field::Quantity),
            "tin_label" => return Ok(Field::Label),
            _ => {}
        }
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.key() == key)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Errors that make a mapping unusable
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("brand and blend must both be mapped to a column")]
    MissingRequired,

    #[error("rating is mapped but no positive rating maximum was given")]
    RatingMaxRequired,

    #[error("column '{column}' mapped to {field} does not exist in the file")]
    UnknownColumn { field: Field, column: String },
}

/// User-declared association of logical fields to CSV columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub columns: BTreeMap<Field, String>,
    pub has_header: bool,
    pub collate_tins: bool,
    pub sync_tins: bool,
    pub date_format: Option<DateFormat>,
    /// Maximum of the source rating scale
    pub rating_max: Option<f64>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            columns: BTreeMap::new(),
            has_header: true,
            collate_tins: false,
            sync_tins: false,
            date_format: None,
            rating_max: None,
        }
    }
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a field to a column name; a blank name unmaps it
    pub fn set(&mut self, field: Field, column: impl Into<String>) -> &mut Self {
        let column = column.into();
        if column.trim().is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
        self
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, field: Field, column: impl Into<String>) -> Self {
        self.set(field, column);
        self
    }

    /// Column name mapped to a field, if any
    pub fn column(&self, field: Field) -> Option<&str> {
        self.columns
            .get(&field)
            .map(|c| c.as_str())
            .filter(|c| !c.trim().is_empty())
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    /// Whether any tin field is mapped
    pub fn maps_tins(&self) -> bool {
        Field::TIN_FIELDS.iter().any(|f| self.is_mapped(*f))
    }

    /// Check the mapping can be submitted
    pub fn validate(&self) -> Result<(), MappingError> {
        if !self.is_mapped(Field::Brand) || !self.is_mapped(Field::Blend) {
            return Err(MappingError::MissingRequired);
        }
        if self.is_mapped(Field::Rating) && !self.rating_max.is_some_and(|m| m > 0.0) {
            return Err(MappingError::RatingMaxRequired);
        }
        Ok(())
    }

    /// Resolve column names to indices against the file's column labels
    pub fn resolve(&self, labels: &[String]) -> Result<ResolvedColumns, MappingError> {
        let mut indices = [None; Field::COUNT];

        for (field, column) in &self.columns {
            let wanted = column.trim();
            if wanted.is_empty() {
                continue;
            }
            let idx = labels
                .iter()
                .position(|l| l.trim() == wanted)
                .or_else(|| {
                    labels
                        .iter()
                        .position(|l| l.trim().eq_ignore_ascii_case(wanted))
                })
                .ok_or_else(|| MappingError::UnknownColumn {
                    field: *field,
                    column: wanted.to_string(),
                })?;
            indices[field.index()] = Some(idx);
        }

        Ok(ResolvedColumns { indices })
    }

    /// Mapping that re-imports the item CSV export
    pub fn item_export() -> Self {
        let mut mapping = Self::new();
        for (field, header) in crate::export::ITEM_HEADERS {
            mapping.set(*field, *header);
        }
        mapping.rating_max = Some(crate::entities::item::RATING_SCALE);
        mapping
    }

    /// Mapping that re-imports the tin CSV export, one tin per row
    pub fn tin_export() -> Self {
        let mut mapping = Self::new();
        for (field, header) in crate::export::TIN_HEADERS {
            mapping.set(*field, *header);
        }
        mapping.collate_tins = true;
        mapping.date_format = Some(DateFormat::MonthDayYear);
        mapping
    }
}

/// Column indices per field, resolved once at import start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    indices: [Option<usize>; Field::COUNT],
}

impl ResolvedColumns {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices[field.index()]
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.index(field).is_some()
    }

    /// Trimmed cell for a field; empty when unmapped or the row is short
    pub fn cell<'r>(&self, record: &'r StringRecord, field: Field) -> &'r str {
        self.index(field)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }
}

/// Item fields Overwrite is allowed to replace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverwriteSet(BTreeSet<Field>);

impl OverwriteSet {
    pub fn all() -> Self {
        Self(Field::OVERWRITABLE.iter().copied().collect())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn insert(&mut self, field: Field) -> Result<(), String> {
        if !Field::OVERWRITABLE.contains(&field) {
            return Err(format!("Field '{}' cannot be overwritten", field));
        }
        self.0.insert(field);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Field> for OverwriteSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|f| Field::OVERWRITABLE.contains(f))
                .collect(),
        )
    }
}

impl std::str::FromStr for OverwriteSet {
    type Err = String;

    /// Comma separated field keys, or "all"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let mut set = Self::default();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            set.insert(part.parse()?)?;
        }
        Ok(set)
    }
}
