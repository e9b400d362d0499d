//! CSV import pipeline
//!
//! A file goes through four stages:
//! 1. [`read_csv`] loads every row into a [`CsvTable`]
//! 2. a [`ColumnMapping`] names the column feeding each logical [`Field`]
//! 3. [`plan_import`] groups records by (brand, blend) and reconciles them
//!    with the collection under a [`MergePolicy`]
//! 4. the store commits the resulting [`ImportPlan`] atomically
//!
//! [`ImportSession`] drives the stages and tracks the outcome.

mod coerce;
mod engine;
mod mapping;
mod reader;
mod session;

pub use coerce::{
    parse_blend_type, parse_bool, parse_quantity, parse_rating, parse_tin_quantity,
    resolve_two_digit_year, DateFormat, TinAmount, MAX_IMPORT_QUANTITY,
};
pub use engine::{
    plan_import, Catalog, ImportOptions, ImportPlan, ImportSummary, MergePolicy, PlannedInsert,
    PlannedUpdate, TinAction,
};
pub use mapping::{ColumnMapping, Field, MappingError, OverwriteSet, ResolvedColumns};
pub use reader::{read_csv, read_csv_file, CsvTable};
pub use session::{ImportFailure, ImportSession, ImportStatus};

use std::error::Error as _;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::store::StoreError;

/// Errors that stop an import
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("the file contains no rows")]
    #[diagnostic(code(cellar::import::empty))]
    EmptyFile,

    #[error("could not read CSV: {0}")]
    #[diagnostic(code(cellar::import::parse))]
    Parse(String),

    #[error(transparent)]
    #[diagnostic(
        code(cellar::import::mapping),
        help("brand and blend are required, e.g. --map brand=Brand --map blend=Blend; column names must match the file header")
    )]
    Mapping(#[from] MappingError),

    #[error("import failed: {message}")]
    #[diagnostic(
        code(cellar::import::persistence),
        help("no changes were saved; the import can be retried")
    )]
    Persistence {
        message: String,
        cause: Option<String>,
    },
}

impl ImportError {
    /// Underlying cause, if the error wraps one
    pub fn cause(&self) -> Option<&str> {
        match self {
            ImportError::Persistence { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        ImportError::Persistence {
            message: err.to_string(),
            cause: err.source().map(|s| s.to_string()),
        }
    }
}
