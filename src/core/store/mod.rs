//! SQLite-backed storage for the collection
//!
//! This module owns the project database:
//! - `items` holds one row per (brand, blend), enforced by a UNIQUE constraint
//! - `tins` holds containers, unique by (item_id, label), cascading on item delete
//!
//! Unlike a cache the database is the source of truth, so a schema version
//! mismatch is reported instead of rebuilding.

mod apply;
mod queries;
mod schema;
mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, Row};
use thiserror::Error;

use crate::core::project::Project;
use crate::entities::{Item, Tin};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Date format used for date columns
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is not supported (expected {expected})")]
    SchemaVersion { found: i32, expected: i32 },

    #[error("item {0} not found")]
    ItemNotFound(i64),

    #[error("tin {0} not found")]
    TinNotFound(i64),

    #[error("item '{brand} - {blend}' already exists")]
    DuplicateItem { brand: String, blend: String },

    #[error("tin '{label}' already exists for this item")]
    DuplicateTin { label: String },
}

/// The collection database
pub struct CellarStore {
    conn: Connection,
}

impl CellarStore {
    /// Open or create the database of a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::open_path(&project.database_path())
    }

    /// Open or create a database at the given path
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self { conn };
        match store.schema_version()? {
            None => store.init_schema()?,
            Some(SCHEMA_VERSION) => {}
            Some(found) => {
                return Err(StoreError::SchemaVersion {
                    found,
                    expected: SCHEMA_VERSION,
                })
            }
        }

        Ok(store)
    }
}

/// Map a UNIQUE constraint violation to a friendlier error
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

/// Column list matching `item_from_row`
const ITEM_COLUMNS: &str = "id, brand, blend, blend_type, subgenre, cut, components, flavoring, \
     quantity, rating, favorite, disliked, in_production, notes";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let blend_type: Option<String> = row.get(3)?;
    Ok(Item {
        id: Some(row.get(0)?),
        brand: row.get(1)?,
        blend: row.get(2)?,
        blend_type: blend_type.and_then(|t| t.parse().ok()),
        subgenre: row.get(4)?,
        cut: row.get(5)?,
        components: row.get(6)?,
        flavoring: row.get(7)?,
        quantity: row.get(8)?,
        rating: row.get(9)?,
        favorite: row.get(10)?,
        disliked: row.get(11)?,
        in_production: row.get(12)?,
        notes: row.get(13)?,
    })
}

/// Column list matching `tin_from_row`
const TIN_COLUMNS: &str = "id, item_id, label, container, quantity, unit, \
     manufacture_date, cellar_date, open_date, finished";

fn tin_from_row(row: &Row<'_>) -> rusqlite::Result<Tin> {
    let unit: Option<String> = row.get(5)?;
    Ok(Tin {
        id: Some(row.get(0)?),
        item_id: Some(row.get(1)?),
        label: row.get(2)?,
        container: row.get(3)?,
        quantity: row.get(4)?,
        unit: unit.and_then(|u| u.parse().ok()),
        manufacture_date: parse_date(row.get(6)?),
        cellar_date: parse_date(row.get(7)?),
        open_date: parse_date(row.get(8)?),
        finished: row.get(9)?,
    })
}
