//! Tin Cellar: a pipe tobacco collection manager
//!
//! Tracks blends and the individual tins that hold them in a local SQLite
//! database, with a CSV import pipeline that reconciles arbitrary spreadsheets
//! against the existing collection.

pub mod cli;
pub mod core;
pub mod entities;
pub mod export;
pub mod import;
pub mod yaml;
