//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{CellarStore, StoreError, SCHEMA_VERSION};

impl CellarStore {
    /// Stored schema version, or None for a fresh database
    pub(super) fn schema_version(&self) -> Result<Option<i32>, StoreError> {
        let has_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(None);
        }

        let version = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(version)
    }

    /// Initialize database schema
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- One row per blend; brand + blend is the natural key (case-sensitive)
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brand TEXT NOT NULL,
                blend TEXT NOT NULL,
                blend_type TEXT,
                subgenre TEXT NOT NULL DEFAULT '',
                cut TEXT NOT NULL DEFAULT '',
                components TEXT NOT NULL DEFAULT '',
                flavoring TEXT NOT NULL DEFAULT '',
                quantity INTEGER NOT NULL DEFAULT 1,
                rating REAL,
                favorite INTEGER NOT NULL DEFAULT 0,
                disliked INTEGER NOT NULL DEFAULT 0,
                in_production INTEGER NOT NULL DEFAULT 1,
                notes TEXT NOT NULL DEFAULT '',
                UNIQUE (brand, blend)
            );
            CREATE INDEX IF NOT EXISTS idx_items_type ON items(blend_type);

            -- Containers of an item; label is unique per item
            CREATE TABLE IF NOT EXISTS tins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                container TEXT NOT NULL DEFAULT '',
                quantity REAL,
                unit TEXT,
                manufacture_date TEXT,
                cellar_date TEXT,
                open_date TEXT,
                finished INTEGER NOT NULL DEFAULT 0,
                UNIQUE (item_id, label),
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tins_item ON tins(item_id);
            "#,
        )?;

        self.conn.execute("DELETE FROM schema_version", [])?;
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}
