//! Query and mutation methods for items and tins

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::{
    format_date, is_unique_violation, item_from_row, tin_from_row, BulkEdit, CellarStats,
    CellarStore, ItemFilter, StoreError, TinRow, ITEM_COLUMNS, TIN_COLUMNS,
};
use crate::entities::{Item, Tin};

impl CellarStore {
    /// Point lookup by natural key
    pub fn find_item(&self, brand: &str, blend: &str) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {} FROM items WHERE brand = ?1 AND blend = ?2", ITEM_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![brand, blend], item_from_row)
            .optional()?)
    }

    pub fn get_item(&self, id: i64) -> Result<Item, StoreError> {
        let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
        self.conn
            .query_row(&sql, params![id], item_from_row)
            .optional()?
            .ok_or(StoreError::ItemNotFound(id))
    }

    /// List items matching a filter
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        let mut sql = format!("SELECT {} FROM items WHERE 1=1", ITEM_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(ref brand) = filter.brand {
            sql.push_str(" AND brand LIKE ? ESCAPE '\\'");
            params_vec.push(Box::new(contains_pattern(brand)));
        }

        if let Some(blend_type) = filter.blend_type {
            sql.push_str(" AND blend_type = ?");
            params_vec.push(Box::new(blend_type.as_str().to_string()));
        }

        if let Some(favorite) = filter.favorite {
            sql.push_str(" AND favorite = ?");
            params_vec.push(Box::new(favorite));
        }

        if let Some(disliked) = filter.disliked {
            sql.push_str(" AND disliked = ?");
            params_vec.push(Box::new(disliked));
        }

        if let Some(in_production) = filter.in_production {
            sql.push_str(" AND in_production = ?");
            params_vec.push(Box::new(in_production));
        }

        if filter.in_stock {
            sql.push_str(" AND quantity > 0");
        }

        if let Some(ref search) = filter.search {
            sql.push_str(
                " AND (brand LIKE ? ESCAPE '\\' OR blend LIKE ? ESCAPE '\\' OR notes LIKE ? ESCAPE '\\')",
            );
            let pattern = contains_pattern(search);
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(filter.sort.order_clause());

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let items = stmt
            .query_map(params_refs.as_slice(), item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Insert a new item, returning its id
    pub fn insert_item(&mut self, item: &Item) -> Result<i64, StoreError> {
        insert_item(&self.conn, item)
    }

    /// Persist all fields of an item that has an id
    pub fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        update_item(&self.conn, item)
    }

    /// Delete an item and, through the cascade, its tins
    pub fn delete_item(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::ItemNotFound(id));
        }
        Ok(())
    }

    pub fn tins_for_item(&self, item_id: i64) -> Result<Vec<Tin>, StoreError> {
        tins_for_item(&self.conn, item_id)
    }

    pub fn get_tin(&self, id: i64) -> Result<Tin, StoreError> {
        let sql = format!("SELECT {} FROM tins WHERE id = ?1", TIN_COLUMNS);
        self.conn
            .query_row(&sql, params![id], tin_from_row)
            .optional()?
            .ok_or(StoreError::TinNotFound(id))
    }

    /// Tins across the collection, each with its item's key
    pub fn list_tins(
        &self,
        filter: &ItemFilter,
        include_finished: bool,
    ) -> Result<Vec<TinRow>, StoreError> {
        let items = self.list_items(filter)?;
        let mut rows = Vec::new();
        for item in items {
            let Some(item_id) = item.id else { continue };
            for tin in tins_for_item(&self.conn, item_id)? {
                if tin.finished && !include_finished {
                    continue;
                }
                rows.push(TinRow {
                    brand: item.brand.clone(),
                    blend: item.blend.clone(),
                    tin,
                });
            }
        }
        Ok(rows)
    }

    /// Attach a tin to an item, returning the tin id
    pub fn insert_tin(&mut self, item_id: i64, tin: &Tin) -> Result<i64, StoreError> {
        insert_tin(&self.conn, item_id, tin)
    }

    pub fn delete_tin(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM tins WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::TinNotFound(id));
        }
        Ok(())
    }

    pub fn set_tin_finished(&mut self, id: i64, finished: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE tins SET finished = ?1 WHERE id = ?2",
            params![finished, id],
        )?;
        if changed == 0 {
            return Err(StoreError::TinNotFound(id));
        }
        Ok(())
    }

    /// Apply one field change to every listed item inside a transaction.
    /// Returns the number of items whose state changed.
    pub fn bulk_update(&mut self, ids: &[i64], edit: BulkEdit) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut changed = 0;

        for &id in ids {
            let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
            let mut item = tx
                .query_row(&sql, params![id], item_from_row)
                .optional()?
                .ok_or(StoreError::ItemNotFound(id))?;
            let before = item.clone();

            match edit {
                BulkEdit::SetType(t) => item.blend_type = t,
                BulkEdit::SetFavorite(v) => item.set_favorite(v),
                BulkEdit::SetDisliked(v) => item.set_disliked(v),
                BulkEdit::SetProduction(v) => item.in_production = v,
            }

            if item != before {
                update_item(&tx, &item)?;
                changed += 1;
            }
        }

        tx.commit()?;
        Ok(changed)
    }

    /// Collection statistics
    pub fn stats(&self) -> Result<CellarStats, StoreError> {
        let mut stats = self.conn.query_row(
            r#"SELECT COUNT(*),
                      COUNT(DISTINCT brand),
                      COALESCE(SUM(quantity), 0),
                      COALESCE(SUM(favorite), 0),
                      COALESCE(SUM(disliked), 0),
                      COALESCE(SUM(CASE WHEN in_production = 0 THEN 1 ELSE 0 END), 0),
                      AVG(rating)
               FROM items"#,
            [],
            |row| {
                Ok(CellarStats {
                    items: row.get::<_, i64>(0)? as usize,
                    brands: row.get::<_, i64>(1)? as usize,
                    total_quantity: row.get(2)?,
                    favorites: row.get::<_, i64>(3)? as usize,
                    disliked: row.get::<_, i64>(4)? as usize,
                    out_of_production: row.get::<_, i64>(5)? as usize,
                    average_rating: row.get(6)?,
                    ..Default::default()
                })
            },
        )?;

        let mut by_type = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT blend_type, COUNT(*) FROM items GROUP BY blend_type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (blend_type, count) = row?;
            let key = blend_type.unwrap_or_else(|| "(none)".to_string());
            *by_type.entry(key).or_insert(0) += count as usize;
        }
        stats.by_type = by_type;

        let (tins, opened, finished) = self.conn.query_row(
            r#"SELECT COUNT(*),
                      COALESCE(SUM(CASE WHEN open_date IS NOT NULL THEN 1 ELSE 0 END), 0),
                      COALESCE(SUM(finished), 0)
               FROM tins"#,
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        stats.tins = tins as usize;
        stats.tins_opened = opened as usize;
        stats.tins_finished = finished as usize;

        Ok(stats)
    }
}

pub(super) fn insert_item(conn: &Connection, item: &Item) -> Result<i64, StoreError> {
    let result = conn.execute(
        r#"INSERT INTO items (brand, blend, blend_type, subgenre, cut, components, flavoring,
                              quantity, rating, favorite, disliked, in_production, notes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
        params![
            item.brand,
            item.blend,
            item.blend_type.map(|t| t.as_str()),
            item.subgenre,
            item.cut,
            item.components,
            item.flavoring,
            item.quantity,
            item.rating,
            item.favorite,
            item.disliked,
            item.in_production,
            item.notes,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateItem {
            brand: item.brand.clone(),
            blend: item.blend.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

pub(super) fn update_item(conn: &Connection, item: &Item) -> Result<(), StoreError> {
    let id = item.id.ok_or(StoreError::ItemNotFound(0))?;
    let result = conn.execute(
        r#"UPDATE items SET brand = ?1, blend = ?2, blend_type = ?3, subgenre = ?4, cut = ?5,
                             components = ?6, flavoring = ?7, quantity = ?8, rating = ?9,
                             favorite = ?10, disliked = ?11, in_production = ?12, notes = ?13
           WHERE id = ?14"#,
        params![
            item.brand,
            item.blend,
            item.blend_type.map(|t| t.as_str()),
            item.subgenre,
            item.cut,
            item.components,
            item.flavoring,
            item.quantity,
            item.rating,
            item.favorite,
            item.disliked,
            item.in_production,
            item.notes,
            id,
        ],
    );

    match result {
        Ok(0) => Err(StoreError::ItemNotFound(id)),
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateItem {
            brand: item.brand.clone(),
            blend: item.blend.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// `%text%` for LIKE, with the pattern characters in `text` taken literally
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(super) fn tins_for_item(conn: &Connection, item_id: i64) -> Result<Vec<Tin>, StoreError> {
    let sql = format!(
        "SELECT {} FROM tins WHERE item_id = ?1 ORDER BY id",
        TIN_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let tins = stmt
        .query_map(params![item_id], tin_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tins)
}

pub(super) fn insert_tin(conn: &Connection, item_id: i64, tin: &Tin) -> Result<i64, StoreError> {
    let result = conn.execute(
        r#"INSERT INTO tins (item_id, label, container, quantity, unit,
                             manufacture_date, cellar_date, open_date, finished)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        params![
            item_id,
            tin.label,
            tin.container,
            tin.quantity,
            tin.unit.map(|u| u.as_str()),
            format_date(tin.manufacture_date),
            format_date(tin.cellar_date),
            format_date(tin.open_date),
            tin.finished,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateTin {
            label: tin.label.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}
