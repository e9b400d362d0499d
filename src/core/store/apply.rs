//! Import support: catalog lookups and atomic plan commits

use rusqlite::params;

use super::queries::{insert_item, insert_tin, tins_for_item, update_item};
use super::{CellarStore, StoreError};
use crate::entities::{Item, Tin};
use crate::import::{Catalog, ImportPlan, ImportSummary, TinAction};

impl Catalog for CellarStore {
    fn find_item(&self, brand: &str, blend: &str) -> Result<Option<Item>, StoreError> {
        CellarStore::find_item(self, brand, blend)
    }

    fn tins_for_item(&self, item_id: i64) -> Result<Vec<Tin>, StoreError> {
        tins_for_item(&self.conn, item_id)
    }
}

impl CellarStore {
    /// Commit an import plan. Either every change lands or none does.
    pub fn apply_import(&mut self, plan: &ImportPlan) -> Result<ImportSummary, StoreError> {
        let tx = self.conn.transaction()?;
        let mut summary = ImportSummary {
            total_records: plan.total_records,
            conversions: plan.inserts.len() + plan.matched,
            tins_collated: plan.collate,
            ..Default::default()
        };

        for insert in &plan.inserts {
            let item_id = insert_item(&tx, &insert.item)?;
            for tin in &insert.tins {
                insert_tin(&tx, item_id, tin)?;
            }
            summary.insertions += 1;
            summary.tins += insert.tins.len();
        }

        for update in &plan.updates {
            let item_id = update.item.id.ok_or(StoreError::ItemNotFound(0))?;

            if update.changed {
                update_item(&tx, &update.item)?;
                summary.updates += 1;
            }

            if update.tin_action == TinAction::Replace {
                let removed = tx.execute("DELETE FROM tins WHERE item_id = ?1", params![item_id])?;
                log::debug!("{}: replaced {} tin(s)", update.item.display_name(), removed);
            }
            for tin in &update.tins {
                insert_tin(&tx, item_id, tin)?;
            }
            summary.tins += update.tins.len();
        }

        tx.commit()?;
        summary.tins_collated = plan.collate && summary.tins > 0;
        Ok(summary)
    }
}
