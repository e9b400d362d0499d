//! Import session: one mapping, one set of options, one outcome

use serde::Serialize;

use super::engine::{plan_import, ImportOptions, ImportPlan, ImportSummary};
use super::mapping::ColumnMapping;
use super::reader::CsvTable;
use super::ImportError;
use crate::core::store::CellarStore;

/// Error payload kept for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub message: String,
    pub cause: Option<String>,
}

impl From<&ImportError> for ImportFailure {
    fn from(err: &ImportError) -> Self {
        Self {
            message: err.to_string(),
            cause: err.cause().map(str::to_string),
        }
    }
}

/// Where an import session stands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImportStatus {
    #[default]
    Idle,
    Loading,
    Success(ImportSummary),
    Error(ImportFailure),
    /// Declined at confirmation; nothing was written
    Cancelled,
}

/// State for a single import, passed explicitly through the pipeline
#[derive(Debug, Clone)]
pub struct ImportSession {
    pub mapping: ColumnMapping,
    pub options: ImportOptions,
    status: ImportStatus,
}

impl ImportSession {
    pub fn new(mapping: ColumnMapping, options: ImportOptions) -> Self {
        Self {
            mapping,
            options,
            status: ImportStatus::Idle,
        }
    }

    pub fn status(&self) -> &ImportStatus {
        &self.status
    }

    /// Reconcile the table against the store without writing
    pub fn plan(&mut self, store: &CellarStore, table: &CsvTable) -> Result<ImportPlan, ImportError> {
        self.status = ImportStatus::Loading;
        let result = plan_import(store, table, &self.mapping, &self.options);
        if let Err(ref e) = result {
            self.status = ImportStatus::Error(e.into());
        }
        result
    }

    /// Summary of a plan without writing it
    pub fn preview(&mut self, plan: &ImportPlan) -> ImportSummary {
        let summary = plan.preview();
        self.status = ImportStatus::Success(summary.clone());
        summary
    }

    pub fn cancel(&mut self) {
        log::info!("import cancelled before commit");
        self.status = ImportStatus::Cancelled;
    }

    /// Write a plan in one transaction
    pub fn commit(
        &mut self,
        store: &mut CellarStore,
        plan: &ImportPlan,
    ) -> Result<ImportSummary, ImportError> {
        self.status = ImportStatus::Loading;
        match store.apply_import(plan) {
            Ok(summary) => {
                log::info!(
                    "import committed: {} inserted, {} updated, {} tins",
                    summary.insertions,
                    summary.updates,
                    summary.tins
                );
                self.status = ImportStatus::Success(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                let err = ImportError::from(e);
                log::error!("import aborted: {}", err);
                self.status = ImportStatus::Error((&err).into());
                Err(err)
            }
        }
    }

    /// Plan and commit in one step
    pub fn run(
        &mut self,
        store: &mut CellarStore,
        table: &CsvTable,
    ) -> Result<ImportSummary, ImportError> {
        let plan = self.plan(store, table)?;
        self.commit(store, &plan)
    }

    /// Back to Idle, keeping the mapping and options
    pub fn reset(&mut self) {
        self.status = ImportStatus::Idle;
    }
}
