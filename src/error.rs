//! Error taxonomy shared by every core operation.
//!
//! NotFound and Validation are returned synchronously and never retried.
//! PartialFailure carries the full per-entity report of a bulk pass.
//! DependentWrite marks a loopback write that failed after the primary
//! item write had already been committed.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("bulk operation failed for {} of {} entities", .report.failures.len(), .report.attempted)]
    PartialFailure { report: BulkReport },

    #[error("item {item_id} updated but forcing batch {batch_id} to EDITING failed: {source}")]
    DependentWrite {
        item_id: i64,
        batch_id: i64,
        source: sqlx::Error,
    },

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }
}

/// Per-entity outcome of a bulk fan-out. `affected` counts successful
/// writes; every failure is enumerated, never collapsed into a pass/fail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub attempted: usize,
    pub affected: u64,
    pub failures: Vec<EntityFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityFailure {
    pub id: i64,
    pub message: String,
}

impl BulkReport {
    /// Collapse into a result: clean pass yields the affected count, any
    /// failure yields the whole report.
    pub fn into_result(self) -> Result<u64> {
        if self.failures.is_empty() {
            Ok(self.affected)
        } else {
            Err(CoreError::PartialFailure { report: self })
        }
    }
}
