//! Database module: row models and SQL repositories.
//!
//! `model` holds the row structs queries map into; `repo` holds the
//! SQL-only functions. Callers import from `creative_ops::db` — the
//! repository API is re-exported here.

pub mod model;
pub mod repo;

pub use model::{BatchItemRow, BatchRow};
pub use repo::*;
