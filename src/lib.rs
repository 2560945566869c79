//! Core coordination engine for short-form ad creative production.
//!
//! Two subsystems over one SQLite store: the batch/item lifecycle state
//! machine (`batches`, `items`) and the identifier-driven linking and
//! bulk-tagging engine (`roster`, `creators`, `tags`).

pub mod batches;
pub mod config;
pub mod creators;
pub mod db;
pub mod error;
pub mod items;
pub mod model;
pub mod roster;
pub mod tags;
