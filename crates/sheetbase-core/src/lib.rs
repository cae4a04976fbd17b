//! Core types and traits for SheetBase grid storage backends.
//!
//! This crate provides the `GridStore` trait and the primitive cell model,
//! enabling pluggable grid implementations in separate crates.

pub mod cell;
pub mod storage;

// Re-export key types at crate root for convenience
pub use cell::CellValue;
pub use storage::{check_delete_range, check_spreadsheet_id, GridRange, GridStore, StorageError, PLACEHOLDER_SPREADSHEET_ID};
