//! Table-specific wrappers that own defaults, validation and the soft vs.
//! hard delete policy of their entity.

pub mod bank;

pub use bank::{BankRepository, DeleteOutcome};
