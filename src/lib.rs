//! Tabular data access over spreadsheet grids.
//!
//! Each table is a named sheet whose first row holds the field names and whose
//! first column holds the row identity. [`table_service::TableService`] layers
//! generic CRUD on top of a [`grid::GridAccessor`]; entity repositories such as
//! [`repository::BankRepository`] build typed operations on that, and
//! [`api::BankApi`] wraps them in the response envelope served over HTTP.

pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod grid;
pub mod id;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod settings;
pub mod setup;
pub mod table_service;
