use serde::Serialize;

use crate::codec::{Record, RowObject};

pub const BANK_ID: &str = "bank_id";
pub const NAME: &str = "name";
pub const IS_BODEGA: &str = "is_bodega";
pub const SUPPORTS_BIZUM: &str = "supports_bizum";
pub const ACTIVE: &str = "active";

/// A row of the Banks table.
///
/// Flags read from the grid count as set only when the cell holds a real
/// boolean `true`; text such as `"TRUE"` reads as `false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bank {
    pub bank_id: String,
    pub name: String,
    pub is_bodega: bool,
    pub supports_bizum: bool,
    pub active: bool,
}

impl Bank {
    pub fn from_record(record: &Record) -> Self {
        Self {
            bank_id: record.display(BANK_ID),
            name: record.display(NAME),
            is_bodega: record.is_true(IS_BODEGA),
            supports_bizum: record.is_true(SUPPORTS_BIZUM),
            active: record.is_true(ACTIVE),
        }
    }

    pub fn to_object(&self) -> RowObject {
        RowObject::new()
            .with(BANK_ID, self.bank_id.as_str())
            .with(NAME, self.name.as_str())
            .with(IS_BODEGA, self.is_bodega)
            .with(SUPPORTS_BIZUM, self.supports_bizum)
            .with(ACTIVE, self.active)
    }
}
