//! Table definitions and live header access.
//!
//! The static definitions describe how the sheets are provisioned. At run
//! time the header row is always read back from the grid, so a header edited
//! in the spreadsheet wins over what is declared here.

use std::fmt;

use sheetbase_core::{CellValue, GridRange};

use crate::{error::StorageError, grid::Sheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Banks,
    Promotions,
    Conditions,
    Periods,
    Evaluations,
    Transfers,
    Documents,
    Config,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Banks,
        Table::Promotions,
        Table::Conditions,
        Table::Periods,
        Table::Evaluations,
        Table::Transfers,
        Table::Documents,
        Table::Config,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Banks => "Banks",
            Table::Promotions => "Promotions",
            Table::Conditions => "Conditions",
            Table::Periods => "Periods",
            Table::Evaluations => "Evaluations",
            Table::Transfers => "Transfers",
            Table::Documents => "Documents",
            Table::Config => "Configuración",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Header row in column order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Table::Banks => &["bank_id", "name", "is_bodega", "supports_bizum", "active"],
            Table::Promotions => &[
                "promo_id",
                "bank_id",
                "account_number",
                "type",
                "title",
                "start_date",
                "end_date",
                "benefits",
                "status",
                "period_cycle_json",
                "notes",
            ],
            Table::Conditions => &["condition_id", "promo_id", "type", "params_json", "is_recurring"],
            Table::Periods => &["period_id", "promo_id", "start_ts", "end_ts", "index", "status"],
            Table::Evaluations => &[
                "eval_id",
                "condition_id",
                "period_id",
                "status",
                "user_notes",
                "marked_by",
                "marked_on",
            ],
            Table::Transfers => &[
                "transfer_id",
                "from_bank_id",
                "to_bank_id",
                "amount",
                "date_planned",
                "date_done",
                "is_salary_marked",
                "promo_id",
                "status",
            ],
            Table::Documents => &["document_id", "promo_id", "file_id", "filename", "uploaded_on"],
            Table::Config => &["key", "value", "description", "type"],
        }
    }

    pub fn field_index(self, field: &str) -> Option<usize> {
        self.fields().iter().position(|f| *f == field)
    }

    /// The identity column. For `Config` this is the key.
    pub fn id_field(self) -> &'static str {
        self.fields()[0]
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AsRef<str> for Table {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

fn header_name(cell: CellValue) -> String {
    match cell {
        CellValue::Text(s) => s,
        other => other.to_string(),
    }
}

/// Reads the header row of `sheet` as it currently stands in the grid.
pub fn read_headers(sheet: &Sheet<'_>) -> Result<Vec<String>, StorageError> {
    let last_column = sheet.last_column()?;
    if last_column == 0 {
        return Ok(Vec::new());
    }
    let mut rows = sheet.read(GridRange::row(1, last_column))?;
    Ok(rows
        .pop()
        .unwrap_or_default()
        .into_iter()
        .map(header_name)
        .collect())
}
