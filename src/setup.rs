//! Provisioning and verification of the sheets the registry declares.

use serde::Serialize;
use sheetbase_core::CellValue;

use crate::{
    error::{StorageError, TableError},
    schema::Table,
    table_service::TableService,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetupReport {
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerifyReport {
    pub success: bool,
    pub checks: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

fn text(s: &str) -> CellValue {
    CellValue::from(s)
}

/// Demo rows, in header order.
pub fn sample_rows(table: Table) -> Vec<Vec<CellValue>> {
    let (t, f) = (CellValue::Bool(true), CellValue::Bool(false));
    match table {
        Table::Banks => vec![
            vec![text("BBVA001"), text("BBVA"), t.clone(), t.clone(), t.clone()],
            vec![text("SANTANDER001"), text("Santander"), f.clone(), t.clone(), t.clone()],
            vec![text("OPENBANK001"), text("Openbank"), t.clone(), t.clone(), t.clone()],
        ],
        Table::Promotions => vec![vec![
            text("PROMO001"),
            text("BBVA001"),
            text("ES1234567890123456789012"),
            text("Promoción transferencias"),
            text("Bienvenida 300€"),
            text("2025-01-01"),
            text("2025-12-31"),
            text("300€ si cumples condiciones 6 meses"),
            text("Activa"),
            text(r#"{"day_start": 5, "day_end": 4}"#),
            text("Requiere nómina mensual"),
        ]],
        Table::Conditions => vec![
            vec![
                text("COND001"),
                text("PROMO001"),
                text("Transferencias mínimas"),
                text(r#"{"amount": 700, "is_salary_required": true}"#),
                t.clone(),
            ],
            vec![
                text("COND002"),
                text("PROMO001"),
                text("Saldo mínimo"),
                text(r#"{"amount": 1000}"#),
                t.clone(),
            ],
        ],
        Table::Periods => vec![
            vec![text("PERIOD001"), text("PROMO001"), text("2025-01-05"), text("2025-02-04"), CellValue::Number(1.0), text("Pending")],
            vec![text("PERIOD002"), text("PROMO001"), text("2025-02-05"), text("2025-03-04"), CellValue::Number(2.0), text("Pending")],
        ],
        Table::Evaluations => vec![vec![
            text("EVAL001"),
            text("COND001"),
            text("PERIOD001"),
            text("Pending"),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ]],
        Table::Transfers => vec![vec![
            text("TRANS001"),
            text("OPENBANK001"),
            text("BBVA001"),
            CellValue::Number(700.0),
            text("2025-01-10"),
            CellValue::Empty,
            t,
            text("PROMO001"),
            text("Planificada"),
        ]],
        Table::Documents => Vec::new(),
        Table::Config => vec![
            vec![text("email_address"), text("your.email@example.com"), text("Email address for notifications"), text("email")],
            vec![text("notify_transfers_days"), text("3"), text("Days before transfer to send reminder"), text("number")],
            vec![text("notify_period_days"), text("2"), text("Days before period end to send reminder"), text("number")],
            vec![text("notify_promotion_days"), text("7"), text("Days before promotion expiration to send reminder"), text("number")],
        ],
    }
}

pub struct Provisioner<'a> {
    tables: &'a TableService,
}

impl<'a> Provisioner<'a> {
    pub fn new(tables: &'a TableService) -> Self {
        Self { tables }
    }

    /// Creates `table` if missing and (re)writes its header row. An existing
    /// sheet is left untouched when `skip_if_exists` is set.
    pub fn create_sheet_with_headers(&self, table: Table, skip_if_exists: bool) -> Result<bool, StorageError> {
        let grid = self.tables.grid();
        let exists = grid.has_sheet(table.name())?;
        if exists && skip_if_exists {
            tracing::info!(sheet = %table, "Sheet already exists, skipping");
            return Ok(false);
        }
        if !exists {
            grid.insert_sheet(table.name())?;
            tracing::info!(sheet = %table, "Sheet created");
        }
        let header: Vec<CellValue> = table.fields().iter().map(|f| text(f)).collect();
        grid.sheet(table.name())?.write(1, 1, &[header])?;
        Ok(!exists)
    }

    pub fn create_all_sheets(&self, skip_if_exists: bool) -> SetupReport {
        let mut report = SetupReport::default();
        for table in Table::ALL {
            match self.create_sheet_with_headers(table, skip_if_exists) {
                Ok(true) => report.created += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(component = "setup", operation = "create_all_sheets", sheet = %table, error = %e, "Sheet creation failed");
                    report.errors.push(format!("{}: {}", table, e));
                }
            }
        }
        report
    }

    /// Seeds demo rows. Sheets that already hold data are skipped unless
    /// `clear_first` is set.
    pub fn add_sample_data(&self, table: Table, clear_first: bool) -> Result<usize, TableError> {
        let rows = sample_rows(table);
        if rows.is_empty() {
            return Ok(0);
        }
        if clear_first {
            self.tables.clear_all_data(table.name())?;
        }
        let existing = self.tables.row_count(table.name())?;
        if existing > 0 {
            tracing::info!(sheet = %table, existing, "Sheet already has data, skipping sample data");
            return Ok(0);
        }
        for row in &rows {
            self.tables.append_row(table.name(), row)?;
        }
        tracing::info!(sheet = %table, rows = rows.len(), "Sample data added");
        Ok(rows.len())
    }

    pub fn add_all_sample_data(&self, clear_first: bool) -> Result<usize, TableError> {
        let mut total = 0;
        for table in Table::ALL {
            total += self.add_sample_data(table, clear_first)?;
        }
        Ok(total)
    }

    /// Declared sheets missing from the spreadsheet.
    pub fn missing_sheets(&self) -> Result<Vec<Table>, StorageError> {
        let existing = self.tables.grid().sheet_names()?;
        Ok(Table::ALL
            .into_iter()
            .filter(|t| !existing.iter().any(|name| name == t.name()))
            .collect())
    }

    pub fn verify_setup(&self) -> VerifyReport {
        let mut report = VerifyReport {
            success: true,
            ..VerifyReport::default()
        };
        report.checks.push(format!("Spreadsheet accessible: {}", self.tables.grid().spreadsheet_id()));

        match self.missing_sheets() {
            Ok(missing) if missing.is_empty() => report.checks.push(format!("All required sheets exist ({})", Table::ALL.len())),
            Ok(missing) => {
                let names: Vec<&str> = missing.iter().map(|t| t.name()).collect();
                report.errors.push(format!("Missing sheets: {}", names.join(", ")));
            }
            Err(e) => report.errors.push(format!("Could not list sheets: {}", e)),
        }

        for table in Table::ALL {
            let headers = match self.tables.headers(table.name()) {
                Ok(headers) => headers,
                Err(TableError::Storage(StorageError::SheetNotFound(_))) => continue,
                Err(e) => {
                    report.errors.push(format!("Could not verify headers for {}: {}", table, e));
                    continue;
                }
            };
            if headers.len() != table.fields().len() {
                report.warnings.push(format!("Wrong number of columns in: {}", table));
            } else if headers.iter().zip(table.fields()).any(|(actual, expected)| actual != expected) {
                report.warnings.push(format!("Header mismatch in: {}", table));
            } else {
                report.checks.push(format!("Headers correct for: {}", table));
            }

            match self.tables.row_count(table.name()) {
                Ok(0) if !sample_rows(table).is_empty() => report.warnings.push(format!("No data in: {}", table)),
                Ok(0) => {}
                Ok(rows) => report.checks.push(format!("Data exists in: {} ({} rows)", table, rows)),
                Err(e) => report.errors.push(format!("Could not count rows in {}: {}", table, e)),
            }
        }

        report.success = report.errors.is_empty();
        report
    }
}
