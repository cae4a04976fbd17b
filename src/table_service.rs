//! Generic CRUD engine over one sheet at a time.
//!
//! Every call goes back to the live grid; nothing is cached. Row numbers are
//! 1-based and count the header, so the first data row is row 2. Column 1 is
//! the identity column of every table.
//!
//! There is no isolation between callers. `update_by_id` is a
//! read-modify-write of the whole row: two concurrent updates of the same row
//! race and the last full-row write silently discards the other (lost
//! update). Deletes shift every later row up by one, so a row number resolved
//! before a delete must not be reused; resolve by id again instead.

use serde::Serialize;
use sheetbase_core::{CellValue, GridRange};

use crate::{
    codec::{Record, RowCodec, RowObject, Value},
    error::{StorageError, TableError},
    grid::{GridAccessor, Sheet},
    schema::read_headers,
};

/// One entry of a batch update.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub id: String,
    pub updates: RowObject,
}

impl RowUpdate {
    pub fn new(id: impl Into<String>, updates: RowObject) -> Self {
        Self { id: id.into(), updates }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Tally of a batch update. Partial application is the normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchUpdateOutcome {
    pub success_count: usize,
    pub fail_count: usize,
    pub failures: Vec<BatchFailure>,
}

pub struct TableService {
    grid: GridAccessor,
    codec: RowCodec,
}

impl TableService {
    pub fn new(grid: GridAccessor, codec: RowCodec) -> Self {
        Self { grid, codec }
    }

    pub fn grid(&self) -> &GridAccessor {
        &self.grid
    }

    /// Runs `f`, logging any failure under a stable component/operation tag.
    /// Only public operations go through here; helpers they share do not log.
    fn run<T>(&self, operation: &'static str, sheet: &str, f: impl FnOnce() -> Result<T, TableError>) -> Result<T, TableError> {
        let result = f();
        if let Err(e) = &result {
            tracing::error!(component = "table_service", operation, sheet, error = %e, "Table operation failed");
        }
        result
    }

    fn records(&self, handle: &Sheet<'_>, headers: &[String]) -> Result<Vec<Record>, TableError> {
        let last_row = handle.last_row()?;
        if last_row <= 1 {
            return Ok(Vec::new());
        }
        let rows = handle.read(GridRange::new(2, 1, last_row - 1, headers.len()))?;
        Ok(rows.into_iter().map(|row| self.codec.decode(headers, row)).collect())
    }

    fn write_row(&self, handle: &Sheet<'_>, row_number: usize, cells: &[CellValue]) -> Result<(), TableError> {
        let width = handle.last_column()?.max(cells.len());
        let mut row = cells.to_vec();
        row.resize(width, CellValue::Empty);
        Ok(handle.write(row_number, 1, &[row])?)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The live header row.
    pub fn headers(&self, sheet: &str) -> Result<Vec<String>, TableError> {
        self.run("headers", sheet, || Ok(read_headers(&self.grid.sheet(sheet)?)?))
    }

    /// All data rows as flat cells, header excluded.
    pub fn get_all_data(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>, TableError> {
        self.run("get_all_data", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let last_row = handle.last_row()?;
            if last_row <= 1 {
                return Ok(Vec::new());
            }
            let last_column = handle.last_column()?;
            Ok(handle.read(GridRange::new(2, 1, last_row - 1, last_column))?)
        })
    }

    /// All data rows zipped with the header.
    pub fn get_all_records(&self, sheet: &str) -> Result<Vec<Record>, TableError> {
        self.run("get_all_records", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let headers = read_headers(&handle)?;
            self.records(&handle, &headers)
        })
    }

    /// First record whose identity field equals `id`. Duplicates later in
    /// the sheet are never seen.
    pub fn find_by_id(&self, sheet: &str, id: &str) -> Result<Option<Record>, TableError> {
        self.run("find_by_id", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let headers = read_headers(&handle)?;
            let Some(id_field) = headers.first() else {
                return Ok(None);
            };
            Ok(self
                .records(&handle, &headers)?
                .into_iter()
                .find(|record| record.text(id_field) == Some(id)))
        })
    }

    /// Row number of the first data row whose first cell is the text `id`.
    pub fn find_row_number_by_id(&self, sheet: &str, id: &str) -> Result<Option<usize>, TableError> {
        self.run("find_row_number_by_id", sheet, || Ok(row_number_of(&self.grid.sheet(sheet)?, id)?))
    }

    /// Every record whose `column` equals `value`. Always a full scan.
    pub fn find_by_column(&self, sheet: &str, column: &str, value: &CellValue) -> Result<Vec<Record>, TableError> {
        self.run("find_by_column", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let headers = read_headers(&handle)?;
            Ok(self
                .records(&handle, &headers)?
                .into_iter()
                .filter(|record| record.get(column) == Some(value))
                .collect())
        })
    }

    pub fn id_exists(&self, sheet: &str, id: &str) -> Result<bool, TableError> {
        self.run("id_exists", sheet, || Ok(row_number_of(&self.grid.sheet(sheet)?, id)?.is_some()))
    }

    /// Data rows below the header; never negative.
    pub fn row_count(&self, sheet: &str) -> Result<usize, TableError> {
        self.run("row_count", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            Ok(handle.last_row()?.saturating_sub(1))
        })
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Appends already-flattened cells; returns the new last row.
    pub fn append_row(&self, sheet: &str, cells: &[CellValue]) -> Result<usize, TableError> {
        self.run("append_row", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            handle.append_row(cells)?;
            Ok(handle.last_row()?)
        })
    }

    /// Encodes `object` against the live header and appends it.
    ///
    /// Identity uniqueness is not checked; callers generate the id first.
    pub fn append_object(&self, sheet: &str, object: &RowObject) -> Result<usize, TableError> {
        self.run("append_object", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let headers = read_headers(&handle)?;
            let cells = self.codec.encode(&headers, object)?;
            handle.append_row(&cells)?;
            Ok(handle.last_row()?)
        })
    }

    /// Overwrites the full width of `row_number`. Shorter input is padded
    /// with empty cells.
    pub fn update_row(&self, sheet: &str, row_number: usize, cells: &[CellValue]) -> Result<(), TableError> {
        self.run("update_row", sheet, || self.write_row(&self.grid.sheet(sheet)?, row_number, cells))
    }

    /// Merges `updates` into the row identified by `id`.
    ///
    /// Returns `false` when the id is absent. Fields not named in `updates`
    /// keep the values read from the grid immediately before the write.
    pub fn update_by_id(&self, sheet: &str, id: &str, updates: &RowObject) -> Result<bool, TableError> {
        self.run("update_by_id", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let Some(row_number) = row_number_of(&handle, id)? else {
                return Ok(false);
            };
            let headers = read_headers(&handle)?;
            let current = handle
                .read(GridRange::row(row_number, headers.len()))?
                .pop()
                .unwrap_or_default();
            let merged = self.codec.merge(&headers, &current, updates)?;
            self.write_row(&handle, row_number, &merged)?;
            tracing::debug!(sheet, id, row_number, "Row updated");
            Ok(true)
        })
    }

    /// Encodes and writes a single cell.
    pub fn update_cell(&self, sheet: &str, row_number: usize, column: usize, value: &Value) -> Result<(), TableError> {
        self.run("update_cell", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let cell = self.codec.encode_value(&format!("R{}C{}", row_number, column), value)?;
            Ok(handle.write(row_number, column, &[vec![cell]])?)
        })
    }

    /// Applies every update independently, tallying hits and misses.
    pub fn batch_update(&self, sheet: &str, updates: &[RowUpdate]) -> BatchUpdateOutcome {
        let mut outcome = BatchUpdateOutcome::default();
        for update in updates {
            match self.update_by_id(sheet, &update.id, &update.updates) {
                Ok(true) => outcome.success_count += 1,
                Ok(false) => {
                    outcome.fail_count += 1;
                    outcome.failures.push(BatchFailure {
                        id: update.id.clone(),
                        error: "row not found".to_string(),
                    });
                }
                Err(e) => {
                    outcome.fail_count += 1;
                    outcome.failures.push(BatchFailure {
                        id: update.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::debug!(sheet, success = outcome.success_count, failed = outcome.fail_count, "Batch update finished");
        outcome
    }

    /// Writes all objects as one contiguous block after the last row.
    pub fn batch_append(&self, sheet: &str, objects: &[RowObject]) -> Result<usize, TableError> {
        if objects.is_empty() {
            return Ok(0);
        }
        self.run("batch_append", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let headers = read_headers(&handle)?;
            let rows = objects
                .iter()
                .map(|object| self.codec.encode(&headers, object))
                .collect::<Result<Vec<_>, _>>()?;
            let start = handle.last_row()? + 1;
            handle.write(start, 1, &rows)?;
            Ok(rows.len())
        })
    }

    // ------------------------------------------------------------------
    // Deletes
    // ------------------------------------------------------------------

    /// Physically removes a row; every later row moves up by one.
    pub fn delete_row(&self, sheet: &str, row_number: usize) -> Result<(), TableError> {
        self.run("delete_row", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            Ok(handle.delete_row(row_number)?)
        })
    }

    pub fn delete_by_id(&self, sheet: &str, id: &str) -> Result<bool, TableError> {
        self.run("delete_by_id", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let Some(row_number) = row_number_of(&handle, id)? else {
                return Ok(false);
            };
            handle.delete_row(row_number)?;
            tracing::debug!(sheet, id, row_number, "Row deleted");
            Ok(true)
        })
    }

    /// Deletes every data row and keeps the header.
    pub fn clear_all_data(&self, sheet: &str) -> Result<(), TableError> {
        self.run("clear_all_data", sheet, || {
            let handle = self.grid.sheet(sheet)?;
            let last_row = handle.last_row()?;
            if last_row > 1 {
                handle.delete_rows(2, last_row - 1)?;
            }
            Ok(())
        })
    }
}

/// Row number of the first data row whose first cell is the text `id`.
fn row_number_of(handle: &Sheet<'_>, id: &str) -> Result<Option<usize>, StorageError> {
    Ok(handle
        .data_range()?
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.first().and_then(CellValue::as_text) == Some(id))
        .map(|(i, _)| i + 1))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use sheetbase_memory::InMemoryGrid;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct ErrorCount(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCount {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_each_failed_operation_logs_once() {
        let grid = InMemoryGrid::open("test").unwrap();
        let tables = TableService::new(GridAccessor::new(Arc::new(grid)), RowCodec::default());
        let errors = ErrorCount::default();
        let subscriber = tracing_subscriber::registry().with(errors.clone());

        tracing::subscriber::with_default(subscriber, || {
            assert!(tables.find_by_id("Missing", "A").is_err());
            assert!(tables.update_by_id("Missing", "A", &RowObject::new()).is_err());
            assert!(tables.delete_by_id("Missing", "A").is_err());
        });

        assert_eq!(errors.0.load(Ordering::SeqCst), 3);
    }
}
