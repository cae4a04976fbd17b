use crate::cell::CellValue;

use thiserror::Error;

/// Identifier shipped in sample configuration; never a real spreadsheet.
pub const PLACEHOLDER_SPREADSHEET_ID: &str = "YOUR_SPREADSHEET_ID_HERE";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
    #[error("could not open spreadsheet \"{0}\"; check storage.spreadsheet_id")]
    SpreadsheetNotFound(String),
    #[error("sheet \"{0}\" not found; run `sheetbase setup` to provision it")]
    SheetNotFound(String),
    #[error("sheet already exists: {0}")]
    SheetAlreadyExists(String),
    #[error("row {row} is outside the occupied range 1..={last_row}")]
    RowOutOfRange { row: usize, last_row: usize },
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// A rectangular block of cells. Rows and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub row: usize,
    pub column: usize,
    pub rows: usize,
    pub columns: usize,
}

impl GridRange {
    pub fn new(row: usize, column: usize, rows: usize, columns: usize) -> Self {
        Self { row, column, rows, columns }
    }

    /// The whole width of a single row.
    pub fn row(row: usize, columns: usize) -> Self {
        Self::new(row, 1, 1, columns)
    }

    pub fn last_row(&self) -> usize {
        self.row + self.rows.saturating_sub(1)
    }

    pub fn last_column(&self) -> usize {
        self.column + self.columns.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.row == 0 || self.column == 0 {
            return Err(StorageError::InvalidRange(format!(
                "rows and columns are 1-based, got row {} column {}",
                self.row, self.column
            )));
        }
        Ok(())
    }
}

/// The abstract ordered-grid store every table operation goes through.
///
/// Implementations are shared across requests and must be `Send + Sync`, but
/// provide no isolation between callers: each method is individually
/// consistent, sequences of calls are not.
pub trait GridStore: Send + Sync {
    fn spreadsheet_id(&self) -> &str;

    // Sheet management
    fn sheet_names(&self) -> Result<Vec<String>, StorageError>;
    fn has_sheet(&self, sheet: &str) -> Result<bool, StorageError>;
    fn insert_sheet(&self, sheet: &str) -> Result<(), StorageError>;

    // All cell operations scoped by sheet name
    fn last_row(&self, sheet: &str) -> Result<usize, StorageError>;
    fn last_column(&self, sheet: &str) -> Result<usize, StorageError>;
    fn read_range(&self, sheet: &str, range: GridRange) -> Result<Vec<Vec<CellValue>>, StorageError>;
    fn write_range(&self, sheet: &str, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StorageError>;
    fn append_row(&self, sheet: &str, values: &[CellValue]) -> Result<(), StorageError>;
    fn delete_rows(&self, sheet: &str, start: usize, count: usize) -> Result<(), StorageError>;

    fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StorageError> {
        self.delete_rows(sheet, row, 1)
    }
}

/// Rejects identifiers that cannot name a real spreadsheet.
pub fn check_spreadsheet_id(id: &str) -> Result<(), StorageError> {
    if id.trim().is_empty() || id == PLACEHOLDER_SPREADSHEET_ID {
        return Err(StorageError::SpreadsheetNotFound(id.to_string()));
    }
    Ok(())
}

/// Shared bounds check for `delete_rows` implementations.
pub fn check_delete_range(start: usize, count: usize, last_row: usize) -> Result<(), StorageError> {
    if start == 0 || count == 0 || start + count - 1 > last_row {
        return Err(StorageError::RowOutOfRange {
            row: if start == 0 { 0 } else { start + count.saturating_sub(1) },
            last_row,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds() {
        let range = GridRange::new(2, 1, 3, 5);
        assert_eq!(range.last_row(), 4);
        assert_eq!(range.last_column(), 5);
        assert!(GridRange::new(0, 1, 1, 1).validate().is_err());
    }

    #[test]
    fn test_spreadsheet_id_check() {
        assert!(check_spreadsheet_id("").is_err());
        assert!(check_spreadsheet_id(PLACEHOLDER_SPREADSHEET_ID).is_err());
        assert!(check_spreadsheet_id("promos").is_ok());
    }

    #[test]
    fn test_delete_range_check() {
        assert!(check_delete_range(2, 1, 4).is_ok());
        assert!(check_delete_range(4, 1, 4).is_ok());
        assert!(matches!(
            check_delete_range(5, 1, 4),
            Err(StorageError::RowOutOfRange { row: 5, last_row: 4 })
        ));
        assert!(check_delete_range(0, 1, 4).is_err());
        assert!(check_delete_range(2, 0, 4).is_err());
    }
}
