//! In-memory `GridStore` implementation.
//!
//! Every sheet is a vector of rows; rows are vectors of cells and may be
//! ragged. Reads pad missing positions with `CellValue::Empty`.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use sheetbase_core::{
    check_delete_range, check_spreadsheet_id, CellValue, GridRange, GridStore, StorageError,
};

#[derive(Clone, Default)]
struct SheetData {
    position: usize,
    rows: Vec<Vec<CellValue>>,
}

impl SheetData {
    fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_empty()))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn last_column(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(|c| !c.is_empty()))
            .map(|i| i + 1)
            .max()
            .unwrap_or(0)
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(column - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn set(&mut self, row: usize, column: usize, value: CellValue) {
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, CellValue::Empty);
        }
        cells[column - 1] = value.normalized();
    }
}

pub struct InMemoryGrid {
    id: String,
    sheets: RwLock<BTreeMap<Arc<str>, SheetData>>,
}

impl InMemoryGrid {
    /// Opens an empty grid under `id`. Fails for blank or placeholder ids.
    pub fn open(id: &str) -> Result<Self, StorageError> {
        check_spreadsheet_id(id)?;
        tracing::debug!(spreadsheet_id = id, "Opened in-memory grid");
        Ok(Self {
            id: id.to_string(),
            sheets: RwLock::new(BTreeMap::new()),
        })
    }

    /// Opens a grid and seeds it with header-only sheets.
    pub fn with_sheets(id: &str, sheets: &[(&str, &[&str])]) -> Result<Self, StorageError> {
        let grid = Self::open(id)?;
        for (name, headers) in sheets {
            grid.insert_sheet(name)?;
            let header: Vec<CellValue> = headers.iter().map(|h| CellValue::from(*h)).collect();
            grid.write_range(name, 1, 1, &[header])?;
        }
        Ok(grid)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Arc<str>, SheetData>>, StorageError> {
        self.sheets.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Arc<str>, SheetData>>, StorageError> {
        self.sheets.write().map_err(|_| StorageError::LockPoisoned)
    }

    fn with_sheet<T>(&self, sheet: &str, f: impl FnOnce(&SheetData) -> T) -> Result<T, StorageError> {
        let sheets = self.read()?;
        let data = sheets
            .get(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(sheet.to_string()))?;
        Ok(f(data))
    }

    fn with_sheet_mut<T>(
        &self,
        sheet: &str,
        f: impl FnOnce(&mut SheetData) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut sheets = self.write()?;
        let data = sheets
            .get_mut(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(sheet.to_string()))?;
        f(data)
    }
}

impl GridStore for InMemoryGrid {
    fn spreadsheet_id(&self) -> &str {
        &self.id
    }

    fn sheet_names(&self) -> Result<Vec<String>, StorageError> {
        let sheets = self.read()?;
        let mut names: Vec<(usize, &Arc<str>)> = sheets.iter().map(|(k, v)| (v.position, k)).collect();
        names.sort_by_key(|(position, _)| *position);
        Ok(names.into_iter().map(|(_, name)| name.to_string()).collect())
    }

    fn has_sheet(&self, sheet: &str) -> Result<bool, StorageError> {
        Ok(self.read()?.contains_key(sheet))
    }

    fn insert_sheet(&self, sheet: &str) -> Result<(), StorageError> {
        let mut sheets = self.write()?;
        let key: Arc<str> = Arc::from(sheet);
        if sheets.contains_key(&key) {
            return Err(StorageError::SheetAlreadyExists(sheet.to_string()));
        }
        let position = sheets.len();
        sheets.insert(key, SheetData { position, rows: Vec::new() });
        tracing::debug!(sheet, "Sheet inserted");
        Ok(())
    }

    fn last_row(&self, sheet: &str) -> Result<usize, StorageError> {
        self.with_sheet(sheet, SheetData::last_row)
    }

    fn last_column(&self, sheet: &str) -> Result<usize, StorageError> {
        self.with_sheet(sheet, SheetData::last_column)
    }

    fn read_range(&self, sheet: &str, range: GridRange) -> Result<Vec<Vec<CellValue>>, StorageError> {
        range.validate()?;
        self.with_sheet(sheet, |data| {
            (range.row..range.row + range.rows)
                .map(|row| {
                    (range.column..range.column + range.columns)
                        .map(|column| data.cell(row, column))
                        .collect()
                })
                .collect()
        })
    }

    fn write_range(&self, sheet: &str, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StorageError> {
        GridRange::new(row, column, values.len(), 1).validate()?;
        self.with_sheet_mut(sheet, |data| {
            for (r, cells) in values.iter().enumerate() {
                for (c, value) in cells.iter().enumerate() {
                    data.set(row + r, column + c, value.clone());
                }
            }
            Ok(())
        })
    }

    fn append_row(&self, sheet: &str, values: &[CellValue]) -> Result<(), StorageError> {
        self.with_sheet_mut(sheet, |data| {
            let row = data.last_row() + 1;
            data.rows.truncate(row - 1);
            data.rows.push(values.iter().cloned().map(CellValue::normalized).collect());
            Ok(())
        })
    }

    fn delete_rows(&self, sheet: &str, start: usize, count: usize) -> Result<(), StorageError> {
        self.with_sheet_mut(sheet, |data| {
            check_delete_range(start, count, data.last_row())?;
            data.rows.drain(start - 1..start - 1 + count);
            tracing::debug!(sheet, start, count, "Rows deleted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> InMemoryGrid {
        InMemoryGrid::with_sheets("test", &[("Banks", &["bank_id", "name", "active"])]).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_open_rejects_placeholder() {
        assert!(matches!(
            InMemoryGrid::open(sheetbase_core::PLACEHOLDER_SPREADSHEET_ID),
            Err(StorageError::SpreadsheetNotFound(_))
        ));
        assert!(InMemoryGrid::open("  ").is_err());
    }

    #[test]
    fn test_missing_sheet() {
        let grid = grid();
        assert!(matches!(grid.last_row("Nope"), Err(StorageError::SheetNotFound(_))));
        assert!(matches!(grid.insert_sheet("Banks"), Err(StorageError::SheetAlreadyExists(_))));
    }

    #[test]
    fn test_append_and_read() {
        let grid = grid();
        assert_eq!(grid.last_row("Banks").unwrap(), 1);
        assert_eq!(grid.last_column("Banks").unwrap(), 3);

        grid.append_row("Banks", &[text("A"), text("Alpha"), CellValue::Bool(true)]).unwrap();
        grid.append_row("Banks", &[text("B"), text(""), CellValue::Bool(false)]).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 3);

        let rows = grid.read_range("Banks", GridRange::new(2, 1, 2, 4)).unwrap();
        assert_eq!(rows[0], vec![text("A"), text("Alpha"), CellValue::Bool(true), CellValue::Empty]);
        assert_eq!(rows[1][1], CellValue::Empty);
    }

    #[test]
    fn test_delete_shifts_rows() {
        let grid = grid();
        for id in ["A", "B", "C"] {
            grid.append_row("Banks", &[text(id)]).unwrap();
        }
        grid.delete_row("Banks", 3).unwrap();
        let rows = grid.read_range("Banks", GridRange::new(2, 1, 2, 1)).unwrap();
        assert_eq!(rows, vec![vec![text("A")], vec![text("C")]]);
        assert!(matches!(
            grid.delete_row("Banks", 9),
            Err(StorageError::RowOutOfRange { row: 9, last_row: 3 })
        ));
    }

    #[test]
    fn test_blank_rows_do_not_count() {
        let grid = grid();
        grid.write_range("Banks", 4, 1, &[vec![text("X")]]).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 4);
        grid.write_range("Banks", 4, 1, &[vec![CellValue::Empty]]).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 1);

        grid.append_row("Banks", &[text("Y")]).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 2);
    }

    #[test]
    fn test_sheet_order() {
        let grid = InMemoryGrid::open("test").unwrap();
        grid.insert_sheet("Zeta").unwrap();
        grid.insert_sheet("Alpha").unwrap();
        assert_eq!(grid.sheet_names().unwrap(), vec!["Zeta".to_string(), "Alpha".to_string()]);
    }
}
