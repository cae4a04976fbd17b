//! SQLite-backed `GridStore`.
//!
//! Only non-empty cells are persisted, keyed by `(sheet, row, col)`, so the
//! last occupied row and column fall out of `MAX()` queries.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use sheetbase_core::{
    check_delete_range, check_spreadsheet_id, CellValue, GridRange, GridStore, StorageError,
};

pub struct SqliteGrid {
    id: String,
    conn: Mutex<Connection>,
}

fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::Other(e.to_string())
}

fn encode_cell(value: &CellValue) -> Option<(&'static str, String)> {
    match value {
        CellValue::Empty => None,
        CellValue::Text(s) if s.is_empty() => None,
        CellValue::Bool(b) => Some(("b", b.to_string())),
        CellValue::Number(n) => Some(("n", n.to_string())),
        CellValue::Text(s) => Some(("s", s.clone())),
    }
}

fn decode_cell(kind: &str, value: String) -> Result<CellValue, StorageError> {
    match kind {
        "b" => Ok(CellValue::Bool(value == "true")),
        "n" => value
            .parse::<f64>()
            .map(CellValue::Number)
            .map_err(|e| StorageError::Other(format!("Invalid number cell {:?}: {}", value, e))),
        "s" => Ok(CellValue::Text(value)),
        other => Err(StorageError::Other(format!("Unknown cell kind: {}", other))),
    }
}

impl SqliteGrid {
    /// Opens (or creates) the grid at `path` and binds it to `id`.
    ///
    /// A file already bound to a different spreadsheet id is rejected.
    pub fn open(path: &str, id: &str) -> Result<Self, StorageError> {
        check_spreadsheet_id(id)?;
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(sql_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(sql_err)?;

        let grid = Self {
            id: id.to_string(),
            conn: Mutex::new(conn),
        };
        grid.init_schema()?;
        grid.bind_id()?;
        tracing::debug!(path, spreadsheet_id = id, "Opened SQLite grid");
        Ok(grid)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sheets (
                name TEXT PRIMARY KEY,
                position INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cells (
                sheet TEXT NOT NULL,
                row INTEGER NOT NULL,
                col INTEGER NOT NULL,
                kind TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (sheet, row, col),
                FOREIGN KEY (sheet) REFERENCES sheets(name)
            );
            ",
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn bind_id(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let existing: Option<String> = conn
            .query_row("SELECT value FROM metadata WHERE key = 'spreadsheet_id'", [], |r| r.get(0))
            .optional()
            .map_err(sql_err)?;
        match existing {
            Some(bound) if bound != self.id => {
                tracing::error!(component = "sqlite_grid", operation = "open", bound = %bound, requested = %self.id, "Spreadsheet id mismatch");
                Err(StorageError::SpreadsheetNotFound(self.id.clone()))
            }
            Some(_) => Ok(()),
            None => {
                conn.execute(
                    "INSERT INTO metadata (key, value) VALUES ('spreadsheet_id', ?1)",
                    params![self.id],
                )
                .map_err(sql_err)?;
                Ok(())
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn ensure_sheet(conn: &Connection, sheet: &str) -> Result<(), StorageError> {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM sheets WHERE name = ?1", params![sheet], |r| r.get(0))
            .optional()
            .map_err(sql_err)?;
        match found {
            Some(_) => Ok(()),
            None => Err(StorageError::SheetNotFound(sheet.to_string())),
        }
    }

    fn max_row(conn: &Connection, sheet: &str) -> Result<usize, StorageError> {
        let max: i64 = conn
            .query_row("SELECT COALESCE(MAX(row), 0) FROM cells WHERE sheet = ?1", params![sheet], |r| r.get(0))
            .map_err(sql_err)?;
        Ok(max as usize)
    }

    fn put_cells(conn: &Connection, sheet: &str, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StorageError> {
        let mut upsert = conn
            .prepare_cached("INSERT OR REPLACE INTO cells (sheet, row, col, kind, value) VALUES (?1, ?2, ?3, ?4, ?5)")
            .map_err(sql_err)?;
        let mut clear = conn
            .prepare_cached("DELETE FROM cells WHERE sheet = ?1 AND row = ?2 AND col = ?3")
            .map_err(sql_err)?;

        for (r, cells) in values.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                let (row, col) = ((row + r) as i64, (column + c) as i64);
                let written = match encode_cell(value) {
                    Some((kind, text)) => upsert.execute(params![sheet, row, col, kind, text]),
                    None => clear.execute(params![sheet, row, col]),
                };
                written.map_err(sql_err)?;
            }
        }
        Ok(())
    }
}

impl GridStore for SqliteGrid {
    fn spreadsheet_id(&self) -> &str {
        &self.id
    }

    fn sheet_names(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM sheets ORDER BY position").map_err(sql_err)?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(0))
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        Ok(names)
    }

    fn has_sheet(&self, sheet: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        match Self::ensure_sheet(&conn, sheet) {
            Ok(()) => Ok(true),
            Err(StorageError::SheetNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn insert_sheet(&self, sheet: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        if Self::ensure_sheet(&conn, sheet).is_ok() {
            return Err(StorageError::SheetAlreadyExists(sheet.to_string()));
        }
        conn.execute(
            "INSERT INTO sheets (name, position) VALUES (?1, (SELECT COUNT(*) FROM sheets))",
            params![sheet],
        )
        .map_err(sql_err)?;
        tracing::debug!(sheet, "SQLite sheet inserted");
        Ok(())
    }

    fn last_row(&self, sheet: &str) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;
        Self::max_row(&conn, sheet)
    }

    fn last_column(&self, sheet: &str) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;
        let max: i64 = conn
            .query_row("SELECT COALESCE(MAX(col), 0) FROM cells WHERE sheet = ?1", params![sheet], |r| r.get(0))
            .map_err(sql_err)?;
        Ok(max as usize)
    }

    fn read_range(&self, sheet: &str, range: GridRange) -> Result<Vec<Vec<CellValue>>, StorageError> {
        range.validate()?;
        let conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;

        let mut grid = vec![vec![CellValue::Empty; range.columns]; range.rows];
        if range.rows == 0 || range.columns == 0 {
            return Ok(grid);
        }

        let mut stmt = conn
            .prepare(
                "SELECT row, col, kind, value FROM cells
                 WHERE sheet = ?1 AND row BETWEEN ?2 AND ?3 AND col BETWEEN ?4 AND ?5",
            )
            .map_err(sql_err)?;
        let cells = stmt
            .query_map(
                params![
                    sheet,
                    range.row as i64,
                    range.last_row() as i64,
                    range.column as i64,
                    range.last_column() as i64
                ],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, i64>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                },
            )
            .map_err(sql_err)?;

        for cell in cells {
            let (row, col, kind, value) = cell.map_err(sql_err)?;
            let (r, c) = (row as usize - range.row, col as usize - range.column);
            grid[r][c] = decode_cell(&kind, value)?;
        }
        Ok(grid)
    }

    fn write_range(&self, sheet: &str, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StorageError> {
        GridRange::new(row, column, values.len(), 1).validate()?;
        let mut conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;
        let tx = conn.transaction().map_err(sql_err)?;
        Self::put_cells(&tx, sheet, row, column, values)?;
        tx.commit().map_err(sql_err)?;
        Ok(())
    }

    fn append_row(&self, sheet: &str, values: &[CellValue]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;
        let tx = conn.transaction().map_err(sql_err)?;
        let row = Self::max_row(&tx, sheet)? + 1;
        Self::put_cells(&tx, sheet, row, 1, &[values.to_vec()])?;
        tx.commit().map_err(sql_err)?;
        Ok(())
    }

    fn delete_rows(&self, sheet: &str, start: usize, count: usize) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        Self::ensure_sheet(&conn, sheet)?;
        let tx = conn.transaction().map_err(sql_err)?;
        check_delete_range(start, count, Self::max_row(&tx, sheet)?)?;

        let end = (start + count - 1) as i64;
        tx.execute(
            "DELETE FROM cells WHERE sheet = ?1 AND row BETWEEN ?2 AND ?3",
            params![sheet, start as i64, end],
        )
        .map_err(sql_err)?;
        // Shift through negative rows so the primary key never collides mid-update.
        tx.execute(
            "UPDATE cells SET row = -(row - ?2) WHERE sheet = ?1 AND row > ?3",
            params![sheet, count as i64, end],
        )
        .map_err(sql_err)?;
        tx.execute("UPDATE cells SET row = -row WHERE sheet = ?1 AND row < 0", params![sheet])
            .map_err(sql_err)?;
        tx.commit().map_err(sql_err)?;

        tracing::debug!(sheet, start, count, "SQLite rows deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SqliteGrid {
        let grid = SqliteGrid::open(":memory:", "test").unwrap();
        grid.insert_sheet("Banks").unwrap();
        grid.write_range(
            "Banks",
            1,
            1,
            &[vec![CellValue::from("bank_id"), CellValue::from("name"), CellValue::from("active")]],
        )
        .unwrap();
        grid
    }

    #[test]
    fn test_cell_kinds_persist() {
        let grid = grid();
        grid.append_row(
            "Banks",
            &[CellValue::from("A"), CellValue::Number(12.5), CellValue::Bool(true)],
        )
        .unwrap();
        let rows = grid.read_range("Banks", GridRange::row(2, 4)).unwrap();
        assert_eq!(
            rows[0],
            vec![CellValue::from("A"), CellValue::Number(12.5), CellValue::Bool(true), CellValue::Empty]
        );
    }

    #[test]
    fn test_delete_rows_shift() {
        let grid = grid();
        for id in ["A", "B", "C", "D"] {
            grid.append_row("Banks", &[CellValue::from(id)]).unwrap();
        }
        grid.delete_rows("Banks", 3, 2).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 3);
        let ids = grid.read_range("Banks", GridRange::new(2, 1, 2, 1)).unwrap();
        assert_eq!(ids, vec![vec![CellValue::from("A")], vec![CellValue::from("D")]]);
    }

    #[test]
    fn test_empty_write_clears_cell() {
        let grid = grid();
        grid.append_row("Banks", &[CellValue::from("A"), CellValue::from("Alpha")]).unwrap();
        grid.write_range("Banks", 2, 1, &[vec![CellValue::Empty, CellValue::Empty]]).unwrap();
        assert_eq!(grid.last_row("Banks").unwrap(), 1);
    }

    #[test]
    fn test_missing_sheet() {
        let grid = grid();
        assert!(matches!(grid.last_row("Nope"), Err(StorageError::SheetNotFound(_))));
        assert!(!grid.has_sheet("Nope").unwrap());
        assert!(matches!(grid.insert_sheet("Banks"), Err(StorageError::SheetAlreadyExists(_))));
    }

    #[test]
    fn test_rejects_placeholder_id() {
        assert!(matches!(
            SqliteGrid::open(":memory:", sheetbase_core::PLACEHOLDER_SPREADSHEET_ID),
            Err(StorageError::SpreadsheetNotFound(_))
        ));
    }
}
