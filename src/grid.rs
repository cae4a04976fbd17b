use std::sync::Arc;

use sheetbase_core::{CellValue, GridRange, GridStore};
use sheetbase_memory::InMemoryGrid;
use sheetbase_sqlite::SqliteGrid;

use crate::{
    config::StorageConfig,
    error::{ConfigError, StorageError},
};

/// Opens the backing spreadsheet and resolves sheets by name.
#[derive(Clone)]
pub struct GridAccessor {
    store: Arc<dyn GridStore>,
}

impl GridAccessor {
    pub fn new(store: Arc<dyn GridStore>) -> Self {
        Self { store }
    }

    /// Opens the backend named in the storage configuration.
    pub fn open(config: &StorageConfig) -> Result<Self, ConfigError> {
        let store: Arc<dyn GridStore> = match config.backend.as_str() {
            "memory" => Arc::new(InMemoryGrid::open(&config.spreadsheet_id)?),
            "sqlite" => Arc::new(SqliteGrid::open(&config.path, &config.spreadsheet_id)?),
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };
        tracing::info!(backend = %config.backend, spreadsheet_id = %config.spreadsheet_id, "Spreadsheet opened");
        Ok(Self::new(store))
    }

    pub fn spreadsheet_id(&self) -> &str {
        self.store.spreadsheet_id()
    }

    pub fn sheet_names(&self) -> Result<Vec<String>, StorageError> {
        self.store.sheet_names()
    }

    pub fn has_sheet(&self, name: &str) -> Result<bool, StorageError> {
        self.store.has_sheet(name)
    }

    pub fn insert_sheet(&self, name: &str) -> Result<(), StorageError> {
        self.store.insert_sheet(name)
    }

    /// Resolves a sheet, failing fast when it does not exist.
    pub fn sheet<'a>(&'a self, name: &'a str) -> Result<Sheet<'a>, StorageError> {
        if !self.store.has_sheet(name)? {
            return Err(StorageError::SheetNotFound(name.to_string()));
        }
        Ok(Sheet { store: self.store.as_ref(), name })
    }
}

/// A resolved sheet handle. Row numbers are 1-based and include the header.
pub struct Sheet<'a> {
    store: &'a dyn GridStore,
    name: &'a str,
}

impl<'a> Sheet<'a> {
    pub fn last_row(&self) -> Result<usize, StorageError> {
        self.store.last_row(self.name)
    }

    pub fn last_column(&self) -> Result<usize, StorageError> {
        self.store.last_column(self.name)
    }

    pub fn read(&self, range: GridRange) -> Result<Vec<Vec<CellValue>>, StorageError> {
        self.store.read_range(self.name, range)
    }

    /// Every occupied cell from A1 to the last occupied row and column.
    pub fn data_range(&self) -> Result<Vec<Vec<CellValue>>, StorageError> {
        let (rows, columns) = (self.last_row()?, self.last_column()?);
        if rows == 0 || columns == 0 {
            return Ok(Vec::new());
        }
        self.read(GridRange::new(1, 1, rows, columns))
    }

    pub fn write(&self, row: usize, column: usize, values: &[Vec<CellValue>]) -> Result<(), StorageError> {
        self.store.write_range(self.name, row, column, values)
    }

    pub fn append_row(&self, values: &[CellValue]) -> Result<(), StorageError> {
        self.store.append_row(self.name, values)
    }

    pub fn delete_row(&self, row: usize) -> Result<(), StorageError> {
        self.store.delete_row(self.name, row)
    }

    pub fn delete_rows(&self, start: usize, count: usize) -> Result<(), StorageError> {
        self.store.delete_rows(self.name, start, count)
    }
}
