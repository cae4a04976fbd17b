use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::{ErrorKind, RepositoryError},
    id::IdSource,
    models::{read::ACTIVE, Bank, BankUpdate, NewBank},
    schema::Table,
    table_service::TableService,
};

const ENTITY: &str = "Bank";
const ID_PREFIX: &str = "BANK";

/// Result of a delete, returned instead of an error so callers can branch on
/// `success` directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl DeleteOutcome {
    fn failed(error: &RepositoryError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            bank: None,
            kind: Some(error.kind()),
        }
    }
}

pub struct BankRepository {
    tables: Arc<TableService>,
    ids: Arc<dyn IdSource>,
}

fn require_id(bank_id: &str) -> Result<(), RepositoryError> {
    if bank_id.is_empty() {
        return Err(RepositoryError::Validation("Bank ID is required".to_string()));
    }
    Ok(())
}

fn logged<T>(operation: &'static str, f: impl FnOnce() -> Result<T, RepositoryError>) -> Result<T, RepositoryError> {
    let result = f();
    if let Err(e) = &result {
        tracing::error!(component = "bank_repository", operation, error = %e, "Bank operation failed");
    }
    result
}

impl BankRepository {
    pub fn new(tables: Arc<TableService>, ids: Arc<dyn IdSource>) -> Self {
        Self { tables, ids }
    }

    fn sheet() -> &'static str {
        Table::Banks.name()
    }

    /// Every problem with a create payload, without touching storage.
    pub fn validate(&self, data: &NewBank) -> Vec<String> {
        data.validate()
    }

    pub fn create(&self, data: &NewBank) -> Result<Bank, RepositoryError> {
        logged("create", || {
            let name = data
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| RepositoryError::Validation("Bank name is required".to_string()))?;

            let bank = Bank {
                bank_id: self.ids.generate(ID_PREFIX),
                name: name.to_string(),
                is_bodega: data.is_bodega == Some(true),
                supports_bizum: data.supports_bizum == Some(true),
                active: data.active != Some(false),
            };
            self.tables.append_object(Self::sheet(), &bank.to_object())?;

            tracing::info!(bank_id = %bank.bank_id, name = %bank.name, "Bank created");
            Ok(bank)
        })
    }

    pub fn get_by_id(&self, bank_id: &str) -> Result<Option<Bank>, RepositoryError> {
        logged("get_by_id", || {
            require_id(bank_id)?;
            Ok(self.tables.find_by_id(Self::sheet(), bank_id)?.as_ref().map(Bank::from_record))
        })
    }

    /// All banks; without `include_inactive` only rows whose `active` cell is
    /// boolean `true`.
    pub fn get_all(&self, include_inactive: bool) -> Result<Vec<Bank>, RepositoryError> {
        logged("get_all", || {
            let records = self.tables.get_all_records(Self::sheet())?;
            Ok(records
                .iter()
                .filter(|record| include_inactive || record.is_true(ACTIVE))
                .map(Bank::from_record)
                .collect())
        })
    }

    pub fn get_by_bodega(&self, is_bodega: bool, include_inactive: bool) -> Result<Vec<Bank>, RepositoryError> {
        let banks = self.get_all(include_inactive)?;
        Ok(banks.into_iter().filter(|b| b.is_bodega == is_bodega).collect())
    }

    pub fn get_supporting_bizum(&self, include_inactive: bool) -> Result<Vec<Bank>, RepositoryError> {
        let banks = self.get_all(include_inactive)?;
        Ok(banks.into_iter().filter(|b| b.supports_bizum).collect())
    }

    /// Lookup failures are logged and reported as "does not exist".
    pub fn exists(&self, bank_id: &str) -> bool {
        match self.tables.id_exists(Self::sheet(), bank_id) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(component = "bank_repository", operation = "exists", error = %e, "Bank operation failed");
                false
            }
        }
    }

    /// Applies the allow-listed fields of `updates` and returns the fresh row.
    pub fn update(&self, bank_id: &str, updates: &BankUpdate) -> Result<Bank, RepositoryError> {
        logged("update", || {
            require_id(bank_id)?;
            if self.get_by_id(bank_id)?.is_none() {
                return Err(RepositoryError::NotFound { entity: ENTITY, id: bank_id.to_string() });
            }
            if matches!(&updates.name, Some(name) if name.trim().is_empty()) {
                return Err(RepositoryError::Validation("Bank name cannot be empty".to_string()));
            }
            if updates.is_empty() {
                return Err(RepositoryError::Validation("No valid fields to update".to_string()));
            }

            if !self.tables.update_by_id(Self::sheet(), bank_id, &updates.to_object())? {
                return Err(RepositoryError::WriteFailed { action: "update", entity: ENTITY, id: bank_id.to_string() });
            }

            let bank = self
                .get_by_id(bank_id)?
                .ok_or_else(|| RepositoryError::NotFound { entity: ENTITY, id: bank_id.to_string() })?;
            tracing::info!(bank_id, name = %bank.name, "Bank updated");
            Ok(bank)
        })
    }

    pub fn activate(&self, bank_id: &str) -> Result<Bank, RepositoryError> {
        self.update(bank_id, &BankUpdate::active(true))
    }

    pub fn deactivate(&self, bank_id: &str) -> Result<Bank, RepositoryError> {
        self.update(bank_id, &BankUpdate::active(false))
    }

    /// Soft delete: flips `active` off and keeps the row.
    pub fn delete(&self, bank_id: &str) -> DeleteOutcome {
        let result = logged("delete", || {
            require_id(bank_id)?;
            if self.get_by_id(bank_id)?.is_none() {
                return Err(RepositoryError::NotFound { entity: ENTITY, id: bank_id.to_string() });
            }
            self.deactivate(bank_id)
        });

        match result {
            Ok(bank) => {
                tracing::info!(bank_id, name = %bank.name, "Bank deleted (soft)");
                DeleteOutcome {
                    success: true,
                    message: "Bank deactivated successfully".to_string(),
                    bank: Some(bank),
                    kind: None,
                }
            }
            Err(e) => DeleteOutcome::failed(&e),
        }
    }

    /// Hard delete: removes the row for good.
    pub fn permanently_delete(&self, bank_id: &str) -> DeleteOutcome {
        let result = logged("permanently_delete", || {
            require_id(bank_id)?;
            let bank = self
                .get_by_id(bank_id)?
                .ok_or_else(|| RepositoryError::NotFound { entity: ENTITY, id: bank_id.to_string() })?;
            if !self.tables.delete_by_id(Self::sheet(), bank_id)? {
                return Err(RepositoryError::WriteFailed { action: "delete", entity: ENTITY, id: bank_id.to_string() });
            }
            Ok(bank)
        });

        match result {
            Ok(bank) => {
                tracing::info!(bank_id, name = %bank.name, "Bank permanently deleted");
                DeleteOutcome {
                    success: true,
                    message: "Bank permanently deleted".to_string(),
                    bank: None,
                    kind: None,
                }
            }
            Err(e) => DeleteOutcome::failed(&e),
        }
    }
}
