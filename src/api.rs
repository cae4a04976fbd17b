//! Bank operations wrapped in the uniform `{ success, data, error }`
//! envelope. Nothing here returns `Err`; every failure becomes a response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::{
    error::{ErrorKind, RepositoryError},
    models::{Bank, BankUpdate, NewBank},
    repository::{BankRepository, DeleteOutcome},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Category of the failure; not part of the JSON envelope.
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            error: None,
            errors: None,
            kind: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Attaches `message` only to successful responses.
    fn with_success_message(self, message: &str) -> Self {
        if self.success {
            self.with_message(message)
        } else {
            self
        }
    }

    pub fn done(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: Some(message.to_string()),
            error: None,
            errors: None,
            kind: None,
        }
    }

    pub fn fail(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            message: None,
            error: Some(error.into()),
            errors: None,
            kind: Some(kind),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::fail(ErrorKind::Invalid, "Validation failed")
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::ok(items)
        }
    }
}

impl<T> From<Result<T, RepositoryError>> for ApiResponse<T> {
    fn from(result: Result<T, RepositoryError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.kind(), e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateFailure {
    pub index: usize,
    pub data: Json,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateFailure {
    pub bank_id: String,
    pub error: String,
}

/// Itemised outcome of a batch create; `success` stays true even when some
/// items failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchCreateResponse {
    pub success: bool,
    pub created: Vec<Bank>,
    pub failed: Vec<CreateFailure>,
    pub success_count: usize,
    pub fail_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchUpdateResponse {
    pub success: bool,
    pub updated: Vec<Bank>,
    pub failed: Vec<UpdateFailure>,
    pub success_count: usize,
    pub fail_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankPatch {
    pub bank_id: String,
    /// Checked per item, so a malformed patch fails alone.
    #[serde(default)]
    pub updates: Json,
}

pub struct BankApi {
    banks: Arc<BankRepository>,
}

impl BankApi {
    pub fn new(banks: Arc<BankRepository>) -> Self {
        Self { banks }
    }

    pub fn get_all(&self, include_inactive: bool) -> ApiResponse<Vec<Bank>> {
        match self.banks.get_all(include_inactive) {
            Ok(banks) => ApiResponse::list(banks),
            Err(e) => ApiResponse::fail(e.kind(), e.to_string()),
        }
    }

    pub fn get_by_id(&self, bank_id: &str) -> ApiResponse<Bank> {
        match self.banks.get_by_id(bank_id) {
            Ok(Some(bank)) => ApiResponse::ok(bank),
            Ok(None) => ApiResponse::fail(ErrorKind::NotFound, "Bank not found"),
            Err(e) => ApiResponse::fail(e.kind(), e.to_string()),
        }
    }

    pub fn create(&self, data: &NewBank) -> ApiResponse<Bank> {
        let errors = self.banks.validate(data);
        if !errors.is_empty() {
            return ApiResponse::invalid(errors);
        }
        ApiResponse::from(self.banks.create(data)).with_success_message("Banco creado correctamente")
    }

    /// Create from an untyped body; field type errors come back in `errors`.
    pub fn create_json(&self, body: &Json) -> ApiResponse<Bank> {
        match NewBank::from_json(body) {
            Ok(data) => self.create(&data),
            Err(errors) => ApiResponse::invalid(errors),
        }
    }

    pub fn update(&self, bank_id: &str, updates: &BankUpdate) -> ApiResponse<Bank> {
        ApiResponse::from(self.banks.update(bank_id, updates)).with_success_message("Banco actualizado correctamente")
    }

    pub fn update_json(&self, bank_id: &str, body: &Json) -> ApiResponse<Bank> {
        match BankUpdate::from_json(body) {
            Ok(updates) => self.update(bank_id, &updates),
            Err(errors) => ApiResponse::invalid(errors),
        }
    }

    fn settled(outcome: DeleteOutcome, message: &str) -> ApiResponse<Bank> {
        match outcome.kind {
            None => ApiResponse::done(message),
            Some(kind) => ApiResponse::fail(kind, outcome.message),
        }
    }

    pub fn delete(&self, bank_id: &str) -> ApiResponse<Bank> {
        let outcome = self.banks.delete(bank_id);
        Self::settled(outcome, "Banco desactivado correctamente")
    }

    pub fn activate(&self, bank_id: &str) -> ApiResponse<Bank> {
        ApiResponse::from(self.banks.activate(bank_id)).with_success_message("Banco activado correctamente")
    }

    pub fn permanently_delete(&self, bank_id: &str) -> ApiResponse<Bank> {
        let outcome = self.banks.permanently_delete(bank_id);
        Self::settled(outcome, "Banco eliminado permanentemente")
    }

    pub fn get_by_bodega(&self, is_bodega: bool, include_inactive: bool) -> ApiResponse<Vec<Bank>> {
        match self.banks.get_by_bodega(is_bodega, include_inactive) {
            Ok(banks) => ApiResponse::list(banks),
            Err(e) => ApiResponse::fail(e.kind(), e.to_string()),
        }
    }

    pub fn get_supporting_bizum(&self, include_inactive: bool) -> ApiResponse<Vec<Bank>> {
        match self.banks.get_supporting_bizum(include_inactive) {
            Ok(banks) => ApiResponse::list(banks),
            Err(e) => ApiResponse::fail(e.kind(), e.to_string()),
        }
    }

    pub fn batch_create(&self, items: &[Json]) -> BatchCreateResponse {
        let mut created = Vec::new();
        let mut failed = Vec::new();
        for (index, data) in items.iter().enumerate() {
            let result = NewBank::from_json(data)
                .map_err(|errors| errors.join(", "))
                .and_then(|bank| self.banks.create(&bank).map_err(|e| e.to_string()));
            match result {
                Ok(bank) => created.push(bank),
                Err(error) => failed.push(CreateFailure { index, data: data.clone(), error }),
            }
        }
        BatchCreateResponse {
            success: true,
            success_count: created.len(),
            fail_count: failed.len(),
            created,
            failed,
        }
    }

    pub fn batch_update(&self, patches: &[BankPatch]) -> BatchUpdateResponse {
        let mut updated = Vec::new();
        let mut failed = Vec::new();
        for patch in patches {
            let parsed = match &patch.updates {
                Json::Null => Ok(BankUpdate::default()),
                body => BankUpdate::from_json(body),
            };
            let result = parsed
                .map_err(|errors| errors.join(", "))
                .and_then(|updates| self.banks.update(&patch.bank_id, &updates).map_err(|e| e.to_string()));
            match result {
                Ok(bank) => updated.push(bank),
                Err(error) => failed.push(UpdateFailure { bank_id: patch.bank_id.clone(), error }),
            }
        }
        BatchUpdateResponse {
            success: true,
            success_count: updated.len(),
            fail_count: failed.len(),
            updated,
            failed,
        }
    }
}
