use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    api::{ApiResponse, BankApi, BankPatch},
    error::ErrorKind,
    id::UuidIdSource,
    models::Bank,
    repository::BankRepository,
    table_service::TableService,
};

#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<TableService>,
    pub banks: Arc<BankApi>,
}

impl AppState {
    pub fn new(tables: Arc<TableService>) -> Self {
        let repository = BankRepository::new(tables.clone(), Arc::new(UuidIdSource));
        Self {
            tables,
            banks: Arc::new(BankApi::new(Arc::new(repository))),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/banks", get(list_banks).post(create_bank))
        .route("/banks/:id", get(get_bank).patch(update_bank).delete(delete_bank))
        .route("/banks/:id/activate", post(activate_bank))
        .route("/banks/:id/permanent", delete(permanently_delete_bank))
        .route("/batch/banks", post(batch_create_banks).patch(batch_update_banks))
        .with_state(state)
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

/// `status` for a success; failures map by kind.
fn respond<T: Serialize>(status: StatusCode, response: ApiResponse<T>) -> Reply<T> {
    let status = match (response.success, response.kind) {
        (true, _) => status,
        (false, Some(ErrorKind::NotFound)) => StatusCode::NOT_FOUND,
        (false, Some(ErrorKind::Internal)) => StatusCode::INTERNAL_SERVER_ERROR,
        (false, _) => StatusCode::BAD_REQUEST,
    };
    (status, Json(response))
}

/// Unparseable bodies get the same envelope as invalid ones.
fn body(payload: Result<Json<JsonValue>, JsonRejection>) -> Result<JsonValue, ApiResponse<Bank>> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiResponse::invalid(vec![rejection.body_text()]))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    spreadsheet_id: String,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        spreadsheet_id: state.tables.grid().spreadsheet_id().to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct BankQuery {
    #[serde(default)]
    include_inactive: bool,
    bodega: Option<bool>,
    bizum: Option<bool>,
}

async fn list_banks(State(state): State<AppState>, Query(query): Query<BankQuery>) -> Reply<Vec<Bank>> {
    let response = match (query.bodega, query.bizum) {
        (Some(is_bodega), _) => state.banks.get_by_bodega(is_bodega, query.include_inactive),
        (None, Some(true)) => state.banks.get_supporting_bizum(query.include_inactive),
        _ => state.banks.get_all(query.include_inactive),
    };
    respond(StatusCode::OK, response)
}

async fn get_bank(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Bank> {
    respond(StatusCode::OK, state.banks.get_by_id(&id))
}

async fn create_bank(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Reply<Bank> {
    let response = match body(payload) {
        Ok(data) => state.banks.create_json(&data),
        Err(invalid) => invalid,
    };
    respond(StatusCode::CREATED, response)
}

async fn update_bank(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Reply<Bank> {
    let response = match body(payload) {
        Ok(updates) => state.banks.update_json(&id, &updates),
        Err(invalid) => invalid,
    };
    respond(StatusCode::OK, response)
}

async fn delete_bank(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Bank> {
    respond(StatusCode::OK, state.banks.delete(&id))
}

async fn activate_bank(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Bank> {
    respond(StatusCode::OK, state.banks.activate(&id))
}

async fn permanently_delete_bank(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Bank> {
    respond(StatusCode::OK, state.banks.permanently_delete(&id))
}

async fn batch_create_banks(State(state): State<AppState>, Json(items): Json<Vec<JsonValue>>) -> impl IntoResponse {
    Json(state.banks.batch_create(&items))
}

async fn batch_update_banks(State(state): State<AppState>, Json(patches): Json<Vec<BankPatch>>) -> impl IntoResponse {
    Json(state.banks.batch_update(&patches))
}
