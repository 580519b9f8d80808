//! Rutas de carga de exportes
//!
//! El exporte CSV entra crudo por POST, pasa por el normalizador y el
//! sanitizador, y se persiste como un lote nuevo. Las advertencias de
//! parseo vuelven en la respuesta en lugar de perderse.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::fuel_transaction::UploadBatch;
use crate::services::normalizer::{self, NormalizerOptions, ParseWarning};
use crate::services::sanitizer;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub fn create_upload_router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_export))
        .route("/batches", get(list_batches))
        .route("/batch/:id", delete(delete_batch))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    file_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    batch_id: Uuid,
    record_count: usize,
    rows_without_liters: usize,
    zero_liter_rows: usize,
    duplicate_rows: usize,
    reversal_rows: usize,
    warnings: Vec<ParseWarning>,
}

async fn upload_export(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> AppResult<Json<UploadResponse>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("El exporte CSV llegó vacío".to_string()));
    }

    let options = NormalizerOptions {
        rescale_small_odometers: state.config.rescale_small_odometers,
    };

    let outcome = normalizer::normalize_csv(&body, &options)
        .map_err(|e| AppError::BadRequest(format!("CSV ilegible: {}", e)))?;
    let sanitized = sanitizer::sanitize(outcome.rows);

    let batch = UploadBatch {
        id: Uuid::new_v4(),
        file_name: params.file_name.unwrap_or_else(|| "exporte.csv".to_string()),
        uploaded_at: Utc::now(),
        record_count: sanitized.records.len(),
    };
    let batch_id = batch.id;
    let record_count = sanitized.records.len();

    state.records.save_batch(batch, sanitized.records).await?;

    Ok(Json(UploadResponse {
        batch_id,
        record_count,
        rows_without_liters: outcome.rows_without_liters,
        zero_liter_rows: sanitized.zero_liter_rows,
        duplicate_rows: sanitized.duplicate_rows,
        reversal_rows: sanitized.reversal_rows,
        warnings: outcome.warnings,
    }))
}

async fn list_batches(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let batches = state.records.list_batches().await?;
    Ok(Json(serde_json::json!({ "batches": batches })))
}

async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    state.records.delete_batch(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Lote eliminado junto con sus registros"
    })))
}
