//! Rutas de auditoría de continuidad

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::models::audit::AuditReport;
use crate::services::continuity;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub fn create_audit_router() -> Router<AppState> {
    Router::new().route("/audit/:vehicle_id", get(audit_vehicle))
}

async fn audit_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> AppResult<Json<AuditReport>> {
    let records = state.records.list_records(None).await?;

    let unit_records: Vec<_> = records
        .into_iter()
        .filter(|r| r.vehicle_id == vehicle_id)
        .collect();

    if unit_records.is_empty() {
        return Err(not_found_error("Vehicle", &vehicle_id));
    }

    Ok(Json(continuity::audit_vehicle(&vehicle_id, unit_records)))
}
