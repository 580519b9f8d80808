//! Rutas del cruce flota-GPS
//!
//! Consultan al proveedor externo; las fallas por unidad quedan aisladas
//! en el reporte y solo la indisponibilidad total del proveedor corta la
//! operación.

use axum::{extract::State, routing::{get, post}, Json, Router};

use crate::models::gps::GpsComparisonReport;
use crate::services::matching;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_gps_router() -> Router<AppState> {
    Router::new()
        .route("/gps/assets", get(list_assets))
        .route("/gps/compare", post(compare_fleet))
}

async fn list_assets(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let gps = state.gps_client()?;
    let assets = gps.list_assets().await?;
    Ok(Json(serde_json::json!({ "assets": assets })))
}

async fn compare_fleet(State(state): State<AppState>) -> AppResult<Json<GpsComparisonReport>> {
    let gps = state.gps_client()?;
    let records = state.records.list_records(None).await?;
    let report = matching::compare_with_gps(&records, &gps).await?;
    Ok(Json(report))
}
