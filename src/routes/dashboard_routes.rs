//! Rutas del dashboard
//!
//! Agregados puros sobre el set canónico actual; se recalculan en cada
//! lectura.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::models::fuel_transaction::{FleetKpis, MonthlyRollup, VehicleAggregate};
use crate::services::aggregation;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/vehicles", get(get_vehicles))
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    kpis: FleetKpis,
    monthly: Vec<MonthlyRollup>,
    vehicles: Vec<VehicleAggregate>,
}

async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    let records = state.records.list_records(None).await?;

    Ok(Json(DashboardResponse {
        kpis: aggregation::calculate_kpis(&records),
        monthly: aggregation::monthly_rollup(&records),
        vehicles: aggregation::aggregate_by_vehicle(&records),
    }))
}

async fn get_vehicles(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let records = state.records.list_records(None).await?;
    let vehicles = aggregation::distinct_vehicles(&records);
    Ok(Json(serde_json::json!({ "vehicles": vehicles })))
}
