pub mod audit_routes;
pub mod config_routes;
pub mod dashboard_routes;
pub mod gps_routes;
pub mod upload_routes;

use axum::Router;

use crate::state::AppState;

/// Crear el router principal de la API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(upload_routes::create_upload_router())
        .merge(dashboard_routes::create_dashboard_router())
        .merge(audit_routes::create_audit_router())
        .merge(gps_routes::create_gps_router())
        .merge(config_routes::create_config_router())
}
