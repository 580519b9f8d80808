//! Backend de gestión de combustible de flota
//!
//! Motor de reconciliación de exportes de combustible: normaliza el CSV,
//! sanitiza el set, agrega para el dashboard, audita continuidad de
//! odómetros y cruza contra el proveedor GPS externo.

pub mod clients;
pub mod config;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;

use middleware::cors::cors_middleware;
use state::AppState;

/// Construir la aplicación completa sobre un estado ya armado
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/test", get(test_endpoint))
        .nest("/api", routes::create_api_router())
        .layer(cors_middleware())
        .with_state(state)
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "¡Backend de combustible de flota funcionando correctamente!",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
