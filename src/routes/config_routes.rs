//! Rutas de configuración clave/valor

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};

use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_config_router() -> Router<AppState> {
    Router::new()
        .route("/config/:kind", get(get_config))
        .route("/config/:kind", put(save_config))
}

async fn get_config(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<HashMap<String, String>>> {
    Ok(Json(state.settings.get_config(&kind).await?))
}

async fn save_config(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(entries): Json<HashMap<String, String>>,
) -> AppResult<Json<serde_json::Value>> {
    state.settings.save_config(&kind, entries).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Configuración guardada"
    })))
}
