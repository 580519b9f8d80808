//! Cliente HTTP para el proveedor GPS externo
//!
//! El proveedor expone una única URL JSON con acciones POST
//! (`GETVEHICULOS`, `DATOSHISTORICOS`). Es lento y poco confiable, así que
//! cada request lleva timeout explícito y reintentos con backoff
//! exponencial. El esquema de respuesta varía entre instalaciones: todo el
//! adivinado de formas vive en los decoders de este módulo, con una cadena
//! de fallbacks explícita; una forma desconocida es un error, nunca datos
//! vacíos.

use anyhow::Result;
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::gps::{GpsAsset, GpsHistory};
use crate::utils::errors::{AppError, AppResult};

/// Reintentos por request contra el proveedor
const MAX_ATTEMPTS: u32 = 3;
/// Backoff base entre reintentos (se duplica por intento)
const RETRY_BACKOFF_MS: u64 = 500;

pub struct GpsProviderClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl GpsProviderClient {
    /// Crear el cliente con timeout explícito
    pub fn new(base_url: String, user: String, password: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            user,
            password,
        })
    }

    /// Listar los activos (vehículos) registrados en el proveedor
    pub async fn list_assets(&self) -> AppResult<Vec<GpsAsset>> {
        let body = json!({
            "user": self.user,
            "pwd": self.password,
            "action": "GETVEHICULOS",
        });

        let payload = self.post_with_retry(&body).await?;
        decode_assets(&payload)
    }

    /// Historial de un activo por patente sobre un rango de fechas.
    /// El rango se ensancha al día completo (00:00:00 a 23:59:59).
    pub async fn get_history(
        &self,
        plate: &str,
        from_millis: i64,
        to_millis: i64,
    ) -> AppResult<GpsHistory> {
        let body = json!({
            "user": self.user,
            "pwd": self.password,
            "action": "DATOSHISTORICOS",
            "vehiculo": plate,
            "tipoID": "patente",
            "desde": format_day_start(from_millis),
            "hasta": format_day_end(to_millis),
        });

        log::info!("📡 Pidiendo historial GPS para patente '{}'", plate);
        let payload = self.post_with_retry(&body).await?;
        decode_history(&payload)
    }

    /// POST con reintentos y backoff exponencial; el último error gana
    async fn post_with_retry(&self, body: &Value) -> AppResult<Value> {
        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = RETRY_BACKOFF_MS * (1u64 << (attempt - 1));
                log::warn!(
                    "🔁 Reintento {}/{} contra el proveedor GPS en {} ms",
                    attempt + 1,
                    MAX_ATTEMPTS,
                    backoff
                );
                tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
            }

            let response = match self
                .client
                .post(&self.base_url)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = format!("Error de red: {}", e);
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                last_error = format!("Error HTTP: {}", status);
                continue;
            }

            // A veces devuelven HTML ante errores internos
            let text = match response.text().await {
                Ok(t) => t,
                Err(e) => {
                    last_error = format!("Error leyendo respuesta: {}", e);
                    continue;
                }
            };

            match serde_json::from_str::<Value>(&text) {
                Ok(value) => return Ok(value),
                Err(_) => {
                    last_error = "Respuesta no válida del servidor GPS (no es JSON)".to_string();
                    continue;
                }
            }
        }

        Err(AppError::ServiceUnavailable(format!(
            "Proveedor GPS inaccesible tras {} intentos: {}",
            MAX_ATTEMPTS, last_error
        )))
    }
}

/// "YYYY-MM-DD 00:00:00" del día del instante
fn format_day_start(millis: i64) -> String {
    let date = chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .date_naive();
    format!("{} 00:00:00", date.format("%Y-%m-%d"))
}

/// "YYYY-MM-DD 23:59:59" del día del instante
fn format_day_end(millis: i64) -> String {
    let date = chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .date_naive();
    format!("{} 23:59:59", date.format("%Y-%m-%d"))
}

/// Decodificar la lista de activos: la API la devuelve bajo 'unidades'
/// con campos `id_gps` / `alias` / `patente`
pub fn decode_assets(payload: &Value) -> AppResult<Vec<GpsAsset>> {
    let raw_assets = payload
        .get("unidades")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AppError::ExternalApi(
                "Respuesta de GETVEHICULOS sin la propiedad 'unidades'".to_string(),
            )
        })?;

    Ok(raw_assets
        .iter()
        .map(|asset| GpsAsset {
            id: value_to_string(asset.get("id_gps")),
            name: value_to_string(asset.get("alias")),
            plate: value_to_string(asset.get("patente")),
        })
        .collect())
}

/// Decodificar un historial. Cadena de fallbacks, en orden:
/// - filas bajo `result`, `datos`, `filas`, o el payload mismo como array
/// - distancia desde `resumen.distancia`, si no `distancia_acumulada` o
///   `distancia` de la última fila, si no delta de `odometro` última-primera
/// - puntos desde `lat`/`lon` o `y`/`x`
pub fn decode_history(payload: &Value) -> AppResult<GpsHistory> {
    let rows = history_rows(payload).ok_or_else(|| {
        AppError::ExternalApi("Forma desconocida de respuesta de DATOSHISTORICOS".to_string())
    })?;

    let mut total_distance = 0.0;

    if !rows.is_empty() {
        if let Some(d) = payload
            .get("resumen")
            .and_then(|r| r.get("distancia"))
            .and_then(value_to_f64)
        {
            total_distance = d;
        } else {
            let last = &rows[rows.len() - 1];
            if let Some(d) = last.get("distancia_acumulada").and_then(value_to_f64) {
                total_distance = d;
            } else if let Some(d) = last.get("distancia").and_then(value_to_f64) {
                total_distance = d;
            } else if let (Some(last_odo), Some(first_odo)) = (
                last.get("odometro").and_then(value_to_f64),
                rows[0].get("odometro").and_then(value_to_f64),
            ) {
                total_distance = last_odo - first_odo;
            }
        }
    }

    let points: Vec<[f64; 2]> = rows
        .iter()
        .filter_map(|p| {
            let lat = p.get("lat").or_else(|| p.get("y")).and_then(value_to_f64)?;
            let lng = p.get("lon").or_else(|| p.get("x")).and_then(value_to_f64)?;
            Some([lat, lng])
        })
        .collect();

    Ok(GpsHistory {
        // Evitar distancias negativas del proveedor
        total_distance_km: total_distance.max(0.0),
        points,
    })
}

fn history_rows(payload: &Value) -> Option<&Vec<Value>> {
    payload
        .get("result")
        .and_then(Value::as_array)
        .or_else(|| payload.get("datos").and_then(Value::as_array))
        .or_else(|| payload.get("filas").and_then(Value::as_array))
        .or_else(|| payload.as_array())
}

/// El proveedor mezcla números y strings numéricos según la instalación
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
