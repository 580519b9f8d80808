//! Modelos del proveedor GPS y del cruce flota-GPS
//!
//! El proveedor es de solo lectura para el sistema: consumimos su lista de
//! activos y su distancia histórica tal como la reporta.

use serde::{Deserialize, Serialize};

/// Activo (vehículo) registrado en el proveedor GPS externo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsAsset {
    pub id: String,
    /// Alias visual en la plataforma GPS
    pub name: String,
    pub plate: String,
}

/// Historial GPS de un activo sobre un rango de fechas
#[derive(Debug, Clone, Serialize)]
pub struct GpsHistory {
    pub total_distance_km: f64,
    /// Puntos [lat, lng] de la ruta
    pub points: Vec<[f64; 2]>,
}

/// Vínculo de una unidad interna con a lo sumo un activo GPS
#[derive(Debug, Clone, Serialize)]
pub struct MatchedVehicle {
    pub vehicle_id: String,
    pub plate: String,
    pub total_liters: f64,
    pub total_cost: f64,
    /// `None` cuando ninguna regla de matching encontró un activo
    pub gps_asset: Option<GpsAsset>,
}

/// Indicador de rendimiento real combustible-vs-GPS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyFlag {
    Normal,
    /// Rendimiento < 4 km/L: posible fuga o sustracción de combustible
    PossibleLeak,
    /// Rendimiento > 18 km/L: posible carga fuera de sistema
    PossibleOffSystemRefuel,
}

/// Resultado del cruce para una unidad (éxito o falla aislada)
#[derive(Debug, Clone, Serialize)]
pub struct VehicleComparison {
    #[serde(flatten)]
    pub matched: MatchedVehicle,
    /// Distancia reportada por el proveedor GPS en el rango de fechas
    pub gps_distance_km: f64,
    /// `gps_distance_km / total_liters`; None si no hubo litros o no hay GPS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_efficiency: Option<f64>,
    pub flag: EfficiencyFlag,
    /// Falla del proveedor para esta unidad; no aborta el lote completo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reporte completo del cruce flota-GPS
#[derive(Debug, Clone, Serialize)]
pub struct GpsComparisonReport {
    pub vehicles: Vec<VehicleComparison>,
    /// Rango [min, max] de timestamps cubierto por las transacciones
    pub date_range: [i64; 2],
}
