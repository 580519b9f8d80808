//! Modelo de FuelTransaction
//!
//! Este módulo contiene el registro canónico de una carga de combustible
//! (una fila del exporte CSV que sobrevive la sanitización) y los agregados
//! derivados que consume el dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conductor sin asignar en el exporte
pub const UNASSIGNED_DRIVER: &str = "Sin Asignar";
/// Estación externa (carga fuera de estaciones propias)
pub const EXTERNAL_STATION: &str = "Externo";
/// Unidad desconocida
pub const UNKNOWN_VEHICLE: &str = "Desconocido";
/// Tipo de transacción cuando el exporte no trae la columna
pub const CONSUMPTION_TRANSACTION: &str = "CONSUMO";

/// Registro canónico de una carga de combustible.
///
/// Inmutable una vez creado; solo se elimina junto con su lote de origen.
/// `liters` puede ser negativo únicamente antes de pasar por el sanitizador
/// (una reversión); en el set canónico siempre es > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelTransaction {
    pub vehicle_id: String,
    /// Instante combinado fecha+hora en milisegundos epoch; 0 si no parseable
    pub timestamp: i64,
    /// Fecha y hora originales del exporte, para mostrar en la UI
    pub date: String,
    pub time: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub driver: String,
    /// Tipo declarado en el exporte ("CONSUMO", "REVERSION", ...)
    pub transaction_type: String,
    pub liters: f64,
    pub cost: f64,
    pub station: String,
    pub address: String,
    pub city: String,
    /// Odómetro al inicio de la carga; 0 significa "desconocido"
    pub odometer_start: i64,
    /// Odómetro al final de la carga; 0 significa "desconocido"
    pub odometer_end: i64,
    /// Distancia del tramo: `odometer_end - odometer_start` cuando ambos son
    /// válidos y el final supera al inicio; si no, 0. Nunca negativa.
    pub trip_distance: i64,
}

impl FuelTransaction {
    /// Firma para detección de duplicados exactos
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{:.3}|{}",
            self.timestamp, self.vehicle_id, self.liters, self.odometer_start
        )
    }

    /// Una fila es reversión si trae litros negativos o si el exporte la
    /// declara como tal en la columna de tipo
    pub fn is_reversal(&self) -> bool {
        self.liters < 0.0 || self.transaction_type.to_uppercase().contains("REVERSI")
    }
}

/// Metadatos de un lote de carga (un archivo subido)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBatch {
    pub id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub record_count: usize,
}

/// Agregado por vehículo - derivado, nunca persistido.
///
/// `total_distance` es la suma de `trip_distance` por fila. Los saltos de
/// odómetro entre filas NO se suman acá: los reporta el auditor de
/// continuidad como km fuera de sistema.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleAggregate {
    pub vehicle_id: String,
    pub total_liters: f64,
    pub total_cost: f64,
    pub total_distance: i64,
    pub brand: String,
    pub model: String,
    pub drivers: Vec<String>,
}

/// Consumo agrupado por mes calendario
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRollup {
    /// Abreviatura del mes ("Ene".."Dic")
    pub name: String,
    /// Nombre completo con año ("Enero 2024")
    pub full_name: String,
    pub year: i32,
    pub liters: i64,
    pub cost: i64,
}

/// KPIs de flota para el dashboard
#[derive(Debug, Clone, Serialize)]
pub struct FleetKpis {
    pub total_liters: f64,
    pub total_cost: f64,
    pub top_consumers: Vec<VehicleAggregate>,
}
