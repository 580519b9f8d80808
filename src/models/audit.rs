//! Modelos del reporte de auditoría de continuidad
//!
//! Cada transacción de la unidad auditada cae en exactamente una
//! clasificación, evaluada contra su predecesora cronológica inmediata.

use serde::{Deserialize, Serialize};

use super::fuel_transaction::FuelTransaction;

/// Clasificación de una transacción dentro de la secuencia cronológica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Continuidad normal con la transacción anterior
    Ok,
    /// El odómetro retrocedió respecto del cierre anterior (imposible)
    ContinuityRegression,
    /// Salto de odómetro sin explicar (posible carga fuera de sistema)
    ContinuityJump,
    /// Tramo o rendimiento implícito fuera de rango plausible
    DistanceAnomaly,
}

/// Transacción anotada por el auditor de continuidad
#[derive(Debug, Clone, Serialize)]
pub struct AuditedTransaction {
    #[serde(flatten)]
    pub transaction: FuelTransaction,
    pub classification: Classification,
    /// Explicación legible para la UI
    pub reason: String,
    /// Cierre de odómetro de la transacción anterior (0 si es la primera)
    pub prev_odometer_end: i64,
    /// Salto detectado en km (positivo solo para ContinuityJump)
    pub gap_km: i64,
    /// Rendimiento implícito `trip_distance / litros de la carga anterior`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_efficiency: Option<f64>,
}

/// Reporte de auditoría para una unidad
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub vehicle_id: String,
    pub rows: Vec<AuditedTransaction>,
    /// Suma de saltos positivos de odómetro (km recorridos fuera de sistema)
    pub off_system_km: i64,
    /// Cantidad de transacciones que no quedaron en Ok
    pub incident_count: usize,
    pub record_count: usize,
}
