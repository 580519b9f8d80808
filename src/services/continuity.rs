//! Auditor de continuidad de odómetros
//!
//! Recorre las transacciones de UNA unidad en orden cronológico y clasifica
//! cada una contra su predecesora inmediata: continuidad normal, retroceso
//! de odómetro, salto sin explicar, o anomalía de distancia/rendimiento.
//! No hay estado más allá de la transacción anterior; las anomalías son el
//! producto del auditor, nunca errores.

use crate::models::audit::{AuditReport, AuditedTransaction, Classification};
use crate::models::fuel_transaction::FuelTransaction;

/// Tolerancia de continuidad entre cierre anterior e inicio actual, en km
/// (movimientos internos en playa no cuentan como salto)
pub const CONTINUITY_TOLERANCE_KM: i64 = 5;

/// Tramo máximo plausible entre dos cargas consecutivas
pub const MAX_TRIP_KM: i64 = 1000;

/// Rendimiento máximo plausible; por encima sugiere una carga intermedia
/// hecha fuera del sistema
pub const MAX_PLAUSIBLE_EFFICIENCY: f64 = 18.0;

/// Auditar la secuencia de transacciones de una unidad (en cualquier orden)
pub fn audit_vehicle(vehicle_id: &str, mut transactions: Vec<FuelTransaction>) -> AuditReport {
    transactions.sort_by_key(|t| t.timestamp);

    let mut rows: Vec<AuditedTransaction> = Vec::with_capacity(transactions.len());
    let mut off_system_km = 0i64;
    let mut incident_count = 0usize;

    for (i, current) in transactions.iter().enumerate() {
        let annotated = if i == 0 {
            // La primera no tiene contra qué comparar
            AuditedTransaction {
                transaction: current.clone(),
                classification: Classification::Ok,
                reason: "Continuo".to_string(),
                prev_odometer_end: 0,
                gap_km: 0,
                implied_efficiency: None,
            }
        } else {
            classify(current, &transactions[i - 1])
        };

        match annotated.classification {
            Classification::Ok => {}
            Classification::ContinuityJump => {
                off_system_km += annotated.gap_km;
                incident_count += 1;
            }
            _ => incident_count += 1,
        }
        rows.push(annotated);
    }

    log::info!(
        "🔍 Auditoría de '{}': {} registros, {} incidentes, {} km fuera de sistema",
        vehicle_id,
        rows.len(),
        incident_count,
        off_system_km
    );

    AuditReport {
        vehicle_id: vehicle_id.to_string(),
        rows,
        off_system_km,
        incident_count,
        record_count: transactions.len(),
    }
}

fn classify(current: &FuelTransaction, previous: &FuelTransaction) -> AuditedTransaction {
    let prev_end = previous.odometer_end;
    let cur_start = current.odometer_start;

    // Chequeo de continuidad: solo con ambos odómetros válidos
    if prev_end > 0 && cur_start > 0 {
        let diff = cur_start - prev_end;
        if diff.abs() > CONTINUITY_TOLERANCE_KM {
            return if diff < 0 {
                // El odómetro es monótono no decreciente en el tiempo:
                // un retroceso es una imposibilidad cronológica
                AuditedTransaction {
                    transaction: current.clone(),
                    classification: Classification::ContinuityRegression,
                    reason: format!(
                        "El odómetro retrocedió {} km respecto del cierre anterior ({})",
                        -diff, prev_end
                    ),
                    prev_odometer_end: prev_end,
                    gap_km: diff,
                    implied_efficiency: None,
                }
            } else {
                AuditedTransaction {
                    transaction: current.clone(),
                    classification: Classification::ContinuityJump,
                    reason: format!(
                        "Salto de {} km sin explicar: posible carga fuera de sistema",
                        diff
                    ),
                    prev_odometer_end: prev_end,
                    gap_km: diff,
                    implied_efficiency: None,
                }
            };
        }
    }

    // Sin salto de continuidad: outliers de la propia transacción
    if current.trip_distance > MAX_TRIP_KM {
        return AuditedTransaction {
            transaction: current.clone(),
            classification: Classification::DistanceAnomaly,
            reason: format!(
                "Tramo de {} km entre cargas consecutivas (máximo plausible {})",
                current.trip_distance, MAX_TRIP_KM
            ),
            prev_odometer_end: prev_end,
            gap_km: 0,
            implied_efficiency: None,
        };
    }

    // Rendimiento implícito de la carga ANTERIOR: el tramo actual se hizo
    // con los litros cargados la vez pasada
    if previous.liters > 0.0 {
        let efficiency = current.trip_distance as f64 / previous.liters;
        if efficiency > MAX_PLAUSIBLE_EFFICIENCY {
            return AuditedTransaction {
                transaction: current.clone(),
                classification: Classification::DistanceAnomaly,
                reason: format!(
                    "Rendimiento implícito de {:.1} km/L (límite {}): sugiere carga intermedia fuera de sistema",
                    efficiency, MAX_PLAUSIBLE_EFFICIENCY
                ),
                prev_odometer_end: prev_end,
                gap_km: 0,
                implied_efficiency: Some(efficiency),
            };
        }

        return AuditedTransaction {
            transaction: current.clone(),
            classification: Classification::Ok,
            reason: "Continuo".to_string(),
            prev_odometer_end: prev_end,
            gap_km: 0,
            implied_efficiency: Some(efficiency),
        };
    }

    AuditedTransaction {
        transaction: current.clone(),
        classification: Classification::Ok,
        reason: "Continuo".to_string(),
        prev_odometer_end: prev_end,
        gap_km: 0,
        implied_efficiency: None,
    }
}
