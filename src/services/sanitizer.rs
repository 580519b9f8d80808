//! Sanitizador del set de transacciones
//!
//! Deja el exporte normalizado en su forma canónica: sin filas de litros
//! cero, sin duplicados exactos y sin pares reversión/carga-original.
//! Es idempotente: sanitizar un set ya canónico no elimina nada más.

use std::collections::HashSet;

use crate::models::fuel_transaction::FuelTransaction;

/// Tolerancia decimal al aparear una reversión con su carga original
const REVERSAL_LITERS_TOLERANCE: f64 = 0.1;

/// Resultado de la sanitización, con conteos para diagnóstico
#[derive(Debug)]
pub struct SanitizeOutcome {
    pub records: Vec<FuelTransaction>,
    pub zero_liter_rows: usize,
    pub duplicate_rows: usize,
    pub reversal_rows: usize,
}

/// Sanitizar el set completo. Orden de pasadas:
/// 1. descartar litros == 0
/// 2. descartar duplicados exactos (firma timestamp+unidad+litros+odómetro)
/// 3. eliminar pares de reversión (negativo + su positivo de igual magnitud)
/// 4. ordenar por odómetro físico, con fallback cronológico
pub fn sanitize(rows: Vec<FuelTransaction>) -> SanitizeOutcome {
    let before = rows.len();

    // Quitar filas vacías o litros 0
    let rows: Vec<FuelTransaction> = rows.into_iter().filter(|r| r.liters != 0.0).collect();
    let zero_liter_rows = before - rows.len();

    // Duplicados exactos: sobrevive la primera ocurrencia de cada firma
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(row.signature()) {
            deduped.push(row);
        }
    }
    let duplicate_rows = before - zero_liter_rows - deduped.len();

    // Reversiones: la fila negativa se borra siempre; si existe una positiva
    // de la misma unidad con igual magnitud, se borra también (la anulación
    // cancela la carga original)
    let mut to_delete: HashSet<usize> = HashSet::new();
    for i in 0..deduped.len() {
        if deduped[i].liters >= 0.0 {
            continue;
        }
        to_delete.insert(i);

        let magnitude = deduped[i].liters.abs();
        let partner = deduped.iter().enumerate().find(|(j, r)| {
            !to_delete.contains(j)
                && r.vehicle_id == deduped[i].vehicle_id
                && r.liters > 0.0
                && (r.liters - magnitude).abs() < REVERSAL_LITERS_TOLERANCE
        });

        match partner {
            Some((j, _)) => {
                to_delete.insert(j);
            }
            None => {
                // Reversión huérfana: se descarta igual, pero queda registro
                log::warn!(
                    "⚠️ Reversión sin carga original: unidad '{}', {} litros, fila descartada",
                    deduped[i].vehicle_id,
                    deduped[i].liters
                );
            }
        }
    }

    let reversal_rows = to_delete.len();
    let mut records: Vec<FuelTransaction> = deduped
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !to_delete.contains(i))
        .map(|(_, r)| r)
        .collect();

    // Orden por odómetro físico por defecto, cronológico si falta. La clave
    // (odómetro, timestamp) da un orden total: las filas sin odómetro van
    // primero entre sí en orden cronológico, el resto por odómetro.
    records.sort_by_key(|r| (r.odometer_start.max(0), r.timestamp));

    log::info!(
        "🧹 Sanitización: {} canónicas ({} litros-cero, {} duplicadas, {} por reversión)",
        records.len(),
        zero_liter_rows,
        duplicate_rows,
        reversal_rows
    );

    SanitizeOutcome {
        records,
        zero_liter_rows,
        duplicate_rows,
        reversal_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(vehicle: &str, liters: f64, timestamp: i64, odo_start: i64) -> FuelTransaction {
        FuelTransaction {
            vehicle_id: vehicle.to_string(),
            timestamp,
            date: String::new(),
            time: String::new(),
            plate: String::new(),
            brand: String::new(),
            model: String::new(),
            driver: String::new(),
            transaction_type: String::new(),
            liters,
            cost: 0.0,
            station: String::new(),
            address: String::new(),
            city: String::new(),
            odometer_start: odo_start,
            odometer_end: 0,
            trip_distance: 0,
        }
    }

    #[test]
    fn test_descarta_litros_cero() {
        let outcome = sanitize(vec![tx("A", 0.0, 1, 0), tx("A", 50.0, 2, 0)]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.zero_liter_rows, 1);
    }

    #[test]
    fn test_duplicados_exactos_sobrevive_el_primero() {
        let outcome = sanitize(vec![
            tx("A", 50.0, 100, 1000),
            tx("A", 50.0, 100, 1000),
            tx("A", 50.0, 200, 1100),
        ]);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.duplicate_rows, 1);
    }

    #[test]
    fn test_reversion_elimina_el_par_completo() {
        let outcome = sanitize(vec![tx("A", 100.0, 1, 0), tx("A", -100.0, 2, 0)]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.reversal_rows, 2);
    }

    #[test]
    fn test_reversion_con_tolerancia_decimal() {
        let outcome = sanitize(vec![tx("A", 100.05, 1, 0), tx("A", -100.0, 2, 0)]);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_reversion_de_otra_unidad_no_apaga_la_positiva() {
        let outcome = sanitize(vec![tx("A", 100.0, 1, 0), tx("B", -100.0, 2, 0)]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].vehicle_id, "A");
        assert_eq!(outcome.reversal_rows, 1);
    }

    #[test]
    fn test_orden_por_odometro_con_fallback_cronologico() {
        let outcome = sanitize(vec![
            tx("A", 10.0, 300, 2000),
            tx("A", 10.0, 100, 1000),
            tx("A", 20.0, 200, 0),
        ]);
        // Con odómetro en 0 la comparación cae al timestamp
        let starts: Vec<i64> = outcome.records.iter().map(|r| r.odometer_start).collect();
        assert_eq!(starts.len(), 3);
        assert!(starts.windows(2).all(|w| {
            w[0] <= w[1] || w[0] == 0 || w[1] == 0
        }));
    }

    #[test]
    fn test_orden_total_con_mezcla_grande_de_odometros() {
        // Lote grande alternando filas con y sin odómetro
        let mut rows = Vec::new();
        for i in 0..300i64 {
            rows.push(tx("A", 10.0, 1000 - i, 0));
            rows.push(tx("A", 10.0, i, 5000 + (300 - i)));
        }

        let outcome = sanitize(rows);
        assert_eq!(outcome.records.len(), 600);

        let keys: Vec<(i64, i64)> = outcome
            .records
            .iter()
            .map(|r| (r.odometer_start, r.timestamp))
            .collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        // Las filas sin odómetro quedan primero
        assert_eq!(outcome.records[0].odometer_start, 0);
        assert!(outcome.records[599].odometer_start > 0);
    }

    #[test]
    fn test_idempotencia() {
        let outcome = sanitize(vec![
            tx("A", 100.0, 1, 1000),
            tx("A", -100.0, 2, 0),
            tx("B", 40.0, 3, 500),
            tx("B", 40.0, 3, 500),
        ]);
        let first_pass = outcome.records.clone();
        let second = sanitize(first_pass.clone());
        assert_eq!(second.records.len(), first_pass.len());
        assert_eq!(second.zero_liter_rows, 0);
        assert_eq!(second.duplicate_rows, 0);
        assert_eq!(second.reversal_rows, 0);
    }
}
