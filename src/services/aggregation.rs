//! Motor de agregación y distancias
//!
//! Funciones puras sobre el set canónico: totales por unidad, KPIs de flota
//! y consumo mensual. Se recalculan en cada lectura, no persisten nada.
//!
//! La distancia total por unidad es la SUMA de `trip_distance` por fila.
//! Los saltos de odómetro entre filas quedan afuera a propósito: esos km
//! los reporta el auditor de continuidad como "fuera de sistema".

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike};

use crate::models::fuel_transaction::{
    FleetKpis, FuelTransaction, MonthlyRollup, VehicleAggregate, UNASSIGNED_DRIVER,
};

/// Cantidad máxima de períodos en el rollup mensual
const MONTHLY_ROLLUP_CAP: usize = 12;

const MONTH_SHORT: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
const MONTH_FULL: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Totales por unidad: litros, costo, distancia y conductores observados
pub fn aggregate_by_vehicle(records: &[FuelTransaction]) -> Vec<VehicleAggregate> {
    let mut by_vehicle: HashMap<&str, VehicleAggregate> = HashMap::new();

    for record in records {
        let entry = by_vehicle
            .entry(record.vehicle_id.as_str())
            .or_insert_with(|| VehicleAggregate {
                vehicle_id: record.vehicle_id.clone(),
                total_liters: 0.0,
                total_cost: 0.0,
                total_distance: 0,
                brand: record.brand.clone(),
                model: record.model.clone(),
                drivers: Vec::new(),
            });

        entry.total_liters += record.liters;
        entry.total_cost += record.cost;
        entry.total_distance += record.trip_distance;

        let driver = record.driver.trim();
        if !driver.is_empty() && driver != UNASSIGNED_DRIVER && !entry.drivers.iter().any(|d| d == driver)
        {
            entry.drivers.push(driver.to_string());
        }
    }

    let mut aggregates: Vec<VehicleAggregate> = by_vehicle.into_values().collect();
    aggregates.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
    aggregates
}

/// KPIs de flota: totales globales y ranking de mayores consumidores
pub fn calculate_kpis(records: &[FuelTransaction]) -> FleetKpis {
    let total_liters = records.iter().map(|r| r.liters).sum();
    let total_cost = records.iter().map(|r| r.cost).sum();

    let mut top_consumers = aggregate_by_vehicle(records);
    top_consumers.sort_by(|a, b| {
        b.total_liters
            .partial_cmp(&a.total_liters)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    FleetKpis {
        total_liters,
        total_cost,
        top_consumers,
    }
}

/// Consumo agrupado por (año, mes), cronológico, últimos 12 períodos.
/// Litros y costo van redondeados a entero como espera el gráfico.
pub fn monthly_rollup(records: &[FuelTransaction]) -> Vec<MonthlyRollup> {
    // BTreeMap sobre (año, mes) deja el resultado ya ordenado
    let mut grouped: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();

    for record in records {
        // Sin timestamp no hay período al que imputar la fila
        let Some(date) = DateTime::from_timestamp_millis(record.timestamp).filter(|_| record.timestamp != 0)
        else {
            continue;
        };
        let key = (date.year(), date.month0());
        let entry = grouped.entry(key).or_insert((0.0, 0.0));
        entry.0 += record.liters;
        entry.1 += record.cost;
    }

    let rollup: Vec<MonthlyRollup> = grouped
        .into_iter()
        .map(|((year, month0), (liters, cost))| MonthlyRollup {
            name: MONTH_SHORT[month0 as usize].to_string(),
            full_name: format!("{} {}", MONTH_FULL[month0 as usize], year),
            year,
            liters: liters.round() as i64,
            cost: cost.round() as i64,
        })
        .collect();

    let skip = rollup.len().saturating_sub(MONTHLY_ROLLUP_CAP);
    rollup.into_iter().skip(skip).collect()
}

/// Unidades distintas presentes en el set, ordenadas
pub fn distinct_vehicles(records: &[FuelTransaction]) -> Vec<String> {
    let mut vehicles: Vec<String> = records.iter().map(|r| r.vehicle_id.clone()).collect();
    vehicles.sort();
    vehicles.dedup();
    vehicles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(vehicle: &str, liters: f64, cost: f64, distance: i64, driver: &str, ts: i64) -> FuelTransaction {
        FuelTransaction {
            vehicle_id: vehicle.to_string(),
            timestamp: ts,
            date: String::new(),
            time: String::new(),
            plate: String::new(),
            brand: String::new(),
            model: String::new(),
            driver: driver.to_string(),
            transaction_type: String::new(),
            liters,
            cost,
            station: String::new(),
            address: String::new(),
            city: String::new(),
            odometer_start: 0,
            odometer_end: 0,
            trip_distance: distance,
        }
    }

    fn millis(year: i32, month: u32, day: u32) -> i64 {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_totales_por_unidad() {
        let records = vec![
            tx("A", 40.0, 4000.0, 100, "PEREZ", 1),
            tx("A", 60.0, 6000.0, 150, "GOMEZ", 2),
            tx("B", 10.0, 1000.0, 30, UNASSIGNED_DRIVER, 3),
        ];
        let aggregates = aggregate_by_vehicle(&records);

        assert_eq!(aggregates.len(), 2);
        let a = aggregates.iter().find(|v| v.vehicle_id == "A").unwrap();
        assert_eq!(a.total_liters, 100.0);
        assert_eq!(a.total_cost, 10000.0);
        assert_eq!(a.total_distance, 250);
        assert_eq!(a.drivers.len(), 2);

        // "Sin Asignar" no cuenta como conductor observado
        let b = aggregates.iter().find(|v| v.vehicle_id == "B").unwrap();
        assert!(b.drivers.is_empty());
    }

    #[test]
    fn test_ranking_de_consumidores() {
        let records = vec![
            tx("A", 40.0, 0.0, 0, "", 1),
            tx("B", 90.0, 0.0, 0, "", 2),
            tx("A", 20.0, 0.0, 0, "", 3),
        ];
        let kpis = calculate_kpis(&records);

        assert_eq!(kpis.total_liters, 150.0);
        assert_eq!(kpis.top_consumers[0].vehicle_id, "B");
        assert_eq!(kpis.top_consumers[1].vehicle_id, "A");
        assert_eq!(kpis.top_consumers[1].total_liters, 60.0);
    }

    #[test]
    fn test_rollup_mensual_ordenado_y_redondeado() {
        let records = vec![
            tx("A", 40.6, 4000.4, 0, "", millis(2024, 2, 10)),
            tx("A", 10.0, 1000.0, 0, "", millis(2024, 1, 5)),
            tx("A", 5.0, 500.0, 0, "", millis(2024, 2, 20)),
        ];
        let rollup = monthly_rollup(&records);

        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].name, "Ene");
        assert_eq!(rollup[1].full_name, "Febrero 2024");
        assert_eq!(rollup[1].liters, 46);
        assert_eq!(rollup[1].cost, 4500);
    }

    #[test]
    fn test_rollup_mensual_limite_de_doce_periodos() {
        let mut records = Vec::new();
        for m in 1..=12 {
            records.push(tx("A", 10.0, 0.0, 0, "", millis(2023, m, 1)));
        }
        for m in 1..=3 {
            records.push(tx("A", 10.0, 0.0, 0, "", millis(2024, m, 1)));
        }
        let rollup = monthly_rollup(&records);

        assert_eq!(rollup.len(), 12);
        // Se quedan los 12 más recientes: Abr 2023 .. Mar 2024
        assert_eq!(rollup[0].full_name, "Abril 2023");
        assert_eq!(rollup[11].full_name, "Marzo 2024");
    }

    #[test]
    fn test_rollup_ignora_timestamp_cero() {
        let records = vec![tx("A", 10.0, 0.0, 0, "", 0)];
        assert!(monthly_rollup(&records).is_empty());
    }

    #[test]
    fn test_unidades_distintas() {
        let records = vec![
            tx("B", 1.0, 0.0, 0, "", 1),
            tx("A", 1.0, 0.0, 0, "", 2),
            tx("B", 1.0, 0.0, 0, "", 3),
        ];
        assert_eq!(distinct_vehicles(&records), vec!["A", "B"]);
    }
}
