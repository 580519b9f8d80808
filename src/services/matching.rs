//! Cruce flota-GPS
//!
//! Vincula cada unidad interna del exporte con a lo sumo un activo del
//! proveedor GPS (por patente normalizada, o por alias que contenga el
//! nombre de la unidad) y compara la distancia medida por satélite contra
//! los litros cargados para detectar fugas o cargas fuera de sistema.

use std::collections::BTreeMap;

use futures::future::join_all;

use crate::clients::GpsProviderClient;
use crate::models::fuel_transaction::FuelTransaction;
use crate::models::gps::{
    EfficiencyFlag, GpsAsset, GpsComparisonReport, MatchedVehicle, VehicleComparison,
};
use crate::services::continuity::MAX_PLAUSIBLE_EFFICIENCY;

/// Rendimiento real mínimo plausible; por debajo sugiere fuga o sustracción
pub const MIN_PLAUSIBLE_EFFICIENCY: f64 = 4.0;

/// Lote de requests concurrentes contra el proveedor
const HISTORY_BATCH_SIZE: usize = 5;

/// Quitar todo lo no alfanumérico y pasar a mayúsculas para comparar
/// patentes y alias
pub fn normalize_identity(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Resumen de combustible por unidad (litros, costo, patente)
struct VehicleSummary {
    plate: String,
    total_liters: f64,
    total_cost: f64,
}

/// Vincular cada unidad del set canónico con a lo sumo un activo GPS.
/// Devuelve además el rango [min, max] de timestamps del set, que se usa
/// para la consulta de historial posterior.
pub fn match_fleet(
    records: &[FuelTransaction],
    assets: &[GpsAsset],
) -> (Vec<MatchedVehicle>, [i64; 2]) {
    // BTreeMap para salida determinística por unidad
    let mut summary: BTreeMap<&str, VehicleSummary> = BTreeMap::new();
    for record in records {
        let entry = summary
            .entry(record.vehicle_id.as_str())
            .or_insert_with(|| VehicleSummary {
                plate: record.plate.clone(),
                total_liters: 0.0,
                total_cost: 0.0,
            });
        entry.total_liters += record.liters;
        entry.total_cost += record.cost;
    }

    let matched: Vec<MatchedVehicle> = summary
        .into_iter()
        .map(|(vehicle_id, info)| {
            let asset = find_asset(vehicle_id, &info.plate, assets);
            MatchedVehicle {
                vehicle_id: vehicle_id.to_string(),
                plate: info.plate,
                total_liters: info.total_liters,
                total_cost: info.total_cost,
                gps_asset: asset.cloned(),
            }
        })
        .collect();

    let mut timestamps = records.iter().map(|r| r.timestamp).filter(|t| *t > 0);
    let date_range = match timestamps.next() {
        Some(first) => {
            let (min, max) = timestamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
            [min, max]
        }
        None => [0, 0],
    };

    (matched, date_range)
}

/// Primera regla que acierta gana; el primer activo que matchea queda
/// vinculado (los empates no se desambiguan)
fn find_asset<'a>(vehicle_id: &str, plate: &str, assets: &'a [GpsAsset]) -> Option<&'a GpsAsset> {
    let fleet_plate = normalize_identity(plate);
    let fleet_unit = normalize_identity(vehicle_id);

    assets.iter().find(|asset| {
        let gps_plate = normalize_identity(&asset.plate);
        let gps_name = normalize_identity(&asset.name);

        // Coincidencia por patente: ambas con largo > 2 para no matchear
        // strings vacíos o triviales
        if gps_plate.len() > 2 && fleet_plate.len() > 2 && gps_plate == fleet_plate {
            return true;
        }
        // Coincidencia por alias: el nombre GPS contiene la unidad interna
        if !fleet_unit.is_empty() && gps_name.contains(&fleet_unit) {
            return true;
        }
        false
    })
}

/// Correr el cruce completo: matching + historial GPS por unidad vinculada.
///
/// Los lookups van en lotes concurrentes; la falla de una unidad queda
/// aislada en su propio resultado y no aborta el resto. Si el caller
/// abandona el request, soltar este future cancela los requests en vuelo.
pub async fn compare_with_gps(
    records: &[FuelTransaction],
    gps: &GpsProviderClient,
) -> Result<GpsComparisonReport, crate::utils::errors::AppError> {
    let assets = gps.list_assets().await?;
    log::info!("📡 Proveedor GPS reporta {} activos", assets.len());

    let (matched, date_range) = match_fleet(records, &assets);

    let mut vehicles: Vec<VehicleComparison> = Vec::with_capacity(matched.len());

    for chunk in matched.chunks(HISTORY_BATCH_SIZE) {
        let futures: Vec<_> = chunk
            .iter()
            .map(|m| compare_one(m.clone(), gps, date_range))
            .collect();
        vehicles.extend(join_all(futures).await);
    }

    let flagged = vehicles
        .iter()
        .filter(|v| v.flag != EfficiencyFlag::Normal)
        .count();
    log::info!(
        "✅ Cruce flota-GPS: {} unidades, {} con indicador de alerta",
        vehicles.len(),
        flagged
    );

    Ok(GpsComparisonReport {
        vehicles,
        date_range,
    })
}

async fn compare_one(
    matched: MatchedVehicle,
    gps: &GpsProviderClient,
    date_range: [i64; 2],
) -> VehicleComparison {
    let Some(asset) = matched.gps_asset.clone() else {
        return VehicleComparison {
            matched,
            gps_distance_km: 0.0,
            real_efficiency: None,
            flag: EfficiencyFlag::Normal,
            error: None,
        };
    };

    match gps.get_history(&asset.plate, date_range[0], date_range[1]).await {
        Ok(history) => {
            let real_efficiency = if matched.total_liters > 0.0 {
                Some(history.total_distance_km / matched.total_liters)
            } else {
                None
            };

            let flag = match real_efficiency {
                Some(e) if e < MIN_PLAUSIBLE_EFFICIENCY => EfficiencyFlag::PossibleLeak,
                Some(e) if e > MAX_PLAUSIBLE_EFFICIENCY => EfficiencyFlag::PossibleOffSystemRefuel,
                _ => EfficiencyFlag::Normal,
            };

            VehicleComparison {
                matched,
                gps_distance_km: history.total_distance_km,
                real_efficiency,
                flag,
                error: None,
            }
        }
        Err(e) => {
            log::error!(
                "❌ Historial GPS falló para unidad '{}': {}",
                matched.vehicle_id,
                e
            );
            VehicleComparison {
                matched,
                gps_distance_km: 0.0,
                real_efficiency: None,
                flag: EfficiencyFlag::Normal,
                error: Some(e.to_string()),
            }
        }
    }
}
