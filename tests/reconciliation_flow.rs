//! Flujo completo de reconciliación sobre un exporte realista
//!
//! Exporte -> normalizador -> sanitizador -> agregación / auditoría /
//! matching, sin pasar por HTTP ni por el proveedor GPS real.

use fleet_fuel_backend::models::audit::Classification;
use fleet_fuel_backend::models::gps::GpsAsset;
use fleet_fuel_backend::services::{aggregation, continuity, matching, normalizer, sanitizer};

const EXPORT: &str = "\
FECHA,HORA,UNIDAD,PATENTE,CONDUCTOR,LITROS,IMPORTE,ODÓMETRO ANTERIOR,ÚLTIMO ODÓMETRO,ESTACION
02/01/2024,07:15:00,MOVIL 25,AA-472 RQ,PEREZ,\"40,0\",\"48.000,00\",\"76,6\",\"77,0\",YPF RUTA 3
10/01/2024,08:00:00,MOVIL 25,AA-472 RQ,PEREZ,\"55,5\",\"66.600,00\",77002,77410,YPF RUTA 3
20/01/2024,09:30:00,MOVIL 25,AA-472 RQ,GOMEZ,\"48,0\",\"57.600,00\",77910,78300,SHELL CENTRO
03/01/2024,10:00:00,31,BB-910 XC,LOPEZ,\"60,0\",\"72.000,00\",120500,121000,YPF RUTA 3
15/01/2024,11:00:00,31,BB-910 XC,LOPEZ,\"60,0\",\"72.000,00\",121000,121400,YPF RUTA 3
16/01/2024,12:00:00,31,BB-910 XC,LOPEZ,\"-60,0\",\"-72.000,00\",0,0,ANULACION
";

fn canonical() -> Vec<fleet_fuel_backend::models::fuel_transaction::FuelTransaction> {
    let outcome =
        normalizer::normalize_csv(EXPORT.as_bytes(), &normalizer::NormalizerOptions::default())
            .unwrap();
    assert!(outcome.warnings.is_empty());
    sanitizer::sanitize(outcome.rows).records
}

#[test]
fn test_set_canonico_tras_normalizar_y_sanitizar() {
    let records = canonical();

    // La reversión de la unidad 31 cancela una de sus dos cargas de 60 L
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.liters > 0.0));

    // El odómetro "76,6" del exporte quedó re-escalado a 76600
    let first = records
        .iter()
        .find(|r| r.vehicle_id == "MOVIL 25" && r.odometer_start == 76600)
        .unwrap();
    assert_eq!(first.odometer_end, 77000);
    assert_eq!(first.trip_distance, 400);
}

#[test]
fn test_agregados_del_flujo() {
    let records = canonical();
    let kpis = aggregation::calculate_kpis(&records);

    let movil25 = kpis
        .top_consumers
        .iter()
        .find(|v| v.vehicle_id == "MOVIL 25")
        .unwrap();
    assert_eq!(movil25.total_liters, 143.5);
    assert_eq!(movil25.drivers.len(), 2);

    // 400 + 408 + 390, sin contar el salto 77410 -> 77910
    assert_eq!(movil25.total_distance, 1198);

    let rollup = aggregation::monthly_rollup(&records);
    assert_eq!(rollup.len(), 1);
    assert_eq!(rollup[0].full_name, "Enero 2024");
}

#[test]
fn test_auditoria_detecta_el_salto() {
    let records = canonical();
    let unit: Vec<_> = records
        .iter()
        .filter(|r| r.vehicle_id == "MOVIL 25")
        .cloned()
        .collect();

    let report = continuity::audit_vehicle("MOVIL 25", unit);

    assert_eq!(report.rows[0].classification, Classification::Ok);
    // 77000 -> 77002 dentro de tolerancia
    assert_eq!(report.rows[1].classification, Classification::Ok);
    // 77410 -> 77910: 500 km fuera de sistema
    assert_eq!(report.rows[2].classification, Classification::ContinuityJump);
    assert_eq!(report.rows[2].gap_km, 500);
    assert_eq!(report.off_system_km, 500);
    assert_eq!(report.incident_count, 1);
}

#[test]
fn test_matching_contra_activos_gps() {
    let records = canonical();
    let assets = vec![
        GpsAsset {
            id: "7".to_string(),
            name: "SCANIA ROJO".to_string(),
            plate: "aa472rq".to_string(),
        },
        GpsAsset {
            id: "9".to_string(),
            name: "MOVIL 31 MERCEDES".to_string(),
            plate: "ZZ000ZZ".to_string(),
        },
    ];

    let (matched, range) = matching::match_fleet(&records, &assets);

    let movil25 = matched.iter().find(|m| m.vehicle_id == "MOVIL 25").unwrap();
    assert_eq!(movil25.gps_asset.as_ref().unwrap().id, "7");

    // "31" matchea por contención en el alias "MOVIL 31 MERCEDES"
    let unidad31 = matched.iter().find(|m| m.vehicle_id == "31").unwrap();
    assert_eq!(unidad31.gps_asset.as_ref().unwrap().id, "9");

    assert!(range[0] < range[1]);
}
