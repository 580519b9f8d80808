//! Normalizador de campos del exporte CSV
//!
//! Los exportes llegan con encabezados en español con acentos y variantes
//! (LITROS / LITRO / CANTIDAD), números en formato argentino (1.250,50) y
//! fecha/hora separadas en DD/MM/YYYY + HH:MM:SS. Este módulo mapea cada
//! fila cruda a un `FuelTransaction` canónico, acumulando advertencias de
//! parseo en lugar de tragárselas en silencio.

use serde::Serialize;
use thiserror::Error;

use crate::models::fuel_transaction::{
    FuelTransaction, CONSUMPTION_TRANSACTION, EXTERNAL_STATION, UNASSIGNED_DRIVER, UNKNOWN_VEHICLE,
};

/// Alias aceptados por campo canónico, en orden de prioridad
const LITERS_ALIASES: &[&str] = &["LITROS", "LITRO", "CANTIDAD"];
const COST_ALIASES: &[&str] = &["M.N.", "M.N", "IMPORTE", "NETO"];
const ODOMETER_START_ALIASES: &[&str] = &["ODÓMETRO ANTERIOR", "ODOMETRO ANTERIOR"];
const ODOMETER_END_ALIASES: &[&str] = &["ÚLTIMO ODÓMETRO", "ULTIMO ODOMETRO"];
const DATE_ALIASES: &[&str] = &["FECHA", "DATE"];
const TIME_ALIASES: &[&str] = &["HORA", "TIME"];
const VEHICLE_ALIASES: &[&str] = &["UNIDAD", "MOVIL", "VEHICULO"];
const PLATE_ALIASES: &[&str] = &["PLACA", "PATENTE"];
const BRAND_ALIASES: &[&str] = &["MARCA"];
const MODEL_ALIASES: &[&str] = &["MODELO"];
const DRIVER_ALIASES: &[&str] = &["CONDUCTOR", "CHOFER"];
const TRANSACTION_TYPE_ALIASES: &[&str] = &["TRANSACCIÓN", "TRANSACCION", "TIPO"];
const STATION_ALIASES: &[&str] = &["ESTACION DE SERVICIO", "ESTACION", "LUGAR"];
const ADDRESS_ALIASES: &[&str] = &["DIRECCIÓN ESTACIÓN", "DIRECCION"];
const CITY_ALIASES: &[&str] = &["CIUDAD", "LOCALIDAD"];

/// Un odómetro parseado por debajo de este valor se asume mal escalado
/// (el exporte a veces trae "76,6" queriendo decir 76600)
const ODOMETER_RESCALE_CEILING: f64 = 10_000.0;

/// Error de parseo de un campo individual
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("valor numérico inválido: '{0}'")]
    InvalidNumber(String),
    #[error("fecha inválida: '{0}'")]
    InvalidDate(String),
}

/// Advertencia no fatal: un campo falló el parseo y cayó a su default.
///
/// Se devuelven junto con el lote normalizado para que el consumidor decida
/// si mostrarlas; nunca abortan la carga.
#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    /// Fila del exporte (1-based, sin contar el encabezado)
    pub row: usize,
    pub field: &'static str,
    pub raw_value: String,
    pub message: String,
}

/// Opciones del normalizador
#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Aplicar la heurística de re-escalado de odómetros chicos.
    /// Puede corromper odómetros legítimos < 10000; por eso es configurable.
    pub rescale_small_odometers: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            rescale_small_odometers: true,
        }
    }
}

/// Resultado de normalizar un exporte completo
#[derive(Debug)]
pub struct NormalizationOutcome {
    /// Filas mapeadas (todavía sin sanitizar: puede haber litros <= 0)
    pub rows: Vec<FuelTransaction>,
    pub warnings: Vec<ParseWarning>,
    /// Filas descartadas por no traer columna de litros
    pub rows_without_liters: usize,
}

/// Quitar diacríticos, recortar y pasar a mayúsculas para comparar claves
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(strip_diacritic)
        .collect::<String>()
        .to_uppercase()
}

fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => if c.is_uppercase() { 'A' } else { 'a' },
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => if c.is_uppercase() { 'E' } else { 'e' },
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => if c.is_uppercase() { 'I' } else { 'i' },
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => if c.is_uppercase() { 'O' } else { 'o' },
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => if c.is_uppercase() { 'U' } else { 'u' },
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => c,
    }
}

/// Parsear un número en formato argentino estricto ("1.250,50" -> 1250.50).
///
/// Vacío o "-" se consideran celda sin dato y valen 0 sin advertencia;
/// cualquier otra cosa no numérica es un `ParseError`.
pub fn parse_locale_number(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(0.0);
    }

    // Primero: quitar TODOS los puntos (separadores de miles)
    // Segundo: reemplazar la coma decimal por punto
    let cleaned = trimmed.replace('.', "").replace(',', ".");

    cleaned
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

/// Parsear un odómetro, aplicando opcionalmente la heurística de escala:
/// un valor en (0, 10000) se asume expresado en miles ("76,6" -> 76600).
pub fn parse_odometer(raw: &str, rescale_small: bool) -> Result<i64, ParseError> {
    let value = parse_locale_number(raw)?;
    let scaled = if rescale_small && value > 0.0 && value < ODOMETER_RESCALE_CEILING {
        value * 1000.0
    } else {
        value
    };
    Ok(scaled.round() as i64)
}

/// Combinar fecha DD/MM/YYYY y hora HH:MM:SS opcional en milisegundos epoch.
///
/// Si la fecha viene con la hora pegada ("01/02/2024 10:30") la parte horaria
/// pegada se ignora en favor de la columna de hora.
pub fn parse_timestamp(date_raw: &str, time_raw: &str) -> Result<i64, ParseError> {
    let date_part = date_raw.trim().split(' ').next().unwrap_or("");
    if date_part.is_empty() {
        return Ok(0);
    }

    if !date_part.contains('/') {
        // Último intento: formato ISO
        if let Ok(d) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            let dt = d.and_hms_opt(0, 0, 0).unwrap_or_default();
            return Ok(dt.and_utc().timestamp_millis());
        }
        return Err(ParseError::InvalidDate(date_raw.to_string()));
    }

    let parts: Vec<&str> = date_part.split('/').collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidDate(date_raw.to_string()));
    }

    let day: u32 = parts[0]
        .parse()
        .map_err(|_| ParseError::InvalidDate(date_raw.to_string()))?;
    let month: u32 = parts[1]
        .parse()
        .map_err(|_| ParseError::InvalidDate(date_raw.to_string()))?;
    let year: i32 = parts[2]
        .parse()
        .map_err(|_| ParseError::InvalidDate(date_raw.to_string()))?;

    let (hours, minutes, seconds) = parse_time_parts(time_raw);

    let date = chrono::NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParseError::InvalidDate(date_raw.to_string()))?;
    let datetime = date
        .and_hms_opt(hours, minutes, seconds)
        .ok_or_else(|| ParseError::InvalidDate(format!("{} {}", date_raw, time_raw)))?;

    Ok(datetime.and_utc().timestamp_millis())
}

fn parse_time_parts(time_raw: &str) -> (u32, u32, u32) {
    if !time_raw.contains(':') {
        return (0, 0, 0);
    }
    let mut it = time_raw.trim().split(':');
    let h = it.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let m = it.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let s = it.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (h, m, s)
}

/// Índice de columnas: encabezado normalizado -> posición en el registro
struct HeaderIndex {
    normalized: Vec<String>,
}

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        Self {
            normalized: headers.iter().map(normalize_key).collect(),
        }
    }

    /// Primer alias que matchea algún encabezado de la fila gana
    fn find<'a>(&self, record: &'a csv::StringRecord, aliases: &[&str]) -> Option<&'a str> {
        for alias in aliases {
            let wanted = normalize_key(alias);
            if let Some(pos) = self.normalized.iter().position(|h| *h == wanted) {
                if let Some(value) = record.get(pos) {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed);
                    }
                }
            }
        }
        None
    }
}

/// Normalizar un exporte CSV completo (UTF-8, con fila de encabezados).
///
/// Mejor esfuerzo: los campos que no parsean caen a 0 y generan una
/// `ParseWarning`; solo la ausencia total de litros descarta la fila.
pub fn normalize_csv(csv_bytes: &[u8], options: &NormalizerOptions) -> anyhow::Result<NormalizationOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_bytes);

    let headers = reader.headers()?.clone();
    let index = HeaderIndex::new(&headers);

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut rows_without_liters = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = i + 1;

        // Litros es la columna obligatoria: sin ella la fila no sirve
        let liters_raw = match index.find(&record, LITERS_ALIASES) {
            Some(v) => v,
            None => {
                rows_without_liters += 1;
                continue;
            }
        };

        let mut warn = |field: &'static str, raw: &str, err: ParseError| {
            warnings.push(ParseWarning {
                row: row_number,
                field,
                raw_value: raw.to_string(),
                message: err.to_string(),
            });
        };

        let liters = match parse_locale_number(liters_raw) {
            Ok(v) => v,
            Err(e) => {
                warn("liters", liters_raw, e);
                0.0
            }
        };

        let cost_raw = index.find(&record, COST_ALIASES).unwrap_or("0");
        let cost = match parse_locale_number(cost_raw) {
            Ok(v) => v,
            Err(e) => {
                warn("cost", cost_raw, e);
                0.0
            }
        };

        let odo_start_raw = index.find(&record, ODOMETER_START_ALIASES).unwrap_or("0");
        let odometer_start = match parse_odometer(odo_start_raw, options.rescale_small_odometers) {
            Ok(v) => v,
            Err(e) => {
                warn("odometer_start", odo_start_raw, e);
                0
            }
        };

        let odo_end_raw = index.find(&record, ODOMETER_END_ALIASES).unwrap_or("0");
        let odometer_end = match parse_odometer(odo_end_raw, options.rescale_small_odometers) {
            Ok(v) => v,
            Err(e) => {
                warn("odometer_end", odo_end_raw, e);
                0
            }
        };

        // Distancia del tramo (dato interno)
        let trip_distance = if odometer_end > odometer_start && odometer_start > 0 {
            odometer_end - odometer_start
        } else {
            0
        };

        let date_raw = index.find(&record, DATE_ALIASES).unwrap_or("").to_string();
        let time_raw = index
            .find(&record, TIME_ALIASES)
            .unwrap_or("00:00:00")
            .to_string();
        let timestamp = match parse_timestamp(&date_raw, &time_raw) {
            Ok(t) => t,
            Err(e) => {
                warn("date", &date_raw, e);
                0
            }
        };

        rows.push(FuelTransaction {
            vehicle_id: index
                .find(&record, VEHICLE_ALIASES)
                .unwrap_or(UNKNOWN_VEHICLE)
                .to_string(),
            timestamp,
            date: date_raw,
            time: time_raw,
            plate: index.find(&record, PLATE_ALIASES).unwrap_or("").to_string(),
            brand: index.find(&record, BRAND_ALIASES).unwrap_or("").to_string(),
            model: index.find(&record, MODEL_ALIASES).unwrap_or("").to_string(),
            driver: index
                .find(&record, DRIVER_ALIASES)
                .unwrap_or(UNASSIGNED_DRIVER)
                .to_string(),
            transaction_type: index
                .find(&record, TRANSACTION_TYPE_ALIASES)
                .unwrap_or(CONSUMPTION_TRANSACTION)
                .to_string(),
            liters,
            cost,
            station: index
                .find(&record, STATION_ALIASES)
                .unwrap_or(EXTERNAL_STATION)
                .to_string(),
            address: index.find(&record, ADDRESS_ALIASES).unwrap_or("").to_string(),
            city: index.find(&record, CITY_ALIASES).unwrap_or("").to_string(),
            odometer_start,
            odometer_end,
            trip_distance,
        });
    }

    log::info!(
        "📄 Exporte normalizado: {} filas, {} advertencias, {} sin litros",
        rows.len(),
        warnings.len(),
        rows_without_liters
    );

    Ok(NormalizationOutcome {
        rows,
        warnings,
        rows_without_liters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale_number_formato_argentino() {
        assert_eq!(parse_locale_number("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_locale_number("1.250,50").unwrap(), 1250.50);
        assert_eq!(parse_locale_number("34,5").unwrap(), 34.5);
        assert_eq!(parse_locale_number("-120,00").unwrap(), -120.0);
    }

    #[test]
    fn test_parse_locale_number_sin_dato() {
        assert_eq!(parse_locale_number("").unwrap(), 0.0);
        assert_eq!(parse_locale_number("-").unwrap(), 0.0);
        assert_eq!(parse_locale_number("  ").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_locale_number_basura() {
        assert!(matches!(
            parse_locale_number("N/A"),
            Err(ParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_parse_odometer_reescala_valores_chicos() {
        // "76,6" en el exporte quiere decir 76600
        assert_eq!(parse_odometer("76,6", true).unwrap(), 76600);
        assert_eq!(parse_odometer("123456", true).unwrap(), 123456);
        assert_eq!(parse_odometer("0", true).unwrap(), 0);
    }

    #[test]
    fn test_parse_odometer_heuristica_apagada() {
        assert_eq!(parse_odometer("76,6", false).unwrap(), 77);
        assert_eq!(parse_odometer("9.500", false).unwrap(), 9500);
    }

    #[test]
    fn test_parse_timestamp_fecha_y_hora() {
        let ts = parse_timestamp("15/03/2024", "10:30:00").unwrap();
        let dt = chrono::DateTime::from_timestamp_millis(ts).unwrap();
        assert_eq!(dt.format("%d/%m/%Y %H:%M:%S").to_string(), "15/03/2024 10:30:00");
    }

    #[test]
    fn test_parse_timestamp_hora_pegada_a_la_fecha() {
        // La hora pegada a la fecha se ignora; manda la columna HORA
        let ts = parse_timestamp("15/03/2024 23:59", "08:00:00").unwrap();
        let dt = chrono::DateTime::from_timestamp_millis(ts).unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "08:00");
    }

    #[test]
    fn test_parse_timestamp_invalida() {
        assert!(parse_timestamp("sin fecha", "").is_err());
        assert_eq!(parse_timestamp("", "10:00:00").unwrap(), 0);
    }

    #[test]
    fn test_normalize_key_acentos() {
        assert_eq!(normalize_key("  Odómetro Anterior "), "ODOMETRO ANTERIOR");
        assert_eq!(normalize_key("DIRECCIÓN ESTACIÓN"), "DIRECCION ESTACION");
    }

    #[test]
    fn test_normalize_csv_encabezados_con_acentos() {
        let csv = "FECHA,HORA,UNIDAD,LITROS,M.N.,ODÓMETRO ANTERIOR,ÚLTIMO ODÓMETRO,CONDUCTOR\n\
                   15/03/2024,10:30:00,MOVIL 25,\"1.250,50\",\"150.000,00\",76600,76800,PEREZ\n";
        let outcome = normalize_csv(csv.as_bytes(), &NormalizerOptions::default()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.warnings.is_empty());

        let row = &outcome.rows[0];
        assert_eq!(row.vehicle_id, "MOVIL 25");
        assert_eq!(row.liters, 1250.50);
        assert_eq!(row.cost, 150_000.0);
        assert_eq!(row.odometer_start, 76600);
        assert_eq!(row.odometer_end, 76800);
        assert_eq!(row.trip_distance, 200);
        assert_eq!(row.driver, "PEREZ");
        assert_eq!(row.station, EXTERNAL_STATION);
    }

    #[test]
    fn test_normalize_csv_tipo_de_transaccion() {
        let csv = "FECHA,UNIDAD,LITROS,TIPO\n\
                   15/03/2024,MOVIL 1,\"40,0\",CONSUMO\n\
                   16/03/2024,MOVIL 1,\"-40,0\",Reversión de carga\n";
        let outcome = normalize_csv(csv.as_bytes(), &NormalizerOptions::default()).unwrap();

        assert_eq!(outcome.rows[0].transaction_type, "CONSUMO");
        assert!(!outcome.rows[0].is_reversal());
        assert_eq!(outcome.rows[1].transaction_type, "Reversión de carga");
        assert!(outcome.rows[1].is_reversal());
    }

    #[test]
    fn test_normalize_csv_tipo_ausente_cae_a_consumo() {
        let csv = "FECHA,UNIDAD,LITROS\n15/03/2024,MOVIL 1,\"40,0\"\n";
        let outcome = normalize_csv(csv.as_bytes(), &NormalizerOptions::default()).unwrap();

        assert_eq!(outcome.rows[0].transaction_type, CONSUMPTION_TRANSACTION);
    }

    #[test]
    fn test_normalize_csv_fila_sin_litros_se_descarta() {
        let csv = "FECHA,UNIDAD,LITROS\n15/03/2024,MOVIL 1,\n16/03/2024,MOVIL 2,\"40,0\"\n";
        let outcome = normalize_csv(csv.as_bytes(), &NormalizerOptions::default()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows_without_liters, 1);
        assert_eq!(outcome.rows[0].vehicle_id, "MOVIL 2");
    }

    #[test]
    fn test_normalize_csv_campo_invalido_genera_advertencia() {
        let csv = "FECHA,UNIDAD,LITROS,IMPORTE\nbasura,MOVIL 1,\"40,0\",XX\n";
        let outcome = normalize_csv(csv.as_bytes(), &NormalizerOptions::default()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.rows[0].cost, 0.0);
        assert_eq!(outcome.rows[0].timestamp, 0);

        let fields: Vec<&str> = outcome.warnings.iter().map(|w| w.field).collect();
        assert!(fields.contains(&"cost"));
        assert!(fields.contains(&"date"));
    }
}
