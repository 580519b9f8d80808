//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del dominio de combustible:
//! transacciones canónicas, agregados por vehículo, reportes de auditoría
//! y activos del proveedor GPS.

pub mod audit;
pub mod fuel_transaction;
pub mod gps;
