//! Services module
//!
//! Este módulo contiene la lógica de negocio del motor de reconciliación:
//! normalización del exporte, sanitización, agregación, auditoría de
//! continuidad y cruce flota-GPS.

pub mod aggregation;
pub mod continuity;
pub mod matching;
pub mod normalizer;
pub mod sanitizer;
