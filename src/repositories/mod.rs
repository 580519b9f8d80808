//! Repositorios del sistema
//!
//! Interfaces angostas hacia la persistencia (colaborador externo) y sus
//! implementaciones en memoria.

pub mod config_repository;
pub mod record_repository;

pub use config_repository::{ConfigStore, InMemoryConfigStore};
pub use record_repository::{FuelRecordStore, InMemoryRecordStore};
