//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los almacenes se inyectan como trait
//! objects para mantener la persistencia como colaborador intercambiable.

use std::sync::Arc;

use crate::clients::GpsProviderClient;
use crate::config::environment::EnvironmentConfig;
use crate::repositories::{ConfigStore, FuelRecordStore};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub records: Arc<dyn FuelRecordStore>,
    pub settings: Arc<dyn ConfigStore>,
    /// None cuando faltan credenciales del proveedor en el entorno
    pub gps: Option<Arc<GpsProviderClient>>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        records: Arc<dyn FuelRecordStore>,
        settings: Arc<dyn ConfigStore>,
        gps: Option<Arc<GpsProviderClient>>,
    ) -> Self {
        Self {
            config,
            records,
            settings,
            gps,
        }
    }

    /// Cliente GPS o error claro si no está configurado
    pub fn gps_client(&self) -> Result<Arc<GpsProviderClient>, crate::utils::errors::AppError> {
        self.gps.clone().ok_or_else(|| {
            crate::utils::errors::AppError::ServiceUnavailable(
                "Faltan credenciales del proveedor GPS (GPS_PROVIDER_USER / GPS_PROVIDER_PASS)"
                    .to_string(),
            )
        })
    }
}
