//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    // Proveedor GPS (las credenciales llegan por entorno, nunca hardcodeadas)
    pub gps_provider_url: String,
    pub gps_provider_user: Option<String>,
    pub gps_provider_pass: Option<String>,
    /// Heurística de re-escalado de odómetros chicos del normalizador
    pub rescale_small_odometers: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            gps_provider_url: env::var("GPS_PROVIDER_URL")
                .unwrap_or_else(|_| "https://api.cybermapa.com/v1/json/".to_string()),
            gps_provider_user: env::var("GPS_PROVIDER_USER").ok(),
            gps_provider_pass: env::var("GPS_PROVIDER_PASS").ok(),
            rescale_small_odometers: env::var("NORMALIZER_RESCALE_ODOMETERS")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credenciales GPS completas (las dos variables presentes)
    pub fn gps_credentials(&self) -> Option<(String, String)> {
        match (&self.gps_provider_user, &self.gps_provider_pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}
