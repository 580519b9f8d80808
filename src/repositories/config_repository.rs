//! Repositorio de configuración clave/valor
//!
//! Centros de costo, coordenadas de estaciones y demás configuración viven
//! como mapas clave/valor por tipo. El repositorio se inyecta en los
//! componentes que lo necesitan; no hay estado global.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::utils::errors::AppResult;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Mapa de configuración para un tipo ("cost_centers", "station_coords");
    /// un tipo inexistente devuelve un mapa vacío
    async fn get_config(&self, kind: &str) -> AppResult<HashMap<String, String>>;

    /// Reemplazar el mapa completo de un tipo
    async fn save_config(&self, kind: &str, entries: HashMap<String, String>) -> AppResult<()>;
}

/// Implementación en memoria del almacén de configuración
#[derive(Default)]
pub struct InMemoryConfigStore {
    entries: Arc<RwLock<HashMap<String, HashMap<String, String>>>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_config(&self, kind: &str) -> AppResult<HashMap<String, String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(kind).cloned().unwrap_or_default())
    }

    async fn save_config(&self, kind: &str, new_entries: HashMap<String, String>) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        log::info!("💾 Configuración '{}' actualizada ({} claves)", kind, new_entries.len());
        entries.insert(kind.to_string(), new_entries);
        Ok(())
    }
}
