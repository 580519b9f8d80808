//! Repositorio de transacciones de combustible
//!
//! La persistencia real es un colaborador externo; el motor solo conoce
//! esta interfaz angosta. Las transacciones pertenecen a exactamente un
//! lote: borrar el lote borra todos sus registros (cascada), y el guardado
//! de un lote es todo-o-nada desde el punto de vista del consumidor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::fuel_transaction::{FuelTransaction, UploadBatch};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait FuelRecordStore: Send + Sync {
    /// Registros de un lote, o de todos los lotes si `batch_id` es None
    async fn list_records(&self, batch_id: Option<Uuid>) -> AppResult<Vec<FuelTransaction>>;

    /// Guardar un lote completo de forma atómica: o entra entero o no entra
    async fn save_batch(&self, batch: UploadBatch, records: Vec<FuelTransaction>) -> AppResult<()>;

    /// Borrar un lote y, en cascada, todos sus registros
    async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()>;

    async fn list_batches(&self) -> AppResult<Vec<UploadBatch>>;
}

/// Implementación en memoria del almacén de registros.
/// El write lock hace que cada lote entre o salga completo.
#[derive(Default)]
pub struct InMemoryRecordStore {
    batches: Arc<RwLock<HashMap<Uuid, (UploadBatch, Vec<FuelTransaction>)>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FuelRecordStore for InMemoryRecordStore {
    async fn list_records(&self, batch_id: Option<Uuid>) -> AppResult<Vec<FuelTransaction>> {
        let batches = self.batches.read().await;
        match batch_id {
            Some(id) => {
                let (_, records) = batches
                    .get(&id)
                    .ok_or_else(|| not_found_error("Batch", &id.to_string()))?;
                Ok(records.clone())
            }
            None => {
                let mut all: Vec<FuelTransaction> =
                    batches.values().flat_map(|(_, r)| r.iter().cloned()).collect();
                all.sort_by_key(|r| r.timestamp);
                Ok(all)
            }
        }
    }

    async fn save_batch(&self, batch: UploadBatch, records: Vec<FuelTransaction>) -> AppResult<()> {
        let mut batches = self.batches.write().await;
        log::info!(
            "💾 Guardando lote '{}' ({} registros de '{}')",
            batch.id,
            records.len(),
            batch.file_name
        );
        batches.insert(batch.id, (batch, records));
        Ok(())
    }

    async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()> {
        let mut batches = self.batches.write().await;
        match batches.remove(&batch_id) {
            Some((batch, records)) => {
                log::info!(
                    "🗑️ Lote '{}' eliminado junto con sus {} registros",
                    batch.id,
                    records.len()
                );
                Ok(())
            }
            None => Err(not_found_error("Batch", &batch_id.to_string())),
        }
    }

    async fn list_batches(&self) -> AppResult<Vec<UploadBatch>> {
        let batches = self.batches.read().await;
        let mut list: Vec<UploadBatch> = batches.values().map(|(b, _)| b.clone()).collect();
        list.sort_by_key(|b| b.uploaded_at);
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tx(vehicle: &str, ts: i64) -> FuelTransaction {
        FuelTransaction {
            vehicle_id: vehicle.to_string(),
            timestamp: ts,
            date: String::new(),
            time: String::new(),
            plate: String::new(),
            brand: String::new(),
            model: String::new(),
            driver: String::new(),
            transaction_type: String::new(),
            liters: 10.0,
            cost: 100.0,
            station: String::new(),
            address: String::new(),
            city: String::new(),
            odometer_start: 0,
            odometer_end: 0,
            trip_distance: 0,
        }
    }

    fn batch(records: usize) -> UploadBatch {
        UploadBatch {
            id: Uuid::new_v4(),
            file_name: "exporte.csv".to_string(),
            uploaded_at: Utc::now(),
            record_count: records,
        }
    }

    #[tokio::test]
    async fn test_guardar_y_listar_por_lote() {
        let store = InMemoryRecordStore::new();
        let b = batch(2);
        let id = b.id;
        store
            .save_batch(b, vec![tx("A", 1), tx("B", 2)])
            .await
            .unwrap();

        assert_eq!(store.list_records(Some(id)).await.unwrap().len(), 2);
        assert_eq!(store.list_records(None).await.unwrap().len(), 2);
        assert_eq!(store.list_batches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_borrar_lote_en_cascada() {
        let store = InMemoryRecordStore::new();
        let b1 = batch(1);
        let b2 = batch(1);
        let id1 = b1.id;
        store.save_batch(b1, vec![tx("A", 1)]).await.unwrap();
        store.save_batch(b2, vec![tx("B", 2)]).await.unwrap();

        store.delete_batch(id1).await.unwrap();

        // Solo caen los registros del lote borrado
        let remaining = store.list_records(None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].vehicle_id, "B");
    }

    #[tokio::test]
    async fn test_borrar_lote_inexistente() {
        let store = InMemoryRecordStore::new();
        assert!(store.delete_batch(Uuid::new_v4()).await.is_err());
    }
}
