use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use fleet_fuel_backend::clients::GpsProviderClient;
use fleet_fuel_backend::config::environment::EnvironmentConfig;
use fleet_fuel_backend::create_app;
use fleet_fuel_backend::repositories::{InMemoryConfigStore, InMemoryRecordStore};
use fleet_fuel_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("⛽ Fleet Fuel Backend - Reconciliación de combustible");
    info!("====================================================");

    let config = EnvironmentConfig::default();

    // Cliente GPS solo si hay credenciales en el entorno
    let gps = match config.gps_credentials() {
        Some((user, pass)) => {
            let client = match GpsProviderClient::new(config.gps_provider_url.clone(), user, pass) {
                Ok(c) => c,
                Err(e) => {
                    error!("❌ Error creando el cliente GPS: {}", e);
                    return Err(anyhow::anyhow!("Error del cliente GPS: {}", e));
                }
            };
            info!("✅ Proveedor GPS configurado: {}", config.gps_provider_url);
            Some(Arc::new(client))
        }
        None => {
            info!("⚠️ Sin credenciales GPS: el cruce flota-GPS queda deshabilitado");
            None
        }
    };

    let state = AppState::new(
        config.clone(),
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryConfigStore::new()),
        gps,
    );

    let app = create_app(state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /test - Endpoint de prueba");
    info!("📄 Exportes:");
    info!("   POST   /api/upload - Cargar exporte CSV (body crudo)");
    info!("   GET    /api/batches - Listar lotes cargados");
    info!("   DELETE /api/batch/:id - Eliminar lote (cascada)");
    info!("📊 Dashboard:");
    info!("   GET    /api/dashboard - KPIs, agregados y consumo mensual");
    info!("   GET    /api/vehicles - Unidades presentes en el set");
    info!("🔍 Auditoría:");
    info!("   GET    /api/audit/:vehicle_id - Continuidad de odómetros");
    info!("📡 GPS:");
    info!("   GET    /api/gps/assets - Activos del proveedor");
    info!("   POST   /api/gps/compare - Cruce combustible vs distancia GPS");
    info!("⚙️ Configuración:");
    info!("   GET    /api/config/:kind - Leer configuración clave/valor");
    info!("   PUT    /api/config/:kind - Guardar configuración");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
