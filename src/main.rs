use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

use fleet_manager::config::{DatabaseConfig, EnvironmentConfig, StoreBackend};
use fleet_manager::gateway::{DocumentStore, LocalAuthProvider, MemoryStore, PostgresStore};
use fleet_manager::routes::create_router;
use fleet_manager::services::seed_service;
use fleet_manager::state::AppState;
use fleet_manager::utils::clock::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_manager=debug,tower_http=info")),
        )
        .init();

    info!("🚐 Fleet Manager - API de gestión de flota");
    info!("==========================================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Entorno: {} (almacén: {})", config.environment, config.store_backend.as_str());
    if config.is_production() && !config.backend.is_configured() {
        warn!("⚠️ Credenciales del backend incompletas (BACKEND_API_KEY, BACKEND_PROJECT_ID, BACKEND_APP_ID)");
    }
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Inicializar almacén
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => {
            info!("🧠 Usando almacén en memoria");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = match db_config.create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            Arc::new(PostgresStore::connect(pool).await?)
        }
    };

    let auth_provider = Arc::new(LocalAuthProvider::new(store.clone()));

    if let Some(path) = &config.seed_file {
        info!("🌱 Cargando datos iniciales desde {}", path.display());
        let seed = seed_service::load_seed_file(path).await?;
        if let Err(e) =
            seed_service::apply_seed(store.clone(), &auth_provider, seed, clock.now()).await
        {
            warn!("⚠️ Seed no aplicado: {}", e);
        }
    }

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(store, auth_provider, config, clock);
    let app = create_router(app_state);

    info!("🌐 Servidor escuchando en http://{}", addr);
    info!("📋 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   POST /api/auth/login | /api/auth/logout, GET /api/auth/me");
    info!("   GET  /api/vehicles?status=&limit= - Flota");
    info!("   POST /api/vehicles/:id/assign | start-trip | start-return | complete");
    info!("   GET  /api/vehicles/:id/timeline - Timeline del viaje");
    info!("   GET  /api/requests, POST /api/requests, POST /api/requests/:id/approve | reject");
    info!("   GET  /api/drivers/available | me/vehicle | me/history");
    info!("   GET  /api/dashboard/stats");
    info!("📡 Streams SSE: /api/stream/vehicles | requests | dashboard | me/vehicle");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
