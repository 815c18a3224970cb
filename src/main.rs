use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use oficina_api::config::environment::EnvironmentConfig;
use oficina_api::database;
use oficina_api::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use oficina_api::routes;
use oficina_api::services::email_queue::RedisEmailQueue;
use oficina_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env();

    // Configurar logging
    let max_level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(max_level).init();

    info!("🔧 Oficina API - Ordens de Serviço");
    info!("==================================");

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => {
            info!("✅ PostgreSQL conectado exitosamente");
            pool
        }
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Inicializar la fila de emails sobre Redis
    let email_queue = match RedisEmailQueue::new(&config.redis_url).await {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(anyhow::anyhow!("Error de Redis: {}", e));
        }
    };

    // CORS: orígenes restringidos en producción, permisivo en desarrollo
    let cors = if config.is_production() {
        cors_middleware_with_origins(config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(pool, config, email_queue);

    let app = Router::new()
        .route("/test", get(test_endpoint))
        .nest(
            "/api/work-orders",
            routes::work_order_routes::create_work_order_router(),
        )
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("🔧 Endpoints - Ordens de serviço:");
    info!("   POST   /api/work-orders - Crear ordem");
    info!("   GET    /api/work-orders - Listar ordens (filtros opcionales)");
    info!("   GET    /api/work-orders/:id - Obtener ordem");
    info!("   GET    /api/work-orders/:id/progress - Progreso de la ordem");
    info!("   PUT    /api/work-orders/:id - Editar ordem (solo RECEIVED)");
    info!("   PATCH  /api/work-orders/:id/status - Avanzar status");
    info!("   DELETE /api/work-orders/:id - Eliminar ordem");
    info!("   GET    /api/work-orders/customer/:document - Ordens por CPF/CNPJ");
    info!("   GET    /api/work-orders/by-customer/:customer_id - Ordens por cliente");
    info!("   GET    /api/work-orders/by-vehicle/:vehicle_id - Ordens por vehículo");
    info!("   GET    /api/work-orders/by-status/:status - Ordens por status");
    info!("🔓 Endpoints públicos (hash):");
    info!("   GET    /api/work-orders/view/:hash_view - Vista pública");
    info!("   GET    /api/work-orders/approve/:hash_view - Aprobación pública");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                anyhow::anyhow!(e)
            })
    });

    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "API de ordens de serviço funcionando!",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Error instalando handler de Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("❌ Error instalando handler de SIGTERM: {}", e),
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
