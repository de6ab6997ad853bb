use axum::Router;
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::FiscalConfig;
use crate::services::{seed_rate_tables, InMemoryQueue, MessageQueue, MongoDb, RedisQueue};
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: FiscalConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb).await?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let queue = connect_queue(&config).await;
        let state = AppState::with_mongo(config.clone(), db, queue);

        if config.seed_rate_tables {
            seed_rate_tables(state.rate_table_repo.as_ref()).await?;
        }

        let app = build_router(state.clone());
        Self::serve(app, config.common.port, state).await
    }

    async fn serve(app: Router, port: u16, state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> Option<&MongoDb> {
        self.state.db.as_ref()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// Redis when enabled; otherwise a process-local queue.
///
/// An unreachable Redis does not stop the service: publishing is best-effort,
/// so every send fails and is logged until the process is restarted.
async fn connect_queue(config: &FiscalConfig) -> Arc<dyn MessageQueue> {
    if !config.queue.enabled {
        tracing::info!("Message queue disabled, using in-memory queue");
        return Arc::new(InMemoryQueue::new(true));
    }

    match RedisQueue::connect(&config.queue.redis_url).await {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis, queue publishing disabled");
            Arc::new(InMemoryQueue::new(false))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
