use crate::config::Config;
use crate::error::Result;
use crate::handlers::{get_document, health_check, share, shared_page, AppState, SharedState};
use crate::health::HealthChecker;
use crate::middleware::logging_middleware;
use crate::store::{select_store, SharedStore, StoreStatus};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    /// Selects the document store from `config` and builds the router
    pub fn new(config: Config) -> Result<Self> {
        let store = select_store(&config)?;
        Ok(Self::with_store(&config, store))
    }

    pub fn with_store(config: &Config, store: SharedStore) -> Self {
        Self {
            app: create_app(config, store),
            bind_addr: config.bind_addr,
        }
    }

    pub async fn run(self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!("Readex server listening on {}", listener.local_addr()?);
        tracing::info!("Share endpoint available at POST /api/share");
        tracing::info!("Health check available at /health");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Router for the share and fetch endpoints over `store`
pub fn create_app(config: &Config, store: SharedStore) -> Router {
    let health = HealthChecker::new(StoreStatus::new(store.backend(), config));
    let shared_state: SharedState = Arc::new(AppState {
        store,
        health,
        fallback_host: config.bind_addr.to_string(),
    });

    Router::new()
        .route("/api/share", post(share))
        .route("/api/share/:id", get(get_document))
        .route("/s/:id", get(shared_page))
        .route("/health", get(health_check))
        .with_state(shared_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
