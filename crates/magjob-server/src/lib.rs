pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod realtime;
pub mod service;

use axum::Router;
use magjob_core::{Clock, SystemClock};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, StorageKind};
use crate::db::{Database, Repositories};
use crate::realtime::Hub;
use crate::service::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let hub = Arc::new(Hub::new());
        let services = Services::new(repos, hub.clone(), clock);
        Self { services, hub }
    }
}

/// Build the HTTP and WebSocket router around the given state
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::router())
        .merge(realtime::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let repos = match config.storage {
        StorageKind::Postgres => {
            let db = Database::connect(&config.database_url, config.database_max_connections).await?;
            db.migrate().await?;
            Repositories::postgres(db)
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Repositories::memory()
        }
    };

    let state = AppState::new(repos, Arc::new(SystemClock));
    let app = build_app(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
