// src/main.rs
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod store;

use axum::routing::get;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

const PORT_ATTEMPTS: u16 = 20;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env();
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL is not set; every /api request will fail until it is");
    }

    // The store connects lazily on the first request and is reused afterwards
    let app_state = state::AppState::new(database::ConnectionManager::new(config.database_url.clone()));

    let app = routes::create_router()
        .route("/", get(|| async { "Inventory API" }))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone());

    let Some(listener) = bind_listener(&config).await else {
        tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
        return;
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error=%e, "Server error");
    }

    app_state.connections.release().await;
}

// Walks PORT..=PORT+20 and takes the first free address
async fn bind_listener(config: &config::Config) -> Option<TcpListener> {
    for port in (0..=PORT_ATTEMPTS).map(|offset| config.port.saturating_add(offset)) {
        let addr = SocketAddr::from((config.host, port));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "Server running");
                return Some(listener);
            }
            Err(e) => tracing::warn!(%addr, error = %e, "Address unavailable, trying next port"),
        }
    }
    None
}

async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error=%e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; }
            Err(e) => {
                tracing::error!(error=%e, "Failed to listen for SIGTERM");
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
    tracing::info!("Shutting down");
}
