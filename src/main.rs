// src/main.rs
mod routes;
mod handlers;
mod models;
mod database;
mod middleware;
mod state;
mod dtos;
mod error;
mod auth;
mod config;
mod inventory;

use axum::{routing::get, Router};
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use tokio::net::TcpListener;
use dotenvy::dotenv;
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    // Create database pool
    let db_pool = match database::create_pool(&config.database_url, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create database pool");
            return;
        }
    };
    if let Err(e) = database::run_migrations(&db_pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        return;
    }

    // Create application state
    let app_state = state::AppState::new(db_pool, &config.jwt_secret);

    let cors = match config.cors_allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any),
        Some(Err(e)) => {
            tracing::error!(error = %e, "CORS_ALLOWED_ORIGIN is not a valid header value");
            return;
        }
        None => CorsLayer::permissive(),
    };

    let api = routes::create_router(app_state.clone())
        .route("/", get(|| async { "Storefront inventory API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest("/api", api)
        .layer(cors)
        .with_state(app_state);

    // Try base port..base port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = config.port.saturating_add(offset);
            let addr = SocketAddr::from((config.host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
