//! In-memory KollabX backend for local development and integration tests.
//!
//! Speaks the same auth + PostgREST-style REST surface as the hosted
//! backend and publishes change events over NATS, so clients built on
//! `kollabx-sdk` run against it unchanged.

use std::sync::{Arc, Mutex};

use nkeys::KeyPair;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod jwt;
mod routes;
mod store;

use config::AppConfig;
use routes::AppState;
use store::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let account_kp = KeyPair::new_account();
    tracing::info!(
        account_public_key = %account_kp.public_key(),
        "signing realtime JWTs with a fresh account key"
    );

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                Some(client)
            }
            Err(e) => {
                tracing::warn!(%url, "NATS unavailable, realtime events disabled: {e}");
                None
            }
        },
        None => {
            tracing::info!("realtime events disabled by configuration");
            None
        }
    };

    let state = Arc::new(AppState {
        account_kp,
        nats,
        store: Mutex::new(Store::new()),
        config,
    });

    let addr = format!("0.0.0.0:{}", state.config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(%addr, "mock backend listening");

    axum::serve(listener, routes::router(state))
        .await
        .expect("Server error");
}
