//! Devnet host initialization and runtime.

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tower_http::cors;

use crate::config::Config;
use crate::devnet::Devnet;
use crate::handlers;
use crate::util::{SigDown, Telemetry};

/// Runs the devnet host until SIGINT or SIGTERM.
///
/// - Loads `.env` variables.
/// - Initializes logging, and OpenTelemetry export when enabled.
/// - Builds the factory and the genesis ledger from the configuration.
/// - Serves the HTTP endpoints on the configured `host`/`port`.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load()?;
    let devnet = Devnet::from_config(&config)?;
    tracing::info!(
        chain = %config.chain().as_chain_id(),
        factory = %config.factory(),
        genesis = config.genesis().len(),
        "Devnet initialized"
    );

    let http_endpoints = Router::new()
        .merge(handlers::routes().with_state(devnet.into_shared()))
        .layer(telemetry.http_tracing())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let axum_cancellation_token = sig_down.cancellation_token();
    let axum_graceful_shutdown = async move { axum_cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(axum_graceful_shutdown)
        .await?;
    sig_down.recv().await;

    Ok(())
}
