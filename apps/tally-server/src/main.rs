//! # Tally Server
//!
//! Entry point: seeds the counter store, starts the save loop and serves
//! the HTTP API until a termination signal arrives.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use background::{Lifecycle, LifecycleConfig};
use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting tally server on {}:{}",
        config.host,
        config.port
    );

    // Seeded before the first request is accepted
    let state = AppState::new().await;

    let lifecycle = Lifecycle::spawn(
        state.persistence.clone(),
        state.rate_limiter.clone(),
        LifecycleConfig::from(&config),
    );

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(handlers::configure_routes)
    })
    .disable_signals()
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        // Drain in-flight requests so the final save sees every increment.
        handle.stop(true).await;
    });

    let served = server.await;

    lifecycle.shutdown().await;
    tracing::info!("Shutdown complete");

    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
