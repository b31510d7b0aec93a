//! # vshomed — vshome daemon
//!
//! Composition root that wires the hub into the HTTP adapter and starts the
//! server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Load and validate the device catalog; any problem aborts startup
//! - Construct the hub (registry + change feed)
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT), closing every viewer
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod catalog;
mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use vshome_adapter_http_axum::router;
use vshome_adapter_http_axum::state::AppState;
use vshome_app::hub::Hub;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Catalog
    let catalog_path = config.catalog.path.as_path();
    let devices = catalog::load(catalog_path)
        .with_context(|| format!("failed to load device catalog {}", catalog_path.display()))?;
    tracing::info!(
        devices = devices.len(),
        path = %catalog_path.display(),
        "device catalog loaded"
    );

    // Hub
    let hub = Arc::new(Hub::new(devices, config.hub.queue_capacity)?);

    // HTTP
    let state = AppState::from_arc(Arc::clone(&hub)).with_limits(config.viewer_limits());
    let static_dir = config.static_dir().filter(|dir| {
        let exists = dir.is_dir();
        if !exists {
            tracing::warn!(dir = %dir.display(), "static directory not found, not serving assets");
        }
        exists
    });
    let app = router::build(state, static_dir);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "vshomed listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .context("server error")?;

    tracing::info!("vshomed stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM, after asking every viewer to close.
async fn shutdown_signal(hub: Arc<Hub>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
    hub.disconnect_all().await;
}
