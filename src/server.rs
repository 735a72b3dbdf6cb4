//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, delete worker lifecycle, and the Axum server
//! with graceful shutdown.

use crate::application::services::{TokenSigner, UrlService, UserService};
use crate::config::Config;
use crate::domain::delete_worker::{DeleteWorker, delete_pipeline};
use crate::domain::repositories::UrlStorage;
use crate::domain::shutdown::shutdown_channel;
use crate::infrastructure::persistence::open_storage;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Wires services around `storage`.
///
/// Returns the handler state and the delete worker, which the caller must
/// spawn; until it runs, deletion requests only fill the queue.
///
/// # Errors
///
/// Returns an error if `TRUSTED_SUBNET` is malformed.
pub fn build_state(config: &Config, storage: Arc<dyn UrlStorage>) -> Result<(AppState, DeleteWorker)> {
    let signer = match &config.user_signing_secret {
        Some(secret) => TokenSigner::new(secret.as_bytes()),
        None => {
            tracing::warn!(
                "USER_SIGNING_SECRET is not set, using a random secret; user tokens will not survive a restart"
            );
            TokenSigner::random()
        }
    };

    let (delete_queue, worker) = delete_pipeline(storage.clone(), config.delete_worker_settings());

    let url_service = Arc::new(UrlService::new(
        storage.clone(),
        delete_queue,
        config.base_url.clone(),
    ));
    let user_service = Arc::new(UserService::new(storage, signer));

    let state = AppState::new(url_service, user_service, config.trusted_subnet()?);
    Ok((state, worker))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (applying migrations for PostgreSQL)
/// - Background delete worker
/// - Axum HTTP server
///
/// On SIGINT or SIGTERM the server stops accepting connections and finishes
/// in-flight requests, then the delete worker drains its queue, then the
/// storage is closed.
///
/// # Errors
///
/// Returns an error if:
/// - Storage cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let storage = open_storage(&config).await?;
    let (state, worker) = build_state(&config, storage.clone())?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));
    tracing::info!("Delete worker started");

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    let served = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("HTTP server stopped, draining delete queue");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Delete worker task failed");
    }

    storage.close().await;
    tracing::info!("Shutdown complete");

    served.context("HTTP server error")
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
