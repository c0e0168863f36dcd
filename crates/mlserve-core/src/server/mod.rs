//! Server module for mlserve Core.
//!
//! Runs the gRPC service (`tonic`) and the REST API (`axum`) side by side
//! over one shared lifecycle manager.

pub mod grpc;
pub mod logging;
pub mod rest;

pub use grpc::MlService;

use std::future::Future;
use std::sync::Arc;

use mlserve_training::ArtifactStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tracing::{error, info};

use crate::config::{Config, StorageConfig};
use crate::error::{MlServeError, Result};
use crate::lifecycle::ModelLifecycleManager;
use crate::proto::model_service_server::ModelServiceServer;
use crate::storage::Database;
use logging::RequestLoggerLayer;

/// Opens the registry and artifact directory named by `storage`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn build_manager(storage: &StorageConfig) -> Result<ModelLifecycleManager> {
    let db = Database::open(&storage.database_path)?;
    info!(
        database = %storage.database_path,
        artifact_dir = %storage.artifact_dir.display(),
        "Opened model storage"
    );
    Ok(ModelLifecycleManager::new(db, ArtifactStore::new(&storage.artifact_dir)))
}

/// Start both servers and run until Ctrl-C.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, a listener cannot bind, or
/// either server fails.
pub async fn run(config: &Config) -> Result<()> {
    run_with_shutdown(config, shutdown_signal()).await
}

/// Start both servers and run until `shutdown` resolves.
///
/// # Errors
///
/// See [`run`].
pub async fn run_with_shutdown(
    config: &Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let manager = build_manager(&config.storage)?;
    let grpc_listener = TcpListener::bind(config.server.grpc_address).await?;
    let http_listener = TcpListener::bind(config.server.http_address).await?;
    serve(manager, grpc_listener, http_listener, config.server.enable_grpc_web, shutdown).await
}

/// Serve on already-bound listeners until `shutdown` resolves.
///
/// Both servers stop gracefully on shutdown. If one fails, its error is
/// returned.
///
/// # Errors
///
/// Returns the first server error.
pub async fn serve(
    manager: ModelLifecycleManager,
    grpc_listener: TcpListener,
    http_listener: TcpListener,
    enable_grpc_web: bool,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let (stop_tx, stop_rx) = watch::channel(());
    let stop_tx = Arc::new(stop_tx);
    let on_shutdown = Arc::clone(&stop_tx);
    tokio::spawn(async move {
        shutdown.await;
        let _ = on_shutdown.send(());
    });

    let grpc_addr = grpc_listener.local_addr()?;
    let http_addr = http_listener.local_addr()?;

    let service = ModelServiceServer::new(MlService::new(manager.clone()));
    let grpc_stop = wait_for_stop(stop_rx.clone());
    let incoming = TcpListenerStream::new(grpc_listener);
    let mut grpc_handle: JoinHandle<Result<()>> = if enable_grpc_web {
        info!(%grpc_addr, "Starting gRPC server with gRPC-Web support");
        tokio::spawn(async move {
            Server::builder()
                .accept_http1(true)
                .layer(ServiceBuilder::new().layer(RequestLoggerLayer).layer(GrpcWebLayer::new()))
                .add_service(service)
                .serve_with_incoming_shutdown(incoming, grpc_stop)
                .await
                .map_err(MlServeError::from)
        })
    } else {
        info!(%grpc_addr, "Starting gRPC server");
        tokio::spawn(async move {
            Server::builder()
                .layer(RequestLoggerLayer)
                .add_service(service)
                .serve_with_incoming_shutdown(incoming, grpc_stop)
                .await
                .map_err(MlServeError::from)
        })
    };

    info!(%http_addr, "Starting REST server");
    let app = rest::router(manager);
    let http_stop = wait_for_stop(stop_rx);
    let mut http_handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        axum::serve(http_listener, app)
            .with_graceful_shutdown(http_stop)
            .await
            .map_err(MlServeError::from)
    });

    tokio::select! {
        result = &mut grpc_handle => finish(joined(result), &stop_tx, http_handle).await?,
        result = &mut http_handle => finish(joined(result), &stop_tx, grpc_handle).await?,
    }

    info!("Servers stopped");
    Ok(())
}

fn joined(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    result.map_err(|e| MlServeError::Io(std::io::Error::other(e)))?
}

/// Waits for the server still running once the first one has returned.
///
/// A failed server stops its sibling before waiting, and its error wins.
async fn finish(
    first: Result<()>,
    stop: &watch::Sender<()>,
    other: JoinHandle<Result<()>>,
) -> Result<()> {
    if let Err(e) = &first {
        error!(error = %e, "Server failed; stopping the other one");
        let _ = stop.send(());
    }
    let second = joined(other.await);
    first.and(second)
}

async fn wait_for_stop(mut stop: watch::Receiver<()>) {
    // An error means the sender is gone, which also means stop.
    let _ = stop.changed().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
