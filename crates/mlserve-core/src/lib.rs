//! mlserve Core - model lifecycle service.
//!
//! This crate provides:
//! - The model lifecycle manager (train, retrain, predict, describe, delete)
//! - The SQLite model registry
//! - gRPC and REST adapters over the same manager
//! - Configuration management
//! - Error handling
//!
//! # Example
//!
//! ```rust,no_run
//! use mlserve_core::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> mlserve_core::error::Result<()> {
//!     let config = Config::load()?;
//!     server::run(&config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod server;
pub mod storage;

/// Generated protobuf code for the mlserve gRPC API.
#[allow(clippy::similar_names)]
#[allow(clippy::doc_markdown)]
pub mod proto {
    tonic::include_proto!("mlserve");
}

pub use config::Config;
pub use error::{MlServeError, Result};
pub use lifecycle::{
    ErrorKind, LifecycleError, LifecycleResult, ModelLifecycleManager, Operation, TrainOutcome,
    TrainRequest,
};
pub use models::{ModelRecord, ModelSummary};
pub use proto::model_service_client::ModelServiceClient;
pub use storage::{Database, ModelRepository, SqliteModelRepository, StorageError};
