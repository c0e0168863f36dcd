//! Storage layer for mlserve.
//!
//! This module provides the model registry: durable model metadata in SQLite
//! behind the Repository pattern.

// SQL strings don't need hash-less raw strings
#![allow(clippy::needless_raw_string_hashes)]

pub mod database;
pub mod error;
pub mod repositories;

pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use repositories::{ModelRepository, SqliteModelRepository};
