//! Repository implementation for model records.
//!
//! This module provides the Repository pattern implementation for the model
//! registry using SQLite as the backing store.

use crate::models::ModelRecord;
use crate::storage::database::Database;
use crate::storage::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use mlserve_training::{ClassificationMetrics, ModelType};
use rusqlite::{ErrorCode, Row, params};
use std::path::PathBuf;
use tracing::{debug, info};

// ============================================================================
// Row Parsing Helpers
// ============================================================================

/// Parses a JSON field from a row into a deserializable type.
///
/// # Errors
/// Returns a `rusqlite::Error::InvalidColumnType` if parsing fails.
fn parse_json_field<T>(row: &Row, idx: usize, column_name: &str) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let json_str: String = row.get(idx)?;
    serde_json::from_str(&json_str).map_err(|_| {
        rusqlite::Error::InvalidColumnType(
            idx,
            column_name.to_string(),
            rusqlite::types::Type::Text,
        )
    })
}

/// Parses an RFC3339 timestamp string from a row into a `DateTime<Utc>`.
fn parse_timestamp(row: &Row, idx: usize, column_name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let timestamp_str: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&timestamp_str).map(|dt| dt.with_timezone(&Utc)).map_err(|_| {
        rusqlite::Error::InvalidColumnType(
            idx,
            column_name.to_string(),
            rusqlite::types::Type::Text,
        )
    })
}

fn parse_model_type(row: &Row, idx: usize) -> rusqlite::Result<ModelType> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(idx, "model_type".to_string(), rusqlite::types::Type::Text)
    })
}

fn row_to_record(row: &Row) -> rusqlite::Result<ModelRecord> {
    let artifact_path: String = row.get(3)?;
    Ok(ModelRecord {
        id: row.get(0)?,
        model_type: parse_model_type(row, 1)?,
        hyperparameters: parse_json_field(row, 2, "hyperparameters_json")?,
        artifact_path: PathBuf::from(artifact_path),
        created_at: parse_timestamp(row, 4, "created_at")?,
        metrics: parse_json_field(row, 5, "metrics_json")?,
    })
}

fn not_found_error(id: &str) -> StorageError {
    StorageError::NotFound(format!("model with id {id} not found"))
}

const SELECT_COLUMNS: &str =
    "SELECT id, model_type, hyperparameters_json, artifact_path, created_at, metrics_json FROM models";

// ============================================================================
// Repository Trait
// ============================================================================

/// Repository trait for model record operations.
pub trait ModelRepository {
    /// Inserts a new record. Fails with `DuplicateKey` if the id is taken.
    fn insert(&mut self, record: &ModelRecord) -> StorageResult<()>;

    /// Retrieves a record by ID.
    fn get(&self, id: &str) -> StorageResult<ModelRecord>;

    /// Retrieves all records in insertion order.
    fn list(&self) -> StorageResult<Vec<ModelRecord>>;

    /// Overwrites only the metrics of an existing record.
    fn update_metrics(&mut self, id: &str, metrics: &ClassificationMetrics) -> StorageResult<()>;

    /// Deletes a record by ID.
    fn delete(&mut self, id: &str) -> StorageResult<()>;
}

// ============================================================================
// SQLite Model Repository
// ============================================================================

/// SQLite implementation of ModelRepository.
pub struct SqliteModelRepository<'a> {
    db: &'a mut Database,
}

impl<'a> SqliteModelRepository<'a> {
    /// Creates a new SQLite model repository.
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }
}

impl ModelRepository for SqliteModelRepository<'_> {
    fn insert(&mut self, record: &ModelRecord) -> StorageResult<()> {
        let hyperparameters_json = serde_json::to_string(&record.hyperparameters)?;
        let metrics_json = serde_json::to_string(&record.metrics)?;
        let artifact_path = record.artifact_path.to_str().ok_or_else(|| {
            StorageError::InvalidData(format!(
                "artifact path is not valid UTF-8: {}",
                record.artifact_path.display()
            ))
        })?;

        let result = self.db.conn_mut().execute(
            "INSERT INTO models (id, model_type, hyperparameters_json, artifact_path, created_at, metrics_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![record.id, record.model_type.as_str(), hyperparameters_json, artifact_path, record.created_at.to_rfc3339(), metrics_json],
        );
        match result {
            Ok(_) => {
                info!(model_id = %record.id, model_type = %record.model_type, "Created model record");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::DuplicateKey(record.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, id: &str) -> StorageResult<ModelRecord> {
        let mut stmt = self.db.conn().prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], row_to_record)?;
        match rows.next() {
            Some(Ok(record)) => Ok(record),
            Some(Err(e)) => Err(e.into()),
            None => Err(not_found_error(id)),
        }
    }

    fn list(&self) -> StorageResult<Vec<ModelRecord>> {
        let mut stmt = self.db.conn().prepare(&format!("{SELECT_COLUMNS} ORDER BY seq"))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn update_metrics(&mut self, id: &str, metrics: &ClassificationMetrics) -> StorageResult<()> {
        let metrics_json = serde_json::to_string(metrics)?;
        let rows_affected = self.db.conn_mut().execute(
            "UPDATE models SET metrics_json = ?2 WHERE id = ?1",
            params![id, metrics_json],
        )?;
        if rows_affected == 0 {
            return Err(not_found_error(id));
        }
        debug!(model_id = %id, "Updated model metrics");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        let rows_affected =
            self.db.conn_mut().execute("DELETE FROM models WHERE id = ?1", params![id])?;
        if rows_affected == 0 {
            return Err(not_found_error(id));
        }
        info!(model_id = %id, "Deleted model record");
        Ok(())
    }
}
