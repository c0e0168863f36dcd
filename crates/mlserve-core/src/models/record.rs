//! The persisted model record and its public summary.

use chrono::{DateTime, Utc};
use mlserve_training::{ClassificationMetrics, HyperparameterMap, ModelType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one trained model. One row in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// UUID assigned at train time.
    pub id: String,
    pub model_type: ModelType,
    /// Normalized hyperparameters as supplied at train time. Never rewritten.
    pub hyperparameters: HyperparameterMap,
    /// Where the serialized classifier lives.
    pub artifact_path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// In-sample scores from the latest train or retrain.
    pub metrics: ClassificationMetrics,
}

impl ModelRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: String,
        model_type: ModelType,
        hyperparameters: HyperparameterMap,
        artifact_path: PathBuf,
        metrics: ClassificationMetrics,
    ) -> Self {
        Self { id, model_type, hyperparameters, artifact_path, created_at: Utc::now(), metrics }
    }

    /// The caller-facing view; the artifact path stays internal.
    #[must_use]
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id.clone(),
            model_type: self.model_type,
            params: self.hyperparameters.clone(),
            created_at: self.created_at,
            metrics: self.metrics,
        }
    }
}

/// What transports return for a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub model_type: ModelType,
    pub params: HyperparameterMap,
    pub created_at: DateTime<Utc>,
    pub metrics: ClassificationMetrics,
}
