//! Error taxonomy for lifecycle operations.

use std::fmt;

use mlserve_training::TrainingError;
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;

/// The lifecycle operation an error arose in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Train,
    Retrain,
    Predict,
    Describe,
    List,
    Metrics,
    Delete,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Retrain => "retrain",
            Self::Predict => "predict",
            Self::Describe => "describe",
            Self::List => "list",
            Self::Metrics => "metrics",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transport should classify an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed model does not exist.
    NotFound,
    /// The caller sent something unusable.
    InvalidInput,
    /// Store corruption or an I/O failure on our side.
    Internal,
}

fn scope(model_id: Option<&String>) -> String {
    model_id.map_or_else(String::new, |id| format!(" for model {id}"))
}

/// Errors returned by [`ModelLifecycleManager`](super::ModelLifecycleManager).
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{operation} failed: model {model_id} not found")]
    ModelNotFound { operation: Operation, model_id: String },

    #[error("{operation} failed: unsupported model type {model_type:?}")]
    UnsupportedModelType { operation: Operation, model_type: String },

    #[error("{operation} failed: invalid hyperparameters: {reason}")]
    InvalidHyperparameters { operation: Operation, reason: String },

    #[error("{operation} failed{}: invalid training data: {reason}", scope(.model_id.as_ref()))]
    InvalidTrainingData { operation: Operation, model_id: Option<String>, reason: String },

    #[error("{operation} failed{}: training failed: {reason}", scope(.model_id.as_ref()))]
    TrainingFailed { operation: Operation, model_id: Option<String>, reason: String },

    #[error("{operation} failed for model {model_id}: prediction failed: {reason}")]
    PredictionFailed { operation: Operation, model_id: String, reason: String },

    #[error("{operation} failed for model {model_id}: artifact missing: {reason}")]
    ArtifactMissing { operation: Operation, model_id: String, reason: String },

    #[error("{operation} failed{}: storage error: {source}", scope(.model_id.as_ref()))]
    Storage {
        operation: Operation,
        model_id: Option<String>,
        #[source]
        source: StorageError,
    },

    #[error("{operation} failed{}: artifact error: {source}", scope(.model_id.as_ref()))]
    Artifact {
        operation: Operation,
        model_id: Option<String>,
        #[source]
        source: TrainingError,
    },
}

impl LifecycleError {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::ModelNotFound { operation, .. }
            | Self::UnsupportedModelType { operation, .. }
            | Self::InvalidHyperparameters { operation, .. }
            | Self::InvalidTrainingData { operation, .. }
            | Self::TrainingFailed { operation, .. }
            | Self::PredictionFailed { operation, .. }
            | Self::ArtifactMissing { operation, .. }
            | Self::Storage { operation, .. }
            | Self::Artifact { operation, .. } => *operation,
        }
    }

    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        match self {
            Self::ModelNotFound { model_id, .. }
            | Self::PredictionFailed { model_id, .. }
            | Self::ArtifactMissing { model_id, .. } => Some(model_id),
            Self::InvalidTrainingData { model_id, .. }
            | Self::TrainingFailed { model_id, .. }
            | Self::Storage { model_id, .. }
            | Self::Artifact { model_id, .. } => model_id.as_deref(),
            Self::UnsupportedModelType { .. } | Self::InvalidHyperparameters { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedModelType { .. }
            | Self::InvalidHyperparameters { .. }
            | Self::InvalidTrainingData { .. }
            | Self::TrainingFailed { .. }
            | Self::PredictionFailed { .. } => ErrorKind::InvalidInput,
            Self::ArtifactMissing { .. } | Self::Storage { .. } | Self::Artifact { .. } => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn not_found(operation: Operation, model_id: &str) -> Self {
        Self::ModelNotFound { operation, model_id: model_id.to_string() }
    }

    /// Classifies a registry failure; `NotFound` becomes `ModelNotFound`.
    pub(crate) fn from_storage(
        operation: Operation,
        model_id: Option<&str>,
        err: StorageError,
    ) -> Self {
        match (err, model_id) {
            (StorageError::NotFound(_), Some(id)) => Self::not_found(operation, id),
            (source, _) => {
                Self::Storage { operation, model_id: model_id.map(ToString::to_string), source }
            }
        }
    }

    /// Classifies a training-crate failure in the context of `operation`.
    ///
    /// Dataset problems are bad training data on train/retrain and a failed
    /// prediction on predict. A missing artifact is logged as corruption.
    pub(crate) fn from_training(
        operation: Operation,
        model_id: Option<&str>,
        err: TrainingError,
    ) -> Self {
        let owned_id = model_id.map(ToString::to_string);
        match err {
            TrainingError::UnsupportedModelType(model_type) => {
                Self::UnsupportedModelType { operation, model_type }
            }
            TrainingError::InvalidHyperparameters(reason) => {
                Self::InvalidHyperparameters { operation, reason }
            }
            TrainingError::InvalidDataset(reason) | TrainingError::Prediction(reason)
                if operation == Operation::Predict =>
            {
                Self::PredictionFailed {
                    operation,
                    model_id: owned_id.unwrap_or_default(),
                    reason,
                }
            }
            TrainingError::InvalidDataset(reason) => {
                Self::InvalidTrainingData { operation, model_id: owned_id, reason }
            }
            TrainingError::Fit(reason) | TrainingError::Prediction(reason) => {
                Self::TrainingFailed { operation, model_id: owned_id, reason }
            }
            TrainingError::ArtifactMissing { path, reason } => {
                let model_id = owned_id.unwrap_or_default();
                error!(
                    operation = %operation,
                    model_id = %model_id,
                    path = %path.display(),
                    %reason,
                    "Artifact missing for registered model"
                );
                Self::ArtifactMissing {
                    operation,
                    model_id,
                    reason: format!("{}: {reason}", path.display()),
                }
            }
            source => Self::Artifact { operation, model_id: owned_id, source },
        }
    }
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
