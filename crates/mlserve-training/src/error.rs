use std::path::PathBuf;

use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("unsupported model type: {0}")]
    UnsupportedModelType(String),

    #[error("invalid hyperparameters: {0}")]
    InvalidHyperparameters(String),

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("fit failed: {0}")]
    Fit(String),

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("artifact missing at {}: {reason}", path.display())]
    ArtifactMissing { path: PathBuf, reason: String },

    #[error("invalid artifact id: {0:?}")]
    InvalidArtifactId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
