//! mlserve Training
//!
//! Classifier primitives for the model-serving facade:
//! - Normalizing loosely-typed hyperparameters (`normalize_params`)
//! - Typed hyperparameter records and the static model catalog
//! - The `Classifier` fit/predict capability backed by `smartcore`
//! - In-sample metric evaluation with a degenerate fallback
//! - Writing classifier artifacts to disk (`ArtifactStore`)

pub mod artifacts;
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod hyperparams;
pub mod layout;
pub mod metrics;
pub mod params;

pub use artifacts::ArtifactStore;
pub use classifier::Classifier;
pub use dataset::{validate_features, validate_training_set, Label};
pub use error::{TrainingError, TrainingResult};
pub use hyperparams::{
    model_catalog, Hyperparameters, LogisticRegressionParams, ModelClassInfo, ModelType,
    RandomForestParams, Solver,
};
pub use layout::ArtifactLayout;
pub use metrics::{evaluate, ClassificationMetrics};
pub use params::{normalize_params, normalize_value, HyperparameterMap, ParamValue};
