//! The model lifecycle manager.
//!
//! Maps `(model_type, hyperparameters, training data)` to a persisted model and
//! serves retrain, predict, describe and delete against it. Owns the only
//! write path to both the registry and the artifact store.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use mlserve_training::{
    evaluate, model_catalog, normalize_params, ArtifactStore, ClassificationMetrics, Classifier,
    HyperparameterMap, Hyperparameters, Label, ModelClassInfo, ModelType, TrainingError,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::lifecycle::error::{LifecycleError, LifecycleResult, Operation};
use crate::lifecycle::locks::ModelLocks;
use crate::models::{ModelRecord, ModelSummary};
use crate::storage::{Database, ModelRepository, SqliteModelRepository, StorageError, StorageResult};

/// Inputs to [`ModelLifecycleManager::train`].
#[derive(Debug, Clone)]
pub struct TrainRequest {
    /// Wire name of the classifier, e.g. `random_forest`.
    pub model_type: String,
    /// Raw hyperparameters; string values are normalized before use.
    pub hyperparameters: HyperparameterMap,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<Label>,
}

/// Result of a successful train.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub model_id: String,
    pub metrics: ClassificationMetrics,
}

/// Coordinates the model registry and the artifact store.
///
/// Cheap to clone; clones share the database handle, the artifact directory
/// and the per-model lock table. All methods block, so async callers should
/// run them on the blocking pool.
#[derive(Clone)]
pub struct ModelLifecycleManager {
    db: Arc<Mutex<Database>>,
    artifacts: ArtifactStore,
    locks: Arc<ModelLocks>,
}

impl ModelLifecycleManager {
    /// Creates a manager over an opened database and an artifact directory.
    pub fn new(db: Database, artifacts: ArtifactStore) -> Self {
        Self { db: Arc::new(Mutex::new(db)), artifacts, locks: Arc::new(ModelLocks::new()) }
    }

    /// Creates a manager with an in-memory registry.
    ///
    /// # Errors
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn in_memory(artifacts: ArtifactStore) -> StorageResult<Self> {
        Ok(Self::new(Database::open_in_memory()?, artifacts))
    }

    #[must_use]
    pub fn artifact_store(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Runs `f` against the registry while holding the connection lock.
    fn registry<T>(
        &self,
        operation: Operation,
        model_id: Option<&str>,
        f: impl FnOnce(&mut SqliteModelRepository<'_>) -> StorageResult<T>,
    ) -> LifecycleResult<T> {
        let mut db = self.db.lock().map_err(|e| {
            error!(operation = %operation, error = %e, "Failed to acquire database lock");
            LifecycleError::from_storage(
                operation,
                model_id,
                StorageError::LockPoisoned(e.to_string()),
            )
        })?;
        let mut repo = SqliteModelRepository::new(&mut db);
        f(&mut repo).map_err(|e| LifecycleError::from_storage(operation, model_id, e))
    }

    fn require_record(&self, operation: Operation, model_id: &str) -> LifecycleResult<ModelRecord> {
        self.registry(operation, Some(model_id), |repo| repo.get(model_id))
    }

    /// The static catalog of supported classifier types.
    #[must_use]
    pub fn model_classes(&self) -> &'static [ModelClassInfo] {
        model_catalog()
    }

    /// Trains a new model and persists it.
    ///
    /// Nothing is written until the classifier has been fitted and scored. The
    /// artifact is saved before the record is inserted, so a registry failure
    /// can leave an orphan artifact but never a record without one.
    ///
    /// # Errors
    /// * `UnsupportedModelType` / `InvalidHyperparameters` - bad request shape
    /// * `InvalidTrainingData` - empty, ragged or mismatched data
    /// * `TrainingFailed` - the backend rejected the fit
    /// * `Artifact` / `Storage` - persistence failed
    pub fn train(&self, request: TrainRequest) -> LifecycleResult<TrainOutcome> {
        const OP: Operation = Operation::Train;
        let start = Instant::now();

        let model_type = ModelType::from_str(&request.model_type)
            .map_err(|e| LifecycleError::from_training(OP, None, e))?;
        let hyperparameters = normalize_params(&request.hyperparameters);
        let typed = Hyperparameters::from_map(model_type, &hyperparameters)
            .map_err(|e| LifecycleError::from_training(OP, None, e))?;

        let mut classifier = Classifier::new(typed);
        classifier
            .fit(&request.features, &request.labels)
            .map_err(|e| LifecycleError::from_training(OP, None, e))?;
        let predictions = classifier
            .predict(&request.features)
            .map_err(|e| LifecycleError::from_training(OP, None, e))?;
        let metrics = evaluate(&request.labels, &predictions);

        let model_id = Uuid::new_v4().to_string();
        let artifact_path = self
            .artifacts
            .save(&model_id, &classifier)
            .map_err(|e| LifecycleError::from_training(OP, Some(&model_id), e))?;

        let record =
            ModelRecord::new(model_id.clone(), model_type, hyperparameters, artifact_path, metrics);
        self.registry(OP, Some(&model_id), |repo| repo.insert(&record)).inspect_err(|e| {
            error!(
                model_id = %model_id,
                error = %e,
                "Registry insert failed; artifact left orphaned"
            );
        })?;

        info!(
            model_id = %model_id,
            model_type = %model_type,
            samples = request.labels.len(),
            duration_ms = start.elapsed().as_millis(),
            "Model trained"
        );
        Ok(TrainOutcome { model_id, metrics })
    }

    /// Refits an existing model on new data and replaces its artifact.
    ///
    /// The hyperparameters carried by the artifact are reused; the record's
    /// stored hyperparameters, type, path and creation time stay as they were.
    ///
    /// # Errors
    /// * `ModelNotFound` - no model with this id
    /// * `InvalidTrainingData` / `TrainingFailed` - the new data was rejected
    /// * `ArtifactMissing` - the record exists but its artifact does not
    pub fn retrain(
        &self,
        model_id: &str,
        features: &[Vec<f64>],
        labels: &[Label],
    ) -> LifecycleResult<ClassificationMetrics> {
        const OP: Operation = Operation::Retrain;
        let start = Instant::now();
        let training = |e| LifecycleError::from_training(OP, Some(model_id), e);

        self.locks.with_lock(model_id, || {
            self.require_record(OP, model_id)?;

            let mut classifier = self.artifacts.load(model_id).map_err(training)?;
            classifier.fit(features, labels).map_err(training)?;
            let predictions = classifier.predict(features).map_err(training)?;
            self.artifacts.save(model_id, &classifier).map_err(training)?;

            let metrics = evaluate(labels, &predictions);
            self.registry(OP, Some(model_id), |repo| repo.update_metrics(model_id, &metrics))?;

            info!(
                model_id = %model_id,
                samples = labels.len(),
                duration_ms = start.elapsed().as_millis(),
                "Model retrained"
            );
            Ok(metrics)
        })
    }

    /// Predicts labels for `features` with a freshly loaded artifact.
    ///
    /// # Errors
    /// * `ModelNotFound` - no model with this id
    /// * `PredictionFailed` - empty, ragged or wrongly-sized input
    /// * `ArtifactMissing` - the record exists but its artifact does not
    pub fn predict(&self, model_id: &str, features: &[Vec<f64>]) -> LifecycleResult<Vec<Label>> {
        const OP: Operation = Operation::Predict;
        let training = |e| LifecycleError::from_training(OP, Some(model_id), e);

        self.require_record(OP, model_id)?;
        let classifier =
            self.artifacts.load(model_id).map_err(|e| self.load_failure(OP, model_id, e))?;
        let predictions = classifier.predict(features).map_err(training)?;

        debug!(model_id = %model_id, rows = features.len(), "Prediction served");
        Ok(predictions)
    }

    /// Maps an artifact load failure on a lock-free path.
    ///
    /// A delete may land between the record check and the load; if the record
    /// is gone as well, the model simply no longer exists.
    fn load_failure(&self, operation: Operation, model_id: &str, err: TrainingError) -> LifecycleError {
        if matches!(err, TrainingError::ArtifactMissing { .. })
            && let Err(gone @ LifecycleError::ModelNotFound { .. }) =
                self.require_record(operation, model_id)
        {
            debug!(model_id = %model_id, "Model deleted while loading its artifact");
            return gone;
        }
        LifecycleError::from_training(operation, Some(model_id), err)
    }

    /// Returns the summary of one model.
    ///
    /// # Errors
    /// `ModelNotFound` if no model with this id exists.
    pub fn describe(&self, model_id: &str) -> LifecycleResult<ModelSummary> {
        self.require_record(Operation::Describe, model_id).map(|r| r.summary())
    }

    /// Returns every model in creation order.
    ///
    /// # Errors
    /// Returns a storage error if the registry cannot be read.
    pub fn list(&self) -> LifecycleResult<Vec<ModelSummary>> {
        let records = self.registry(Operation::List, None, |repo| repo.list())?;
        Ok(records.iter().map(ModelRecord::summary).collect())
    }

    /// Returns the metrics recorded by the latest train or retrain.
    ///
    /// # Errors
    /// `ModelNotFound` if no model with this id exists.
    pub fn metrics(&self, model_id: &str) -> LifecycleResult<ClassificationMetrics> {
        self.require_record(Operation::Metrics, model_id).map(|r| r.metrics)
    }

    /// Removes a model's artifact and record.
    ///
    /// An artifact that cannot be removed is logged and the record is removed
    /// anyway.
    ///
    /// # Errors
    /// `ModelNotFound` if no model with this id exists.
    pub fn delete(&self, model_id: &str) -> LifecycleResult<()> {
        const OP: Operation = Operation::Delete;

        self.locks.with_lock(model_id, || {
            self.require_record(OP, model_id)?;

            if let Err(e) = self.artifacts.delete(model_id) {
                error!(model_id = %model_id, error = %e, "Failed to remove artifact");
            }
            self.registry(OP, Some(model_id), |repo| repo.delete(model_id))
        })?;

        info!(model_id = %model_id, "Model deleted");
        Ok(())
    }
}
