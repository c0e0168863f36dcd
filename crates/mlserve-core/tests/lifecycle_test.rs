//! Integration tests for the model lifecycle manager.
//!
//! These exercise the manager end to end against an on-disk registry and a
//! scratch artifact directory.

use mlserve_core::{
    Database, ErrorKind, LifecycleError, ModelLifecycleManager, Operation, TrainRequest,
};
use mlserve_training::{ArtifactStore, ClassificationMetrics, HyperparameterMap, ParamValue};
use tempfile::TempDir;

fn iris_sample() -> Vec<Vec<f64>> {
    vec![vec![5.1, 3.5, 1.4, 0.2], vec![4.9, 3.0, 1.4, 0.2], vec![7.0, 3.2, 4.7, 1.4]]
}

fn setup() -> (TempDir, ModelLifecycleManager) {
    let temp = TempDir::new().unwrap();
    let db = Database::open(temp.path().join("registry.db").to_str().unwrap()).unwrap();
    let manager = ModelLifecycleManager::new(db, ArtifactStore::new(temp.path().join("saved_models")));
    (temp, manager)
}

fn random_forest_request() -> TrainRequest {
    TrainRequest {
        model_type: "random_forest".to_string(),
        hyperparameters: HyperparameterMap::from([
            ("n_estimators".to_string(), ParamValue::Int(10)),
            ("max_depth".to_string(), ParamValue::Int(5)),
        ]),
        features: iris_sample(),
        labels: vec![0, 0, 1],
    }
}

fn assert_consistent(manager: &ModelLifecycleManager) {
    for summary in manager.list().unwrap() {
        assert!(
            manager.artifact_store().load(&summary.id).is_ok(),
            "model {} has no loadable artifact",
            summary.id
        );
    }
}

#[test]
fn test_iris_random_forest_scenario() {
    let (_temp, manager) = setup();

    let outcome = manager.train(random_forest_request()).unwrap();
    assert_eq!(outcome.metrics, ClassificationMetrics { accuracy: 1.0, precision: 1.0, recall: 1.0 });

    let predictions = manager.predict(&outcome.model_id, &iris_sample()).unwrap();
    assert_eq!(predictions, vec![0, 0, 1]);
}

#[test]
fn test_train_then_predict_round_trip() {
    let (_temp, manager) = setup();

    let request = TrainRequest {
        model_type: "logistic_regression".to_string(),
        hyperparameters: HyperparameterMap::from([
            ("C".to_string(), ParamValue::from("0.5")),
            ("solver".to_string(), ParamValue::from("lbfgs")),
        ]),
        features: iris_sample(),
        labels: vec![0, 0, 1],
    };
    let outcome = manager.train(request).unwrap();

    let rows = vec![vec![5.0, 3.4, 1.5, 0.2], vec![6.9, 3.1, 4.9, 1.5], vec![5.5, 2.3, 4.0, 1.3]];
    let predictions = manager.predict(&outcome.model_id, &rows).unwrap();
    assert_eq!(predictions.len(), rows.len());
}

#[test]
fn test_unsupported_model_type_creates_nothing() {
    let (temp, manager) = setup();

    let mut request = random_forest_request();
    request.model_type = "unsupported_model".to_string();
    let err = manager.train(request).unwrap_err();

    assert!(matches!(
        &err,
        LifecycleError::UnsupportedModelType { model_type, .. } if model_type == "unsupported_model"
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(manager.list().unwrap().is_empty());
    assert!(!temp.path().join("saved_models").exists());
}

#[test]
fn test_reads_are_idempotent() {
    let (_temp, manager) = setup();
    let outcome = manager.train(random_forest_request()).unwrap();

    let first = manager.describe(&outcome.model_id).unwrap();
    let second = manager.describe(&outcome.model_id).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        manager.metrics(&outcome.model_id).unwrap(),
        manager.metrics(&outcome.model_id).unwrap()
    );
}

#[test]
fn test_deletion_is_final() {
    let (_temp, manager) = setup();
    let outcome = manager.train(random_forest_request()).unwrap();
    let id = outcome.model_id;

    manager.delete(&id).unwrap();
    assert!(!manager.artifact_store().exists(&id));

    let not_found = |err: LifecycleError, op: Operation| {
        assert!(matches!(&err, LifecycleError::ModelNotFound { model_id, .. } if *model_id == id));
        assert_eq!(err.operation(), op);
    };
    not_found(manager.describe(&id).unwrap_err(), Operation::Describe);
    not_found(manager.metrics(&id).unwrap_err(), Operation::Metrics);
    not_found(manager.predict(&id, &iris_sample()).unwrap_err(), Operation::Predict);
    not_found(manager.retrain(&id, &iris_sample(), &[0, 0, 1]).unwrap_err(), Operation::Retrain);
    not_found(manager.delete(&id).unwrap_err(), Operation::Delete);
}

#[test]
fn test_retrain_unknown_id_leaves_registry_unchanged() {
    let (_temp, manager) = setup();
    let outcome = manager.train(random_forest_request()).unwrap();
    let before = manager.list().unwrap();

    let err = manager.retrain("no-such-model", &iris_sample(), &[0, 0, 1]).unwrap_err();
    assert!(matches!(err, LifecycleError::ModelNotFound { .. }));
    assert_eq!(manager.list().unwrap(), before);
    assert_eq!(before[0].id, outcome.model_id);
}

#[test]
fn test_retrain_updates_only_metrics() {
    let (_temp, manager) = setup();
    let outcome = manager.train(random_forest_request()).unwrap();
    let before = manager.describe(&outcome.model_id).unwrap();

    // Flipped labels: the refit model should follow the new data.
    let metrics = manager.retrain(&outcome.model_id, &iris_sample(), &[1, 1, 0]).unwrap();
    let after = manager.describe(&outcome.model_id).unwrap();

    assert_eq!(after.metrics, metrics);
    assert_eq!(after.params, before.params);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(manager.predict(&outcome.model_id, &iris_sample()).unwrap(), vec![1, 1, 0]);
}

#[test]
fn test_list_follows_creation_order_and_stays_consistent() {
    let (_temp, manager) = setup();

    let a = manager.train(random_forest_request()).unwrap().model_id;
    let b = manager.train(random_forest_request()).unwrap().model_id;
    let c = manager.train(random_forest_request()).unwrap().model_id;
    assert_consistent(&manager);

    manager.retrain(&b, &iris_sample(), &[1, 0, 1]).unwrap();
    manager.delete(&a).unwrap();
    assert_consistent(&manager);

    let ids: Vec<String> = manager.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![b, c]);
}

#[test]
fn test_registry_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("registry.db");
    let artifacts = temp.path().join("saved_models");

    let model_id = {
        let db = Database::open(db_path.to_str().unwrap()).unwrap();
        let manager = ModelLifecycleManager::new(db, ArtifactStore::new(&artifacts));
        manager.train(random_forest_request()).unwrap().model_id
    };

    let db = Database::open(db_path.to_str().unwrap()).unwrap();
    let manager = ModelLifecycleManager::new(db, ArtifactStore::new(&artifacts));
    assert_eq!(manager.predict(&model_id, &iris_sample()).unwrap(), vec![0, 0, 1]);
}

#[test]
fn test_concurrent_trains_get_distinct_ids() {
    let (_temp, manager) = setup();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            std::thread::spawn(move || manager.train(random_forest_request()).unwrap().model_id)
        })
        .collect();
    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 4);
    assert_eq!(manager.list().unwrap().len(), 4);
    assert_consistent(&manager);
}

#[test]
fn test_concurrent_retrain_and_predict() {
    let (_temp, manager) = setup();
    let id = manager.train(random_forest_request()).unwrap().model_id;

    let writer = {
        let manager = manager.clone();
        let id = id.clone();
        std::thread::spawn(move || {
            for i in 0..5 {
                let labels = if i % 2 == 0 { [1, 1, 0] } else { [0, 0, 1] };
                manager.retrain(&id, &iris_sample(), &labels).unwrap();
            }
        })
    };
    for _ in 0..10 {
        // Atomic replacement: every read sees a complete artifact.
        assert_eq!(manager.predict(&id, &iris_sample()).unwrap().len(), 3);
    }
    writer.join().unwrap();
    assert_consistent(&manager);
}
