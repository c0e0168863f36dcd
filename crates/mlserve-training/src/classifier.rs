//! The fit/predict capability behind every stored model.
//!
//! A [`Classifier`] pairs typed hyperparameters with an optional fitted
//! `smartcore` estimator. It serializes as one value, which is what the
//! artifact store writes to disk.

use crate::dataset::{validate_features, validate_training_set, Label};
use crate::error::{TrainingError, TrainingResult};
use crate::hyperparams::{Hyperparameters, LogisticRegressionParams, ModelType, RandomForestParams, Solver};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{
    LogisticRegression, LogisticRegressionParameters, LogisticRegressionSolverName,
};
use std::fmt;
use tracing::debug;

type Matrix = DenseMatrix<f64>;
type RandomForestEstimator = RandomForestClassifier<f64, Label, Matrix, Vec<Label>>;
type LogisticRegressionEstimator = LogisticRegression<f64, Label, Matrix, Vec<Label>>;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Estimator {
    RandomForest(RandomForestEstimator),
    LogisticRegression(LogisticRegressionEstimator),
    /// A forest grown on one class can only ever vote for it.
    SingleClass(Label),
}

#[derive(Serialize, Deserialize)]
struct Fitted {
    n_features: usize,
    estimator: Estimator,
}

#[derive(Serialize, Deserialize)]
pub struct Classifier {
    hyperparameters: Hyperparameters,
    fitted: Option<Fitted>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("hyperparameters", &self.hyperparameters)
            .field("n_features", &self.n_features())
            .finish()
    }
}

impl Classifier {
    /// Creates an unfitted classifier.
    #[must_use]
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self { hyperparameters, fitted: None }
    }

    #[must_use]
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    #[must_use]
    pub fn model_type(&self) -> ModelType {
        self.hyperparameters.model_type()
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Column count seen by the last successful `fit`.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Fits on `(rows, labels)`, replacing any previous fit.
    ///
    /// The backend refits from scratch with the stored hyperparameters. On
    /// failure the previous fit is kept.
    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[Label]) -> TrainingResult<()> {
        let n_features = validate_training_set(rows, labels)?;
        let x = Matrix::from_2d_vec(&rows.to_vec());
        let y = labels.to_vec();

        let estimator = match &self.hyperparameters {
            Hyperparameters::RandomForest(_) if labels.iter().all(|l| *l == labels[0]) => {
                Estimator::SingleClass(labels[0])
            }
            Hyperparameters::RandomForest(params) => {
                let fitted = RandomForestClassifier::fit(&x, &y, random_forest_parameters(params))
                    .map_err(|e| TrainingError::Fit(e.to_string()))?;
                Estimator::RandomForest(fitted)
            }
            Hyperparameters::LogisticRegression(params) => {
                let fitted = LogisticRegression::fit(&x, &y, logistic_regression_parameters(params))
                    .map_err(|e| TrainingError::Fit(e.to_string()))?;
                Estimator::LogisticRegression(fitted)
            }
        };

        debug!(model_type = %self.model_type(), samples = rows.len(), n_features, "Classifier fitted");
        self.fitted = Some(Fitted { n_features, estimator });
        Ok(())
    }

    /// Predicts a label for each row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> TrainingResult<Vec<Label>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| TrainingError::Prediction("classifier has not been fitted".to_string()))?;
        let n_features = validate_features(rows).map_err(|e| match e {
            TrainingError::InvalidDataset(msg) => TrainingError::Prediction(msg),
            other => other,
        })?;
        if n_features != fitted.n_features {
            return Err(TrainingError::Prediction(format!(
                "expected {} features per row, got {n_features}",
                fitted.n_features
            )));
        }

        let x = Matrix::from_2d_vec(&rows.to_vec());
        let predictions = match &fitted.estimator {
            Estimator::RandomForest(model) => model.predict(&x),
            Estimator::LogisticRegression(model) => model.predict(&x),
            Estimator::SingleClass(label) => Ok(vec![*label; rows.len()]),
        };
        predictions.map_err(|e| TrainingError::Prediction(e.to_string()))
    }
}

fn random_forest_parameters(params: &RandomForestParams) -> RandomForestClassifierParameters {
    let mut parameters = RandomForestClassifierParameters::default()
        .with_n_trees(params.n_estimators)
        .with_seed(params.random_state);
    if let Some(depth) = params.max_depth {
        parameters = parameters.with_max_depth(depth);
    }
    parameters
}

fn logistic_regression_parameters(params: &LogisticRegressionParams) -> LogisticRegressionParameters<f64> {
    let solver = match params.solver {
        Solver::Lbfgs => LogisticRegressionSolverName::LBFGS,
    };
    LogisticRegressionParameters::default().with_solver(solver).with_alpha(params.alpha())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iris_sample() -> (Vec<Vec<f64>>, Vec<Label>) {
        (
            vec![
                vec![5.1, 3.5, 1.4, 0.2],
                vec![4.9, 3.0, 1.4, 0.2],
                vec![7.0, 3.2, 4.7, 1.4],
            ],
            vec![0, 0, 1],
        )
    }

    fn separable() -> (Vec<Vec<f64>>, Vec<Label>) {
        (
            vec![
                vec![0.0, 0.1],
                vec![0.2, 0.0],
                vec![0.1, 0.3],
                vec![5.0, 5.2],
                vec![5.3, 4.9],
                vec![4.8, 5.1],
            ],
            vec![0, 0, 0, 1, 1, 1],
        )
    }

    #[test]
    fn test_random_forest_fits_separable_sample() {
        let (x, y) = iris_sample();
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams {
            n_estimators: 10,
            max_depth: Some(5),
            random_state: 0,
        }));
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.n_features(), Some(4));
        assert_eq!(clf.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_logistic_regression_predicts_one_label_per_row() {
        let (x, y) = separable();
        let mut clf = Classifier::new(Hyperparameters::LogisticRegression(LogisticRegressionParams::default()));
        clf.fit(&x, &y).unwrap();
        let predictions = clf.predict(&x).unwrap();
        assert_eq!(predictions.len(), x.len());
        assert!(predictions.iter().all(|p| *p == 0 || *p == 1));
    }

    #[test]
    fn test_random_forest_accepts_single_class() {
        let (x, _) = separable();
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams {
            n_estimators: 5,
            ..RandomForestParams::default()
        }));
        clf.fit(&x, &[2; 6]).unwrap();
        assert_eq!(clf.predict(&[vec![0.0, 0.0], vec![9.0, 9.0]]).unwrap(), vec![2, 2]);

        let restored: Classifier = serde_json::from_slice(&serde_json::to_vec(&clf).unwrap()).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), vec![2; 6]);

        // Refitting on two classes replaces the constant vote.
        let (x, y) = separable();
        clf.fit(&x, &y).unwrap();
        assert!(clf.predict(&x).unwrap().iter().all(|p| *p == 0 || *p == 1));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams::default()));
        assert!(matches!(clf.predict(&[vec![1.0]]), Err(TrainingError::Prediction(_))));
    }

    #[test]
    fn test_predict_rejects_feature_count_mismatch() {
        let (x, y) = separable();
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams {
            n_estimators: 5,
            ..RandomForestParams::default()
        }));
        clf.fit(&x, &y).unwrap();
        let err = clf.predict(&[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, TrainingError::Prediction(msg) if msg.contains("expected 2")));
    }

    #[test]
    fn test_fit_rejects_invalid_dataset_without_touching_state() {
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams::default()));
        let err = clf.fit(&[vec![1.0, 2.0]], &[0, 1]).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidDataset(_)));
        assert!(!clf.is_fitted());
    }

    #[test]
    fn test_classifier_survives_json_round_trip() {
        let (x, y) = separable();
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams {
            n_estimators: 5,
            max_depth: Some(3),
            random_state: 7,
        }));
        clf.fit(&x, &y).unwrap();
        let before = clf.predict(&x).unwrap();

        let bytes = serde_json::to_vec(&clf).unwrap();
        let restored: Classifier = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(restored.hyperparameters(), clf.hyperparameters());
        assert_eq!(restored.predict(&x).unwrap(), before);
    }
}
