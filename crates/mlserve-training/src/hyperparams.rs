//! Supported model types and their typed hyperparameter records.

use crate::error::{TrainingError, TrainingResult};
use crate::params::{HyperparameterMap, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of classifier families the service can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    RandomForest,
    LogisticRegression,
}

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::RandomForest, ModelType::LogisticRegression];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
            Self::LogisticRegression => "logistic_regression",
        }
    }

    /// Static catalog entry for this type.
    #[must_use]
    pub fn info(self) -> &'static ModelClassInfo {
        match self {
            Self::RandomForest => &MODEL_CATALOG[0],
            Self::LogisticRegression => &MODEL_CATALOG[1],
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TrainingError::UnsupportedModelType(s.to_string()))
    }
}

/// Descriptive metadata for one supported model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelClassInfo {
    pub model_type: ModelType,
    pub class_name: &'static str,
    pub description: &'static str,
    pub hyperparameters: &'static [&'static str],
}

static MODEL_CATALOG: [ModelClassInfo; 2] = [
    ModelClassInfo {
        model_type: ModelType::RandomForest,
        class_name: "RandomForestClassifier",
        description: "Random Forest Classifier",
        hyperparameters: &["n_estimators", "max_depth", "random_state"],
    },
    ModelClassInfo {
        model_type: ModelType::LogisticRegression,
        class_name: "LogisticRegression",
        description: "Logistic Regression",
        hyperparameters: &["C", "solver", "max_iter"],
    },
];

/// The full catalog, in a stable order.
#[must_use]
pub fn model_catalog() -> &'static [ModelClassInfo] {
    &MODEL_CATALOG
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: u16,
    pub max_depth: Option<u16>,
    pub random_state: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self { n_estimators: 100, max_depth: None, random_state: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    Lbfgs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub solver: Solver,
    pub max_iter: u32,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self { c: 1.0, solver: Solver::Lbfgs, max_iter: 100 }
    }
}

impl LogisticRegressionParams {
    /// L2 penalty handed to the backend.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        1.0 / self.c
    }
}

/// Hyperparameters for a classifier, tagged by model type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum Hyperparameters {
    RandomForest(RandomForestParams),
    LogisticRegression(LogisticRegressionParams),
}

impl Hyperparameters {
    /// Builds the typed record for `model_type` from an already-normalized map.
    ///
    /// Keys outside the type's accepted set, values of the wrong type and
    /// out-of-range values are all rejected.
    pub fn from_map(model_type: ModelType, params: &HyperparameterMap) -> TrainingResult<Self> {
        let accepted = model_type.info().hyperparameters;
        if let Some(unknown) = params.keys().find(|k| !accepted.contains(&k.as_str())) {
            return Err(TrainingError::InvalidHyperparameters(format!(
                "unknown hyperparameter '{unknown}' for {model_type} (accepted: {})",
                accepted.join(", ")
            )));
        }

        match model_type {
            ModelType::RandomForest => {
                let mut rf = RandomForestParams::default();
                if let Some(v) = params.get("n_estimators") {
                    rf.n_estimators = bounded_int(v, "n_estimators", 1, i64::from(u16::MAX))? as u16;
                }
                if let Some(v) = params.get("max_depth") {
                    rf.max_depth = Some(bounded_int(v, "max_depth", 1, i64::from(u16::MAX))? as u16);
                }
                if let Some(v) = params.get("random_state") {
                    rf.random_state = bounded_int(v, "random_state", 0, i64::MAX)? as u64;
                }
                Ok(Self::RandomForest(rf))
            }
            ModelType::LogisticRegression => {
                let mut lr = LogisticRegressionParams::default();
                if let Some(v) = params.get("C") {
                    let c = v.as_f64().ok_or_else(|| wrong_type("C", "a number", v))?;
                    if !c.is_finite() || c <= 0.0 {
                        return Err(TrainingError::InvalidHyperparameters(format!(
                            "C must be a positive finite number, got {c}"
                        )));
                    }
                    lr.c = c;
                }
                if let Some(v) = params.get("solver") {
                    lr.solver = match v {
                        ParamValue::Str(s) if s == "lbfgs" => Solver::Lbfgs,
                        ParamValue::Str(s) => {
                            return Err(TrainingError::InvalidHyperparameters(format!(
                                "unsupported solver '{s}' (supported: lbfgs)"
                            )));
                        }
                        other => return Err(wrong_type("solver", "a string", other)),
                    };
                }
                if let Some(v) = params.get("max_iter") {
                    lr.max_iter = bounded_int(v, "max_iter", 1, i64::from(u32::MAX))? as u32;
                }
                Ok(Self::LogisticRegression(lr))
            }
        }
    }

    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::RandomForest(_) => ModelType::RandomForest,
            Self::LogisticRegression(_) => ModelType::LogisticRegression,
        }
    }
}

fn bounded_int(value: &ParamValue, name: &str, min: i64, max: i64) -> TrainingResult<i64> {
    match value {
        ParamValue::Int(v) if (min..=max).contains(v) => Ok(*v),
        ParamValue::Int(v) => Err(TrainingError::InvalidHyperparameters(format!(
            "{name} must be in {min}..={max}, got {v}"
        ))),
        other => Err(wrong_type(name, "an integer", other)),
    }
}

fn wrong_type(name: &str, expected: &str, got: &ParamValue) -> TrainingError {
    TrainingError::InvalidHyperparameters(format!(
        "{name} must be {expected}, got {} '{got}'",
        got.type_name()
    ))
}
