//! Conversions between proto messages and domain types.

use std::collections::HashMap;

use chrono::SecondsFormat;
use mlserve_training::{ClassificationMetrics, HyperparameterMap, ModelClassInfo};

use crate::models::ModelSummary;
use crate::proto;

/// Flattens proto feature rows into a plain matrix.
pub fn rows_from_proto(rows: Vec<proto::FeatureArray>) -> Vec<Vec<f64>> {
    rows.into_iter().map(|row| row.features).collect()
}

/// Wraps a plain matrix into proto feature rows.
pub fn rows_to_proto(rows: Vec<Vec<f64>>) -> Vec<proto::FeatureArray> {
    rows.into_iter().map(|features| proto::FeatureArray { features }).collect()
}

/// Renders metrics as the proto string-to-double map.
pub fn metrics_to_proto(metrics: &ClassificationMetrics) -> HashMap<String, f64> {
    metrics.to_map().into_iter().collect()
}

/// Renders hyperparameters as strings; the normalizer turns them back.
pub fn params_to_proto(params: &HyperparameterMap) -> HashMap<String, String> {
    params.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
}

impl From<&ModelSummary> for proto::ModelResponse {
    fn from(summary: &ModelSummary) -> Self {
        Self {
            id: summary.id.clone(),
            model_type: summary.model_type.to_string(),
            params: params_to_proto(&summary.params),
            created_at: summary.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            metrics: metrics_to_proto(&summary.metrics),
        }
    }
}

impl From<&ModelClassInfo> for proto::ModelClassInfo {
    fn from(info: &ModelClassInfo) -> Self {
        Self {
            class_name: info.class_name.to_string(),
            hyperparameters: info.hyperparameters.iter().map(ToString::to_string).collect(),
            description: info.description.to_string(),
        }
    }
}
