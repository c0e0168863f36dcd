//! REST adapter over the lifecycle manager.
//!
//! JSON in, JSON out. Feature matrices travel under the key `X`, labels under
//! `y`; hyperparameter values are JSON scalars.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mlserve_training::{ClassificationMetrics, HyperparameterMap, Label, ModelClassInfo};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::lifecycle::{ErrorKind, LifecycleError, LifecycleResult, ModelLifecycleManager, TrainRequest};
use crate::models::ModelSummary;
use crate::server::logging::RequestLoggerLayer;

/// Body of `POST /models/train`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainBody {
    pub model_type: String,
    #[serde(default)]
    pub params: HyperparameterMap,
    #[serde(rename = "X")]
    pub features: Vec<Vec<f64>>,
    pub y: Vec<Label>,
}

/// Body of `POST /models/{id}/predict`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictBody {
    #[serde(rename = "X")]
    pub features: Vec<Vec<f64>>,
}

/// Body of `POST /models/{id}/retrain`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrainBody {
    #[serde(rename = "X")]
    pub features: Vec<Vec<f64>>,
    pub y: Vec<Label>,
}

#[derive(Debug, Serialize)]
struct TrainReply {
    model_id: String,
    metrics: ClassificationMetrics,
}

#[derive(Debug, Serialize)]
struct PredictReply {
    predictions: Vec<Label>,
}

#[derive(Debug, Serialize)]
struct RetrainReply {
    status: &'static str,
    metrics: ClassificationMetrics,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<String>,
}

/// An error rendered as a JSON body with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody { error: message.into(), operation: None, model_id: None },
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => {
                error!(operation = %err.operation(), model_id = ?err.model_id(), error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                operation: Some(err.operation().as_str()),
                model_id: err.model_id().map(ToString::to_string),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody { error: rejection.body_text(), operation: None, model_id: None },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Runs a lifecycle call on the blocking pool.
async fn blocking<T, F>(manager: ModelLifecycleManager, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ModelLifecycleManager) -> LifecycleResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&manager))
        .await
        .map_err(|e| {
            error!(error = %e, "Lifecycle task panicked or was cancelled");
            ApiError::internal("lifecycle task failed")
        })?
        .map_err(ApiError::from)
}

/// Builds the REST router.
pub fn router(manager: ModelLifecycleManager) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/model-classes", get(model_classes))
        .route("/models/train", post(train))
        .route("/models", get(list_models))
        .route("/models/:id", get(get_model).delete(delete_model))
        .route("/models/:id/predict", post(predict))
        .route("/models/:id/retrain", post(retrain))
        .route("/metrics/:id", get(get_metrics))
        .layer(RequestLoggerLayer)
        .with_state(manager)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn model_classes(
    State(manager): State<ModelLifecycleManager>,
) -> Json<BTreeMap<&'static str, &'static ModelClassInfo>> {
    Json(manager.model_classes().iter().map(|info| (info.model_type.as_str(), info)).collect())
}

async fn train(
    State(manager): State<ModelLifecycleManager>,
    body: Result<Json<TrainBody>, JsonRejection>,
) -> Result<(StatusCode, Json<TrainReply>), ApiError> {
    let Json(body) = body?;
    let request = TrainRequest {
        model_type: body.model_type,
        hyperparameters: body.params,
        features: body.features,
        labels: body.y,
    };
    let outcome = blocking(manager, move |m| m.train(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(TrainReply { model_id: outcome.model_id, metrics: outcome.metrics }),
    ))
}

async fn list_models(
    State(manager): State<ModelLifecycleManager>,
) -> Result<Json<Vec<ModelSummary>>, ApiError> {
    Ok(Json(blocking(manager, |m| m.list()).await?))
}

async fn get_model(
    State(manager): State<ModelLifecycleManager>,
    Path(id): Path<String>,
) -> Result<Json<ModelSummary>, ApiError> {
    Ok(Json(blocking(manager, move |m| m.describe(&id)).await?))
}

async fn delete_model(
    State(manager): State<ModelLifecycleManager>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    blocking(manager, move |m| m.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn predict(
    State(manager): State<ModelLifecycleManager>,
    Path(id): Path<String>,
    body: Result<Json<PredictBody>, JsonRejection>,
) -> Result<Json<PredictReply>, ApiError> {
    let Json(body) = body?;
    let predictions = blocking(manager, move |m| m.predict(&id, &body.features)).await?;
    Ok(Json(PredictReply { predictions }))
}

async fn retrain(
    State(manager): State<ModelLifecycleManager>,
    Path(id): Path<String>,
    body: Result<Json<RetrainBody>, JsonRejection>,
) -> Result<Json<RetrainReply>, ApiError> {
    let Json(body) = body?;
    let metrics = blocking(manager, move |m| m.retrain(&id, &body.features, &body.y)).await?;
    Ok(Json(RetrainReply { status: "retrained", metrics }))
}

async fn get_metrics(
    State(manager): State<ModelLifecycleManager>,
    Path(id): Path<String>,
) -> Result<Json<ClassificationMetrics>, ApiError> {
    Ok(Json(blocking(manager, move |m| m.metrics(&id)).await?))
}
