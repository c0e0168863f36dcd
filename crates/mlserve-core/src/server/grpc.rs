//! gRPC adapter over the lifecycle manager.

use tonic::{Request, Response, Status};
use tracing::{error, info};

use mlserve_training::params::from_string_pairs;

use crate::lifecycle::{ErrorKind, LifecycleError, LifecycleResult, ModelLifecycleManager, TrainRequest};
use crate::models::proto_convert::{metrics_to_proto, rows_from_proto};
use crate::proto::model_service_server::ModelService;
use crate::proto::{
    DeleteResponse, Empty, HealthRequest, HealthResponse, ListModelsResponse, MetricsResponse,
    ModelClassesResponse, ModelId, ModelResponse, PredictRequest, PredictResponse,
    RetrainRequest, RetrainResponse, TrainResponse,
};

/// The gRPC service implementation.
#[derive(Clone)]
pub struct MlService {
    manager: ModelLifecycleManager,
}

impl MlService {
    /// Create a new service over a shared lifecycle manager.
    pub fn new(manager: ModelLifecycleManager) -> Self {
        Self { manager }
    }

    /// Runs a lifecycle call on the blocking pool and maps its error.
    async fn run<T, F>(&self, f: F) -> Result<T, Status>
    where
        T: Send + 'static,
        F: FnOnce(&ModelLifecycleManager) -> LifecycleResult<T> + Send + 'static,
    {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || f(&manager))
            .await
            .map_err(|e| {
                error!(error = %e, "Lifecycle task panicked or was cancelled");
                Status::internal("lifecycle task failed")
            })?
            .map_err(|e| lifecycle_to_status(&e))
    }
}

/// Converts a `LifecycleError` into a gRPC `Status`.
///
/// Maps not-found to `NOT_FOUND`, caller mistakes to `INVALID_ARGUMENT` and
/// everything else to `INTERNAL`.
pub fn lifecycle_to_status(err: &LifecycleError) -> Status {
    match err.kind() {
        ErrorKind::NotFound => Status::not_found(err.to_string()),
        ErrorKind::InvalidInput => Status::invalid_argument(err.to_string()),
        ErrorKind::Internal => {
            error!(operation = %err.operation(), model_id = ?err.model_id(), error = %err, "Internal error");
            Status::internal(err.to_string())
        }
    }
}

#[tonic::async_trait]
impl ModelService for MlService {
    async fn health_check(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        Ok(Response::new(HealthResponse { status: "ok".to_string() }))
    }

    async fn get_model_classes(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ModelClassesResponse>, Status> {
        let model_classes = self
            .manager
            .model_classes()
            .iter()
            .map(|info| (info.model_type.to_string(), info.into()))
            .collect();
        Ok(Response::new(ModelClassesResponse { model_classes }))
    }

    async fn train_model(
        &self,
        request: Request<crate::proto::TrainRequest>,
    ) -> Result<Response<TrainResponse>, Status> {
        let inner = request.into_inner();
        info!(model_type = %inner.model_type, rows = inner.x.len(), "Received train request");

        let train = TrainRequest {
            model_type: inner.model_type,
            hyperparameters: from_string_pairs(inner.params),
            features: rows_from_proto(inner.x),
            labels: inner.y,
        };
        let outcome = self.run(move |m| m.train(train)).await?;

        Ok(Response::new(TrainResponse {
            model_id: outcome.model_id,
            metrics: metrics_to_proto(&outcome.metrics),
        }))
    }

    async fn list_models(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ListModelsResponse>, Status> {
        let models = self.run(|m| m.list()).await?;
        Ok(Response::new(ListModelsResponse { models: models.iter().map(Into::into).collect() }))
    }

    async fn get_model(&self, request: Request<ModelId>) -> Result<Response<ModelResponse>, Status> {
        let model_id = request.into_inner().model_id;
        let summary = self.run(move |m| m.describe(&model_id)).await?;
        Ok(Response::new((&summary).into()))
    }

    async fn delete_model(
        &self,
        request: Request<ModelId>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let model_id = request.into_inner().model_id;
        self.run(move |m| m.delete(&model_id)).await?;
        Ok(Response::new(DeleteResponse { success: true }))
    }

    async fn predict(
        &self,
        request: Request<PredictRequest>,
    ) -> Result<Response<PredictResponse>, Status> {
        let inner = request.into_inner();
        let features = rows_from_proto(inner.x);
        let model_id = inner.model_id;
        let predictions = self.run(move |m| m.predict(&model_id, &features)).await?;
        Ok(Response::new(PredictResponse { predictions }))
    }

    async fn retrain_model(
        &self,
        request: Request<RetrainRequest>,
    ) -> Result<Response<RetrainResponse>, Status> {
        let inner = request.into_inner();
        let features = rows_from_proto(inner.x);
        let labels = inner.y;
        let model_id = inner.model_id;
        let metrics = self.run(move |m| m.retrain(&model_id, &features, &labels)).await?;
        Ok(Response::new(RetrainResponse { metrics: metrics_to_proto(&metrics) }))
    }

    async fn get_metrics(
        &self,
        request: Request<ModelId>,
    ) -> Result<Response<MetricsResponse>, Status> {
        let model_id = request.into_inner().model_id;
        let metrics = self.run(move |m| m.metrics(&model_id)).await?;
        Ok(Response::new(MetricsResponse { metrics: metrics_to_proto(&metrics) }))
    }
}
