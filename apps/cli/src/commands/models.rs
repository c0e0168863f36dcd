//! Model commands: train, list, get, delete, predict, retrain, metrics.

use anyhow::{Context, Result};
use colored::Colorize;
use mlserve_core::models::proto_convert::rows_to_proto;
use mlserve_core::proto::{Empty, ModelId, PredictRequest, RetrainRequest, TrainRequest};
use serde_json::json;
use std::path::Path;

use super::output::{model_json, print_json, print_metrics, print_model, sorted_metrics};
use crate::client;
use crate::data::DataFile;

/// Execute the train command.
pub async fn train(
    server: &str,
    json_output: bool,
    model_type: String,
    data_path: &Path,
    params: Vec<(String, String)>,
) -> Result<()> {
    let data = DataFile::load(data_path)?;
    let labels = data.labels(data_path)?;
    let rows = data.features.len();

    let mut client = client::connect(server).await?;
    let response = client
        .train_model(TrainRequest {
            model_type: model_type.clone(),
            params: params.into_iter().collect(),
            x: rows_to_proto(data.features),
            y: labels,
        })
        .await
        .with_context(|| format!("Failed to train {model_type} model"))?
        .into_inner();

    if json_output {
        return print_json(&json!({
            "model_id": response.model_id,
            "metrics": sorted_metrics(&response.metrics),
        }));
    }

    println!(
        "{} Trained {} on {} rows",
        "✓".green(),
        model_type.bold(),
        rows
    );
    println!("  {:<12} {}", "model id:".dimmed(), response.model_id.cyan());
    print_metrics(&response.metrics);
    Ok(())
}

/// Execute the list command.
pub async fn list(server: &str, json_output: bool) -> Result<()> {
    let mut client = client::connect(server).await?;
    let models =
        client.list_models(Empty {}).await.context("Failed to list models")?.into_inner().models;

    if json_output {
        return print_json(&json!(models.iter().map(model_json).collect::<Vec<_>>()));
    }

    if models.is_empty() {
        println!("{}", "No models trained yet.".yellow());
        return Ok(());
    }
    println!();
    println!("{}", format!("Models ({})", models.len()).bold().cyan());
    println!();
    for model in &models {
        print_model(model);
        println!();
    }
    Ok(())
}

/// Execute the get command.
pub async fn get(server: &str, json_output: bool, model_id: String) -> Result<()> {
    let mut client = client::connect(server).await?;
    let model = client
        .get_model(ModelId { model_id: model_id.clone() })
        .await
        .with_context(|| format!("Failed to get model {model_id}"))?
        .into_inner();

    if json_output {
        print_json(&model_json(&model))
    } else {
        print_model(&model);
        Ok(())
    }
}

/// Execute the delete command.
pub async fn delete(server: &str, json_output: bool, model_id: String) -> Result<()> {
    let mut client = client::connect(server).await?;
    let success = client
        .delete_model(ModelId { model_id: model_id.clone() })
        .await
        .with_context(|| format!("Failed to delete model {model_id}"))?
        .into_inner()
        .success;

    if json_output {
        print_json(&json!({ "model_id": model_id, "success": success }))
    } else {
        println!("{} Deleted model {}", "✓".green(), model_id.cyan());
        Ok(())
    }
}

/// Execute the predict command.
pub async fn predict(
    server: &str,
    json_output: bool,
    model_id: String,
    data_path: &Path,
) -> Result<()> {
    let data = DataFile::load(data_path)?;

    let mut client = client::connect(server).await?;
    let predictions = client
        .predict(PredictRequest { model_id: model_id.clone(), x: rows_to_proto(data.features) })
        .await
        .with_context(|| format!("Prediction with model {model_id} failed"))?
        .into_inner()
        .predictions;

    if json_output {
        return print_json(&json!({ "predictions": predictions }));
    }
    for (row, label) in predictions.iter().enumerate() {
        println!("  {:<6} {}", format!("#{row}").dimmed(), label.to_string().bold());
    }
    Ok(())
}

/// Execute the retrain command.
pub async fn retrain(
    server: &str,
    json_output: bool,
    model_id: String,
    data_path: &Path,
) -> Result<()> {
    let data = DataFile::load(data_path)?;
    let labels = data.labels(data_path)?;

    let mut client = client::connect(server).await?;
    let metrics = client
        .retrain_model(RetrainRequest {
            model_id: model_id.clone(),
            x: rows_to_proto(data.features),
            y: labels,
        })
        .await
        .with_context(|| format!("Failed to retrain model {model_id}"))?
        .into_inner()
        .metrics;

    if json_output {
        return print_json(&json!({
            "status": "retrained",
            "metrics": sorted_metrics(&metrics),
        }));
    }
    println!("{} Retrained model {}", "✓".green(), model_id.cyan());
    print_metrics(&metrics);
    Ok(())
}

/// Execute the metrics command.
pub async fn metrics(server: &str, json_output: bool, model_id: String) -> Result<()> {
    let mut client = client::connect(server).await?;
    let metrics = client
        .get_metrics(ModelId { model_id: model_id.clone() })
        .await
        .with_context(|| format!("Failed to get metrics for model {model_id}"))?
        .into_inner()
        .metrics;

    if json_output {
        print_json(&json!(sorted_metrics(&metrics)))
    } else {
        println!("{}", model_id.bold().cyan());
        print_metrics(&metrics);
        Ok(())
    }
}
