//! Shared rendering for command output.

use colored::Colorize;
use mlserve_core::proto::ModelResponse;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

/// Metrics in a stable key order.
pub fn sorted_metrics(metrics: &HashMap<String, f64>) -> BTreeMap<&str, f64> {
    metrics.iter().map(|(k, v)| (k.as_str(), *v)).collect()
}

pub fn model_json(model: &ModelResponse) -> Value {
    let params: BTreeMap<_, _> = model.params.iter().collect();
    json!({
        "id": model.id,
        "model_type": model.model_type,
        "params": params,
        "created_at": model.created_at,
        "metrics": sorted_metrics(&model.metrics),
    })
}

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_metrics(metrics: &HashMap<String, f64>) {
    for (name, value) in sorted_metrics(metrics) {
        println!("  {:<12} {}", format!("{name}:").dimmed(), format!("{value:.4}").green());
    }
}

pub fn print_model(model: &ModelResponse) {
    println!("{}", model.id.bold().cyan());
    println!("  {:<12} {}", "type:".dimmed(), model.model_type);
    println!("  {:<12} {}", "created:".dimmed(), model.created_at);
    if !model.params.is_empty() {
        let params: BTreeMap<_, _> = model.params.iter().collect();
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  {:<12} {}", "params:".dimmed(), rendered.join(", "));
    }
    print_metrics(&model.metrics);
}
