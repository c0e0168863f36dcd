//! Service-level commands: health and model classes.

use anyhow::{Context, Result};
use colored::Colorize;
use mlserve_core::proto::{Empty, HealthRequest};
use serde_json::json;
use std::collections::BTreeMap;

use super::output::print_json;
use crate::client;

/// Execute the health command.
pub async fn health(server: &str, json_output: bool) -> Result<()> {
    let mut client = client::connect(server).await?;
    let status = client
        .health_check(HealthRequest {})
        .await
        .context("Health check failed")?
        .into_inner()
        .status;

    if json_output {
        print_json(&json!({ "status": status, "server": server }))
    } else {
        println!("{} {} is {}", "●".green(), server, status.bold().green());
        Ok(())
    }
}

/// Execute the classes command.
pub async fn classes(server: &str, json_output: bool) -> Result<()> {
    let mut client = client::connect(server).await?;
    let classes = client
        .get_model_classes(Empty {})
        .await
        .context("Failed to fetch model classes")?
        .into_inner()
        .model_classes;
    let classes: BTreeMap<_, _> = classes.into_iter().collect();

    if json_output {
        let value: BTreeMap<_, _> = classes
            .iter()
            .map(|(name, info)| {
                (
                    name.clone(),
                    json!({
                        "class_name": info.class_name,
                        "description": info.description,
                        "hyperparameters": info.hyperparameters,
                    }),
                )
            })
            .collect();
        return print_json(&json!(value));
    }

    println!();
    println!("{}", format!("Model classes ({})", classes.len()).bold().cyan());
    println!();
    for (name, info) in &classes {
        println!("  {} {}", name.bold(), format!("({})", info.class_name).dimmed());
        println!("    {}", info.description);
        println!("    hyperparameters: {}", info.hyperparameters.join(", ").yellow());
    }
    println!();
    Ok(())
}
