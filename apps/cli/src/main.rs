//! mlserve CLI - command-line client for the mlserve gRPC service
//!
//! This CLI provides an `mls` command for training, inspecting and querying
//! models on a running `mlserve-server`.

mod client;
mod commands;
mod data;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{models, service};

/// mlserve CLI - train and query classifiers over gRPC
#[derive(Parser, Debug)]
#[command(name = "mls", author, version, about = "mlserve - model lifecycle client")]
struct Args {
    /// Server URL
    #[arg(long, global = true, default_value = client::DEFAULT_SERVER)]
    server: String,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up
    Health,

    /// List the supported model types and their hyperparameters
    Classes,

    /// Train a new model
    ///
    /// Reads `{"X": [[...]], "y": [...]}` from the data file.
    Train {
        /// Model type (random_forest, logistic_regression)
        model_type: String,

        /// JSON data file with `X` and `y`
        #[arg(short, long)]
        data: PathBuf,

        /// Hyperparameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = data::parse_param)]
        params: Vec<(String, String)>,
    },

    /// List all models
    List,

    /// Show one model
    Get {
        /// Model ID
        model_id: String,
    },

    /// Delete a model and its artifact
    Delete {
        /// Model ID
        model_id: String,
    },

    /// Predict labels for the rows in a data file
    Predict {
        /// Model ID
        model_id: String,

        /// JSON data file with `X`
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Refit a model on new data
    Retrain {
        /// Model ID
        model_id: String,

        /// JSON data file with `X` and `y`
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Show the latest metrics of a model
    Metrics {
        /// Model ID
        model_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let server = args.server.as_str();
    let json = args.json;
    match args.command {
        Command::Health => service::health(server, json).await,
        Command::Classes => service::classes(server, json).await,
        Command::Train { model_type, data, params } => {
            models::train(server, json, model_type, &data, params).await
        }
        Command::List => models::list(server, json).await,
        Command::Get { model_id } => models::get(server, json, model_id).await,
        Command::Delete { model_id } => models::delete(server, json, model_id).await,
        Command::Predict { model_id, data } => models::predict(server, json, model_id, &data).await,
        Command::Retrain { model_id, data } => models::retrain(server, json, model_id, &data).await,
        Command::Metrics { model_id } => models::metrics(server, json, model_id).await,
    }
}
