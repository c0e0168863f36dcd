//! Connection to the mlserve gRPC server with retry logic.

use anyhow::{Context, Result};
use mlserve_core::ModelServiceClient;
use std::time::Duration;
use tokio::time::sleep;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

/// Server URL used when `--server` is not given.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:50051";

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Connects to `url`, retrying with exponential backoff.
///
/// # Errors
/// Returns an error if the URL is invalid or every attempt fails.
pub async fn connect(url: &str) -> Result<ModelServiceClient<Channel>> {
    let endpoint = Endpoint::from_shared(url.to_string())
        .with_context(|| format!("Invalid server URL: {url}"))?
        .connect_timeout(Duration::from_secs(5));

    info!(url, "Connecting to server");
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match endpoint.connect().await {
            Ok(channel) => {
                debug!(attempt, "Connected");
                return Ok(ModelServiceClient::new(channel));
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                debug!(
                    attempt,
                    delay_ms = retry_delay.as_millis(),
                    error = %e,
                    "Connection failed, retrying"
                );
                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to {url} after {MAX_ATTEMPTS} attempts")
                });
            }
        }
    }
}
