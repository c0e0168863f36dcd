//! Data files and hyperparameter arguments.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

/// Contents of a `--data` file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataFile {
    #[serde(rename = "X")]
    pub features: Vec<Vec<f64>>,
    #[serde(default)]
    pub y: Option<Vec<i64>>,
}

impl DataFile {
    /// Reads and parses a data file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse data file {}", path.display()))
    }

    /// Returns the labels, failing when the file has none.
    pub fn labels(&self, path: &Path) -> Result<Vec<i64>> {
        match &self.y {
            Some(y) => Ok(y.clone()),
            None => bail!("Data file {} has no \"y\" labels", path.display()),
        }
    }
}

/// Parses `key=value` into a pair. The value is sent verbatim; the server
/// turns numeric strings back into numbers.
pub fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}
