//! Configuration module for mlserve Core.
//!
//! Resolution order: built-in defaults, then a TOML file (named by
//! `MLSERVE_CONFIG`, else `mlserve.toml` in the working directory when it
//! exists), then individual environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{MlServeError, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MLSERVE_CONFIG";
/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mlserve.toml";

const GRPC_ADDRESS_ENV: &str = "MLSERVE_GRPC_ADDRESS";
const HTTP_ADDRESS_ENV: &str = "MLSERVE_HTTP_ADDRESS";
const DATABASE_PATH_ENV: &str = "MLSERVE_DATABASE_PATH";
const ARTIFACT_DIR_ENV: &str = "MLSERVE_ARTIFACT_DIR";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// The address to bind the gRPC server to.
    #[serde(default = "default_grpc_address")]
    pub grpc_address: SocketAddr,
    /// The address to bind the REST server to.
    #[serde(default = "default_http_address")]
    pub http_address: SocketAddr,
    /// Enable gRPC-Web support on the gRPC listener.
    #[serde(default)]
    pub enable_grpc_web: bool,
}

fn default_grpc_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 50051))
}

fn default_http_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_address: default_grpc_address(),
            http_address: default_http_address(),
            enable_grpc_web: false,
        }
    }
}

/// Where records and artifacts live.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    /// SQLite file for the model registry; `:memory:` keeps it in memory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Directory holding one artifact per model.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

fn default_database_path() -> String {
    "mlserve.db".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("saved_models")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_path: default_database_path(), artifact_dir: default_artifact_dir() }
    }
}

/// Root configuration for mlserve.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the config file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or an
    /// override holds an invalid address.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Parse a TOML config file. Missing sections and keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MlServeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&text)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply `MLSERVE_*` overrides on top of the current values.
    ///
    /// # Errors
    ///
    /// Returns an error if an address override does not parse.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = lookup(GRPC_ADDRESS_ENV) {
            self.server.grpc_address = addr.parse()?;
            debug!(grpc_address = %self.server.grpc_address, "Override from environment");
        }
        if let Some(addr) = lookup(HTTP_ADDRESS_ENV) {
            self.server.http_address = addr.parse()?;
            debug!(http_address = %self.server.http_address, "Override from environment");
        }
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            self.storage.database_path = path;
        }
        if let Some(dir) = lookup(ARTIFACT_DIR_ENV) {
            self.storage.artifact_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.grpc_address, "127.0.0.1:50051".parse().unwrap());
        assert_eq!(config.server.http_address, "127.0.0.1:5000".parse().unwrap());
        assert!(!config.server.enable_grpc_web);
        assert_eq!(config.storage.database_path, "mlserve.db");
        assert_eq!(config.storage.artifact_dir, PathBuf::from("saved_models"));
    }

    #[test]
    fn test_config_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            grpc_address = "0.0.0.0:6000"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.grpc_address, "0.0.0.0:6000".parse().unwrap());
        assert_eq!(config.server.http_address, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("mlserve.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            enable_grpc_web = true

            [storage]
            database_path = ":memory:"
            artifact_dir = "/var/lib/mlserve/artifacts"
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.server.enable_grpc_web);
        assert_eq!(config.storage.database_path, ":memory:");
        assert_eq!(config.storage.artifact_dir, PathBuf::from("/var/lib/mlserve/artifacts"));
    }

    #[test]
    fn test_config_load_with_file_and_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[storage]\ndatabase_path = \"from-file.db\"\n").unwrap();
        let path = path.to_str().unwrap().to_string();

        let config = Config::load_with(env(&[
            (CONFIG_PATH_ENV, path.as_str()),
            ("MLSERVE_HTTP_ADDRESS", "0.0.0.0:8080"),
            ("MLSERVE_ARTIFACT_DIR", "models"),
        ]))
        .unwrap();

        assert_eq!(config.storage.database_path, "from-file.db");
        assert_eq!(config.server.http_address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.storage.artifact_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_config_missing_file_is_error() {
        let err = Config::load_with(env(&[(CONFIG_PATH_ENV, "/nonexistent/mlserve.toml")]))
            .unwrap_err();
        assert!(matches!(err, MlServeError::Config(_)));
    }

    #[test]
    fn test_config_invalid_address_override() {
        let mut config = Config::new();
        let err = config.apply_overrides(env(&[("MLSERVE_GRPC_ADDRESS", "not-an-addr")])).unwrap_err();
        assert!(matches!(err, MlServeError::InvalidAddress(_)));
    }

    #[test]
    fn test_config_invalid_toml() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(MlServeError::Toml(_))));
    }
}
