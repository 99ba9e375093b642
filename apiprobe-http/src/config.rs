//! Client configuration

use crate::errors::HttpError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for an [`ApiClient`](crate::client::ApiClient).
///
/// Deserializable from YAML so a test suite can keep per-environment
/// configuration files; every field has a default except `host`, which
/// `validate` rejects when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL; request paths are appended to it verbatim
    pub host: String,

    /// Default headers applied to every request
    pub headers: HashMap<String, String>,

    /// Disable structured request/response logging, console output and
    /// coverage recording
    pub disable_log: bool,

    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to verify SSL certificates. Off by default: test targets
    /// routinely run with self-signed certificates.
    pub verify_ssl: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            headers: HashMap::new(),
            disable_log: false,
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            verify_ssl: false,
        }
    }
}

impl ClientConfig {
    /// Configuration for the given host with all other fields defaulted
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, HttpError> {
        serde_yaml::from_str(yaml).map_err(|e| HttpError::Config(e.to_string()))
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, HttpError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HttpError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_yaml_str(&contents)
    }

    /// Validate the configuration before building a client
    pub fn validate(&self) -> Result<(), HttpError> {
        if self.host.trim().is_empty() {
            return Err(HttpError::Config("host must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(HttpError::Config("timeout must be positive".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(HttpError::Config("user_agent must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("apiprobe/{}", env!("CARGO_PKG_VERSION"))
}
