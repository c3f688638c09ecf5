//! Configuration loading and management
//!
//! The client configuration decides which transports the pipeline wires in:
//! the batched-HTTP terminal is mandatory, WebSocket and upload terminals
//! are wired only when their sections are present. Configurations are
//! constructed once at process start and are immutable afterwards.

use crate::core::error::{ConfigError, GraftResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for the batched-HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// HTTP endpoint receiving batched operations (http/https)
    pub endpoint: String,

    /// How long a batch stays open after its first operation, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of operations per batch
    #[serde(default = "default_max_operations")]
    pub max_operations: usize,

    /// Extra headers sent with every batch request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_interval_ms() -> u64 {
    10
}

fn default_max_operations() -> usize {
    10
}

impl BatchConfig {
    /// Create a batch configuration with default interval and batch size
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            interval_ms: default_interval_ms(),
            max_operations: default_max_operations(),
            headers: HashMap::new(),
        }
    }
}

/// Configuration for the WebSocket subscription transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// WebSocket endpoint (ws/wss)
    pub endpoint: String,

    /// Subprotocols offered during the handshake
    ///
    /// An empty list connects without a `Sec-WebSocket-Protocol` header.
    #[serde(default = "default_protocols")]
    pub protocols: Vec<String>,
}

fn default_protocols() -> Vec<String> {
    vec!["graphql-ws".to_string()]
}

impl WebSocketConfig {
    /// Create a WebSocket configuration with the default subprotocol
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            protocols: default_protocols(),
        }
    }
}

/// Configuration for the multipart upload transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// HTTP endpoint receiving multipart requests (http/https)
    pub endpoint: String,

    /// Names of the mutations routed to this transport
    #[serde(default)]
    pub mutations: Vec<String>,
}

impl UploadConfig {
    pub fn new(endpoint: impl Into<String>, mutations: Vec<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            mutations,
        }
    }
}

/// Complete client transport configuration
///
/// `batch` is kept optional in the record so the pipeline composer can fail
/// with a configuration error when it is absent; composing a pipeline
/// without it is a startup failure, not a fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Batched-HTTP transport (mandatory at composition time)
    #[serde(default)]
    pub batch: Option<BatchConfig>,

    /// WebSocket transport for subscriptions (optional)
    #[serde(default)]
    pub websocket: Option<WebSocketConfig>,

    /// Multipart upload transport (optional)
    #[serde(default)]
    pub upload: Option<UploadConfig>,
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> GraftResult<Self> {
        if !std::path::Path::new(path).exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> GraftResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Create a batch-only configuration for testing
    pub fn default_config() -> Self {
        Self {
            batch: Some(BatchConfig::new("http://localhost:4000/graphql")),
            websocket: None,
            upload: None,
        }
    }
}
