//! Typed error handling for the graft crate
//!
//! This module provides a typed error hierarchy that enables callers to
//! handle errors specifically rather than dealing with generic
//! `anyhow::Error` values.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: Errors related to configuration parsing and validation
//! - [`RegistryError`]: Errors related to resolver registration and lookup
//! - [`GraphQLError`]: Errors related to GraphQL documents and execution
//! - [`TransportError`]: Errors related to the outgoing transports
//!
//! # Example
//!
//! ```rust,ignore
//! use graft::prelude::*;
//!
//! match TransportPipeline::from_config(&config) {
//!     Ok(pipeline) => { /* ... */ }
//!     Err(GraftError::Config(ConfigError::MissingField { field, .. })) => {
//!         eprintln!("configuration is missing '{}'", field);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the graft crate
///
/// This enum encompasses all possible errors that can occur within the crate.
/// Each variant contains a more specific error type for that category.
#[derive(Debug)]
pub enum GraftError {
    /// Configuration errors
    Config(ConfigError),

    /// Resolver registry errors
    Registry(RegistryError),

    /// GraphQL document and execution errors
    GraphQL(GraphQLError),

    /// Transport errors (HTTP batch, WebSocket, upload)
    Transport(TransportError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for GraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraftError::Config(e) => write!(f, "{}", e),
            GraftError::Registry(e) => write!(f, "{}", e),
            GraftError::GraphQL(e) => write!(f, "{}", e),
            GraftError::Transport(e) => write!(f, "{}", e),
            GraftError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for GraftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraftError::Config(e) => Some(e),
            GraftError::Registry(e) => Some(e),
            GraftError::GraphQL(e) => Some(e),
            GraftError::Transport(e) => Some(e),
            GraftError::Internal(_) => None,
        }
    }
}

/// GraphQL-style error response body
///
/// Serializes to the `{"errors": [...]}` shape GraphQL clients expect, with
/// the machine-readable code carried under `extensions`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorEntry>,
}

/// A single entry in the `errors` array
#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    /// Human-readable error message
    pub message: String,
    /// Machine-readable metadata
    pub extensions: ErrorExtensions,
}

/// Extensions attached to an error entry
#[derive(Debug, Serialize)]
pub struct ErrorExtensions {
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GraftError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GraftError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GraftError::Registry(e) => e.status_code(),
            GraftError::GraphQL(e) => e.status_code(),
            GraftError::Transport(_) => StatusCode::BAD_GATEWAY,
            GraftError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GraftError::Config(_) => "CONFIG_ERROR",
            GraftError::Registry(e) => e.error_code(),
            GraftError::GraphQL(e) => e.error_code(),
            GraftError::Transport(e) => e.error_code(),
            GraftError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a GraphQL-style error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            errors: vec![ErrorEntry {
                message: self.to_string(),
                extensions: ErrorExtensions {
                    code: self.error_code().to_string(),
                    details: self.details(),
                },
            }],
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GraftError::Registry(RegistryError::AlreadyRegistered { entity }) => {
                Some(serde_json::json!({ "entity": entity }))
            }
            GraftError::GraphQL(GraphQLError::UnknownField { field }) => {
                Some(serde_json::json!({ "field": field }))
            }
            GraftError::GraphQL(GraphQLError::VariableNotProvided { variable }) => {
                Some(serde_json::json!({ "variable": variable }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for GraftError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Missing required field in configuration
    MissingField {
        field: String,
        context: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound {
        path: String,
    },

    /// IO error while reading configuration
    IoError {
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::MissingField { field, context } => {
                write!(f, "Missing required field '{}' in {}", field, context)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for GraftError {
    fn from(err: ConfigError) -> Self {
        GraftError::Config(err)
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors related to the resolver registry
#[derive(Debug)]
pub enum RegistryError {
    /// An entity delegate was registered twice under the same name
    AlreadyRegistered {
        entity: String,
    },

    /// The entity name is not a valid PascalCase identifier
    InvalidEntityName {
        entity: String,
        message: String,
    },

    /// An operation referenced an entity with no registered delegate
    UnknownEntity {
        entity: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyRegistered { entity } => {
                write!(f, "Entity '{}' is already registered", entity)
            }
            RegistryError::InvalidEntityName { entity, message } => {
                write!(f, "Invalid entity name '{}': {}", entity, message)
            }
            RegistryError::UnknownEntity { entity } => {
                write!(f, "No delegate registered for entity '{}'", entity)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::AlreadyRegistered { .. } => StatusCode::CONFLICT,
            RegistryError::InvalidEntityName { .. } => StatusCode::BAD_REQUEST,
            RegistryError::UnknownEntity { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::AlreadyRegistered { .. } => "ENTITY_ALREADY_REGISTERED",
            RegistryError::InvalidEntityName { .. } => "INVALID_ENTITY_NAME",
            RegistryError::UnknownEntity { .. } => "UNKNOWN_ENTITY",
        }
    }
}

impl From<RegistryError> for GraftError {
    fn from(err: RegistryError) -> Self {
        GraftError::Registry(err)
    }
}

// =============================================================================
// GraphQL Errors
// =============================================================================

/// Errors related to GraphQL documents and execution
#[derive(Debug)]
pub enum GraphQLError {
    /// Document parsing error
    ParseError {
        message: String,
    },

    /// Invalid operation (wrong kind, unsupported operation)
    InvalidOperation {
        operation: String,
        message: String,
    },

    /// Top-level field does not map to any supported operation
    UnknownField {
        field: String,
    },

    /// A referenced variable was not provided
    VariableNotProvided {
        variable: String,
    },

    /// Execution error
    ExecutionError {
        message: String,
    },
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQLError::ParseError { message } => {
                write!(f, "GraphQL parse error: {}", message)
            }
            GraphQLError::InvalidOperation { operation, message } => {
                write!(f, "Invalid GraphQL operation '{}': {}", operation, message)
            }
            GraphQLError::UnknownField { field } => {
                write!(f, "Unknown field '{}'", field)
            }
            GraphQLError::VariableNotProvided { variable } => {
                write!(f, "Variable '${}' was not provided", variable)
            }
            GraphQLError::ExecutionError { message } => {
                write!(f, "GraphQL execution error: {}", message)
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GraphQLError::ParseError { .. } => StatusCode::BAD_REQUEST,
            GraphQLError::InvalidOperation { .. } => StatusCode::BAD_REQUEST,
            GraphQLError::UnknownField { .. } => StatusCode::BAD_REQUEST,
            GraphQLError::VariableNotProvided { .. } => StatusCode::BAD_REQUEST,
            GraphQLError::ExecutionError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GraphQLError::ParseError { .. } => "GRAPHQL_PARSE_ERROR",
            GraphQLError::InvalidOperation { .. } => "GRAPHQL_INVALID_OPERATION",
            GraphQLError::UnknownField { .. } => "GRAPHQL_UNKNOWN_FIELD",
            GraphQLError::VariableNotProvided { .. } => "GRAPHQL_VARIABLE_NOT_PROVIDED",
            GraphQLError::ExecutionError { .. } => "GRAPHQL_EXECUTION_ERROR",
        }
    }
}

impl From<GraphQLError> for GraftError {
    fn from(err: GraphQLError) -> Self {
        GraftError::GraphQL(err)
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors related to the outgoing transports
#[derive(Debug)]
pub enum TransportError {
    /// Network-level failure (connection refused, TLS, HTTP status)
    Network {
        message: String,
    },

    /// The peer violated the wire protocol (bad frame, arity mismatch)
    Protocol {
        message: String,
    },

    /// The WebSocket handshake failed
    Handshake {
        endpoint: String,
        message: String,
    },

    /// The connection closed while operations were in flight
    ConnectionClosed {
        message: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network { message } => {
                write!(f, "Transport network error: {}", message)
            }
            TransportError::Protocol { message } => {
                write!(f, "Transport protocol error: {}", message)
            }
            TransportError::Handshake { endpoint, message } => {
                write!(f, "Handshake with '{}' failed: {}", endpoint, message)
            }
            TransportError::ConnectionClosed { message } => {
                write!(f, "Connection closed: {}", message)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Network { .. } => "TRANSPORT_NETWORK_ERROR",
            TransportError::Protocol { .. } => "TRANSPORT_PROTOCOL_ERROR",
            TransportError::Handshake { .. } => "TRANSPORT_HANDSHAKE_ERROR",
            TransportError::ConnectionClosed { .. } => "TRANSPORT_CONNECTION_CLOSED",
        }
    }
}

impl From<TransportError> for GraftError {
    fn from(err: TransportError) -> Self {
        GraftError::Transport(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for GraftError {
    fn from(err: serde_json::Error) -> Self {
        GraftError::Transport(TransportError::Protocol {
            message: format!("invalid JSON: {}", err),
        })
    }
}

impl From<std::io::Error> for GraftError {
    fn from(err: std::io::Error) -> Self {
        GraftError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for GraftError {
    fn from(err: serde_yaml::Error) -> Self {
        GraftError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<reqwest::Error> for GraftError {
    fn from(err: reqwest::Error) -> Self {
        GraftError::Transport(TransportError::Network {
            message: err.to_string(),
        })
    }
}

/// Recover a typed error from an `anyhow::Error` chain
///
/// Resolver seams return `anyhow::Result`; when a typed error crossed that
/// boundary it is recovered here instead of being flattened to a string.
impl From<anyhow::Error> for GraftError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<GraftError>() {
            Ok(graft) => graft,
            Err(other) => GraftError::Internal(other.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for graft operations
pub type GraftResult<T> = Result<T, GraftError>;

// =============================================================================
// Tests
// =============================================================================
