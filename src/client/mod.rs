//! Client facade over the transport pipeline
//!
//! [`GraphQLClient`] owns a composed [`TransportPipeline`] and is the type
//! application code holds: build it once (from a [`ClientConfig`] or the
//! fluent [`ClientBuilder`]), then send operations through it for the life
//! of the process.

use crate::config::{BatchConfig, ClientConfig, UploadConfig, WebSocketConfig};
use crate::core::error::{GraftResult, GraphQLError};
use crate::core::operation::Operation;
use crate::transport::ResponseStream;
use crate::transport::pipeline::{TransportPipeline, TransportRoute};
use futures::StreamExt;
use serde_json::Value;

/// GraphQL client over the composed transport pipeline
#[derive(Debug)]
pub struct GraphQLClient {
    pipeline: TransportPipeline,
}

impl GraphQLClient {
    /// Start building a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from a complete configuration
    ///
    /// Fails when the mandatory batch section is absent or any endpoint is
    /// invalid. Must be called from within a Tokio runtime.
    pub fn from_config(config: &ClientConfig) -> GraftResult<Self> {
        Ok(Self {
            pipeline: TransportPipeline::from_config(config)?,
        })
    }

    /// Which terminal transport an operation would use
    pub fn route(&self, operation: &Operation) -> TransportRoute {
        self.pipeline.route(operation)
    }

    /// Send one operation and return its response stream
    ///
    /// Works for every operation kind: HTTP-bound operations produce a
    /// single-item stream, subscriptions produce an item per event.
    pub async fn request(&self, operation: Operation) -> GraftResult<ResponseStream> {
        self.pipeline.request(operation).await
    }

    /// Send one query or mutation and return its single response
    ///
    /// Subscriptions are rejected here: their result is a stream, not a
    /// value. Use [`subscribe`](Self::subscribe) instead.
    pub async fn execute(&self, operation: Operation) -> GraftResult<Value> {
        if operation.is_subscription() {
            return Err(GraphQLError::InvalidOperation {
                operation: operation
                    .operation_name
                    .unwrap_or_else(|| "subscription".to_string()),
                message: "subscriptions produce a stream; use subscribe()".to_string(),
            }
            .into());
        }

        let mut stream = self.pipeline.request(operation).await?;
        match stream.next().await {
            Some(result) => result,
            None => Err(crate::core::error::TransportError::Protocol {
                message: "transport produced no response".to_string(),
            }
            .into()),
        }
    }

    /// Start a subscription and return its event stream
    ///
    /// Non-subscription operations are rejected; send those through
    /// [`execute`](Self::execute) or [`request`](Self::request).
    pub async fn subscribe(&self, operation: Operation) -> GraftResult<ResponseStream> {
        if !operation.is_subscription() {
            return Err(GraphQLError::InvalidOperation {
                operation: operation
                    .operation_name
                    .unwrap_or_else(|| operation.kind.to_string()),
                message: "only subscription operations can be subscribed".to_string(),
            }
            .into());
        }
        self.pipeline.request(operation).await
    }

    /// Forcibly close and reopen the WebSocket connection
    ///
    /// Active subscriptions are replayed on the fresh session. Without a
    /// WebSocket transport this is a no-op and succeeds.
    pub async fn reconnect(&self) -> GraftResult<()> {
        self.pipeline.reconnect().await
    }

    /// The underlying pipeline
    pub fn pipeline(&self) -> &TransportPipeline {
        &self.pipeline
    }
}

/// Builder for creating a [`GraphQLClient`]
///
/// # Example
///
/// ```rust,ignore
/// let client = GraphQLClient::builder()
///     .batch(BatchConfig::new("http://localhost:4000/graphql"))
///     .websocket(WebSocketConfig::new("ws://localhost:4000/graphql"))
///     .build()?;
/// ```
pub struct ClientBuilder {
    batch: Option<BatchConfig>,
    websocket: Option<WebSocketConfig>,
    upload: Option<UploadConfig>,
}

impl ClientBuilder {
    /// Create a new ClientBuilder
    pub fn new() -> Self {
        Self {
            batch: None,
            websocket: None,
            upload: None,
        }
    }

    /// Set the batched-HTTP configuration (required)
    pub fn batch(mut self, config: BatchConfig) -> Self {
        self.batch = Some(config);
        self
    }

    /// Set the batched-HTTP endpoint with default batching options
    pub fn batch_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.batch(BatchConfig::new(endpoint))
    }

    /// Wire in the WebSocket subscription transport
    pub fn websocket(mut self, config: WebSocketConfig) -> Self {
        self.websocket = Some(config);
        self
    }

    /// Wire in the WebSocket transport with the default subprotocol
    pub fn websocket_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.websocket(WebSocketConfig::new(endpoint))
    }

    /// Wire in the multipart upload transport
    pub fn upload(mut self, config: UploadConfig) -> Self {
        self.upload = Some(config);
        self
    }

    /// The configuration this builder currently holds
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            batch: self.batch.clone(),
            websocket: self.websocket.clone(),
            upload: self.upload.clone(),
        }
    }

    /// Compose the pipeline and build the client
    ///
    /// Fails when no batch configuration was set. Must be called from
    /// within a Tokio runtime.
    pub fn build(self) -> GraftResult<GraphQLClient> {
        GraphQLClient::from_config(&self.config())
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
