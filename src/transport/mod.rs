//! Client-side transport pipeline
//!
//! Operations leave the process through one of three terminal transports:
//! batched HTTP (always present), WebSocket (subscriptions), and multipart
//! upload (named mutations). [`pipeline::TransportPipeline`] picks the
//! terminal per operation with a fixed precedence and never consults a
//! transport that was not configured.

pub mod batch;
pub mod pipeline;
pub mod protocol;
pub mod upload;
pub mod websocket;

pub use batch::HttpBatchTransport;
pub use pipeline::{TransportPipeline, TransportRoute};
pub use upload::UploadTransport;
pub use websocket::WebSocketTransport;

use crate::core::error::{ConfigError, GraftResult};
use crate::core::operation::Operation;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Stream of GraphQL responses for one operation
///
/// HTTP terminals produce exactly one item; WebSocket subscriptions produce
/// zero or more items and end when the server completes the operation.
pub type ResponseStream = Pin<Box<dyn Stream<Item = GraftResult<Value>> + Send>>;

/// A terminal transport that can carry one operation
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one operation and return its response stream
    async fn request(&self, operation: Operation) -> GraftResult<ResponseStream>;
}

/// Wrap an already-received response into a one-item stream
pub(crate) fn single_response(value: Value) -> ResponseStream {
    Box::pin(tokio_stream::once(Ok(value)))
}

/// Check an endpoint's URL scheme at construction time
pub(crate) fn validate_scheme(field: &str, endpoint: &str, allowed: &[&str]) -> GraftResult<()> {
    match endpoint.split_once("://") {
        Some((scheme, rest)) if allowed.contains(&scheme) && !rest.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: endpoint.to_string(),
            message: format!("endpoint scheme must be one of: {}", allowed.join(", ")),
        }
        .into()),
    }
}
