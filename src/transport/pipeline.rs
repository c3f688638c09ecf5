//! Transport routing
//!
//! [`TransportPipeline`] owns the terminal transports and picks one per
//! operation with a fixed precedence:
//!
//! 1. a subscription goes to the WebSocket terminal when one is configured;
//! 2. otherwise an operation whose name is listed in the upload
//!    configuration goes to the upload terminal;
//! 3. everything else goes to the batched HTTP terminal.
//!
//! Routing never consults an absent terminal. The batched terminal is
//! mandatory: composing a pipeline without it is a configuration error,
//! raised at construction rather than at send time.

use crate::config::ClientConfig;
use crate::core::error::{ConfigError, GraftError, GraftResult};
use crate::core::operation::{Operation, OperationKind};
use crate::transport::batch::HttpBatchTransport;
use crate::transport::upload::UploadTransport;
use crate::transport::websocket::WebSocketTransport;
use crate::transport::{ResponseStream, Transport};
use std::fmt;

/// Which terminal a given operation will use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportRoute {
    WebSocket,
    Upload,
    BatchHttp,
}

impl fmt::Display for TransportRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportRoute::WebSocket => write!(f, "websocket"),
            TransportRoute::Upload => write!(f, "upload"),
            TransportRoute::BatchHttp => write!(f, "batch_http"),
        }
    }
}

/// The composed client-side transport
#[derive(Debug)]
pub struct TransportPipeline {
    batch: HttpBatchTransport,
    websocket: Option<WebSocketTransport>,
    upload: Option<UploadTransport>,
}

impl TransportPipeline {
    /// Compose a pipeline from configuration
    ///
    /// The batch section is mandatory; the WebSocket and upload terminals
    /// are wired only when their sections are present. Must be called from
    /// within a Tokio runtime (the batch terminal spawns its drain task).
    pub fn from_config(config: &ClientConfig) -> GraftResult<Self> {
        let batch_config = config
            .batch
            .clone()
            .ok_or_else(|| ConfigError::MissingField {
                field: "batch".to_string(),
                context: "client transport configuration".to_string(),
            })?;
        let batch = HttpBatchTransport::new(batch_config)?;

        let websocket = match &config.websocket {
            Some(ws_config) => Some(WebSocketTransport::new(ws_config.clone())?),
            None => None,
        };
        let upload = match &config.upload {
            Some(upload_config) => Some(UploadTransport::new(upload_config.clone())?),
            None => None,
        };

        tracing::debug!(
            websocket = websocket.is_some(),
            upload = upload.is_some(),
            "Composed transport pipeline"
        );

        Ok(Self {
            batch,
            websocket,
            upload,
        })
    }

    /// Decide which terminal an operation will use
    ///
    /// Evaluated per operation at send time, in fixed precedence order.
    pub fn route(&self, operation: &Operation) -> TransportRoute {
        if self.websocket.is_some() && operation.kind == OperationKind::Subscription {
            return TransportRoute::WebSocket;
        }
        if let (Some(upload), Some(name)) = (&self.upload, &operation.operation_name)
            && upload.handles(name)
        {
            return TransportRoute::Upload;
        }
        TransportRoute::BatchHttp
    }

    /// Send one operation along its route
    ///
    /// The terminal's response stream is returned unchanged: a single item
    /// for the HTTP terminals, any number of items for subscriptions.
    pub async fn request(&self, operation: Operation) -> GraftResult<ResponseStream> {
        let route = self.route(&operation);
        tracing::debug!(
            route = %route,
            operation = operation.operation_name.as_deref().unwrap_or("<anonymous>"),
            "Routing operation"
        );

        match route {
            TransportRoute::WebSocket => {
                let Some(websocket) = &self.websocket else {
                    return Err(GraftError::Internal(
                        "websocket route chosen without a websocket terminal".to_string(),
                    ));
                };
                websocket.request(operation).await
            }
            TransportRoute::Upload => {
                let Some(upload) = &self.upload else {
                    return Err(GraftError::Internal(
                        "upload route chosen without an upload terminal".to_string(),
                    ));
                };
                upload.request(operation).await
            }
            TransportRoute::BatchHttp => self.batch.request(operation).await,
        }
    }

    /// Reconnect the WebSocket terminal, if one is configured
    ///
    /// Without a WebSocket terminal this does nothing and succeeds.
    pub async fn reconnect(&self) -> GraftResult<()> {
        match &self.websocket {
            Some(websocket) => websocket.reconnect().await,
            None => Ok(()),
        }
    }

    pub fn has_websocket(&self) -> bool {
        self.websocket.is_some()
    }

    pub fn has_upload(&self) -> bool {
        self.upload.is_some()
    }

    pub fn batch(&self) -> &HttpBatchTransport {
        &self.batch
    }
}
