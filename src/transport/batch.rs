//! Batched HTTP transport
//!
//! Coalesces operations into fewer HTTP requests. Callers enqueue
//! operations into a channel drained by a background task; a batch closes
//! when it reaches `max_operations` or when `interval_ms` has elapsed since
//! it opened. One POST carries the whole batch as a JSON array, and the
//! response array is matched back to the waiting callers by index. A
//! request-level failure fails every operation in that batch.

use crate::config::BatchConfig;
use crate::core::error::{ConfigError, GraftResult, TransportError};
use crate::core::operation::{Operation, OperationPayload};
use crate::transport::{ResponseStream, Transport, single_response, validate_scheme};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// One queued operation and the channel its caller is waiting on
struct QueuedOperation {
    payload: OperationPayload,
    reply_tx: oneshot::Sender<GraftResult<Value>>,
}

/// HTTP terminal that batches operations
///
/// Dropping the transport closes the queue; the drain task flushes what it
/// already holds and exits.
#[derive(Debug)]
pub struct HttpBatchTransport {
    endpoint: String,
    queue_tx: mpsc::UnboundedSender<QueuedOperation>,
}

impl HttpBatchTransport {
    /// Create the transport and spawn its drain task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: BatchConfig) -> GraftResult<Self> {
        validate_scheme("batch.endpoint", &config.endpoint, &["http", "https"])?;
        if config.max_operations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch.max_operations".to_string(),
                value: "0".to_string(),
                message: "batch size must be at least 1".to_string(),
            }
            .into());
        }
        let headers = build_headers(&config.headers)?;

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_batch_loop(
            reqwest::Client::new(),
            config.endpoint.clone(),
            headers,
            Duration::from_millis(config.interval_ms),
            config.max_operations,
            queue_rx,
        ));

        Ok(Self {
            endpoint: config.endpoint,
            queue_tx,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpBatchTransport {
    async fn request(&self, operation: Operation) -> GraftResult<ResponseStream> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.queue_tx
            .send(QueuedOperation {
                payload: operation.payload(),
                reply_tx,
            })
            .map_err(|_| TransportError::ConnectionClosed {
                message: "batch drain task is gone".to_string(),
            })?;

        let value = reply_rx
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                message: "batch drain task dropped the operation".to_string(),
            })??;
        Ok(single_response(value))
    }
}

fn build_headers(headers: &HashMap<String, String>) -> GraftResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidValue {
                field: "batch.headers".to_string(),
                value: name.clone(),
                message: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
                field: "batch.headers".to_string(),
                value: value.clone(),
                message: e.to_string(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Drain the queue: open a batch on the first operation, close it on the
/// interval or on `max_operations`, then flush
async fn run_batch_loop(
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
    interval: Duration,
    max_operations: usize,
    mut queue_rx: mpsc::UnboundedReceiver<QueuedOperation>,
) {
    while let Some(first) = queue_rx.recv().await {
        let mut batch = vec![first];
        let deadline = tokio::time::sleep(interval);
        tokio::pin!(deadline);

        while batch.len() < max_operations {
            tokio::select! {
                _ = &mut deadline => break,
                next = queue_rx.recv() => match next {
                    Some(queued) => batch.push(queued),
                    None => break,
                },
            }
        }

        flush_batch(&client, &endpoint, &headers, batch).await;
    }
    tracing::debug!("Batch drain task stopped");
}

async fn flush_batch(
    client: &reqwest::Client,
    endpoint: &str,
    headers: &HeaderMap,
    batch: Vec<QueuedOperation>,
) {
    let payloads: Vec<OperationPayload> = batch.iter().map(|q| q.payload.clone()).collect();
    tracing::debug!(operations = payloads.len(), endpoint = %endpoint, "Flushing operation batch");

    let response = match client
        .post(endpoint)
        .headers(headers.clone())
        .json(&payloads)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => return fail_batch(batch, FailureKind::Network, err.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return fail_batch(
            batch,
            FailureKind::Network,
            format!("batch endpoint returned HTTP {}", status),
        );
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return fail_batch(batch, FailureKind::Network, err.to_string()),
    };

    let responses: Vec<Value> = match serde_json::from_str(&body) {
        Ok(responses) => responses,
        Err(err) => {
            return fail_batch(
                batch,
                FailureKind::Protocol,
                format!("invalid batch response: {}", err),
            );
        }
    };

    if responses.len() != batch.len() {
        let message = format!(
            "batch endpoint returned {} responses for {} operations",
            responses.len(),
            batch.len()
        );
        return fail_batch(batch, FailureKind::Protocol, message);
    }

    for (queued, response) in batch.into_iter().zip(responses) {
        // A send failure means the caller gave up waiting; nothing to do.
        let _ = queued.reply_tx.send(Ok(response));
    }
}

enum FailureKind {
    Network,
    Protocol,
}

/// Fail every operation of a batch with the same message
fn fail_batch(batch: Vec<QueuedOperation>, kind: FailureKind, message: String) {
    tracing::warn!(operations = batch.len(), error = %message, "Batch request failed");
    for queued in batch {
        let err = match kind {
            FailureKind::Network => TransportError::Network {
                message: message.clone(),
            },
            FailureKind::Protocol => TransportError::Protocol {
                message: message.clone(),
            },
        };
        let _ = queued.reply_tx.send(Err(err.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GraftError;

    #[tokio::test]
    async fn test_rejects_non_http_endpoint() {
        let err = HttpBatchTransport::new(BatchConfig::new("ws://localhost:4000/graphql"))
            .expect_err("should fail");
        assert!(matches!(
            err,
            GraftError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_zero_max_operations() {
        let mut config = BatchConfig::new("http://localhost:4000/graphql");
        config.max_operations = 0;
        let err = HttpBatchTransport::new(config).expect_err("should fail");
        assert!(err.to_string().contains("max_operations"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_header_name() {
        let mut config = BatchConfig::new("http://localhost:4000/graphql");
        config
            .headers
            .insert("not a header".to_string(), "x".to_string());
        let err = HttpBatchTransport::new(config).expect_err("should fail");
        assert!(matches!(
            err,
            GraftError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_construction_succeeds_with_defaults() {
        let transport = HttpBatchTransport::new(BatchConfig::new("http://localhost:4000/graphql"))
            .expect("should construct");
        assert_eq!(transport.endpoint(), "http://localhost:4000/graphql");
    }
}
