//! WebSocket subscription transport
//!
//! One long-lived connection carries every subscription. The connection is
//! opened lazily on first use: socket connect, `connection_init` →
//! `connection_ack` handshake, then a spawned write loop (frames out) and
//! read loop (frames in, routed to subscribers by operation id).
//!
//! Active subscriptions are kept in insertion order so that
//! [`WebSocketTransport::reconnect`] can replay their `start` frames on a
//! fresh session in the order they were first started. Consumers that drop
//! their stream are detected on the next delivery attempt; the transport
//! then stops the server-side operation and forgets the subscription.

use crate::config::WebSocketConfig;
use crate::core::error::{GraftResult, GraphQLError, TransportError};
use crate::core::operation::{Operation, OperationPayload};
use crate::transport::protocol::{ClientFrame, ServerFrame, subscription_id};
use crate::transport::{ResponseStream, Transport, validate_scheme};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// One active operation: its wire payload (kept for replay) and the channel
/// its consumer reads from
#[derive(Debug)]
struct ActiveSubscription {
    payload: OperationPayload,
    events_tx: mpsc::UnboundedSender<GraftResult<Value>>,
}

type SharedSubscriptions = Arc<Mutex<IndexMap<String, ActiveSubscription>>>;

/// The spawned halves of one open connection
#[derive(Debug)]
struct ConnectionHandle {
    write_tx: mpsc::UnboundedSender<ClientFrame>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl ConnectionHandle {
    fn abort(&self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

/// WebSocket terminal for subscription operations
#[derive(Debug)]
pub struct WebSocketTransport {
    endpoint: String,
    protocols: Vec<String>,
    subscriptions: SharedSubscriptions,
    connection: Mutex<Option<ConnectionHandle>>,
}

impl WebSocketTransport {
    pub fn new(config: WebSocketConfig) -> GraftResult<Self> {
        validate_scheme("websocket.endpoint", &config.endpoint, &["ws", "wss"])?;
        Ok(Self {
            endpoint: config.endpoint,
            protocols: config.protocols,
            subscriptions: Arc::new(Mutex::new(IndexMap::new())),
            connection: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of active subscriptions
    pub async fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Forcibly close the connection, reopen it, and replay every active
    /// subscription on the fresh session
    pub async fn reconnect(&self) -> GraftResult<()> {
        let mut connection = self.connection.lock().await;

        if let Some(stale) = connection.take() {
            stale.abort();
        }

        let handle = self.open_connection().await?;

        let subs = self.subscriptions.lock().await;
        for (id, sub) in subs.iter() {
            handle
                .write_tx
                .send(ClientFrame::Start {
                    id: id.clone(),
                    payload: sub.payload.clone(),
                })
                .map_err(|_| TransportError::ConnectionClosed {
                    message: "connection closed while replaying subscriptions".to_string(),
                })?;
        }
        tracing::info!(
            endpoint = %self.endpoint,
            subscriptions = subs.len(),
            "WebSocket transport reconnected"
        );
        drop(subs);

        *connection = Some(handle);
        Ok(())
    }

    /// Open the socket and run the session handshake, then spawn the read
    /// and write loops
    async fn open_connection(&self) -> GraftResult<ConnectionHandle> {
        tracing::debug!(endpoint = %self.endpoint, "Opening WebSocket connection");

        let mut request =
            self.endpoint
                .as_str()
                .into_client_request()
                .map_err(|e| TransportError::Handshake {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;
        if !self.protocols.is_empty() {
            let value = HeaderValue::from_str(&self.protocols.join(", ")).map_err(|e| {
                TransportError::Handshake {
                    endpoint: self.endpoint.clone(),
                    message: format!("invalid subprotocol list: {}", e),
                }
            })?;
            request.headers_mut().insert("Sec-WebSocket-Protocol", value);
        }

        let (ws_stream, _response) =
            connect_async(request)
                .await
                .map_err(|e| TransportError::Handshake {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;
        let (mut sink, mut stream) = ws_stream.split();

        let init = serde_json::to_string(&ClientFrame::ConnectionInit { payload: None })?;
        sink.send(Message::Text(init.into()))
            .await
            .map_err(|e| TransportError::Handshake {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        self.await_ack(&mut stream).await?;

        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let write_task = tokio::spawn(run_write_loop(sink, write_rx));
        // The read loop aborts the write task when the socket ends, which
        // closes `write_tx` and lets the next request detect the dead
        // connection.
        let read_task = tokio::spawn(run_read_loop(
            stream,
            write_tx.clone(),
            self.subscriptions.clone(),
            write_task.abort_handle(),
        ));

        Ok(ConnectionHandle {
            write_tx,
            read_task,
            write_task,
        })
    }

    /// Wait for `connection_ack`, tolerating keep-alives
    async fn await_ack(&self, stream: &mut SplitStream<WsStream>) -> GraftResult<()> {
        loop {
            let message = stream
                .next()
                .await
                .ok_or_else(|| TransportError::Handshake {
                    endpoint: self.endpoint.clone(),
                    message: "connection closed during session handshake".to_string(),
                })?
                .map_err(|e| TransportError::Handshake {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => {
                    return Err(TransportError::Handshake {
                        endpoint: self.endpoint.clone(),
                        message: "server closed the connection during session handshake"
                            .to_string(),
                    }
                    .into());
                }
                _ => continue,
            };

            match serde_json::from_str::<ServerFrame>(&text) {
                Ok(ServerFrame::ConnectionAck) => return Ok(()),
                Ok(ServerFrame::Ka) => continue,
                Ok(ServerFrame::ConnectionError { payload }) => {
                    return Err(TransportError::Handshake {
                        endpoint: self.endpoint.clone(),
                        message: format!(
                            "server rejected the session: {}",
                            payload.unwrap_or(Value::Null)
                        ),
                    }
                    .into());
                }
                Ok(_) => {
                    return Err(TransportError::Handshake {
                        endpoint: self.endpoint.clone(),
                        message: "unexpected frame before connection_ack".to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    return Err(TransportError::Handshake {
                        endpoint: self.endpoint.clone(),
                        message: format!("malformed handshake frame: {}", e),
                    }
                    .into());
                }
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn request(&self, operation: Operation) -> GraftResult<ResponseStream> {
        let id = subscription_id();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut connection = self.connection.lock().await;

        let needs_open = match connection.as_ref() {
            Some(handle) => handle.write_tx.is_closed(),
            None => true,
        };
        if needs_open {
            if let Some(stale) = connection.take() {
                stale.abort();
            }
            *connection = Some(self.open_connection().await?);
        }
        let Some(handle) = connection.as_ref() else {
            return Err(crate::core::error::GraftError::Internal(
                "connection handle missing after open".to_string(),
            ));
        };

        // Register before sending start so an immediate data frame finds
        // its consumer.
        self.subscriptions.lock().await.insert(
            id.clone(),
            ActiveSubscription {
                payload: operation.payload(),
                events_tx,
            },
        );

        let started = handle.write_tx.send(ClientFrame::Start {
            id: id.clone(),
            payload: operation.payload(),
        });
        if started.is_err() {
            self.subscriptions.lock().await.shift_remove(&id);
            return Err(TransportError::ConnectionClosed {
                message: "connection closed before the operation started".to_string(),
            }
            .into());
        }

        tracing::debug!(id = %id, "Started subscription");
        Ok(Box::pin(UnboundedReceiverStream::new(events_rx)))
    }
}

/// Serialize outgoing frames onto the socket until the channel closes
async fn run_write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut write_rx: mpsc::UnboundedReceiver<ClientFrame>,
) {
    while let Some(frame) = write_rx.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize outgoing frame");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            tracing::debug!(error = %e, "WebSocket write failed, stopping write loop");
            break;
        }
    }
    let _ = sink.close().await;
}

/// Route incoming frames to their subscribers until the socket ends
async fn run_read_loop(
    mut stream: SplitStream<WsStream>,
    write_tx: mpsc::UnboundedSender<ClientFrame>,
    subscriptions: SharedSubscriptions,
    write_abort: tokio::task::AbortHandle,
) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                connection_lost(&subscriptions, &write_abort, &e.to_string()).await;
                return;
            }
        };
        match message {
            Message::Text(text) => handle_frame(&text, &write_tx, &subscriptions).await,
            Message::Close(_) => {
                connection_lost(&subscriptions, &write_abort, "server closed the connection")
                    .await;
                return;
            }
            _ => {}
        }
    }
    connection_lost(&subscriptions, &write_abort, "connection ended").await;
}

async fn handle_frame(
    text: &str,
    write_tx: &mpsc::UnboundedSender<ClientFrame>,
    subscriptions: &SharedSubscriptions,
) {
    let frame: ServerFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed server frame");
            return;
        }
    };

    match frame {
        ServerFrame::Ka | ServerFrame::ConnectionAck => {}
        ServerFrame::ConnectionError { payload } => {
            tracing::warn!(payload = ?payload, "Server reported a connection error");
        }
        ServerFrame::Data { id, payload } => {
            deliver(subscriptions, write_tx, &id, Ok(payload)).await;
        }
        ServerFrame::Error { id, payload } => {
            // A server error frame is terminal for its operation.
            let err = GraphQLError::ExecutionError {
                message: payload.to_string(),
            };
            deliver(subscriptions, write_tx, &id, Err(err.into())).await;
            subscriptions.lock().await.shift_remove(&id);
        }
        ServerFrame::Complete { id } => {
            if subscriptions.lock().await.shift_remove(&id).is_some() {
                tracing::debug!(id = %id, "Subscription completed by server");
            }
        }
    }
}

/// Deliver one stream item, dropping the subscription if its consumer is
/// gone
async fn deliver(
    subscriptions: &SharedSubscriptions,
    write_tx: &mpsc::UnboundedSender<ClientFrame>,
    id: &str,
    item: GraftResult<Value>,
) {
    let mut subs = subscriptions.lock().await;
    let Some(sub) = subs.get(id) else {
        tracing::debug!(id = %id, "Dropping frame for unknown subscription");
        return;
    };
    if sub.events_tx.send(item).is_err() {
        subs.shift_remove(id);
        let _ = write_tx.send(ClientFrame::Stop { id: id.to_string() });
        tracing::debug!(id = %id, "Consumer gone, stopped subscription");
    }
}

/// Tell every subscriber the connection is gone; registrations stay so the
/// next reconnect can replay them
async fn connection_lost(
    subscriptions: &SharedSubscriptions,
    write_abort: &tokio::task::AbortHandle,
    reason: &str,
) {
    write_abort.abort();

    let subs = subscriptions.lock().await;
    tracing::warn!(
        reason = %reason,
        subscriptions = subs.len(),
        "WebSocket connection lost"
    );
    for sub in subs.values() {
        let _ = sub.events_tx.send(Err(TransportError::ConnectionClosed {
            message: reason.to_string(),
        }
        .into()));
    }
}
