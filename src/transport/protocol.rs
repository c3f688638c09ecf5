//! Subscription wire protocol definitions
//!
//! Defines the JSON frames exchanged with a GraphQL subscription server
//! over WebSocket. One connection multiplexes any number of operations,
//! each identified by a client-chosen id.
//!
//! ## Client → Server Frames
//!
//! ```json
//! // Open the session after the socket connects
//! {"type": "connection_init", "payload": {}}
//!
//! // Start an operation
//! {"type": "start", "id": "sub_abc123", "payload": {"query": "...", "variables": {}}}
//!
//! // Stop one operation
//! {"type": "stop", "id": "sub_abc123"}
//!
//! // Close the session
//! {"type": "connection_terminate"}
//! ```
//!
//! ## Server → Client Frames
//!
//! ```json
//! // Session accepted
//! {"type": "connection_ack"}
//!
//! // Session rejected
//! {"type": "connection_error", "payload": {"message": "forbidden"}}
//!
//! // Keep-alive (no payload, may arrive at any time)
//! {"type": "ka"}
//!
//! // Execution result for one operation
//! {"type": "data", "id": "sub_abc123", "payload": {"data": {...}}}
//!
//! // Terminal failure of one operation
//! {"type": "error", "id": "sub_abc123", "payload": {"message": "..."}}
//!
//! // Operation finished
//! {"type": "complete", "id": "sub_abc123"}
//! ```

use crate::core::operation::OperationPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Frames sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Open the GraphQL session on a fresh socket
    ConnectionInit {
        /// Optional connection parameters (auth tokens and the like)
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Start an operation under a client-chosen id
    Start {
        /// Operation id, unique per connection
        id: String,
        /// The operation to execute
        payload: OperationPayload,
    },
    /// Stop a running operation
    Stop {
        /// The operation id to stop
        id: String,
    },
    /// Close the GraphQL session
    ConnectionTerminate,
}

/// Frames sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The session was accepted
    ConnectionAck,
    /// The session was rejected
    ConnectionError {
        /// Rejection details
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Keep-alive; carries no data
    Ka,
    /// An execution result for one operation
    Data {
        /// Which operation this result belongs to
        id: String,
        /// The GraphQL response (`data`, possibly `errors`)
        payload: Value,
    },
    /// A terminal failure of one operation
    Error {
        /// Which operation failed
        id: String,
        /// Failure details
        payload: Value,
    },
    /// The operation's stream is finished
    Complete {
        /// Which operation finished
        id: String,
    },
}

/// Generate a unique operation id for a `start` frame
pub fn subscription_id() -> String {
    format!("sub_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === Serialization tests ===

    #[test]
    fn test_connection_init_serialization() {
        let frame = ClientFrame::ConnectionInit { payload: None };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "connection_init");
        assert!(json.get("payload").is_none());

        let frame = ClientFrame::ConnectionInit {
            payload: Some(json!({ "token": "abc" })),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["payload"]["token"], "abc");
    }

    #[test]
    fn test_start_frame_serialization() {
        let frame = ClientFrame::Start {
            id: "sub_123".to_string(),
            payload: OperationPayload {
                query: "subscription { userChanged { id } }".to_string(),
                variables: json!({}),
                operation_name: None,
            },
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["id"], "sub_123");
        assert_eq!(json["payload"]["query"], "subscription { userChanged { id } }");
        // operationName is omitted when the operation is anonymous
        assert!(json["payload"].get("operationName").is_none());
    }

    #[test]
    fn test_start_frame_carries_operation_name() {
        let frame = ClientFrame::Start {
            id: "sub_123".to_string(),
            payload: OperationPayload {
                query: "subscription OnUser { userChanged { id } }".to_string(),
                variables: json!({ "id": "42" }),
                operation_name: Some("OnUser".to_string()),
            },
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["payload"]["operationName"], "OnUser");
        assert_eq!(json["payload"]["variables"]["id"], "42");
    }

    #[test]
    fn test_stop_and_terminate_serialization() {
        let json = serde_json::to_value(ClientFrame::Stop {
            id: "sub_123".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "stop");
        assert_eq!(json["id"], "sub_123");

        let json = serde_json::to_value(ClientFrame::ConnectionTerminate).unwrap();
        assert_eq!(json["type"], "connection_terminate");
    }

    // === Deserialization tests ===

    #[test]
    fn test_connection_ack_roundtrip() {
        let frame: ServerFrame = serde_json::from_str(r#"{"type":"connection_ack"}"#).unwrap();
        assert!(matches!(frame, ServerFrame::ConnectionAck));
    }

    #[test]
    fn test_ka_frame_deserializes() {
        let frame: ServerFrame = serde_json::from_str(r#"{"type":"ka"}"#).unwrap();
        assert!(matches!(frame, ServerFrame::Ka));
    }

    #[test]
    fn test_data_frame_roundtrip() {
        let raw = r#"{"type":"data","id":"sub_1","payload":{"data":{"userChanged":{"id":"42"}}}}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();

        match frame {
            ServerFrame::Data { id, payload } => {
                assert_eq!(id, "sub_1");
                assert_eq!(payload["data"]["userChanged"]["id"], "42");
            }
            _ => panic!("Expected Data frame"),
        }
    }

    #[test]
    fn test_error_frame_roundtrip() {
        let raw = r#"{"type":"error","id":"sub_1","payload":{"message":"boom"}}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();

        match frame {
            ServerFrame::Error { id, payload } => {
                assert_eq!(id, "sub_1");
                assert_eq!(payload["message"], "boom");
            }
            _ => panic!("Expected Error frame"),
        }
    }

    #[test]
    fn test_complete_frame_roundtrip() {
        let raw = r#"{"type":"complete","id":"sub_1"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        assert!(matches!(frame, ServerFrame::Complete { id } if id == "sub_1"));
    }

    #[test]
    fn test_connection_error_with_and_without_payload() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"connection_error"}"#).unwrap();
        assert!(matches!(frame, ServerFrame::ConnectionError { payload: None }));

        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"connection_error","payload":{"message":"forbidden"}}"#)
                .unwrap();
        match frame {
            ServerFrame::ConnectionError { payload: Some(p) } => {
                assert_eq!(p["message"], "forbidden");
            }
            _ => panic!("Expected ConnectionError with payload"),
        }
    }

    #[test]
    fn test_unknown_frame_type_fails() {
        let result = serde_json::from_str::<ServerFrame>(r#"{"type":"hello"}"#);
        assert!(result.is_err(), "unknown frame type should fail to deserialize");
    }

    #[test]
    fn test_data_frame_without_id_fails() {
        let result = serde_json::from_str::<ServerFrame>(r#"{"type":"data","payload":{}}"#);
        assert!(result.is_err(), "data frame without id should fail to deserialize");
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let a = subscription_id();
        let b = subscription_id();
        assert_ne!(a, b);
        assert!(a.starts_with("sub_"));
        assert!(b.starts_with("sub_"));
    }
}
