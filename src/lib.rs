//! # Graft
//!
//! GraphQL glue for CRUD APIs: entity resolvers over a pluggable data client,
//! plus a composable operation transport pipeline for the client side.
//!
//! ## Features
//!
//! - **Generated-style CRUD resolvers**: ten operations per entity
//!   (`findOneUser`, `createOnePost`, ...) dispatched to an [`EntityDelegate`]
//! - **Pre-delete hook**: a global hook runs before every delete and can veto it
//! - **Transport pipeline**: one composed pipeline routes each operation to
//!   batched HTTP, WebSocket subscriptions, or multipart upload
//! - **Fixed routing precedence**: subscription → WebSocket, listed mutation →
//!   upload, everything else → batched HTTP; absent transports are never wired
//! - **Reconnect with replay**: `reconnect()` reopens the shared socket and
//!   restarts every active subscription
//! - **HTTP exposure**: serve the resolvers over `POST /graphql` with axum
//! - **Configuration-based**: compose the pipeline from YAML or a fluent builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graft::prelude::*;
//!
//! // Server side: register delegates and serve the resolvers
//! let mut registry = ResolverRegistry::new();
//! registry.register("User", Arc::new(InMemoryDelegate::new()))?;
//! let executor = Arc::new(ResolverExecutor::new(Arc::new(registry)));
//! GraphQLExposure::serve(executor, "127.0.0.1:3000").await?;
//!
//! // Client side: compose the pipeline and send operations
//! let client = GraphQLClient::builder()
//!     .batch_endpoint("http://127.0.0.1:3000/graphql")
//!     .websocket_endpoint("ws://127.0.0.1:3000/graphql")
//!     .build()?;
//!
//! let op = Operation::parse("query { findManyUser { id } }", json!({}))?;
//! let response = client.execute(op).await?;
//! ```
//!
//! [`EntityDelegate`]: crate::core::delegate::EntityDelegate

pub mod client;
pub mod config;
pub mod core;
pub mod resolvers;
pub mod server;
pub mod storage;
pub mod transport;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core types ===
    pub use crate::core::{
        delegate::{DeleteHook, DeleteHookContext, EntityDelegate},
        error::{
            ConfigError, GraftError, GraftResult, GraphQLError, RegistryError, TransportError,
        },
        operation::{FileAttachment, Operation, OperationKind},
    };

    // === Resolvers ===
    pub use crate::resolvers::{CrudOperation, ResolverExecutor, ResolverRegistry};

    // === Transport ===
    pub use crate::transport::{ResponseStream, Transport, TransportPipeline, TransportRoute};

    // === Client ===
    pub use crate::client::{ClientBuilder, GraphQLClient};

    // === Config ===
    pub use crate::config::{BatchConfig, ClientConfig, UploadConfig, WebSocketConfig};

    // === Server ===
    pub use crate::server::GraphQLExposure;

    // === Storage ===
    pub use crate::storage::InMemoryDelegate;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use futures::StreamExt;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
