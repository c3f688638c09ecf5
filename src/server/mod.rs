//! GraphQL API exposure for the resolver layer
//!
//! This module serves a [`ResolverExecutor`] over HTTP. The exposure
//! consumes an executor and produces an axum `Router` with the `/graphql`
//! endpoint plus health checks; it is completely separate from the
//! resolver logic and can sit next to other routes in a larger app.
//!
//! `POST /graphql` accepts either a single request object
//! (`{query, variables, operationName?}`) or an array of them; the batched
//! form answers with one response per request, by index, which is what the
//! batched-HTTP transport on the client side sends.

use crate::core::error::{GraftError, GraftResult, GraphQLError};
use crate::resolvers::executor::ResolverExecutor;
use axum::extract::{Extension, Json as AxumJson};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
struct GraphQLRequestBody {
    query: String,
    #[serde(default)]
    variables: Value,
    #[serde(rename = "operationName")]
    #[allow(dead_code)]
    operation_name: Option<String>,
}

/// GraphQL API exposure implementation
///
/// Encapsulates the HTTP-specific pieces of serving the resolvers: request
/// body shapes, error responses, tracing and CORS layers.
pub struct GraphQLExposure;

impl GraphQLExposure {
    /// Build the GraphQL router from an executor
    ///
    /// Returns a fully configured axum router with:
    /// - `POST /graphql` accepting single or batched requests
    /// - health check routes (`/health`, `/healthz`)
    /// - request tracing and permissive CORS
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let executor = Arc::new(ResolverExecutor::new(Arc::new(registry)));
    /// let app = GraphQLExposure::build_router(executor);
    /// axum::serve(listener, app).await?;
    /// ```
    pub fn build_router(executor: Arc<ResolverExecutor>) -> Router {
        Router::new()
            .route("/graphql", post(graphql_handler))
            .merge(Self::health_routes())
            .layer(Extension(executor))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Serve the exposure with graceful shutdown
    ///
    /// Binds the address, serves requests, and handles SIGTERM and Ctrl+C.
    pub async fn serve(executor: Arc<ResolverExecutor>, addr: &str) -> GraftResult<()> {
        let app = Self::build_router(executor);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("GraphQL server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "graft"
        }))
    }
}

/// Handler for GraphQL queries and mutations
///
/// A single request answers with `{"data": ...}` or an error response
/// carrying the underlying error's status code. A batched array always
/// answers 200 with one entry per request, each either a data or an
/// errors object, so one failing operation does not fail its batch.
async fn graphql_handler(
    Extension(executor): Extension<Arc<ResolverExecutor>>,
    AxumJson(body): AxumJson<Value>,
) -> Response {
    match body {
        Value::Array(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for request in requests {
                responses.push(execute_entry(&executor, request).await);
            }
            AxumJson(Value::Array(responses)).into_response()
        }
        single => match parse_request(single) {
            Ok(request) => match executor.execute(&request.query, request.variables).await {
                Ok(response) => AxumJson(response).into_response(),
                Err(e) => e.into_response(),
            },
            Err(e) => e.into_response(),
        },
    }
}

/// Execute one entry of a batched request, mapping failures to the
/// GraphQL errors shape inside the entry
async fn execute_entry(executor: &ResolverExecutor, request: Value) -> Value {
    let request = match parse_request(request) {
        Ok(request) => request,
        Err(e) => return error_entry(&e),
    };
    match executor.execute(&request.query, request.variables).await {
        Ok(response) => response,
        Err(e) => error_entry(&e),
    }
}

fn parse_request(value: Value) -> GraftResult<GraphQLRequestBody> {
    serde_json::from_value(value).map_err(|e| {
        GraphQLError::ParseError {
            message: format!("invalid request body: {}", e),
        }
        .into()
    })
}

fn error_entry(error: &GraftError) -> Value {
    serde_json::to_value(error.to_response())
        .unwrap_or_else(|_| json!({ "errors": [{ "message": error.to_string() }] }))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
