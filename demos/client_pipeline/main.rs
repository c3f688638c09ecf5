//! Transport pipeline example
//!
//! This example demonstrates:
//! - Composing the client pipeline from a YAML configuration
//! - Routing precedence: subscriptions → WebSocket, listed mutations →
//!   upload, everything else → batched HTTP
//! - Concurrent operations sharing one batched HTTP request
//!
//! Start the resolver server first to see live responses:
//!     cargo run --example resolver_server

use graft::prelude::*;

const CONFIG: &str = r#"
batch:
  endpoint: http://127.0.0.1:3000/graphql
  interval_ms: 10
  max_operations: 10
websocket:
  endpoint: ws://127.0.0.1:3000/graphql
upload:
  endpoint: http://127.0.0.1:3000/graphql
  mutations:
    - CreateFile
    - UpdateAvatar
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("🚀 Graft Client Pipeline Example");
    println!("=================================\n");

    let config = ClientConfig::from_yaml_str(CONFIG)?;
    let client = GraphQLClient::from_config(&config)?;
    println!("✅ Composed pipeline:");
    println!("   - batched HTTP: always wired");
    println!("   - websocket:    {}", client.pipeline().has_websocket());
    println!("   - upload:       {}\n", client.pipeline().has_upload());

    // Every operation is routed by kind and name, never by call site
    println!("🧭 Routing decisions:");
    let samples = [
        ("subscription OnUser { userChanged { id } }", "subscription OnUser"),
        ("mutation CreateFile($file: Upload!) { createFile(file: $file) { id } }", "mutation CreateFile"),
        ("mutation CreateUser { createOneUser(data: { name: \"Ada\" }) { id } }", "mutation CreateUser"),
        ("query { findManyUser { id } }", "anonymous query"),
    ];
    for (document, label) in samples {
        let operation = Operation::parse(document, json!({}))?;
        println!("   {:<24} → {}", label, client.route(&operation));
    }

    // Two concurrent operations; the transport coalesces them into one
    // HTTP request and hands each caller its own response back.
    println!("\n📡 Sending two operations through one batch:");
    let find = Operation::parse("query { findManyUser { id name } }", json!({}))?;
    let count = Operation::parse("query { findManyUserCount }", json!({}))?;
    match tokio::join!(client.execute(find), client.execute(count)) {
        (Ok(users), Ok(count)) => {
            println!("   findManyUser      → {}", users["data"]["findManyUser"]);
            println!("   findManyUserCount → {}", count["data"]["findManyUserCount"]);
        }
        (Err(e), _) | (_, Err(e)) => {
            println!("   ⚠️  {} (is the resolver_server example running?)", e);
        }
    }

    Ok(())
}
