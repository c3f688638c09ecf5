//! GraphQL CRUD server example
//!
//! This example demonstrates:
//! - Registering entity delegates in a ResolverRegistry
//! - The ten generated-style CRUD operations per entity
//! - A pre-delete hook that protects admin users
//! - Serving the resolvers over POST /graphql
//!
//! Run it, then try the curl request printed at startup.

use graft::prelude::*;

struct ProtectAdmins;

#[async_trait]
impl DeleteHook for ProtectAdmins {
    async fn on_delete(&self, ctx: DeleteHookContext) -> Result<()> {
        if ctx.model == "User" && ctx.filter.get("role") == Some(&json!("admin")) {
            anyhow::bail!("admin users cannot be deleted");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("🚀 Graft Resolver Server Example");
    println!("=================================\n");

    // Seed two entities with test data
    let users = InMemoryDelegate::new();
    let posts = InMemoryDelegate::new();
    seed_data(&users, &posts)?;
    println!("📋 Seeded {} users and {} posts", users.len(), posts.len());

    // Register delegates and the delete hook
    let mut registry = ResolverRegistry::new();
    registry.register("User", Arc::new(users))?;
    registry.register("Post", Arc::new(posts))?;
    registry.set_delete_hook(Arc::new(ProtectAdmins));
    println!("✅ Registered entities: {:?}\n", registry.entities());

    let executor = Arc::new(ResolverExecutor::new(Arc::new(registry)));

    println!("🌐 Server running on http://127.0.0.1:3000");
    println!("\n📚 Operations (POST /graphql, per registered entity):");
    println!("    findOneUser(where)              - Fetch a single user");
    println!("    findManyUser(where, take, skip) - List users");
    println!("    findManyUserCount(where)        - Count users");
    println!("    aggregateUser(where)            - Aggregate over users");
    println!("    createOneUser(data)             - Create a user");
    println!("    updateOneUser(where, data)      - Update a user");
    println!("    upsertOneUser(where, create, update) - Update or create");
    println!("    deleteOneUser(where)            - Delete a user (hook may veto)");
    println!("    deleteManyUser(where)           - Bulk delete, returns a count");
    println!("    updateManyUser(where, data)     - Bulk update, returns a count");
    println!("\n💡 Try it:");
    println!("    curl -s http://127.0.0.1:3000/graphql \\");
    println!("      -H 'content-type: application/json' \\");
    println!("      -d '{{\"query\": \"query {{ findManyUser {{ id name role }} }}\"}}'");
    println!("\n    Deleting Ada fails with \"admin users cannot be deleted\":");
    println!("    curl -s http://127.0.0.1:3000/graphql \\");
    println!("      -H 'content-type: application/json' \\");
    println!(
        "      -d '{{\"query\": \"mutation {{ deleteOneUser(where: {{ role: \\\"admin\\\" }}) {{ id }} }}\"}}'"
    );
    println!();

    GraphQLExposure::serve(executor, "127.0.0.1:3000").await?;
    Ok(())
}

/// Populate the delegates with test data
fn seed_data(users: &InMemoryDelegate, posts: &InMemoryDelegate) -> Result<()> {
    users.seed(json!({ "name": "Ada", "email": "ada@example.com", "role": "admin" }))?;
    users.seed(json!({ "name": "Grace", "email": "grace@example.com", "role": "member" }))?;
    users.seed(json!({ "name": "Alan", "email": "alan@example.com", "role": "member" }))?;

    posts.seed(json!({ "title": "On computable numbers", "author": "Alan" }))?;
    posts.seed(json!({ "title": "Notes on the analytical engine", "author": "Ada" }))?;

    Ok(())
}
