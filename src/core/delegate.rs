//! Data-client seams for the resolver layer
//!
//! Defines the contract between the resolvers and the application's data
//! client. The resolvers never know concrete record types: every method
//! takes the GraphQL field arguments as JSON and returns JSON, so any ORM
//! or store can sit behind an [`EntityDelegate`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Per-entity data client
///
/// One implementation is registered per entity type. Arguments are the
/// field's GraphQL arguments converted to a JSON object (`where`, `data`,
/// `take`, ...) and are forwarded verbatim; results and failures propagate
/// back to the caller unchanged.
///
/// Every method has a default implementation that fails, so delegates only
/// need to implement the operations their entity actually supports.
#[async_trait]
pub trait EntityDelegate: Send + Sync {
    /// Fetch a single record matching `args["where"]`
    async fn find_one(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "find_one is not implemented for this entity type"
        ))
    }

    /// Fetch all records matching the filter, honoring pagination arguments
    async fn find_many(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "find_many is not implemented for this entity type"
        ))
    }

    /// Count records matching the filter
    async fn count(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "count is not implemented for this entity type"
        ))
    }

    /// Compute aggregates over records matching the filter
    async fn aggregate(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "aggregate is not implemented for this entity type"
        ))
    }

    /// Create a record from `args["data"]`
    async fn create(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "create is not implemented for this entity type"
        ))
    }

    /// Update the record matching `args["where"]` with `args["data"]`
    async fn update(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "update is not implemented for this entity type"
        ))
    }

    /// Delete the record matching `args["where"]`
    async fn delete(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "delete is not implemented for this entity type"
        ))
    }

    /// Update the matching record, or create it from `args["create"]`
    async fn upsert(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "upsert is not implemented for this entity type"
        ))
    }

    /// Delete every record matching the filter
    async fn delete_many(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "delete_many is not implemented for this entity type"
        ))
    }

    /// Update every record matching the filter
    async fn update_many(&self, _args: Value) -> Result<Value> {
        Err(anyhow::anyhow!(
            "update_many is not implemented for this entity type"
        ))
    }
}

/// Context handed to the pre-delete hook
///
/// Serializes to `{"model": ..., "where": ...}`. `filter` is the `where`
/// argument of the delete operation, or JSON `null` when the operation
/// carried none.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteHookContext {
    /// The entity type being deleted (e.g. "User")
    pub model: String,
    /// The delete filter
    #[serde(rename = "where")]
    pub filter: Value,
}

impl DeleteHookContext {
    pub fn new(model: impl Into<String>, filter: Value) -> Self {
        Self {
            model: model.into(),
            filter,
        }
    }
}

/// Pre-delete hook invoked before `delete` and `delete_many`
///
/// The hook runs before the delegate's delete method. If it fails, the
/// delete is never attempted and the hook's error surfaces to the caller.
/// Typical implementations cascade deletes across related entities.
#[async_trait]
pub trait DeleteHook: Send + Sync {
    async fn on_delete(&self, ctx: DeleteHookContext) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PartialDelegate;

    #[async_trait]
    impl EntityDelegate for PartialDelegate {
        async fn find_one(&self, args: Value) -> Result<Value> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn test_default_methods_fail() {
        let delegate = PartialDelegate;
        let result = delegate.update_many(json!({})).await;
        assert!(result.is_err());
        let msg = result.expect_err("should be error").to_string();
        assert!(msg.contains("update_many"), "got: {}", msg);
    }

    #[tokio::test]
    async fn test_implemented_method_passes_args_through() {
        let delegate = PartialDelegate;
        let args = json!({ "where": { "id": "42" } });
        let result = delegate.find_one(args.clone()).await.expect("should succeed");
        assert_eq!(result, args);
    }

    #[test]
    fn test_delete_hook_context_serializes_with_where_key() {
        let ctx = DeleteHookContext::new("User", json!({ "id": "42" }));
        let json = serde_json::to_value(&ctx).expect("should serialize");
        assert_eq!(json["model"], "User");
        assert_eq!(json["where"]["id"], "42");
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn test_delete_hook_context_null_filter() {
        let ctx = DeleteHookContext::new("Post", Value::Null);
        let json = serde_json::to_value(&ctx).expect("should serialize");
        assert_eq!(json["where"], Value::Null);
    }
}
