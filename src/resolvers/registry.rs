//! The resolver registry
//!
//! Maps entity names to their delegates, plus one global pre-delete hook.
//! Registration happens once at startup and is fatal on conflict; lookups
//! afterwards are read-only, so the registry can be shared behind an `Arc`
//! without interior locking.

use crate::core::delegate::{DeleteHook, DeleteHookContext, EntityDelegate};
use crate::core::error::{GraftError, GraftResult, GraphQLError, RegistryError};
use crate::resolvers::table::CrudOperation;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Registry of entity delegates
#[derive(Default)]
pub struct ResolverRegistry {
    entities: HashMap<String, Arc<dyn EntityDelegate>>,
    delete_hook: Option<Arc<dyn DeleteHook>>,
}

fn is_pascal_case(name: &str) -> bool {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap());
    regex.is_match(name)
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            delete_hook: None,
        }
    }

    /// Register a delegate for an entity
    ///
    /// Entity names must be PascalCase identifiers since they are embedded
    /// in the generated field names. Registering a name twice is an error;
    /// callers treat it as fatal at startup.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut registry = ResolverRegistry::new();
    /// registry.register("User", Arc::new(UserDelegate::new()))?;
    /// ```
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        delegate: Arc<dyn EntityDelegate>,
    ) -> GraftResult<()> {
        let entity = entity.into();
        if !is_pascal_case(&entity) {
            return Err(RegistryError::InvalidEntityName {
                entity,
                message: "entity names must be PascalCase identifiers".to_string(),
            }
            .into());
        }
        if self.entities.contains_key(&entity) {
            return Err(RegistryError::AlreadyRegistered { entity }.into());
        }

        tracing::debug!(entity = %entity, "Registered entity delegate");
        self.entities.insert(entity, delegate);
        Ok(())
    }

    /// Install the global pre-delete hook
    ///
    /// One hook serves every entity; it receives the entity name in its
    /// context. Installing a second hook replaces the first.
    pub fn set_delete_hook(&mut self, hook: Arc<dyn DeleteHook>) {
        tracing::debug!("Installed pre-delete hook");
        self.delete_hook = Some(hook);
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Registered entity names, sorted
    pub fn entities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn delegate(&self, entity: &str) -> Option<&Arc<dyn EntityDelegate>> {
        self.entities.get(entity)
    }

    /// Route one CRUD operation to the entity's delegate
    ///
    /// Delete operations run the pre-delete hook first with the operation's
    /// `where` argument (JSON `null` when absent); a hook failure aborts the
    /// operation before the delegate is called.
    pub async fn dispatch(
        &self,
        op: CrudOperation,
        entity: &str,
        args: Value,
    ) -> GraftResult<Value> {
        let delegate = self
            .entities
            .get(entity)
            .ok_or_else(|| RegistryError::UnknownEntity {
                entity: entity.to_string(),
            })?;

        tracing::debug!(
            entity = %entity,
            method = %op.delegate_method(),
            "Dispatching CRUD operation"
        );

        if op.is_delete()
            && let Some(hook) = &self.delete_hook
        {
            let filter = args.get("where").cloned().unwrap_or(Value::Null);
            let ctx = DeleteHookContext::new(entity, filter);
            hook.on_delete(ctx).await.map_err(execution_error)?;
        }

        let result = match op {
            CrudOperation::FindOne => delegate.find_one(args).await,
            CrudOperation::FindMany => delegate.find_many(args).await,
            CrudOperation::FindManyCount => delegate.count(args).await,
            CrudOperation::Aggregate => delegate.aggregate(args).await,
            CrudOperation::CreateOne => delegate.create(args).await,
            CrudOperation::UpdateOne => delegate.update(args).await,
            CrudOperation::DeleteOne => delegate.delete(args).await,
            CrudOperation::UpsertOne => delegate.upsert(args).await,
            CrudOperation::DeleteMany => delegate.delete_many(args).await,
            CrudOperation::UpdateMany => delegate.update_many(args).await,
        };
        result.map_err(execution_error)
    }
}

/// Map a delegate or hook failure to a typed error
///
/// Typed errors that crossed the `anyhow` seam keep their identity; plain
/// failures surface as GraphQL execution errors.
fn execution_error(err: anyhow::Error) -> GraftError {
    match err.downcast::<GraftError>() {
        Ok(typed) => typed,
        Err(other) => GraphQLError::ExecutionError {
            message: other.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct EchoDelegate;

    #[async_trait]
    impl EntityDelegate for EchoDelegate {
        async fn find_one(&self, args: Value) -> Result<Value> {
            Ok(json!({ "method": "find_one", "args": args }))
        }

        async fn delete(&self, args: Value) -> Result<Value> {
            Ok(json!({ "method": "delete", "args": args }))
        }

        async fn delete_many(&self, args: Value) -> Result<Value> {
            Ok(json!({ "method": "delete_many", "args": args }))
        }
    }

    /// Records every context it sees; optionally fails
    struct RecordingHook {
        contexts: Mutex<Vec<Value>>,
        fail: bool,
    }

    impl RecordingHook {
        fn new(fail: bool) -> Self {
            Self {
                contexts: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl DeleteHook for RecordingHook {
        async fn on_delete(&self, ctx: DeleteHookContext) -> Result<()> {
            self.contexts
                .lock()
                .expect("lock poisoned")
                .push(serde_json::to_value(&ctx)?);
            if self.fail {
                anyhow::bail!("cascade failed");
            }
            Ok(())
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ResolverRegistry::new();
        registry
            .register("User", Arc::new(EchoDelegate))
            .expect("first registration should succeed");

        let err = registry
            .register("User", Arc::new(EchoDelegate))
            .expect_err("duplicate should fail");
        assert!(matches!(
            err,
            GraftError::Registry(RegistryError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_register_rejects_non_pascal_case() {
        let mut registry = ResolverRegistry::new();
        for name in ["user", "user_profile", "User Profile", "2User", ""] {
            let err = registry
                .register(name, Arc::new(EchoDelegate))
                .expect_err("should fail");
            assert!(
                matches!(
                    err,
                    GraftError::Registry(RegistryError::InvalidEntityName { .. })
                ),
                "name '{}' should be invalid",
                name
            );
        }
    }

    #[test]
    fn test_pascal_case_accepts_digits_after_first() {
        let mut registry = ResolverRegistry::new();
        registry
            .register("OAuth2Token", Arc::new(EchoDelegate))
            .expect("should register");
        assert!(registry.contains("OAuth2Token"));
    }

    #[test]
    fn test_entities_sorted() {
        let mut registry = ResolverRegistry::new();
        registry.register("Post", Arc::new(EchoDelegate)).unwrap();
        registry.register("Comment", Arc::new(EchoDelegate)).unwrap();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();
        assert_eq!(registry.entities(), vec!["Comment", "Post", "User"]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_entity() {
        let registry = ResolverRegistry::new();
        let err = registry
            .dispatch(CrudOperation::FindOne, "Ghost", json!({}))
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            GraftError::Registry(RegistryError::UnknownEntity { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_delegate_method() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();

        let result = registry
            .dispatch(
                CrudOperation::FindOne,
                "User",
                json!({ "where": { "id": "1" } }),
            )
            .await
            .expect("should dispatch");
        assert_eq!(result["method"], "find_one");
        assert_eq!(result["args"]["where"]["id"], "1");
    }

    #[tokio::test]
    async fn test_dispatch_unimplemented_method_is_execution_error() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();

        let err = registry
            .dispatch(CrudOperation::UpdateMany, "User", json!({}))
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            GraftError::GraphQL(GraphQLError::ExecutionError { .. })
        ));
        assert!(err.to_string().contains("update_many"));
    }

    #[tokio::test]
    async fn test_delete_hook_runs_before_delete() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();

        let hook = Arc::new(RecordingHook::new(false));
        registry.set_delete_hook(hook.clone());

        let result = registry
            .dispatch(
                CrudOperation::DeleteOne,
                "User",
                json!({ "where": { "id": "42" } }),
            )
            .await
            .expect("should delete");
        assert_eq!(result["method"], "delete");

        let contexts = hook.contexts.lock().expect("lock poisoned");
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0]["model"], "User");
        assert_eq!(contexts[0]["where"]["id"], "42");
    }

    #[tokio::test]
    async fn test_hook_sees_each_entity_name() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();
        registry.register("Post", Arc::new(EchoDelegate)).unwrap();

        let hook = Arc::new(RecordingHook::new(false));
        registry.set_delete_hook(hook.clone());

        registry
            .dispatch(CrudOperation::DeleteOne, "User", json!({ "where": {} }))
            .await
            .expect("should delete");
        registry
            .dispatch(CrudOperation::DeleteMany, "Post", json!({ "where": {} }))
            .await
            .expect("should delete");

        let contexts = hook.contexts.lock().expect("lock poisoned");
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0]["model"], "User");
        assert_eq!(contexts[1]["model"], "Post");
    }

    #[tokio::test]
    async fn test_delete_hook_failure_aborts_delete() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();
        registry.set_delete_hook(Arc::new(RecordingHook::new(true)));

        let err = registry
            .dispatch(CrudOperation::DeleteOne, "User", json!({ "where": {} }))
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("cascade failed"));
    }

    #[tokio::test]
    async fn test_delete_many_hook_sees_null_filter_when_where_absent() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();

        let hook = Arc::new(RecordingHook::new(false));
        registry.set_delete_hook(hook.clone());

        registry
            .dispatch(CrudOperation::DeleteMany, "User", json!({}))
            .await
            .expect("should delete");

        let contexts = hook.contexts.lock().expect("lock poisoned");
        assert_eq!(contexts[0]["where"], Value::Null);
    }

    #[tokio::test]
    async fn test_hook_does_not_run_for_non_delete_operations() {
        let mut registry = ResolverRegistry::new();
        registry.register("User", Arc::new(EchoDelegate)).unwrap();

        let hook = Arc::new(RecordingHook::new(true));
        registry.set_delete_hook(hook.clone());

        registry
            .dispatch(CrudOperation::FindOne, "User", json!({}))
            .await
            .expect("find_one should not consult the hook");
        assert!(hook.contexts.lock().expect("lock poisoned").is_empty());
    }
}
