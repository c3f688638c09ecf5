//! In-memory implementation of EntityDelegate for testing and development
//!
//! Records are plain JSON objects keyed by a generated id. Argument shapes
//! follow the data-client conventions the resolver layer forwards: `where`
//! for equality filters, `data` for writes, `take`/`skip` for pagination,
//! `create`/`update` arms for upsert. Bulk writes report `{"count": n}`.

use crate::core::delegate::EntityDelegate;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory entity delegate
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// records iterate in insertion order, which keeps `skip`/`take` stable.
#[derive(Clone)]
pub struct InMemoryDelegate {
    records: Arc<RwLock<IndexMap<Uuid, Value>>>,
}

impl InMemoryDelegate {
    /// Create a new empty delegate
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a record directly, bypassing the delegate methods
    ///
    /// Missing ids are generated. Used to seed test and demo data.
    pub fn seed(&self, mut record: Value) -> Result<Value> {
        let id = ensure_id(&mut record)?;
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records.insert(id, record.clone());
        Ok(record)
    }
}

impl Default for InMemoryDelegate {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a record satisfies a `where` filter
///
/// Every key of the filter must be present in the record with an equal
/// value. An absent, null, or empty filter matches everything.
fn matches_filter(record: &Value, filter: &Value) -> bool {
    match filter {
        Value::Null => true,
        Value::Object(conditions) => conditions
            .iter()
            .all(|(key, expected)| record.get(key) == Some(expected)),
        _ => false,
    }
}

/// Give a record an id, generating one when absent
fn ensure_id(record: &mut Value) -> Result<Uuid> {
    let Value::Object(map) = record else {
        return Err(anyhow!("record data must be a JSON object"));
    };
    match map.get("id").and_then(Value::as_str) {
        Some(existing) => Uuid::parse_str(existing)
            .map_err(|_| anyhow!("record id '{}' is not a valid UUID", existing)),
        None => {
            let id = Uuid::new_v4();
            map.insert("id".to_string(), json!(id.to_string()));
            Ok(id)
        }
    }
}

/// Shallow-merge `data` into a stored record, leaving other fields alone
fn apply_update(record: &mut Value, data: &Value) {
    let (Value::Object(target), Value::Object(changes)) = (record, data) else {
        return;
    };
    for (key, value) in changes {
        if key == "id" {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

#[async_trait]
impl EntityDelegate for InMemoryDelegate {
    async fn find_one(&self, args: Value) -> Result<Value> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        Ok(records
            .values()
            .find(|record| matches_filter(record, &filter))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn find_many(&self, args: Value) -> Result<Value> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let skip = args.get("skip").and_then(Value::as_u64).unwrap_or(0) as usize;
        let take = args.get("take").and_then(Value::as_u64).map(|t| t as usize);

        let matching = records
            .values()
            .filter(|record| matches_filter(record, &filter))
            .skip(skip);
        let selected: Vec<Value> = match take {
            Some(take) => matching.take(take).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(Value::Array(selected))
    }

    async fn count(&self, args: Value) -> Result<Value> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let count = records
            .values()
            .filter(|record| matches_filter(record, &filter))
            .count();
        Ok(json!(count))
    }

    async fn aggregate(&self, args: Value) -> Result<Value> {
        let count = self.count(args).await?;
        Ok(json!({ "_count": count }))
    }

    async fn create(&self, args: Value) -> Result<Value> {
        let mut record = args.get("data").cloned().unwrap_or(json!({}));
        let id = ensure_id(&mut record)?;

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, args: Value) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let data = args.get("data").cloned().unwrap_or(json!({}));

        let record = records
            .values_mut()
            .find(|record| matches_filter(record, &filter))
            .ok_or_else(|| anyhow!("Record not found"))?;
        apply_update(record, &data);
        Ok(record.clone())
    }

    async fn delete(&self, args: Value) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let id = records
            .iter()
            .find(|(_, record)| matches_filter(record, &filter))
            .map(|(id, _)| *id)
            .ok_or_else(|| anyhow!("Record not found"))?;

        Ok(records.shift_remove(&id).unwrap_or(Value::Null))
    }

    async fn upsert(&self, args: Value) -> Result<Value> {
        let filter = args.get("where").cloned().unwrap_or(Value::Null);

        {
            let mut records = self
                .records
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            if let Some(record) = records
                .values_mut()
                .find(|record| matches_filter(record, &filter))
            {
                let update = args.get("update").cloned().unwrap_or(json!({}));
                apply_update(record, &update);
                return Ok(record.clone());
            }
        }

        let create = args.get("create").cloned().unwrap_or(json!({}));
        self.create(json!({ "data": create })).await
    }

    async fn delete_many(&self, args: Value) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let before = records.len();
        records.retain(|_, record| !matches_filter(record, &filter));

        Ok(json!({ "count": before - records.len() }))
    }

    async fn update_many(&self, args: Value) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let filter = args.get("where").cloned().unwrap_or(Value::Null);
        let data = args.get("data").cloned().unwrap_or(json!({}));

        let mut count = 0;
        for record in records
            .values_mut()
            .filter(|record| matches_filter(record, &filter))
        {
            apply_update(record, &data);
            count += 1;
        }
        Ok(json!({ "count": count }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryDelegate {
        let delegate = InMemoryDelegate::new();
        for (name, role) in [("Ada", "admin"), ("Grace", "member"), ("Alan", "member")] {
            delegate
                .create(json!({ "data": { "name": name, "role": role } }))
                .await
                .expect("should create");
        }
        delegate
    }

    #[tokio::test]
    async fn test_create_generates_id() {
        let delegate = InMemoryDelegate::new();
        let created = delegate
            .create(json!({ "data": { "name": "Ada" } }))
            .await
            .expect("should create");

        assert_eq!(created["name"], "Ada");
        let id = created["id"].as_str().expect("id should be a string");
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(delegate.len(), 1);
    }

    #[tokio::test]
    async fn test_create_keeps_provided_id() {
        let delegate = InMemoryDelegate::new();
        let id = Uuid::new_v4().to_string();
        let created = delegate
            .create(json!({ "data": { "id": id, "name": "Ada" } }))
            .await
            .expect("should create");
        assert_eq!(created["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_id() {
        let delegate = InMemoryDelegate::new();
        let result = delegate
            .create(json!({ "data": { "id": "not-a-uuid", "name": "Ada" } }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_one_matches_equality() {
        let delegate = seeded().await;
        let found = delegate
            .find_one(json!({ "where": { "name": "Grace" } }))
            .await
            .expect("should find");
        assert_eq!(found["name"], "Grace");
        assert_eq!(found["role"], "member");
    }

    #[tokio::test]
    async fn test_find_one_without_match_is_null() {
        let delegate = seeded().await;
        let found = delegate
            .find_one(json!({ "where": { "name": "Nobody" } }))
            .await
            .expect("should succeed");
        assert_eq!(found, Value::Null);
    }

    #[tokio::test]
    async fn test_find_many_filters_and_paginates() {
        let delegate = seeded().await;

        let members = delegate
            .find_many(json!({ "where": { "role": "member" } }))
            .await
            .expect("should find");
        assert_eq!(members.as_array().expect("array").len(), 2);

        let paged = delegate
            .find_many(json!({ "skip": 1, "take": 1 }))
            .await
            .expect("should find");
        let paged = paged.as_array().expect("array");
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0]["name"], "Grace");
    }

    #[tokio::test]
    async fn test_find_many_without_filter_returns_all() {
        let delegate = seeded().await;
        let all = delegate.find_many(json!({})).await.expect("should find");
        assert_eq!(all.as_array().expect("array").len(), 3);
    }

    #[tokio::test]
    async fn test_count_and_aggregate() {
        let delegate = seeded().await;

        let count = delegate
            .count(json!({ "where": { "role": "member" } }))
            .await
            .expect("should count");
        assert_eq!(count, json!(2));

        let aggregate = delegate.aggregate(json!({})).await.expect("should aggregate");
        assert_eq!(aggregate["_count"], 3);
    }

    #[tokio::test]
    async fn test_update_merges_data() {
        let delegate = seeded().await;
        let updated = delegate
            .update(json!({
                "where": { "name": "Ada" },
                "data": { "role": "owner" }
            }))
            .await
            .expect("should update");

        assert_eq!(updated["name"], "Ada");
        assert_eq!(updated["role"], "owner");

        let found = delegate
            .find_one(json!({ "where": { "name": "Ada" } }))
            .await
            .expect("should find");
        assert_eq!(found["role"], "owner");
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let delegate = seeded().await;
        let result = delegate
            .update(json!({ "where": { "name": "Nobody" }, "data": {} }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let delegate = seeded().await;
        let before = delegate
            .find_one(json!({ "where": { "name": "Ada" } }))
            .await
            .expect("should find");

        let updated = delegate
            .update(json!({
                "where": { "name": "Ada" },
                "data": { "id": "11111111-1111-1111-1111-111111111111" }
            }))
            .await
            .expect("should update");
        assert_eq!(updated["id"], before["id"]);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_record() {
        let delegate = seeded().await;
        let deleted = delegate
            .delete(json!({ "where": { "name": "Alan" } }))
            .await
            .expect("should delete");
        assert_eq!(deleted["name"], "Alan");
        assert_eq!(delegate.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_record_fails() {
        let delegate = seeded().await;
        let result = delegate.delete(json!({ "where": { "name": "Nobody" } })).await;
        assert!(result.is_err());
        assert_eq!(delegate.len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_updates_existing() {
        let delegate = seeded().await;
        let result = delegate
            .upsert(json!({
                "where": { "name": "Ada" },
                "update": { "role": "owner" },
                "create": { "name": "Ada", "role": "brand-new" }
            }))
            .await
            .expect("should upsert");

        assert_eq!(result["role"], "owner");
        assert_eq!(delegate.len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_creates_when_missing() {
        let delegate = seeded().await;
        let result = delegate
            .upsert(json!({
                "where": { "name": "Linus" },
                "update": { "role": "ignored" },
                "create": { "name": "Linus", "role": "guest" }
            }))
            .await
            .expect("should upsert");

        assert_eq!(result["name"], "Linus");
        assert_eq!(result["role"], "guest");
        assert_eq!(delegate.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_many_reports_count() {
        let delegate = seeded().await;
        let result = delegate
            .delete_many(json!({ "where": { "role": "member" } }))
            .await
            .expect("should delete");
        assert_eq!(result, json!({ "count": 2 }));
        assert_eq!(delegate.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_many_without_filter_clears_all() {
        let delegate = seeded().await;
        let result = delegate.delete_many(json!({})).await.expect("should delete");
        assert_eq!(result, json!({ "count": 3 }));
        assert!(delegate.is_empty());
    }

    #[tokio::test]
    async fn test_update_many_reports_count() {
        let delegate = seeded().await;
        let result = delegate
            .update_many(json!({
                "where": { "role": "member" },
                "data": { "role": "alumni" }
            }))
            .await
            .expect("should update");
        assert_eq!(result, json!({ "count": 2 }));

        let alumni = delegate
            .count(json!({ "where": { "role": "alumni" } }))
            .await
            .expect("should count");
        assert_eq!(alumni, json!(2));
    }

    #[tokio::test]
    async fn test_seed_inserts_directly() {
        let delegate = InMemoryDelegate::new();
        let seeded = delegate
            .seed(json!({ "name": "Ada" }))
            .expect("should seed");
        assert!(seeded["id"].is_string());
        assert_eq!(delegate.len(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_storage() {
        let delegate = InMemoryDelegate::new();
        let clone = delegate.clone();
        delegate
            .create(json!({ "data": { "name": "Ada" } }))
            .await
            .expect("should create");
        assert_eq!(clone.len(), 1);
    }
}
