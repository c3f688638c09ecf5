//! Request execution against the resolver registry
//!
//! Turns one GraphQL request into delegate calls: parse the document, take
//! its main operation, guard the operation kind against the table, convert
//! each top-level field's arguments and dispatch them through the registry.
//! Field results are collected under `{"data": ...}`; the first failure
//! aborts the request.

use crate::core::error::{GraftResult, GraphQLError};
use crate::core::operation::OperationKind;
use crate::resolvers::args::arguments_to_json;
use crate::resolvers::registry::ResolverRegistry;
use crate::resolvers::table::CrudOperation;
use graphql_parser::query::{Definition, OperationDefinition, Selection, parse_query};
use serde_json::{Value, json};
use std::sync::Arc;

/// Executes GraphQL requests against registered entity delegates
pub struct ResolverExecutor {
    registry: Arc<ResolverRegistry>,
}

impl ResolverExecutor {
    /// Create a new executor over a registry
    pub fn new(registry: Arc<ResolverRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ResolverRegistry> {
        &self.registry
    }

    /// Execute a GraphQL request and return the result as JSON
    ///
    /// `variables` is the request-level variables object; pass `Value::Null`
    /// when the request carried none.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = executor
    ///     .execute("query { findManyUser { id } }", Value::Null)
    ///     .await?;
    /// assert!(result["data"]["findManyUser"].is_array());
    /// ```
    pub async fn execute(&self, query: &str, variables: Value) -> GraftResult<Value> {
        let doc = parse_query::<String>(query).map_err(|e| GraphQLError::ParseError {
            message: e.to_string(),
        })?;

        // The main operation is the first operation definition in the
        // document; a bare selection set counts as an anonymous query.
        let operation = doc
            .definitions
            .iter()
            .find_map(|def| {
                if let Definition::Operation(op) = def {
                    Some(op)
                } else {
                    None
                }
            })
            .ok_or_else(|| GraphQLError::ParseError {
                message: "no operation definition in document".to_string(),
            })?;

        let (kind, selections) = match operation {
            OperationDefinition::Query(q) => (OperationKind::Query, &q.selection_set.items),
            OperationDefinition::SelectionSet(s) => (OperationKind::Query, &s.items),
            OperationDefinition::Mutation(m) => (OperationKind::Mutation, &m.selection_set.items),
            OperationDefinition::Subscription(s) => {
                return Err(GraphQLError::InvalidOperation {
                    operation: s.name.clone().unwrap_or_else(|| "subscription".to_string()),
                    message: "Subscriptions are not supported".to_string(),
                }
                .into());
            }
        };

        let data = self.resolve_selections(selections, kind, &variables).await?;
        Ok(json!({ "data": data }))
    }

    /// Resolve every top-level field of the operation
    async fn resolve_selections(
        &self,
        selections: &[Selection<'_, String>],
        kind: OperationKind,
        variables: &Value,
    ) -> GraftResult<Value> {
        let mut data = serde_json::Map::new();

        for selection in selections {
            if let Selection::Field(field) = selection {
                let field_name = field.name.as_str();

                let (op, entity) = CrudOperation::parse(field_name).ok_or_else(|| {
                    GraphQLError::UnknownField {
                        field: field_name.to_string(),
                    }
                })?;

                if op.kind() != kind {
                    return Err(GraphQLError::InvalidOperation {
                        operation: field_name.to_string(),
                        message: format!("must be executed as a {}", op.kind()),
                    }
                    .into());
                }

                let args = arguments_to_json(&field.arguments, variables)?;
                let value = self.registry.dispatch(op, &entity, args).await?;

                let response_key = field.alias.as_deref().unwrap_or(field_name);
                data.insert(response_key.to_string(), value);
            }
        }

        Ok(Value::Object(data))
    }
}
