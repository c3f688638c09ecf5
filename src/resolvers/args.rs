//! Conversion of GraphQL field arguments to JSON
//!
//! Delegates receive a field's arguments as a single JSON object. Literal
//! values map structurally; variable references are substituted from the
//! request's variables object, and a reference to a variable that was not
//! provided fails the whole operation.

use crate::core::error::{GraftResult, GraphQLError};
use graphql_parser::query::Value as GqlValue;
use serde_json::{Map, Value, json};

/// Convert a field's argument list to a JSON object
///
/// `variables` is the request-level variables object (`null` when the
/// request carried none).
pub fn arguments_to_json(
    arguments: &[(String, GqlValue<'_, String>)],
    variables: &Value,
) -> GraftResult<Value> {
    let mut object = Map::new();
    for (name, value) in arguments {
        object.insert(name.clone(), gql_value_to_json(value, variables)?);
    }
    Ok(Value::Object(object))
}

/// Convert a single GraphQL value to JSON, resolving variable references
pub fn gql_value_to_json(value: &GqlValue<'_, String>, variables: &Value) -> GraftResult<Value> {
    match value {
        GqlValue::Variable(name) => {
            variables.get(name.as_str()).cloned().ok_or_else(|| {
                GraphQLError::VariableNotProvided {
                    variable: name.clone(),
                }
                .into()
            })
        }
        GqlValue::Null => Ok(Value::Null),
        GqlValue::Int(i) => Ok(json!(i.as_i64().unwrap_or(0))),
        GqlValue::Float(f) => Ok(json!(f)),
        GqlValue::String(s) => Ok(json!(s)),
        GqlValue::Boolean(b) => Ok(json!(b)),
        GqlValue::Enum(e) => Ok(json!(e)),
        GqlValue::List(list) => {
            let mut items = Vec::with_capacity(list.len());
            for item in list {
                items.push(gql_value_to_json(item, variables)?);
            }
            Ok(Value::Array(items))
        }
        GqlValue::Object(obj) => {
            let mut map = Map::new();
            for (key, value) in obj {
                map.insert(key.clone(), gql_value_to_json(value, variables)?);
            }
            Ok(Value::Object(map))
        }
    }
}
