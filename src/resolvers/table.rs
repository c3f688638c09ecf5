//! The CRUD operation table
//!
//! Every registered entity answers to ten generated operations, named by a
//! camelCase prefix and an optional suffix around the PascalCase entity
//! name (`findOneUser`, `findManyUserCount`, `deleteManyUser`, ...). This
//! table is the single source of truth for which operations exist, which
//! GraphQL kind serves them, and how a top-level field name maps back to
//! an operation and entity.

use crate::core::operation::OperationKind;
use std::fmt;

/// One of the ten generated CRUD operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    FindOne,
    FindMany,
    FindManyCount,
    Aggregate,
    CreateOne,
    UpdateOne,
    DeleteOne,
    UpsertOne,
    DeleteMany,
    UpdateMany,
}

/// All operations, in field-name match order
///
/// `FindManyCount` sits before `FindMany` so `findManyUserCount` is not
/// claimed by the plain list operation. The bare field `findManyCount`
/// still falls through to `FindMany` with entity `Count`.
pub const ALL_OPERATIONS: [CrudOperation; 10] = [
    CrudOperation::FindOne,
    CrudOperation::FindManyCount,
    CrudOperation::FindMany,
    CrudOperation::Aggregate,
    CrudOperation::CreateOne,
    CrudOperation::UpdateOne,
    CrudOperation::DeleteOne,
    CrudOperation::UpsertOne,
    CrudOperation::DeleteMany,
    CrudOperation::UpdateMany,
];

impl CrudOperation {
    /// Field-name prefix before the entity name
    pub fn prefix(&self) -> &'static str {
        match self {
            CrudOperation::FindOne => "findOne",
            CrudOperation::FindMany | CrudOperation::FindManyCount => "findMany",
            CrudOperation::Aggregate => "aggregate",
            CrudOperation::CreateOne => "createOne",
            CrudOperation::UpdateOne => "updateOne",
            CrudOperation::DeleteOne => "deleteOne",
            CrudOperation::UpsertOne => "upsertOne",
            CrudOperation::DeleteMany => "deleteMany",
            CrudOperation::UpdateMany => "updateMany",
        }
    }

    /// Field-name suffix after the entity name
    pub fn suffix(&self) -> &'static str {
        match self {
            CrudOperation::FindManyCount => "Count",
            _ => "",
        }
    }

    /// The GraphQL operation kind that serves this operation
    pub fn kind(&self) -> OperationKind {
        match self {
            CrudOperation::FindOne
            | CrudOperation::FindMany
            | CrudOperation::FindManyCount
            | CrudOperation::Aggregate => OperationKind::Query,
            CrudOperation::CreateOne
            | CrudOperation::UpdateOne
            | CrudOperation::DeleteOne
            | CrudOperation::UpsertOne
            | CrudOperation::DeleteMany
            | CrudOperation::UpdateMany => OperationKind::Mutation,
        }
    }

    /// Name of the delegate method serving this operation
    pub fn delegate_method(&self) -> &'static str {
        match self {
            CrudOperation::FindOne => "find_one",
            CrudOperation::FindMany => "find_many",
            CrudOperation::FindManyCount => "count",
            CrudOperation::Aggregate => "aggregate",
            CrudOperation::CreateOne => "create",
            CrudOperation::UpdateOne => "update",
            CrudOperation::DeleteOne => "delete",
            CrudOperation::UpsertOne => "upsert",
            CrudOperation::DeleteMany => "delete_many",
            CrudOperation::UpdateMany => "update_many",
        }
    }

    /// Whether the pre-delete hook applies to this operation
    pub fn is_delete(&self) -> bool {
        matches!(self, CrudOperation::DeleteOne | CrudOperation::DeleteMany)
    }

    /// The generated field name for an entity (e.g. `findManyUserCount`)
    pub fn field_name(&self, entity: &str) -> String {
        format!("{}{}{}", self.prefix(), entity, self.suffix())
    }

    /// Map a top-level field name back to an operation and entity name
    ///
    /// Returns `None` when the field matches no operation pattern or the
    /// entity segment between prefix and suffix is empty.
    pub fn parse(field: &str) -> Option<(CrudOperation, String)> {
        for op in ALL_OPERATIONS {
            let Some(rest) = field.strip_prefix(op.prefix()) else {
                continue;
            };
            let Some(entity) = rest.strip_suffix(op.suffix()) else {
                continue;
            };
            if !entity.is_empty() {
                return Some((op, entity.to_string()));
            }
        }
        None
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.delegate_method())
    }
}
