//! GraphQL operation model
//!
//! An [`Operation`] is the unit of work the transport pipeline routes and the
//! terminal transports send: the operation kind, an optional name, the
//! document text, its variables, and optional file attachments. Operations
//! are immutable once constructed.

use crate::core::error::{GraftResult, GraphQLError};
use graphql_parser::query::{Definition, OperationDefinition, parse_query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of a GraphQL operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

/// A file carried alongside a mutation
///
/// `variable_path` is the dotted path of the attachment inside the
/// operation's variables (e.g. `"file"` or `"input.avatar"`). The upload
/// transport nulls that position out of the serialized variables and sends
/// the bytes as a separate multipart part.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    /// Dotted path within `variables` where this file belongs
    pub variable_path: String,
    /// Original file name
    pub filename: String,
    /// MIME type (e.g. "image/png")
    pub content_type: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(
        variable_path: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            variable_path: variable_path.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// The wire form of an operation
///
/// This is the JSON object GraphQL servers accept: the document text, the
/// variables, and the operation name when one is set. The batch transport
/// sends arrays of these; the WebSocket transport wraps one in each `start`
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPayload {
    pub query: String,
    pub variables: Value,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

/// A single GraphQL operation
#[derive(Debug, Clone)]
pub struct Operation {
    /// Query, mutation, or subscription
    pub kind: OperationKind,
    /// Name of the main operation definition, if it has one
    pub operation_name: Option<String>,
    /// The GraphQL document text
    pub query: String,
    /// Variables object forwarded verbatim
    pub variables: Value,
    /// Files carried by this operation (upload transport only)
    pub attachments: Vec<FileAttachment>,
}

impl Operation {
    /// Create an operation directly from its parts
    pub fn new(
        kind: OperationKind,
        operation_name: Option<String>,
        query: impl Into<String>,
        variables: Value,
    ) -> Self {
        Self {
            kind,
            operation_name,
            query: query.into(),
            variables,
            attachments: Vec::new(),
        }
    }

    /// Build an operation by parsing a GraphQL document
    ///
    /// The kind and name are taken from the main (first) operation definition
    /// in the document. A shorthand selection set counts as an anonymous
    /// query.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let op = Operation::parse(
    ///     "subscription OnUserChanged { userChanged { id } }",
    ///     serde_json::json!({}),
    /// )?;
    /// assert_eq!(op.kind, OperationKind::Subscription);
    /// ```
    pub fn parse(document: &str, variables: Value) -> GraftResult<Self> {
        let doc = parse_query::<String>(document).map_err(|e| GraphQLError::ParseError {
            message: format!("{}", e),
        })?;

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

        let (kind, name) = match operation {
            OperationDefinition::SelectionSet(_) => (OperationKind::Query, None),
            OperationDefinition::Query(q) => (OperationKind::Query, q.name.clone()),
            OperationDefinition::Mutation(m) => (OperationKind::Mutation, m.name.clone()),
            OperationDefinition::Subscription(s) => (OperationKind::Subscription, s.name.clone()),
        };

        Ok(Self::new(kind, name, document, variables))
    }

    /// Attach files to this operation
    pub fn with_attachments(mut self, attachments: Vec<FileAttachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// The request payload sent over the wire
    pub fn payload(&self) -> OperationPayload {
        OperationPayload {
            query: self.query.clone(),
            variables: self.variables.clone(),
            operation_name: self.operation_name.clone(),
        }
    }

    pub fn is_subscription(&self) -> bool {
        self.kind == OperationKind::Subscription
    }
}
