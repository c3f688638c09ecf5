//! Core module containing fundamental traits and types for the crate

pub mod delegate;
pub mod error;
pub mod operation;

pub use delegate::{DeleteHook, DeleteHookContext, EntityDelegate};
pub use error::{
    ConfigError, GraftError, GraftResult, GraphQLError, RegistryError, TransportError,
};
pub use operation::{FileAttachment, Operation, OperationKind, OperationPayload};
