//! Resolver layer: CRUD operations over entity delegates
//!
//! Maps the generated GraphQL field names (`findOneUser`, `createOnePost`,
//! ...) onto [`EntityDelegate`](crate::core::delegate::EntityDelegate)
//! calls, with a pre-delete hook in front of the delete operations.

pub mod args;
pub mod executor;
pub mod registry;
pub mod table;

pub use args::{arguments_to_json, gql_value_to_json};
pub use executor::ResolverExecutor;
pub use registry::ResolverRegistry;
pub use table::{ALL_OPERATIONS, CrudOperation};
