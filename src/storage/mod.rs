//! Storage implementations for entity delegates

pub mod memory;

pub use memory::InMemoryDelegate;
