//! The typed value model and the per-database keyspace index (spec.md ยง3).

pub mod keyspace;
pub mod value;

pub use keyspace::{Database, Keyspace};
pub use value::{Value, ValueRef};
