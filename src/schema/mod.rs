//! Table Schema Registry - typed column layouts for record types
//!
//! A record type describes its mapped fields once through [`Record`]
//! (usually via the [`record!`](crate::record) macro). The [`Registry`]
//! validates that description on first use and caches the resulting
//! [`TableSchema`] for the registry's lifetime.

pub mod record;
pub mod registry;

pub use record::{FieldDescriptor, Record, TableSchema};
pub use registry::Registry;
