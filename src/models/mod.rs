//! Data models for the SQL Server schema bridge.
//!
//! This module contains the abstract schema model and the value types
//! exchanged with the statement-execution interface.

pub mod identifier;
pub mod query;
pub mod routine;
pub mod schema;
pub mod types;

pub use identifier::*;
pub use query::*;
pub use routine::*;
pub use schema::*;
pub use types::*;
