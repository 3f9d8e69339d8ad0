//! SQL Server schema bridge.
//!
//! Translates abstract column types to T-SQL DDL, reads catalog metadata back
//! into the same abstract model, and renders stored procedure and function
//! calls for drivers with and without output-parameter binding.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::{SchemaOptions, SqlConnection, SqlServerSchema};
pub use error::{DbError, DbResult};
