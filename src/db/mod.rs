//! SQL Server schema layer.
//!
//! This module provides:
//! - Abstract-to-native type translation and value coercion
//! - DDL rendering
//! - Catalog introspection
//! - Stored procedure and function invocation for each driver profile
//! - The statement-execution interface and driver probing
//! - A tiberius-backed connection (feature `mssql`)

pub mod connection;
pub mod ddl;
#[cfg(feature = "mssql")]
pub mod mssql;
pub mod routine;
pub mod schema;
pub mod types;

pub use connection::{
    DriverCapabilities, DriverFamily, DriverProbe, SqlConnection, StaticDriverProbe,
};
pub use ddl::DdlBuilder;
#[cfg(feature = "mssql")]
pub use mssql::TiberiusConnection;
pub use routine::{
    BoundOutputInvoker, DeclareSelectInvoker, ParamBinding, RoutineCall, RoutineInvoker,
};
pub use schema::{SchemaOptions, SqlServerSchema};
