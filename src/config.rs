//! Configuration handling for the schema bridge CLI.
//!
//! Options come from CLI arguments with `MSSQL_*` environment fallbacks and are
//! converted to the library's [`SchemaOptions`].

use crate::db::connection::StaticDriverProbe;
use crate::db::schema::{DEFAULT_SCHEMA, SchemaOptions};
use crate::db::types::DEFAULT_STRING_MAX_SIZE;
use crate::error::{DbError, DbResult};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

pub const DEFAULT_DRIVER: &str = "sqlsrv";

/// Configuration for the `mssql-schema` CLI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mssql-schema",
    about = "SQL Server schema bridge - render column DDL, routine calls and catalog metadata",
    version,
    author
)]
pub struct Config {
    /// Driver names reported as available.
    /// `sqlsrv` binds output parameters; `dblib` and `odbc` do not.
    #[arg(
        long = "driver",
        value_name = "NAME",
        env = "MSSQL_DRIVERS",
        value_delimiter = ',',
        default_value = DEFAULT_DRIVER
    )]
    pub drivers: Vec<String>,

    /// Schema owning unqualified objects
    #[arg(long, default_value = DEFAULT_SCHEMA, env = "MSSQL_DEFAULT_SCHEMA")]
    pub default_schema: String,

    /// Length for varchar, nvarchar and varbinary columns declared without one
    #[arg(long, default_value_t = DEFAULT_STRING_MAX_SIZE, env = "MSSQL_STRING_MAX_SIZE")]
    pub string_max_size: u32,

    /// Extra statement to run after connecting. Can be repeated.
    #[arg(long = "init-statement", value_name = "SQL")]
    pub init_statements: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "MSSQL_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MSSQL_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// JSON arguments accept inline JSON or `@path` to read it from a file.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the column definition for a column spec
    Column {
        #[arg(long, value_name = "JSON")]
        spec: String,
    },
    /// Print CREATE TABLE for a list of named column specs
    CreateTable {
        /// Table name, optionally schema-qualified (`sales.orders`)
        #[arg(long)]
        table: String,
        #[arg(long, value_name = "JSON")]
        spec: String,
    },
    /// Print the EXEC statement and binding plan for a stored procedure
    Procedure {
        #[arg(long, value_name = "JSON")]
        routine: String,
        #[arg(long, value_name = "JSON", default_value = "{}")]
        values: String,
    },
    /// Print the SELECT statement and binding plan for a function
    Function {
        #[arg(long, value_name = "JSON")]
        routine: String,
        #[arg(long, value_name = "JSON", default_value = "{}")]
        values: String,
    },
    /// Print tables and their columns from a live server (feature `mssql`)
    Inspect {
        /// ADO.NET connection string
        #[arg(long, env = "MSSQL_CONNECTION", hide_env_values = true)]
        connection: String,
        /// Schema to list; all schemas when omitted
        #[arg(long, default_value = "")]
        schema: String,
    },
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_schema_options(&self) -> SchemaOptions {
        SchemaOptions {
            default_schema: self.default_schema.clone(),
            string_max_size: self.string_max_size,
            init_statements: self.init_statements.clone(),
        }
    }

    /// Driver probe backed by the configured driver list.
    pub fn driver_probe(&self) -> StaticDriverProbe {
        StaticDriverProbe::new(self.drivers.iter().map(|d| d.trim().to_string()))
    }
}

/// Resolve a JSON argument: `@path` reads the file, anything else is inline.
pub fn read_json_arg(arg: &str) -> DbResult<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| DbError::invalid_input(format!("Cannot read '{}': {}", path, e))),
        None => Ok(arg.to_string()),
    }
}

/// Resolve and deserialize a JSON argument.
pub fn parse_json_arg<T: DeserializeOwned>(arg: &str) -> DbResult<T> {
    Ok(serde_json::from_str(&read_json_arg(arg)?)?)
}
