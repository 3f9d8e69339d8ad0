//! mssql-schema - Main entry point.
//!
//! Renders column DDL and routine calls offline, or inspects a live server
//! when built with the `mssql` feature.

use mssql_schema::config::{Command, Config, parse_json_arg};
use mssql_schema::db::connection::DriverCapabilities;
use mssql_schema::db::routine::{RoutineCall, function_bindings, function_statement, invoker_for};
use mssql_schema::db::DdlBuilder;
use mssql_schema::models::{ColumnSpec, RoutineSchema, Row, quote_table_name};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the command output.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.to_schema_options();
    let ddl = DdlBuilder::new(options.string_max_size);

    match &config.command {
        Command::Column { spec } => {
            let spec: ColumnSpec = parse_json_arg(spec)?;
            println!("{}", ddl.column_type(spec)?);
        }
        Command::CreateTable { table, spec } => {
            let specs: Vec<ColumnSpec> = parse_json_arg(spec)?;
            println!("{}", ddl.create_table(&quote_table_name(table), specs)?);
        }
        Command::Procedure { routine, values } => {
            let routine: RoutineSchema = parse_json_arg::<RoutineSchema>(routine)?.normalized();
            let values: Row = parse_json_arg(values)?;
            let capabilities = DriverCapabilities::probe(&config.driver_probe())?;
            let call = invoker_for(capabilities.family).procedure_call(&routine, &values);
            print_json(&call)?;
        }
        Command::Function { routine, values } => {
            let routine: RoutineSchema = parse_json_arg::<RoutineSchema>(routine)?.normalized();
            let values: Row = parse_json_arg(values)?;
            let call = RoutineCall {
                statement: function_statement(&routine, &routine.parameters, &options.default_schema),
                bindings: function_bindings(&routine.parameters, &values),
            };
            print_json(&call)?;
        }
        Command::Inspect { connection, schema } => inspect(config, connection, schema).await?,
    }
    Ok(())
}

#[cfg(feature = "mssql")]
async fn inspect(
    config: &Config,
    connection: &str,
    schema: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use mssql_schema::db::{SqlServerSchema, TiberiusConnection};
    use std::sync::Arc;

    let conn = Arc::new(TiberiusConnection::connect(connection).await?);
    let bridge = SqlServerSchema::new(conn, &config.driver_probe(), config.to_schema_options())?;
    bridge.run_init_statements().await?;

    let schemas: Vec<String> = if schema.is_empty() {
        bridge.get_schemas().await?
    } else {
        vec![schema.to_string()]
    };
    let constraints = bridge.get_table_constraints(&schemas).await?;

    let mut tables = Vec::new();
    for table in bridge.get_table_names(schema).await?.into_values() {
        let table = bridge.load_table_columns(table).await?;
        tables.push(bridge.apply_constraints(table, &constraints));
    }
    info!(tables = tables.len(), "Inspected catalog");
    print_json(&tables)
}

#[cfg(not(feature = "mssql"))]
async fn inspect(
    _config: &Config,
    _connection: &str,
    _schema: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("inspect needs a build with the `mssql` feature".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        drivers = ?config.drivers,
        "Starting mssql-schema v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(&config).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}
