//! Shared test helpers: an in-memory connection that records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use mssql_schema::db::{SchemaOptions, SqlConnection, SqlServerSchema, StaticDriverProbe};
use mssql_schema::error::DbResult;
use mssql_schema::models::{QueryParam, Row};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};

/// Canned rows are returned for the first registered SQL fragment found in the query.
#[derive(Default)]
pub struct RecordingConnection {
    responses: Mutex<Vec<(String, Vec<Row>)>>,
    selects: Mutex<Vec<(String, Vec<QueryParam>)>>,
    statements: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, fragment: &str, rows: Vec<JsonValue>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().expect("row must be a JSON object"))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push((fragment.to_string(), rows));
        self
    }

    pub fn selects(&self) -> Vec<(String, Vec<QueryParam>)> {
        self.selects.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    /// Number of queries containing a fragment.
    pub fn select_count(&self, fragment: &str) -> usize {
        self.selects
            .lock()
            .unwrap()
            .iter()
            .filter(|(sql, _)| sql.contains(fragment))
            .count()
    }
}

#[async_trait]
impl SqlConnection for RecordingConnection {
    async fn select(&self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<Row>> {
        self.selects
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn statement(&self, sql: &str) -> DbResult<bool> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(true)
    }
}

pub const BASE_TABLES: &str = "TABLE_TYPE = 'BASE TABLE'";
pub const VIEWS: &str = "TABLE_TYPE = 'VIEW'";
pub const COLUMNS: &str = "INFORMATION_SCHEMA.COLUMNS";
pub const INDEXES: &str = "sys.indexes";
pub const CONSTRAINTS: &str = "INFORMATION_SCHEMA.TABLE_CONSTRAINTS";
pub const ROUTINES: &str = "ROUTINE_TYPE = @P1";
pub const PARAMETERS: &str = "INFORMATION_SCHEMA.PARAMETERS";
pub const SCHEMATA: &str = "INFORMATION_SCHEMA.SCHEMATA";

/// Build a schema bridge over a recording connection with the given drivers.
pub fn bridge(
    conn: RecordingConnection,
    drivers: &[&str],
) -> (Arc<RecordingConnection>, SqlServerSchema) {
    let conn = Arc::new(conn);
    let schema = SqlServerSchema::new(
        conn.clone(),
        &StaticDriverProbe::new(drivers.iter().copied()),
        SchemaOptions::default(),
    )
    .expect("driver probe should succeed");
    (conn, schema)
}
