//! Live [`SqlConnection`] over TDS using tiberius.
//!
//! One client behind a mutex; statements run one at a time. Rows come back
//! as JSON maps keyed by column name, binary columns base64-encoded.

use crate::db::connection::SqlConnection;
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, Row};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value as JsonValue;
use tiberius::{Client, ColumnData, Config, FromSql, Query};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

pub type MssqlClient = Client<Compat<TcpStream>>;

pub struct TiberiusConnection {
    client: Mutex<MssqlClient>,
}

impl TiberiusConnection {
    /// Connect with an ADO.NET connection string,
    /// e.g. `server=tcp:localhost,1433;user=sa;password=...;TrustServerCertificate=true`.
    pub async fn connect(connection_string: &str) -> DbResult<Self> {
        let config = Config::from_ado_string(connection_string)?;
        let addr = config.get_addr();

        let tcp = TcpStream::connect(&addr).await.map_err(|e| {
            DbError::connection(
                format!("TCP connection to {} failed: {}", addr, e),
                "Check that SQL Server is running and the host and port are correct",
            )
        })?;
        tcp.set_nodelay(true)
            .map_err(|e| DbError::connection(e.to_string(), "Check the network stack"))?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        info!(addr = %addr, "Connected to SQL Server");
        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

#[async_trait]
impl SqlConnection for TiberiusConnection {
    async fn select(&self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<Row>> {
        let mut query = Query::new(sql);
        for param in params {
            bind_param(&mut query, param);
        }

        let mut client = self.client.lock().await;
        let rows = query.query(&mut *client).await?.into_first_result().await?;
        debug!(rows = rows.len(), params = params.len(), "Query returned");
        Ok(rows.into_iter().map(row_to_json).collect())
    }

    async fn statement(&self, sql: &str) -> DbResult<bool> {
        let mut client = self.client.lock().await;
        let result = client.execute(sql, &[]).await?;
        debug!(rows_affected = result.total(), "Statement executed");
        Ok(true)
    }
}

fn bind_param<'a>(query: &mut Query<'a>, param: &QueryParam) {
    match param {
        QueryParam::Null => query.bind(Option::<String>::None),
        QueryParam::Bool(b) => query.bind(*b),
        QueryParam::Int(i) => query.bind(*i),
        QueryParam::Float(f) => query.bind(*f),
        QueryParam::String(s) => query.bind(s.clone()),
        QueryParam::Bytes(b) => query.bind(b.clone()),
    }
}

fn row_to_json(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names
        .into_iter()
        .zip(row)
        .map(|(name, data)| (name, column_to_json(&data)))
        .collect()
}

/// Binary columns come back base64-encoded.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    JsonValue::String(STANDARD.encode(bytes))
}

fn float_value(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn temporal<T: for<'a> FromSql<'a>>(data: &ColumnData<'static>, format: impl Fn(T) -> String) -> JsonValue {
    match T::from_sql(data) {
        Ok(Some(v)) => JsonValue::String(format(v)),
        _ => JsonValue::Null,
    }
}

fn column_to_json(data: &ColumnData<'static>) -> JsonValue {
    match data {
        ColumnData::U8(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I16(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I32(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::I64(v) => v.map(JsonValue::from).unwrap_or(JsonValue::Null),
        ColumnData::F32(v) => v.map(|f| float_value(f as f64)).unwrap_or(JsonValue::Null),
        ColumnData::F64(v) => v.map(float_value).unwrap_or(JsonValue::Null),
        ColumnData::Bit(v) => v.map(JsonValue::Bool).unwrap_or(JsonValue::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| JsonValue::String(s.to_string()))
            .unwrap_or(JsonValue::Null),
        ColumnData::Guid(v) => v
            .map(|g| JsonValue::String(g.to_string()))
            .unwrap_or(JsonValue::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| decode_binary_value(b))
            .unwrap_or(JsonValue::Null),
        ColumnData::Numeric(v) => v
            .map(|n| JsonValue::String(n.to_string()))
            .unwrap_or(JsonValue::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| JsonValue::String(x.clone().into_owned().into_string()))
            .unwrap_or(JsonValue::Null),
        ColumnData::Date(_) => temporal(data, |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string()),
        ColumnData::Time(_) => temporal(data, |t: chrono::NaiveTime| t.format("%H:%M:%S%.f").to_string()),
        ColumnData::DateTimeOffset(_) => temporal(data, |dt: chrono::DateTime<chrono::FixedOffset>| {
            dt.to_rfc3339()
        }),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal(data, |dt: chrono::NaiveDateTime| {
                dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
            })
        }
        #[allow(unreachable_patterns)]
        _ => JsonValue::Null,
    }
}
