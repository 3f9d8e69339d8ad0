//! Statement-execution interface and driver capability probing.
//!
//! The schema bridge never opens connections itself. Callers hand it a
//! [`SqlConnection`] and a [`DriverProbe`]; the probe is consulted once to
//! decide which driver family is active.

use crate::error::{DbError, DbResult};
use crate::models::{Expression, QueryParam, Row, RowExt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

/// One request/response round trip to the backend.
///
/// Parameters are positional and referenced as `@P1..@Pn` in the SQL text.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// Run a query and return every row of the first result set.
    async fn select(&self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<Row>>;

    /// Run a statement that returns no rows.
    async fn statement(&self, sql: &str) -> DbResult<bool>;

    /// Wrap a raw SQL fragment so it is rendered verbatim.
    fn raw(&self, expr: &str) -> Expression {
        Expression::new(expr)
    }

    /// First column of the first row, if any.
    async fn select_value(&self, sql: &str, params: &[QueryParam]) -> DbResult<Option<JsonValue>> {
        let rows = self.select(sql, params).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().map(|(_, v)| v)))
    }

    /// Values of a named column across all rows, skipping NULLs.
    async fn select_column(
        &self,
        sql: &str,
        params: &[QueryParam],
        column: &str,
    ) -> DbResult<Vec<String>> {
        let rows = self.select(sql, params).await?;
        Ok(rows.iter().filter_map(|row| row.get_string(column)).collect())
    }
}

/// Reports the low-level driver names available to the process.
pub trait DriverProbe: Send + Sync {
    fn available_drivers(&self) -> Vec<String>;
}

/// A probe with a fixed driver list, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDriverProbe {
    drivers: Vec<String>,
}

impl StaticDriverProbe {
    pub fn new<I, S>(drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drivers: drivers.into_iter().map(Into::into).collect(),
        }
    }
}

impl DriverProbe for StaticDriverProbe {
    fn available_drivers(&self) -> Vec<String> {
        self.drivers.clone()
    }
}

/// Driver family in effect for a schema instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverFamily {
    /// Native driver that binds OUT / INOUT parameters directly
    Sqlsrv,
    /// FreeTDS or ODBC; output parameters need DECLARE/SELECT scaffolding
    Dblib,
}

impl DriverFamily {
    /// Pick a family from the available driver names.
    ///
    /// `sqlsrv` wins when present; `dblib` and `odbc` fall back to the limited profile.
    pub fn select(available: &[String]) -> DbResult<Self> {
        let has = |name: &str| available.iter().any(|d| d.eq_ignore_ascii_case(name));
        if has("sqlsrv") {
            Ok(Self::Sqlsrv)
        } else if has("dblib") || has("odbc") {
            Ok(Self::Dblib)
        } else {
            Err(DbError::driver_unavailable(available))
        }
    }

    pub fn supports_output_binding(&self) -> bool {
        matches!(self, Self::Sqlsrv)
    }

    /// Date-time format used by the query grammar when binding dates.
    ///
    /// The dblib driver's DATETIME has no zero-padded fractional part.
    pub fn grammar_date_format(&self) -> &'static str {
        match self {
            Self::Sqlsrv => "%Y-%m-%d %H:%M:%S%.3f",
            Self::Dblib => "%Y-%m-%d %H:%M:%S",
        }
    }
}

impl std::fmt::Display for DriverFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlsrv => write!(f, "sqlsrv"),
            Self::Dblib => write!(f, "dblib"),
        }
    }
}

/// Result of probing the drivers once at construction.
#[derive(Debug, Clone, Serialize)]
pub struct DriverCapabilities {
    pub family: DriverFamily,
    pub available: Vec<String>,
    pub output_binding: bool,
}

impl DriverCapabilities {
    pub fn probe(probe: &dyn DriverProbe) -> DbResult<Self> {
        let available = probe.available_drivers();
        let family = DriverFamily::select(&available)?;
        info!(
            family = %family,
            drivers = ?available,
            "Selected SQL Server driver family"
        );
        Ok(Self {
            family,
            output_binding: family.supports_output_binding(),
            available,
        })
    }
}
