//! Query-related data models.
//!
//! Values exchanged with the statement-execution interface: bound parameters,
//! result rows and raw SQL expression markers.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A result row as returned by the statement-execution interface.
///
/// Column-name lookup should go through [`RowExt`], which ignores key case the
/// way catalog views report `TABLE_NAME` vs `table_name` differently per driver.
pub type Row = serde_json::Map<String, JsonValue>;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Binary data (base64 encoded in JSON)
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render this value as a T-SQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled, booleans become
    /// `1`/`0` and binary data a `0x...` hex literal.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                format!("0x{}", hex)
            }
        }
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        QueryParam::Int(v)
    }
}

impl From<i32> for QueryParam {
    fn from(v: i32) -> Self {
        QueryParam::Int(v as i64)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        QueryParam::Bool(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        QueryParam::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        QueryParam::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        QueryParam::String(v)
    }
}

impl From<JsonValue> for QueryParam {
    /// Arrays and objects are bound as their JSON text.
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => QueryParam::Null,
            JsonValue::Bool(b) => QueryParam::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => QueryParam::Int(i),
                None => QueryParam::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => QueryParam::String(s),
            other => QueryParam::String(other.to_string()),
        }
    }
}

/// Custom serialization for binary data as base64.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque raw SQL expression, rendered verbatim wherever a value is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression(pub String);

impl Expression {
    /// Wrap a raw SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive typed accessors over a result [`Row`].
pub trait RowExt {
    /// Look up a value by column name, ignoring ASCII case.
    fn value(&self, column: &str) -> Option<&JsonValue>;

    /// Get a non-null string value. Numbers are rendered as strings.
    fn get_string(&self, column: &str) -> Option<String> {
        match self.value(column)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Get an integer value, accepting numeric strings.
    fn get_i64(&self, column: &str) -> Option<i64> {
        match self.value(column)? {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64)),
            JsonValue::String(s) => s.trim().parse().ok(),
            JsonValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Get a boolean value. Accepts `YES`/`NO`, `1`/`0` and JSON booleans.
    fn get_bool(&self, column: &str) -> bool {
        match self.value(column) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::Number(n)) => n.as_i64().is_some_and(|i| i != 0),
            Some(JsonValue::String(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1" | "on")
            }
            _ => false,
        }
    }
}

impl RowExt for Row {
    fn value(&self, column: &str) -> Option<&JsonValue> {
        self.get(column).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })
    }
}
