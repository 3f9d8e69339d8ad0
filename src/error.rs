//! Error types for the SQL Server schema bridge.
//!
//! This module defines all error types using `thiserror`. Rendering and
//! value-coercion failures are raised synchronously and never retried; backend
//! failures are propagated unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// The abstract schema is inconsistent and cannot be rendered.
    #[error("Configuration error: {message} (column: {column})")]
    Configuration { message: String, column: String },

    /// A value was assigned to a backend-maintained column.
    #[error("Write forbidden: column '{column}' of type {db_type} cannot be set")]
    ForbiddenWrite { column: String, db_type: String },

    #[error("No acceptable driver for SQL Server found (available: {available})")]
    DriverUnavailable { available: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// Server error number, e.g. 208 for an invalid object name
        code: Option<u32>,
        suggestion: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error for a column definition.
    pub fn configuration(message: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            column: column.into(),
        }
    }

    /// Create a forbidden write error.
    pub fn forbidden_write(column: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self::ForbiddenWrite {
            column: column.into(),
            db_type: db_type.into(),
        }
    }

    /// Create a driver unavailable error from the probed driver names.
    pub fn driver_unavailable(available: &[String]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        };
        Self::DriverUnavailable { available }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with an optional server error number.
    pub fn database(
        message: impl Into<String>,
        code: Option<u32>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            code,
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::Configuration { .. } => {
                Some("A column cannot be both PRIMARY KEY and UNIQUE; drop one of the flags")
            }
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Nothing in this crate retries; the flag is for the owning connection layer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_input(format!("Malformed JSON: {}", err))
    }
}

/// Convert tiberius errors to DbError.
#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Server(token) => DbError::database(
                token.message().to_string(),
                Some(token.code()),
                "Check the SQL syntax and referenced objects",
            ),
            tiberius::error::Error::Io { message, .. } => DbError::connection(
                format!("I/O error: {}", message),
                "Check network connectivity and database server status",
            ),
            tiberius::error::Error::Tls(msg) => DbError::connection(
                format!("TLS error: {}", msg),
                "Verify TLS configuration and certificates",
            ),
            tiberius::error::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            tiberius::error::Error::Conversion(msg) => {
                DbError::internal(format!("Conversion error: {}", msg))
            }
            other => DbError::internal(format!("Unknown database error: {}", other)),
        }
    }
}

/// Result type alias for schema operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::configuration("both primary key and unique", "email");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_forbidden_write_display() {
        let err = DbError::forbidden_write("row_ver", "rowversion");
        assert!(err.to_string().contains("row_ver"));
        assert!(err.to_string().contains("rowversion"));
    }

    #[test]
    fn test_driver_unavailable_lists_drivers() {
        let err = DbError::driver_unavailable(&["mysql".to_string(), "pgsql".to_string()]);
        assert!(err.to_string().contains("mysql, pgsql"));

        let err = DbError::driver_unavailable(&[]);
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::database("Invalid object name", Some(208), "Check the table name");
        assert_eq!(err.suggestion(), Some("Check the table name"));
        assert!(DbError::invalid_input("x").suggestion().is_none());
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::connection("err", "sugg").is_retryable());
        assert!(!DbError::configuration("pk and unique", "id").is_retryable());
        assert!(!DbError::forbidden_write("ts", "timestamp").is_retryable());
        assert!(!DbError::database("deadlock", Some(1205), "retry").is_retryable());
    }
}
