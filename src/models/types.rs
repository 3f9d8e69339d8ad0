//! Abstract (backend-neutral) column types.

use serde::{Deserialize, Serialize};

/// Database-agnostic type tag carried by columns, parameters and routine returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleType {
    /// Auto-incrementing integer primary key
    #[serde(alias = "pk")]
    Id,
    /// Integer foreign key
    #[serde(alias = "fk")]
    Ref,
    UserId,
    UserIdOnCreate,
    UserIdOnUpdate,
    Boolean,
    Integer,
    #[serde(rename = "bigint")]
    BigInt,
    Decimal,
    Money,
    Float,
    Double,
    String,
    Text,
    Binary,
    Date,
    Time,
    Datetime,
    Timestamp,
    TimestampOnCreate,
    TimestampOnUpdate,
    /// Table-valued function return
    Table,
}

impl SimpleType {
    /// Parse an abstract type tag. Returns `None` for native type names.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let ty = match lower.as_str() {
            "id" | "pk" => Self::Id,
            "ref" | "fk" => Self::Ref,
            "user_id" => Self::UserId,
            "user_id_on_create" => Self::UserIdOnCreate,
            "user_id_on_update" => Self::UserIdOnUpdate,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "bigint" => Self::BigInt,
            "decimal" => Self::Decimal,
            "money" => Self::Money,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "text" => Self::Text,
            "binary" => Self::Binary,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::Datetime,
            "timestamp" => Self::Timestamp,
            "timestamp_on_create" => Self::TimestampOnCreate,
            "timestamp_on_update" => Self::TimestampOnUpdate,
            "table" => Self::Table,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Ref => "ref",
            Self::UserId => "user_id",
            Self::UserIdOnCreate => "user_id_on_create",
            Self::UserIdOnUpdate => "user_id_on_update",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Decimal => "decimal",
            Self::Money => "money",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Timestamp => "timestamp",
            Self::TimestampOnCreate => "timestamp_on_create",
            Self::TimestampOnUpdate => "timestamp_on_update",
            Self::Table => "table",
        }
    }

    /// Whether values of this type are whole numbers.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Id
                | Self::Ref
                | Self::UserId
                | Self::UserIdOnCreate
                | Self::UserIdOnUpdate
                | Self::Integer
                | Self::BigInt
        )
    }

    /// Whether this type carries a wall-clock offset.
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            Self::Timestamp | Self::TimestampOnCreate | Self::TimestampOnUpdate
        )
    }
}

impl std::fmt::Display for SimpleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(SimpleType::parse("pk"), Some(SimpleType::Id));
        assert_eq!(SimpleType::parse("FK"), Some(SimpleType::Ref));
        assert_eq!(SimpleType::parse("timestamp_on_update"), Some(SimpleType::TimestampOnUpdate));
        assert_eq!(SimpleType::parse("nvarchar"), None);
    }

    #[test]
    fn test_display_matches_parse() {
        for ty in [SimpleType::BigInt, SimpleType::UserIdOnCreate, SimpleType::Datetime] {
            assert_eq!(SimpleType::parse(&ty.to_string()), Some(ty));
        }
    }

    #[test]
    fn test_serde_aliases() {
        let ty: SimpleType = serde_json::from_str("\"pk\"").unwrap();
        assert_eq!(ty, SimpleType::Id);
        assert_eq!(serde_json::to_string(&SimpleType::BigInt).unwrap(), "\"bigint\"");
    }

    #[test]
    fn test_integer_family() {
        assert!(SimpleType::Ref.is_integer());
        assert!(!SimpleType::Decimal.is_integer());
        assert!(SimpleType::TimestampOnCreate.is_timestamp());
        assert!(!SimpleType::Datetime.is_timestamp());
    }
}
