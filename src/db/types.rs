//! SQL Server type mappings.
//!
//! This module maps between abstract column types and SQL Server native types.
//!
//! # Architecture
//!
//! The forward path is a pipeline of pure passes over a [`ColumnSpec`]:
//! 1. [`translate_simple_column_types`] replaces an abstract tag with a native type
//! 2. [`validate_column_settings`] fills in the display clause and coerces defaults
//!
//! The DDL builder renders the result. The inverse path ([`extract_type`],
//! [`extract_default`]) turns catalog metadata back into a [`ColumnSchema`].

use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnSchema, ColumnSpec, DbFunction, DefaultValue, QueryParam, SimpleType, is_truthy,
    parse_default_value,
};
use chrono::DateTime;
use serde_json::Value as JsonValue;

/// Length used for variable-length types declared without one.
pub const DEFAULT_STRING_MAX_SIZE: u32 = 255;

/// Raw expression for "now" in UPDATE/INSERT value lists.
pub const TIMESTAMP_FOR_SET: &str = "(SYSDATETIMEOFFSET())";

// =============================================================================
// Forward path
// =============================================================================

/// Replace an abstract type tag with its native type and required flags.
///
/// Tags that are not abstract types are treated as native and left untouched.
pub fn translate_simple_column_types(mut spec: ColumnSpec) -> ColumnSpec {
    let tag = spec.data_type.trim().to_lowercase();

    match tag.as_str() {
        "ntext" => {
            spec.data_type = "nvarchar".to_string();
            spec.type_extras = Some("(max)".to_string());
            return spec;
        }
        "image" => {
            spec.data_type = "varbinary".to_string();
            spec.type_extras = Some("(max)".to_string());
            return spec;
        }
        _ => {}
    }

    let Some(simple_type) = SimpleType::parse(&tag) else {
        return spec;
    };

    match simple_type {
        SimpleType::Id => {
            spec.data_type = "int".to_string();
            spec.allow_null = false;
            spec.auto_increment = true;
            spec.is_primary_key = true;
        }
        SimpleType::Ref => {
            spec.data_type = "int".to_string();
            spec.is_foreign_key = true;
        }
        SimpleType::UserId
        | SimpleType::UserIdOnCreate
        | SimpleType::UserIdOnUpdate
        | SimpleType::Integer => {
            spec.data_type = "int".to_string();
        }
        SimpleType::Datetime => {
            spec.data_type = "datetime2".to_string();
        }
        SimpleType::Timestamp => {
            spec.data_type = "datetimeoffset".to_string();
        }
        SimpleType::TimestampOnCreate | SimpleType::TimestampOnUpdate => {
            spec.data_type = "datetimeoffset".to_string();
            if spec.default.is_none() {
                spec.default = Some(DefaultValue::expression("CURRENT_TIMESTAMP"));
            }
        }
        SimpleType::Boolean => {
            spec.data_type = "bit".to_string();
            if let Some(DefaultValue::Literal(value)) = &spec.default {
                let bit = if is_truthy(value) { 1 } else { 0 };
                spec.default = Some(DefaultValue::literal(bit));
            }
        }
        SimpleType::Double => {
            spec.data_type = "float".to_string();
            spec.type_extras = Some("(53)".to_string());
        }
        SimpleType::Text => {
            spec.data_type = "varchar".to_string();
            spec.type_extras = Some("(max)".to_string());
        }
        SimpleType::String => {
            spec.data_type = match (spec.fixed_length, spec.supports_multibyte) {
                (true, true) => "nchar",
                (true, false) => "char",
                (false, true) => "nvarchar",
                (false, false) => "varchar",
            }
            .to_string();
        }
        SimpleType::Binary => {
            spec.data_type = if spec.fixed_length { "binary" } else { "varbinary" }.to_string();
        }
        // Same spelling natively: bigint, decimal, money, float, date, time.
        _ => {}
    }

    spec
}

/// Fill in the native display clause and coerce the default to the column's family.
pub fn validate_column_settings(mut spec: ColumnSpec, string_max_size: u32) -> ColumnSpec {
    let native = spec.data_type.trim().to_lowercase();

    match native.as_str() {
        "bit" | "tinyint" | "smallint" | "int" | "bigint" | "money" | "smallmoney" => {
            if let Some(n) = numeric_default(&spec) {
                spec.default = Some(DefaultValue::literal(n as i64));
            }
        }
        "decimal" | "numeric" => {
            if spec.type_extras.is_none() {
                if let Some(length) = spec.length.or(spec.precision).filter(|l| *l > 0) {
                    spec.type_extras = Some(match spec.decimals.or(spec.scale).filter(|s| *s > 0) {
                        Some(scale) => format!("({},{})", length, scale),
                        None => format!("({})", length),
                    });
                }
            }
            if let Some(n) = numeric_default(&spec) {
                spec.default = Some(DefaultValue::literal(n));
            }
        }
        "real" | "float" => {
            if spec.type_extras.is_none() {
                if let Some(length) = spec.length.or(spec.precision).filter(|l| *l > 0) {
                    spec.type_extras = Some(format!("({})", length));
                }
            }
            if let Some(n) = numeric_default(&spec) {
                spec.default = Some(DefaultValue::literal(n));
            }
        }
        "char" | "nchar" | "binary" => {
            if let Some(length) = spec.length_or_size() {
                spec.type_extras = Some(format!("({})", length));
            }
        }
        "varchar" | "nvarchar" | "varbinary" => {
            if let Some(length) = spec.length_or_size() {
                spec.type_extras = Some(format!("({})", length));
            } else if spec.type_extras.is_none() {
                spec.type_extras = Some(format!("({})", string_max_size));
            }
        }
        "time" | "datetime" | "datetime2" | "datetimeoffset" => {
            if let Some(length) = spec.length_or_size() {
                spec.type_extras = Some(format!("({})", length));
            }
        }
        _ => {}
    }

    spec
}

/// Numeric value of a literal default, accepting numeric strings.
fn numeric_default(spec: &ColumnSpec) -> Option<f64> {
    match spec.default.as_ref()?.as_literal()? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// =============================================================================
// Inverse path
// =============================================================================

/// Map a native type name to its abstract type.
///
/// Any `(...)` suffix is ignored. Unknown types map to string.
pub fn simple_type_for(db_type: &str) -> SimpleType {
    let lower = db_type.trim().to_lowercase();
    let base = lower.split('(').next().unwrap_or_default().trim();

    match base {
        "timestamp" | "rowversion" | "datetimeoffset" => SimpleType::Timestamp,
        "datetime" | "datetime2" | "smalldatetime" => SimpleType::Datetime,
        "date" => SimpleType::Date,
        "time" => SimpleType::Time,
        "bigint" => SimpleType::BigInt,
        "int" | "integer" | "smallint" | "tinyint" => SimpleType::Integer,
        "bit" => SimpleType::Boolean,
        "decimal" | "numeric" => SimpleType::Decimal,
        "money" | "smallmoney" => SimpleType::Money,
        "float" => SimpleType::Double,
        "real" => SimpleType::Float,
        "text" | "ntext" => SimpleType::Text,
        "binary" | "varbinary" | "image" => SimpleType::Binary,
        "table" => SimpleType::Table,
        // char, varchar, nchar, nvarchar, uniqueidentifier, xml, spatial types
        _ => SimpleType::String,
    }
}

/// Whether the native type is the row-versioning counter.
pub fn is_row_version(db_type: &str) -> bool {
    db_type.eq_ignore_ascii_case("timestamp") || db_type.eq_ignore_ascii_case("rowversion")
}

/// Set the abstract type of a catalog column from its native type.
pub fn extract_type(mut column: ColumnSchema, db_type: &str) -> ColumnSchema {
    column.simple_type = simple_type_for(db_type);

    if db_type.to_lowercase().contains("varchar") && column.size.is_none() {
        column.simple_type = SimpleType::Text;
    }
    if is_row_version(db_type) {
        column.simple_type = SimpleType::BigInt;
    }
    column
}

/// Set the default of a catalog column from the raw `COLUMN_DEFAULT` text.
pub fn extract_default(mut column: ColumnSchema, raw: &str) -> ColumnSchema {
    column.default_value = if raw == "(NULL)" {
        None
    } else if column.simple_type == SimpleType::Boolean {
        match raw {
            "((1))" => Some(DefaultValue::literal(true)),
            "((0))" => Some(DefaultValue::literal(false)),
            _ => None,
        }
    } else if column.simple_type.is_timestamp() || is_row_version(&column.db_type) {
        None
    } else {
        let stripped = raw.replace(['(', ')', '\''], "");
        Some(DefaultValue::Literal(parse_default_value(
            &stripped,
            column.simple_type,
        )))
    };
    column
}

pub fn extract_fixed_length(db_type: &str) -> bool {
    matches!(db_type.to_lowercase().as_str(), "char" | "nchar" | "binary")
}

pub fn extract_multibyte_support(db_type: &str) -> bool {
    matches!(db_type.to_lowercase().as_str(), "nchar" | "nvarchar" | "ntext")
}

/// Read-time expression for native types whose wire form is not directly usable.
pub fn read_function_for(db_type: &str, quoted_name: &str) -> Option<DbFunction> {
    let function = match db_type.to_lowercase().as_str() {
        "image" => format!("(CONVERT(varbinary(max), {}))", quoted_name),
        // Not a wall-clock value, an 8-byte row counter
        "timestamp" | "rowversion" => format!("CAST({} AS BIGINT)", quoted_name),
        "geometry" | "geography" | "hierarchyid" => format!("({}.ToString())", quoted_name),
        "uniqueidentifier" => format!("(CONVERT(varchar(255), {}))", quoted_name),
        _ => return None,
    };
    Some(DbFunction::select(function))
}

// =============================================================================
// Value coercion
// =============================================================================

/// Coerce a client value into a bindable parameter for the given column.
pub fn typecast_to_native(value: JsonValue, column: &ColumnSchema) -> DbResult<QueryParam> {
    if is_row_version(&column.db_type) {
        return Err(DbError::forbidden_write(&column.name, &column.db_type));
    }

    if column.db_type.eq_ignore_ascii_case("uniqueidentifier") {
        return match value {
            JsonValue::Null => Ok(QueryParam::Null),
            JsonValue::String(s) if s.trim().eq_ignore_ascii_case("null") => Ok(QueryParam::Null),
            JsonValue::String(s) => uuid::Uuid::parse_str(s.trim())
                .map(|_| QueryParam::String(s))
                .map_err(|e| {
                    DbError::invalid_input(format!("Column '{}' expects a GUID: {}", column.name, e))
                }),
            other => Err(DbError::invalid_input(format!(
                "Column '{}' expects a GUID, got {}",
                column.name, other
            ))),
        };
    }

    if value.is_null() {
        return Ok(QueryParam::Null);
    }

    match column.simple_type {
        SimpleType::Boolean => Ok(QueryParam::Bool(is_truthy(&value))),
        ty if ty.is_integer() => match &value {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(QueryParam::Int)
                .ok_or_else(|| integer_error(column, &value)),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(QueryParam::Int)
                .map_err(|_| integer_error(column, &value)),
            JsonValue::Bool(b) => Ok(QueryParam::Int(*b as i64)),
            _ => Err(integer_error(column, &value)),
        },
        SimpleType::Float | SimpleType::Double => match &value {
            JsonValue::Number(n) => n
                .as_f64()
                .map(QueryParam::Float)
                .ok_or_else(|| DbError::invalid_input(format!("Invalid number for '{}'", column.name))),
            JsonValue::String(s) => s.trim().parse::<f64>().map(QueryParam::Float).map_err(|_| {
                DbError::invalid_input(format!("Column '{}' expects a number, got '{}'", column.name, s))
            }),
            _ => Ok(QueryParam::from(value)),
        },
        SimpleType::Date
        | SimpleType::Time
        | SimpleType::Datetime
        | SimpleType::Timestamp
        | SimpleType::TimestampOnCreate
        | SimpleType::TimestampOnUpdate => match value {
            JsonValue::String(s) => Ok(QueryParam::String(
                format_native_datetime(&s, column).unwrap_or(s),
            )),
            other => Ok(QueryParam::from(other)),
        },
        _ => Ok(QueryParam::from(value)),
    }
}

fn integer_error(column: &ColumnSchema, value: &JsonValue) -> DbError {
    DbError::invalid_input(format!(
        "Column '{}' expects an integer, got {}",
        column.name, value
    ))
}

// =============================================================================
// Date-time formats
// =============================================================================

/// chrono format string for the native representation of a temporal column.
///
/// Legacy `datetime` only stores milliseconds.
pub fn native_date_time_format(simple_type: SimpleType, db_type: Option<&str>) -> Option<&'static str> {
    match simple_type {
        SimpleType::Date => Some("%Y-%m-%d"),
        SimpleType::Datetime => {
            if db_type.is_some_and(|t| t.eq_ignore_ascii_case("datetime")) {
                Some("%Y-%m-%d %H:%M:%S%.3f")
            } else {
                Some("%Y-%m-%d %H:%M:%S%.6f")
            }
        }
        SimpleType::Time => Some("%H:%M:%S%.6f"),
        SimpleType::Timestamp | SimpleType::TimestampOnCreate | SimpleType::TimestampOnUpdate => {
            Some("%Y-%m-%d %H:%M:%S%.6f %:z")
        }
        _ => None,
    }
}

/// Reformat an RFC 3339 string into the column's native format.
///
/// Returns `None` when the input is not RFC 3339 or the column is not temporal.
pub fn format_native_datetime(value: &str, column: &ColumnSchema) -> Option<String> {
    let format = native_date_time_format(column.simple_type, Some(&column.db_type))?;
    let parsed = DateTime::parse_from_rfc3339(value.trim()).ok()?;
    Some(parsed.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translate(spec: ColumnSpec) -> ColumnSpec {
        validate_column_settings(translate_simple_column_types(spec), DEFAULT_STRING_MAX_SIZE)
    }

    #[test]
    fn test_id_sets_key_flags() {
        let spec = translate_simple_column_types(ColumnSpec::new("id", "id"));
        assert_eq!(spec.data_type, "int");
        assert!(spec.is_primary_key);
        assert!(spec.auto_increment);
        assert!(!spec.allow_null);

        let spec = translate_simple_column_types(ColumnSpec::new("id", "pk"));
        assert!(spec.is_primary_key);
    }

    #[test]
    fn test_ref_sets_foreign_key() {
        let spec = translate_simple_column_types(ColumnSpec::new("owner", "fk"));
        assert_eq!(spec.data_type, "int");
        assert!(spec.is_foreign_key);
    }

    #[test]
    fn test_string_matrix_fixed_multibyte() {
        let spec = translate_simple_column_types(ColumnSpec::new("c", "string").with_storage(true, true));
        assert_eq!(spec.data_type, "nchar");
    }

    #[test]
    fn test_string_matrix_fixed_only() {
        let spec = translate_simple_column_types(ColumnSpec::new("c", "string").with_storage(true, false));
        assert_eq!(spec.data_type, "char");
    }

    #[test]
    fn test_string_matrix_multibyte_only() {
        let spec = translate_simple_column_types(ColumnSpec::new("c", "string").with_storage(false, true));
        assert_eq!(spec.data_type, "nvarchar");
    }

    #[test]
    fn test_string_matrix_neither() {
        let spec = translate_simple_column_types(ColumnSpec::new("c", "string").with_storage(false, false));
        assert_eq!(spec.data_type, "varchar");
    }

    #[test]
    fn test_binary_fixed_flag() {
        let fixed = translate_simple_column_types(ColumnSpec::new("b", "binary").with_storage(true, false));
        assert_eq!(fixed.data_type, "binary");
        let var = translate_simple_column_types(ColumnSpec::new("b", "binary"));
        assert_eq!(var.data_type, "varbinary");
    }

    #[test]
    fn test_temporal_types() {
        assert_eq!(translate_simple_column_types(ColumnSpec::new("d", "datetime")).data_type, "datetime2");
        assert_eq!(
            translate_simple_column_types(ColumnSpec::new("d", "timestamp")).data_type,
            "datetimeoffset"
        );
    }

    #[test]
    fn test_timestamp_on_create_default() {
        let spec = translate_simple_column_types(ColumnSpec::new("created", "timestamp_on_create"));
        assert_eq!(spec.data_type, "datetimeoffset");
        assert_eq!(spec.default, Some(DefaultValue::expression("CURRENT_TIMESTAMP")));

        let spec = translate_simple_column_types(
            ColumnSpec::new("updated", "timestamp_on_update")
                .with_default(DefaultValue::expression("SYSDATETIMEOFFSET()")),
        );
        assert_eq!(spec.default, Some(DefaultValue::expression("SYSDATETIMEOFFSET()")));
    }

    #[test]
    fn test_boolean_default_coercion() {
        for (input, expected) in [("true", 1), ("on", 1), ("yes", 1), ("1", 1), ("false", 0), ("nope", 0)] {
            let spec = translate_simple_column_types(
                ColumnSpec::new("flag", "boolean").with_default(DefaultValue::literal(input)),
            );
            assert_eq!(spec.data_type, "bit");
            assert_eq!(spec.default, Some(DefaultValue::literal(expected)), "input {input}");
        }
    }

    #[test]
    fn test_max_extras() {
        let text = translate(ColumnSpec::new("body", "text"));
        assert_eq!(text.type_extras.as_deref(), Some("(max)"));

        let ntext = translate(ColumnSpec::new("body", "ntext"));
        assert_eq!(ntext.data_type, "nvarchar");
        assert_eq!(ntext.type_extras.as_deref(), Some("(max)"));

        let image = translate(ColumnSpec::new("blob", "image"));
        assert_eq!(image.data_type, "varbinary");
        assert_eq!(image.type_extras.as_deref(), Some("(max)"));

        let double = translate(ColumnSpec::new("ratio", "double"));
        assert_eq!(double.data_type, "float");
        assert_eq!(double.type_extras.as_deref(), Some("(53)"));
    }

    #[test]
    fn test_native_passthrough() {
        let spec = translate(ColumnSpec::new("geo", "geography"));
        assert_eq!(spec.data_type, "geography");
        assert_eq!(spec.type_extras, None);
    }

    #[test]
    fn test_varchar_default_length() {
        let spec = translate(ColumnSpec::new("name", "string"));
        assert_eq!(spec.type_extras.as_deref(), Some("(255)"));

        let spec = validate_column_settings(translate_simple_column_types(ColumnSpec::new("name", "string")), 4000);
        assert_eq!(spec.type_extras.as_deref(), Some("(4000)"));

        let spec = translate(ColumnSpec::new("name", "string").with_length(64));
        assert_eq!(spec.type_extras.as_deref(), Some("(64)"));
    }

    #[test]
    fn test_decimal_extras() {
        let mut spec = ColumnSpec::new("price", "decimal");
        spec.precision = Some(10);
        spec.decimals = Some(2);
        spec.default = Some(DefaultValue::literal("9.5"));
        let spec = translate(spec);
        assert_eq!(spec.type_extras.as_deref(), Some("(10,2)"));
        assert_eq!(spec.default, Some(DefaultValue::literal(9.5)));

        let spec = translate(ColumnSpec::new("qty", "numeric").with_length(8));
        assert_eq!(spec.type_extras.as_deref(), Some("(8)"));
    }

    #[test]
    fn test_integer_default_coercion() {
        let spec = translate(ColumnSpec::new("n", "integer").with_default(DefaultValue::literal("42")));
        assert_eq!(spec.default, Some(DefaultValue::literal(42)));

        let spec = translate(ColumnSpec::new("n", "integer").with_default(DefaultValue::literal("abc")));
        assert_eq!(spec.default, Some(DefaultValue::literal("abc")));
    }

    #[test]
    fn test_temporal_precision() {
        let spec = translate(ColumnSpec::new("at", "datetime").with_length(3));
        assert_eq!(spec.type_extras.as_deref(), Some("(3)"));
        let spec = translate(ColumnSpec::new("at", "datetime"));
        assert_eq!(spec.type_extras, None);
    }

    #[test]
    fn test_simple_type_for() {
        assert_eq!(simple_type_for("int"), SimpleType::Integer);
        assert_eq!(simple_type_for("BIGINT"), SimpleType::BigInt);
        assert_eq!(simple_type_for("bit"), SimpleType::Boolean);
        assert_eq!(simple_type_for("datetime2(7)"), SimpleType::Datetime);
        assert_eq!(simple_type_for("datetimeoffset"), SimpleType::Timestamp);
        assert_eq!(simple_type_for("nvarchar(50)"), SimpleType::String);
        assert_eq!(simple_type_for("varbinary"), SimpleType::Binary);
        assert_eq!(simple_type_for("float"), SimpleType::Double);
        assert_eq!(simple_type_for("uniqueidentifier"), SimpleType::String);
        assert_eq!(simple_type_for("TABLE"), SimpleType::Table);
    }

    #[test]
    fn test_extract_type_corrections() {
        let col = extract_type(ColumnSchema::new("body").with_limits(0, 0, -1), "varchar");
        assert_eq!(col.simple_type, SimpleType::Text);

        let col = extract_type(ColumnSchema::new("name").with_limits(0, 0, 50), "nvarchar");
        assert_eq!(col.simple_type, SimpleType::String);

        let col = extract_type(ColumnSchema::new("ver"), "rowversion");
        assert_eq!(col.simple_type, SimpleType::BigInt);
        let col = extract_type(ColumnSchema::new("ver"), "timestamp");
        assert_eq!(col.simple_type, SimpleType::BigInt);
    }

    #[test]
    fn test_extract_default_null() {
        for ty in ["int", "bit", "varchar", "datetimeoffset"] {
            let col = extract_type(ColumnSchema::new("c").with_db_type(ty), ty);
            let col = extract_default(col.with_default(DefaultValue::literal(1)), "(NULL)");
            assert_eq!(col.default_value, None, "type {ty}");
        }
    }

    #[test]
    fn test_extract_default_boolean() {
        let col = || extract_type(ColumnSchema::new("flag").with_db_type("bit"), "bit");
        assert_eq!(extract_default(col(), "((1))").default_value, Some(DefaultValue::literal(true)));
        assert_eq!(extract_default(col(), "((0))").default_value, Some(DefaultValue::literal(false)));
        assert_eq!(extract_default(col(), "('x')").default_value, None);
    }

    #[test]
    fn test_extract_default_timestamp_always_none() {
        let col = extract_type(ColumnSchema::new("at").with_db_type("datetimeoffset"), "datetimeoffset");
        assert_eq!(extract_default(col, "(sysdatetimeoffset())").default_value, None);

        let col = extract_type(ColumnSchema::new("ver").with_db_type("rowversion"), "rowversion");
        assert_eq!(extract_default(col, "((0))").default_value, None);
    }

    #[test]
    fn test_extract_default_strips_wrapping() {
        let col = extract_type(ColumnSchema::new("n").with_db_type("int"), "int");
        assert_eq!(extract_default(col, "((42))").default_value, Some(DefaultValue::literal(42)));

        let col = extract_type(ColumnSchema::new("s").with_db_type("varchar").with_limits(0, 0, 20), "varchar");
        assert_eq!(
            extract_default(col, "('pending')").default_value,
            Some(DefaultValue::literal("pending"))
        );
    }

    #[test]
    fn test_fixed_and_multibyte() {
        assert!(extract_fixed_length("nchar"));
        assert!(extract_fixed_length("binary"));
        assert!(!extract_fixed_length("varchar"));
        assert!(extract_multibyte_support("NVARCHAR"));
        assert!(!extract_multibyte_support("char"));
    }

    #[test]
    fn test_read_functions() {
        assert_eq!(
            read_function_for("image", "[pic]").map(|f| f.function),
            Some("(CONVERT(varbinary(max), [pic]))".to_string())
        );
        assert_eq!(
            read_function_for("rowversion", "[ver]").map(|f| f.function),
            Some("CAST([ver] AS BIGINT)".to_string())
        );
        assert_eq!(
            read_function_for("geography", "[loc]").map(|f| f.function),
            Some("([loc].ToString())".to_string())
        );
        assert!(read_function_for("int", "[id]").is_none());
    }

    #[test]
    fn test_typecast_forbidden_write() {
        let col = extract_type(ColumnSchema::new("ver").with_db_type("rowversion"), "rowversion");
        let err = typecast_to_native(json!(5), &col).unwrap_err();
        assert!(matches!(err, DbError::ForbiddenWrite { .. }));

        let col = ColumnSchema::new("ts").with_db_type("timestamp");
        assert!(typecast_to_native(JsonValue::Null, &col).is_err());
    }

    #[test]
    fn test_typecast_uniqueidentifier() {
        let col = ColumnSchema::new("guid").with_db_type("uniqueidentifier");
        assert_eq!(typecast_to_native(json!("NULL"), &col).unwrap(), QueryParam::Null);
        assert_eq!(
            typecast_to_native(json!("6f9619ff-8b86-d011-b42d-00c04fc964ff"), &col).unwrap(),
            QueryParam::String("6f9619ff-8b86-d011-b42d-00c04fc964ff".to_string())
        );
        assert!(typecast_to_native(json!("not-a-guid"), &col).is_err());
    }

    #[test]
    fn test_typecast_by_type() {
        let flag = ColumnSchema::new("flag").with_type(SimpleType::Boolean);
        assert_eq!(typecast_to_native(json!("yes"), &flag).unwrap(), QueryParam::Bool(true));

        let n = ColumnSchema::new("n").with_type(SimpleType::Integer);
        assert_eq!(typecast_to_native(json!("12"), &n).unwrap(), QueryParam::Int(12));
        assert!(typecast_to_native(json!("twelve"), &n).is_err());

        let d = ColumnSchema::new("ratio").with_type(SimpleType::Double);
        assert_eq!(typecast_to_native(json!("0.5"), &d).unwrap(), QueryParam::Float(0.5));

        let s = ColumnSchema::new("name");
        assert_eq!(typecast_to_native(JsonValue::Null, &s).unwrap(), QueryParam::Null);
    }

    #[test]
    fn test_native_date_time_format() {
        assert_eq!(native_date_time_format(SimpleType::Date, None), Some("%Y-%m-%d"));
        assert_eq!(
            native_date_time_format(SimpleType::Datetime, Some("datetime")),
            Some("%Y-%m-%d %H:%M:%S%.3f")
        );
        assert_eq!(
            native_date_time_format(SimpleType::Datetime, Some("datetime2")),
            Some("%Y-%m-%d %H:%M:%S%.6f")
        );
        assert_eq!(native_date_time_format(SimpleType::String, None), None);
    }

    #[test]
    fn test_typecast_reformats_rfc3339() {
        let col = ColumnSchema::new("at")
            .with_db_type("datetime")
            .with_type(SimpleType::Datetime);
        assert_eq!(
            typecast_to_native(json!("2024-03-01T10:20:30.5Z"), &col).unwrap(),
            QueryParam::String("2024-03-01 10:20:30.500".to_string())
        );

        let col = ColumnSchema::new("at")
            .with_db_type("datetimeoffset")
            .with_type(SimpleType::Timestamp);
        assert_eq!(
            typecast_to_native(json!("2024-03-01T10:20:30+02:00"), &col).unwrap(),
            QueryParam::String("2024-03-01 10:20:30.000000 +02:00".to_string())
        );
    }
}
