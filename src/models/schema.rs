//! Schema-related data models.
//!
//! This module defines the abstract schema shared by the type translator, the
//! DDL builder and the catalog introspector: tables, columns, folded
//! constraints and the caller-side column specification used to render DDL.

use crate::models::identifier::{quote_ident, quote_qualified};
use crate::models::types::SimpleType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// A column default: either a literal value or a raw SQL expression.
///
/// In JSON an object with an `expression` key is an expression marker; any
/// other value is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Expression { expression: String },
    Literal(JsonValue),
}

impl DefaultValue {
    /// Create an expression default rendered verbatim.
    pub fn expression(sql: impl Into<String>) -> Self {
        Self::Expression {
            expression: sql.into(),
        }
    }

    /// Create a literal default.
    pub fn literal(value: impl Into<JsonValue>) -> Self {
        Self::Literal(value.into())
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression { .. })
    }

    /// Get the literal value, if this is not an expression.
    pub fn as_literal(&self) -> Option<&JsonValue> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Expression { .. } => None,
        }
    }
}

/// Where a read-time database function applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionUse {
    Select,
    Filter,
    Insert,
    Update,
}

/// A backend-side expression that replaces the bare column reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbFunction {
    #[serde(rename = "use")]
    pub uses: Vec<FunctionUse>,
    pub function: String,
}

impl DbFunction {
    /// Create a function used only when selecting the column.
    pub fn select(function: impl Into<String>) -> Self {
        Self {
            uses: vec![FunctionUse::Select],
            function: function.into(),
        }
    }

    pub fn applies_to(&self, usage: FunctionUse) -> bool {
        self.uses.contains(&usage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Bracket-quoted identifier, e.g. `[name]`
    pub quoted_name: String,
    #[serde(rename = "type")]
    pub simple_type: SimpleType,
    /// Native type as reported by the catalog, e.g. `nvarchar`
    pub db_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    pub allow_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    pub auto_increment: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_index: bool,
    pub is_foreign_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_field: Option<String>,
    pub fixed_length: bool,
    pub supports_multibyte: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_function: Vec<DbFunction>,
}

impl ColumnSchema {
    /// Create a new column with the given name. The abstract type defaults to string.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            quoted_name: quote_ident(&name),
            name,
            simple_type: SimpleType::String,
            db_type: String::new(),
            size: None,
            precision: None,
            scale: None,
            allow_null: true,
            default_value: None,
            auto_increment: false,
            is_primary_key: false,
            is_unique: false,
            is_index: false,
            is_foreign_key: false,
            ref_table: None,
            ref_field: None,
            fixed_length: false,
            supports_multibyte: false,
            db_function: Vec::new(),
        }
    }

    /// Set the native type.
    pub fn with_db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = db_type.into();
        self
    }

    /// Set the abstract type.
    pub fn with_type(mut self, simple_type: SimpleType) -> Self {
        self.simple_type = simple_type;
        self
    }

    /// Set whether the column accepts NULL.
    pub fn with_nullable(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Set the size, precision and scale from raw catalog numbers.
    ///
    /// Size and precision/scale are mutually exclusive: a positive precision
    /// with no scale is reported as a size; a zero precision falls back to the
    /// character maximum length.
    pub fn with_limits(mut self, precision: i64, scale: i64, char_max_length: i64) -> Self {
        self.size = None;
        self.precision = None;
        self.scale = None;
        if precision > 0 {
            if scale <= 0 {
                self.size = u32::try_from(precision).ok();
            } else {
                self.precision = u32::try_from(precision).ok();
                self.scale = u32::try_from(scale).ok();
            }
        } else if char_max_length > 0 {
            self.size = u32::try_from(char_max_length).ok();
        }
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Mark the column as an identity column.
    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Attach a read-time database function.
    pub fn with_db_function(mut self, function: DbFunction) -> Self {
        self.db_function.push(function);
        self
    }

    /// Expression to use in a SELECT list for this column.
    pub fn select_expression(&self) -> &str {
        self.db_function
            .iter()
            .find(|f| f.applies_to(FunctionUse::Select))
            .map(|f| f.function.as_str())
            .unwrap_or(&self.quoted_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema_name: String,
    /// Bare table name as stored in the catalog
    pub resource_name: String,
    /// Display name, schema-qualified when outside the default schema
    pub name: String,
    /// `schema.table`
    pub internal_name: String,
    /// `[schema].[table]`
    pub quoted_name: String,
    pub primary_key: Vec<String>,
    /// Identity column driving `DBCC CHECKIDENT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_name: Option<String>,
    pub columns: Vec<ColumnSchema>,
    pub is_view: bool,
}

impl TableSchema {
    /// Create a new table schema. The display name defaults to the bare name.
    pub fn new(schema_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        let schema_name = schema_name.into();
        let resource_name = resource_name.into();
        let internal_name = if schema_name.is_empty() {
            resource_name.clone()
        } else {
            format!("{}.{}", schema_name, resource_name)
        };
        Self {
            quoted_name: quote_qualified(&schema_name, &resource_name),
            name: resource_name.clone(),
            schema_name,
            resource_name,
            internal_name,
            primary_key: Vec::new(),
            sequence_name: None,
            columns: Vec::new(),
            is_view: false,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark this object as a view.
    pub fn as_view(mut self) -> Self {
        self.is_view = true;
        self
    }

    /// Add a column definition.
    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.add_column(column);
        self
    }

    /// Append a column, keeping the primary key list and identity column in sync.
    pub fn add_column(&mut self, column: ColumnSchema) {
        if column.is_primary_key && !self.primary_key.contains(&column.name) {
            self.primary_key.push(column.name.clone());
        }
        if column.auto_increment && self.sequence_name.is_none() {
            self.sequence_name = Some(column.name.clone());
        }
        self.columns.push(column);
    }

    /// Find a column by name, ignoring case.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSchema> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The first primary key column, if any.
    pub fn primary_key_column(&self) -> Option<&str> {
        self.primary_key.first().map(String::as_str)
    }
}

/// Kind of table constraint reported by `INFORMATION_SCHEMA.TABLE_CONSTRAINTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

impl ConstraintType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PRIMARY KEY" => Self::PrimaryKey,
            "UNIQUE" => Self::Unique,
            "FOREIGN KEY" => Self::ForeignKey,
            _ => Self::Check,
        }
    }
}

impl std::fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryKey => write!(f, "PRIMARY KEY"),
            Self::Unique => write!(f, "UNIQUE"),
            Self::ForeignKey => write!(f, "FOREIGN KEY"),
            Self::Check => write!(f, "CHECK"),
        }
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    /// Parse from `REFERENTIAL_CONSTRAINTS.UPDATE_RULE` / `DELETE_RULE`.
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            _ => Self::NoAction,
        }
    }
}

impl std::fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAction => write!(f, "NO ACTION"),
            Self::Cascade => write!(f, "CASCADE"),
            Self::SetNull => write!(f, "SET NULL"),
            Self::SetDefault => write!(f, "SET DEFAULT"),
        }
    }
}

/// Identity of a folded constraint. All parts are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintKey {
    pub schema: String,
    pub table: String,
    pub name: String,
}

impl ConstraintKey {
    pub fn new(schema: &str, table: &str, name: &str) -> Self {
        Self {
            schema: schema.to_lowercase(),
            table: table.to_lowercase(),
            name: name.to_lowercase(),
        }
    }
}

/// One constraint with its column lists accumulated across catalog rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConstraint {
    pub constraint_type: ConstraintType,
    pub constraint_schema: String,
    pub constraint_name: String,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table_name: Option<String>,
    pub referenced_column_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<ForeignKeyAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<ForeignKeyAction>,
}

impl TableConstraint {
    /// Referenced table as `schema.table`, or the bare name in the default schema.
    pub fn referenced_table(&self, default_schema: &str) -> Option<String> {
        let table = self.referenced_table_name.as_ref()?;
        match self.referenced_table_schema.as_deref() {
            Some(schema) if !schema.is_empty() && !schema.eq_ignore_ascii_case(default_schema) => {
                Some(format!("{}.{}", schema, table))
            }
            _ => Some(table.clone()),
        }
    }
}

/// Caller-supplied column description, the input of the DDL pipeline.
///
/// `data_type` holds either an abstract tag (`string`, `id`, ...) or a native
/// type name, which is passed through untouched by the translator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Alias of `scale` accepted for decimal types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub allow_null: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub auto_increment: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_primary_key: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_unique: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_foreign_key: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub fixed_length: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub supports_multibyte: bool,
    /// Display clause appended to the native type, e.g. `(max)` or `(10,2)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_extras: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_field: Option<String>,
}

impl ColumnSpec {
    /// Create a spec for the given type tag.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    /// Set the declared length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Set whether the column accepts NULL.
    pub fn with_nullable(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Set the fixed-length and multibyte flags used by string and binary types.
    pub fn with_storage(mut self, fixed_length: bool, supports_multibyte: bool) -> Self {
        self.fixed_length = fixed_length;
        self.supports_multibyte = supports_multibyte;
        self
    }

    /// Length clause source: `length`, falling back to `size`.
    pub fn length_or_size(&self) -> Option<u32> {
        self.length.or(self.size)
    }
}

/// Accept JSON booleans, numbers and the usual truthy strings.
fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

/// Truthiness of a JSON value: `1`, `true`, `on`, `yes` are true.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}

/// Parse a catalog default string into a JSON value appropriate for the
/// column's abstract type.
pub fn parse_default_value(default_str: &str, simple_type: SimpleType) -> JsonValue {
    if simple_type.is_integer() {
        if let Ok(n) = default_str.trim().parse::<i64>() {
            return JsonValue::Number(n.into());
        }
    }

    if matches!(simple_type, SimpleType::Float | SimpleType::Double) {
        if let Ok(n) = default_str.trim().parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return JsonValue::Number(num);
            }
        }
    }

    if simple_type == SimpleType::Boolean {
        match default_str.to_lowercase().as_str() {
            "true" | "1" => return JsonValue::Bool(true),
            "false" | "0" => return JsonValue::Bool(false),
            _ => {}
        }
    }

    // Everything else: decimal/money, strings, dates, expressions, etc.
    JsonValue::String(default_str.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_limits_precision_without_scale_is_size() {
        let col = ColumnSchema::new("qty").with_limits(10, 0, 0);
        assert_eq!(col.size, Some(10));
        assert_eq!(col.precision, None);
        assert_eq!(col.scale, None);
    }

    #[test]
    fn test_with_limits_precision_and_scale() {
        let col = ColumnSchema::new("price").with_limits(18, 2, 0);
        assert_eq!(col.size, None);
        assert_eq!(col.precision, Some(18));
        assert_eq!(col.scale, Some(2));
    }

    #[test]
    fn test_with_limits_character_length() {
        let col = ColumnSchema::new("title").with_limits(0, 0, 255);
        assert_eq!(col.size, Some(255));

        // varchar(max) reports -1
        let col = ColumnSchema::new("body").with_limits(0, 0, -1);
        assert_eq!(col.size, None);
    }

    #[test]
    fn test_select_expression_prefers_db_function() {
        let col = ColumnSchema::new("id");
        assert_eq!(col.select_expression(), "[id]");

        let col = ColumnSchema::new("guid").with_db_function(DbFunction::select(
            "(CONVERT(varchar(255), [guid]))",
        ));
        assert_eq!(col.select_expression(), "(CONVERT(varchar(255), [guid]))");
    }

    #[test]
    fn test_table_schema_names() {
        let table = TableSchema::new("sales", "orders").with_name("sales.orders");
        assert_eq!(table.internal_name, "sales.orders");
        assert_eq!(table.quoted_name, "[sales].[orders]");
        assert_eq!(table.resource_name, "orders");
        assert!(!table.is_view);
    }

    #[test]
    fn test_add_column_tracks_keys() {
        let mut pk = ColumnSchema::new("id").with_auto_increment(true);
        pk.is_primary_key = true;
        let table = TableSchema::new("dbo", "users")
            .with_column(pk)
            .with_column(ColumnSchema::new("email"));
        assert_eq!(table.primary_key, vec!["id".to_string()]);
        assert_eq!(table.sequence_name.as_deref(), Some("id"));
        assert!(table.column("EMAIL").is_some());
    }

    #[test]
    fn test_default_value_deserialize() {
        let expr: DefaultValue = serde_json::from_value(json!({"expression": "GETDATE()"})).unwrap();
        assert!(expr.is_expression());

        let lit: DefaultValue = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(lit.as_literal(), Some(&json!("abc")));
    }

    #[test]
    fn test_column_spec_deserialize() {
        let spec: ColumnSpec = serde_json::from_value(json!({
            "type": "string",
            "fixed_length": "true",
            "supports_multibyte": 1,
            "length": 10,
            "default": {"expression": "N'x'"}
        }))
        .unwrap();
        assert_eq!(spec.data_type, "string");
        assert!(spec.fixed_length);
        assert!(spec.supports_multibyte);
        assert!(!spec.allow_null);
        assert_eq!(spec.length, Some(10));
        assert!(spec.default.as_ref().is_some_and(DefaultValue::is_expression));
    }

    #[test]
    fn test_truthy_values() {
        for v in [json!(true), json!(1), json!("on"), json!("YES"), json!("1")] {
            assert!(is_truthy(&v), "{v} should be truthy");
        }
        for v in [json!(false), json!(0), json!("off"), json!("no"), json!(null)] {
            assert!(!is_truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn test_parse_default_value() {
        assert_eq!(parse_default_value("42", SimpleType::Integer), json!(42));
        assert_eq!(parse_default_value("1.5", SimpleType::Double), json!(1.5));
        assert_eq!(parse_default_value("1", SimpleType::Boolean), json!(true));
        assert_eq!(parse_default_value("10.50", SimpleType::Decimal), json!("10.50"));
        assert_eq!(parse_default_value("hello", SimpleType::String), json!("hello"));
    }

    #[test]
    fn test_constraint_key_lowercases() {
        assert_eq!(
            ConstraintKey::new("DBO", "Orders", "PK_Orders"),
            ConstraintKey::new("dbo", "orders", "pk_orders")
        );
    }

    #[test]
    fn test_constraint_type_parse() {
        assert_eq!(ConstraintType::parse("FOREIGN KEY"), ConstraintType::ForeignKey);
        assert_eq!(ConstraintType::parse("primary key"), ConstraintType::PrimaryKey);
        assert_eq!(ForeignKeyAction::parse("CASCADE"), ForeignKeyAction::Cascade);
        assert_eq!(ForeignKeyAction::parse("NO ACTION"), ForeignKeyAction::NoAction);
    }
}
