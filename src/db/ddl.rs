//! T-SQL DDL rendering.
//!
//! Statement builders interpolate identifiers and rendered column definitions
//! into SQL Server's fixed templates. Table names are used exactly as passed;
//! column names are bracket-quoted.

use crate::db::types::{
    DEFAULT_STRING_MAX_SIZE, translate_simple_column_types, validate_column_settings,
};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnSpec, DefaultValue, quote_column_name};
use serde_json::Value as JsonValue;

/// Render a literal default value.
///
/// Numbers are emitted as-is, booleans as `1`/`0`, strings single-quoted with
/// embedded quotes doubled.
pub fn quote_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Render a finished column definition: type, nullability, default, identity, key clause.
pub fn build_column_definition(spec: &ColumnSpec) -> DbResult<String> {
    if spec.is_primary_key && spec.is_unique {
        return Err(DbError::configuration(
            "a column cannot be both PRIMARY KEY and UNIQUE",
            &spec.name,
        ));
    }

    let mut definition = spec.data_type.clone();
    if let Some(extras) = &spec.type_extras {
        definition.push_str(extras);
    }

    definition.push_str(if spec.allow_null { " NULL" } else { " NOT NULL" });

    match &spec.default {
        Some(DefaultValue::Expression { expression }) => {
            definition.push_str(" DEFAULT ");
            definition.push_str(expression);
        }
        Some(DefaultValue::Literal(JsonValue::Null)) | None => {}
        Some(DefaultValue::Literal(value)) => {
            definition.push_str(" DEFAULT ");
            definition.push_str(&quote_value(value));
        }
    }

    if spec.auto_increment {
        definition.push_str(" IDENTITY");
    }

    if spec.is_primary_key {
        definition.push_str(" PRIMARY KEY");
    } else if spec.is_unique {
        definition.push_str(" UNIQUE");
    }

    Ok(definition)
}

/// Renders DDL statements for one schema configuration.
#[derive(Debug, Clone, Copy)]
pub struct DdlBuilder {
    string_max_size: u32,
}

impl Default for DdlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_STRING_MAX_SIZE)
    }
}

impl DdlBuilder {
    pub fn new(string_max_size: u32) -> Self {
        Self { string_max_size }
    }

    /// Run the full pipeline for one column: translate, validate, build.
    pub fn column_type(&self, spec: ColumnSpec) -> DbResult<String> {
        let spec = translate_simple_column_types(spec);
        let spec = validate_column_settings(spec, self.string_max_size);
        build_column_definition(&spec)
    }

    pub fn rename_table(&self, table: &str, new_name: &str) -> String {
        format!("sp_rename '{}', '{}'", table, new_name)
    }

    pub fn rename_column(&self, table: &str, column: &str, new_name: &str) -> String {
        format!("sp_rename '{}.{}', '{}', 'COLUMN'", table, column, new_name)
    }

    pub fn add_column(&self, table: &str, column: &str, spec: ColumnSpec) -> DbResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {} {};",
            table,
            quote_column_name(column),
            self.column_type(spec)?
        ))
    }

    pub fn alter_column(&self, table: &str, column: &str, spec: ColumnSpec) -> DbResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            table,
            quote_column_name(column),
            self.column_type(spec)?
        ))
    }

    /// `None` when there is nothing to drop.
    pub fn drop_columns<S: AsRef<str>>(&self, table: &str, columns: &[S]) -> Option<String> {
        if columns.is_empty() {
            return None;
        }
        let columns = columns
            .iter()
            .map(|c| quote_column_name(c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("ALTER TABLE {} DROP COLUMN {}", table, columns))
    }

    /// Render `CREATE TABLE` from named column specs, in order.
    pub fn create_table(&self, table: &str, specs: Vec<ColumnSpec>) -> DbResult<String> {
        if specs.is_empty() {
            return Err(DbError::invalid_input(format!(
                "Table '{}' needs at least one column",
                table
            )));
        }

        let mut columns = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(DbError::invalid_input(format!(
                    "Every column of table '{}' needs a name",
                    table
                )));
            }
            let name = quote_column_name(&spec.name);
            columns.push(format!("{} {}", name, self.column_type(spec)?));
        }

        Ok(format!("CREATE TABLE {} ({});", table, columns.join(", ")))
    }

    /// Enable or disable constraint checking on a table.
    pub fn integrity_check_statement(&self, table: &str, enable: bool) -> String {
        let check = if enable { "CHECK" } else { "NOCHECK" };
        format!("ALTER TABLE {} {} CONSTRAINT ALL", table, check)
    }
}
