//! Schema introspection module.
//!
//! This module reads SQL Server catalog metadata into the abstract schema
//! model and runs the few administrative statements that need the catalog
//! (identity reseed, constraint checking, column drops).
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule. All of them go
//! through the caller's [`SqlConnection`] with positional `@P1..@Pn`
//! parameters; rows are read with case-insensitive column lookup.

use crate::db::connection::{DriverCapabilities, DriverProbe, SqlConnection};
use crate::db::ddl::DdlBuilder;
use crate::db::routine::{RoutineCall, RoutineInvoker, function_bindings, function_statement, invoker_for};
use crate::db::types::{
    DEFAULT_STRING_MAX_SIZE, TIMESTAMP_FOR_SET, extract_default, extract_fixed_length,
    extract_multibyte_support, extract_type, read_function_for, simple_type_for,
};
use crate::error::DbResult;
use crate::models::{
    ColumnSchema, ColumnSpec, ConstraintKey, ConstraintType, Expression, ForeignKeyAction,
    ParamDirection, ParameterSchema, QueryParam, RoutineKind, RoutineSchema, Row, RowExt,
    TableConstraint, TableSchema, compare_names, quote_column_name, unquote,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Schema that owns unqualified objects.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Session settings every connection needs before touching indexed views
/// or computed columns.
pub const SESSION_INIT_STATEMENTS: [&str; 3] = [
    "SET ANSI_NULLS ON;",
    "SET ANSI_WARNINGS ON;",
    "SET QUOTED_IDENTIFIER ON;",
];

/// Library-level settings for a [`SqlServerSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaOptions {
    pub default_schema: String,
    /// Length for `varchar` / `nvarchar` / `varbinary` declared without one
    pub string_max_size: u32,
    /// Extra statements appended to the session init list
    #[serde(default)]
    pub init_statements: Vec<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
            string_max_size: DEFAULT_STRING_MAX_SIZE,
            init_statements: Vec::new(),
        }
    }
}

/// SQL Server schema bridge bound to one connection and driver profile.
pub struct SqlServerSchema {
    conn: Arc<dyn SqlConnection>,
    capabilities: DriverCapabilities,
    invoker: Box<dyn RoutineInvoker>,
    ddl: DdlBuilder,
    options: SchemaOptions,
    /// Base table quoted names per lower-cased schema
    base_tables: RwLock<HashMap<String, Vec<String>>>,
}

impl SqlServerSchema {
    /// Probe the drivers once and pick the invocation strategy.
    pub fn new(
        conn: Arc<dyn SqlConnection>,
        probe: &dyn DriverProbe,
        options: SchemaOptions,
    ) -> DbResult<Self> {
        let capabilities = DriverCapabilities::probe(probe)?;
        let invoker = invoker_for(capabilities.family);
        Ok(Self {
            conn,
            invoker,
            capabilities,
            ddl: DdlBuilder::new(options.string_max_size),
            options,
            base_tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn default_schema(&self) -> &str {
        &self.options.default_schema
    }

    pub fn capabilities(&self) -> &DriverCapabilities {
        &self.capabilities
    }

    pub fn invoker(&self) -> &dyn RoutineInvoker {
        self.invoker.as_ref()
    }

    pub fn ddl(&self) -> &DdlBuilder {
        &self.ddl
    }

    /// Whether two table names refer to the same table, quoted or not.
    pub fn compare_table_names(&self, a: &str, b: &str) -> bool {
        compare_names(a, b)
    }

    /// chrono format the query grammar uses for date-time bindings.
    pub fn grammar_date_format(&self) -> &'static str {
        self.capabilities.family.grammar_date_format()
    }

    /// Raw "now" expression for value lists.
    pub fn timestamp_for_set(&self) -> Expression {
        self.conn.raw(TIMESTAMP_FOR_SET)
    }

    /// Column DDL for a spec: translate, validate, build.
    pub fn column_type(&self, spec: ColumnSpec) -> DbResult<String> {
        self.ddl.column_type(spec)
    }

    /// Display name for an object: schema-qualified unless it lives in the
    /// default schema.
    fn display_name(&self, schema: &str, name: &str) -> String {
        if !schema.is_empty() && !schema.eq_ignore_ascii_case(&self.options.default_schema) {
            format!("{}.{}", schema, name)
        } else {
            name.to_string()
        }
    }

    // =========================================================================
    // Session setup
    // =========================================================================

    /// Session statements followed by the configured extras.
    pub fn init_statements(&self) -> Vec<String> {
        SESSION_INIT_STATEMENTS
            .iter()
            .map(|s| s.to_string())
            .chain(self.options.init_statements.iter().cloned())
            .collect()
    }

    pub async fn run_init_statements(&self) -> DbResult<()> {
        for sql in self.init_statements() {
            self.conn.statement(&sql).await?;
        }
        debug!(count = self.init_statements().len(), "Ran session init statements");
        Ok(())
    }

    // =========================================================================
    // Schemas, tables, views
    // =========================================================================

    /// User schemas, excluding system and fixed database-role schemas.
    pub async fn get_schemas(&self) -> DbResult<Vec<String>> {
        let schemas = self
            .conn
            .select_column(queries::LIST_SCHEMAS, &[], "schema_name")
            .await?;
        debug!(count = schemas.len(), "Listed schemas");
        Ok(schemas)
    }

    /// Base tables keyed by lower-cased display name.
    pub async fn get_table_names(&self, schema: &str) -> DbResult<BTreeMap<String, TableSchema>> {
        let tables = self.list_tables(queries::LIST_BASE_TABLES, schema, false).await?;
        debug!(count = tables.len(), schema = schema, "Listed base tables");
        Ok(tables)
    }

    /// Views keyed by lower-cased display name.
    pub async fn get_view_names(&self, schema: &str) -> DbResult<BTreeMap<String, TableSchema>> {
        let views = self.list_tables(queries::LIST_VIEWS, schema, true).await?;
        debug!(count = views.len(), schema = schema, "Listed views");
        Ok(views)
    }

    async fn list_tables(
        &self,
        base_sql: &str,
        schema: &str,
        is_view: bool,
    ) -> DbResult<BTreeMap<String, TableSchema>> {
        let rows = if schema.is_empty() {
            self.conn.select(base_sql, &[]).await?
        } else {
            let sql = format!("{}{}", base_sql, queries::TABLE_SCHEMA_FILTER);
            self.conn.select(&sql, &[QueryParam::from(schema)]).await?
        };

        Ok(rows
            .iter()
            .filter_map(|row| {
                let resource_name = row.get_string("table_name")?;
                let schema_name = row.get_string("table_schema").unwrap_or_default();
                let name = self.display_name(&schema_name, &resource_name);
                let mut table = TableSchema::new(schema_name, resource_name).with_name(name);
                if is_view {
                    table = table.as_view();
                }
                Some((table.name.to_lowercase(), table))
            })
            .collect())
    }

    /// Fill a table's columns, keys and identity from the catalog.
    pub async fn load_table_columns(&self, mut table: TableSchema) -> DbResult<TableSchema> {
        let schema = if table.schema_name.is_empty() {
            self.options.default_schema.clone()
        } else {
            table.schema_name.clone()
        };
        let params = [
            QueryParam::from(table.resource_name.as_str()),
            QueryParam::from(schema.as_str()),
            QueryParam::from(table.quoted_name.as_str()),
        ];
        let rows = self.conn.select(queries::DESCRIBE_COLUMNS, &params).await?;
        let mut columns: Vec<ColumnSchema> = rows.iter().filter_map(column_from_row).collect();

        let index_rows = self
            .conn
            .select(queries::DESCRIBE_INDEX_COLUMNS, &[QueryParam::from(table.quoted_name.as_str())])
            .await?;
        apply_index_flags(&mut columns, &index_rows);

        table.columns.clear();
        table.primary_key.clear();
        table.sequence_name = None;
        for column in columns {
            table.add_column(column);
        }

        debug!(
            table = %table.internal_name,
            columns = table.columns.len(),
            primary_key = ?table.primary_key,
            "Loaded table columns"
        );
        Ok(table)
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    /// Constraints of the given schemas, folded per (schema, table, constraint).
    ///
    /// An empty schema list means the default schema.
    pub async fn get_table_constraints(
        &self,
        schemas: &[String],
    ) -> DbResult<BTreeMap<ConstraintKey, TableConstraint>> {
        let schemas: Vec<&str> = if schemas.is_empty() {
            vec![self.options.default_schema.as_str()]
        } else {
            schemas.iter().map(String::as_str).collect()
        };
        let placeholders = (1..=schemas.len())
            .map(|i| format!("@P{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("{} WHERE tc.constraint_schema IN ({})", queries::LIST_CONSTRAINTS, placeholders);
        let params: Vec<QueryParam> = schemas.iter().map(|s| QueryParam::from(*s)).collect();

        let rows = self.conn.select(&sql, &params).await?;
        let constraints = fold_constraint_rows(&rows);
        debug!(
            rows = rows.len(),
            count = constraints.len(),
            schemas = ?schemas,
            "Listed table constraints"
        );
        Ok(constraints)
    }

    /// Mark key and reference flags on a table's columns from folded constraints.
    pub fn apply_constraints(
        &self,
        mut table: TableSchema,
        constraints: &BTreeMap<ConstraintKey, TableConstraint>,
    ) -> TableSchema {
        let default_schema = self.options.default_schema.clone();
        let table_schema = if table.schema_name.is_empty() {
            default_schema.clone()
        } else {
            table.schema_name.clone()
        };

        let resource_name = table.resource_name.clone();
        let owned = constraints.values().filter(|c| {
            c.table_schema.eq_ignore_ascii_case(&table_schema)
                && c.table_name.eq_ignore_ascii_case(&resource_name)
        });

        for constraint in owned {
            match constraint.constraint_type {
                ConstraintType::PrimaryKey => {
                    for name in &constraint.column_name {
                        if let Some(column) = table.column_mut(name) {
                            column.is_primary_key = true;
                            column.is_unique = false;
                        }
                        if !table.primary_key.iter().any(|pk| pk.eq_ignore_ascii_case(name)) {
                            table.primary_key.push(name.clone());
                        }
                    }
                }
                ConstraintType::Unique if constraint.column_name.len() == 1 => {
                    if let Some(column) = table.column_mut(&constraint.column_name[0]) {
                        column.is_unique = !column.is_primary_key;
                    }
                }
                ConstraintType::ForeignKey => {
                    let ref_table = constraint.referenced_table(&default_schema);
                    for (i, name) in constraint.column_name.iter().enumerate() {
                        if let Some(column) = table.column_mut(name) {
                            column.is_foreign_key = true;
                            column.ref_table = ref_table.clone();
                            column.ref_field = constraint.referenced_column_name.get(i).cloned();
                        }
                    }
                }
                _ => {}
            }
        }
        table
    }

    // =========================================================================
    // Routines
    // =========================================================================

    /// Procedures or functions keyed by lower-cased display name.
    pub async fn get_routine_names(
        &self,
        kind: RoutineKind,
        schema: &str,
    ) -> DbResult<BTreeMap<String, RoutineSchema>> {
        let mut params = vec![QueryParam::from(kind.catalog_type())];
        let sql = if schema.is_empty() {
            queries::LIST_ROUTINES.to_string()
        } else {
            params.push(QueryParam::from(schema));
            format!("{}{}", queries::LIST_ROUTINES, queries::ROUTINE_SCHEMA_FILTER)
        };

        let rows = self.conn.select(&sql, &params).await?;
        let routines: BTreeMap<String, RoutineSchema> = rows
            .iter()
            .filter_map(|row| {
                let resource_name = row.get_string("routine_name")?;
                let schema_name = row
                    .get_string("routine_schema")
                    .unwrap_or_else(|| schema.to_string());
                let name = self.display_name(&schema_name, &resource_name);
                let mut routine = RoutineSchema::new(kind, schema_name, resource_name).with_name(name);
                if let Some(return_type) = row
                    .get_string("data_type")
                    .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("void"))
                {
                    routine = routine.with_return_type(simple_type_for(&return_type));
                }
                Some((routine.name.to_lowercase(), routine))
            })
            .collect();

        debug!(
            count = routines.len(),
            kind = kind.catalog_type(),
            schema = schema,
            "Listed routines"
        );
        Ok(routines)
    }

    /// Fill a routine's parameters and return type from the catalog.
    pub async fn load_parameters(&self, mut routine: RoutineSchema) -> DbResult<RoutineSchema> {
        let schema = if routine.schema_name.is_empty() {
            self.options.default_schema.clone()
        } else {
            routine.schema_name.clone()
        };
        let params = [
            QueryParam::from(routine.resource_name.as_str()),
            QueryParam::from(schema.as_str()),
        ];
        let rows = self.conn.select(queries::DESCRIBE_PARAMETERS, &params).await?;

        routine.parameters.clear();
        for row in &rows {
            let db_type = row.get_string("data_type").unwrap_or_default();
            let simple_type = simple_type_for(&db_type);
            let position = row.get_i64("ordinal_position").unwrap_or_default();
            if position == 0 {
                // Position 0 describes a function's return value
                routine.return_type = Some(simple_type);
                continue;
            }

            let name = row.get_string("parameter_name").unwrap_or_default();
            let direction = ParamDirection::parse(&row.get_string("parameter_mode").unwrap_or_default());
            let mut param = ParameterSchema::new(
                &name,
                u32::try_from(position).unwrap_or_default(),
                direction,
                db_type,
                simple_type,
            );
            param.length = row
                .get_i64("character_maximum_length")
                .and_then(|l| i32::try_from(l).ok());
            param.precision = row
                .get_i64("numeric_precision")
                .and_then(|p| u32::try_from(p).ok());
            param.scale = row.get_i64("numeric_scale").and_then(|s| u32::try_from(s).ok());
            routine.parameters.push(param);
        }
        routine.parameters.sort_by_key(|p| p.position);

        debug!(
            routine = %routine.quoted_name,
            parameters = routine.parameters.len(),
            return_type = ?routine.return_type,
            "Loaded routine parameters"
        );
        Ok(routine)
    }

    /// Statement and bindings for a procedure under the active driver profile.
    pub fn procedure_call(&self, routine: &RoutineSchema, values: &Row) -> RoutineCall {
        self.invoker.procedure_call(routine, values)
    }

    /// Statement and bindings for a function call.
    pub fn function_call(&self, routine: &RoutineSchema, values: &Row) -> RoutineCall {
        RoutineCall {
            statement: function_statement(routine, &routine.parameters, &self.options.default_schema),
            bindings: function_bindings(&routine.parameters, values),
        }
    }

    // =========================================================================
    // Administrative statements
    // =========================================================================

    /// Reseed a table's identity so the next row gets `value`, or `MAX(pk) + 1`.
    ///
    /// Returns the reseed value, or `None` when the table has no identity column.
    pub async fn reset_sequence(&self, table: &TableSchema, value: Option<i64>) -> DbResult<Option<i64>> {
        let Some(sequence) = table.sequence_name.as_deref() else {
            return Ok(None);
        };

        let reseed = match value {
            Some(v) => v.saturating_sub(1),
            None => {
                let pk = table.primary_key_column().unwrap_or(sequence);
                let sql = format!("SELECT MAX({}) FROM {}", quote_column_name(pk), table.quoted_name);
                self.conn
                    .select_value(&sql, &[])
                    .await?
                    .and_then(|v| match v {
                        serde_json::Value::Number(n) => n.as_i64(),
                        serde_json::Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    })
                    .unwrap_or(0)
            }
        };

        let name = unquote(&table.quoted_name);
        self.conn
            .statement(&format!("DBCC CHECKIDENT ('{}',RESEED,{})", name, reseed))
            .await?;
        info!(table = %name, reseed = reseed, "Reseeded identity");
        Ok(Some(reseed))
    }

    /// Enable or disable constraint checking for every base table of a schema.
    ///
    /// Returns the number of tables touched.
    pub async fn set_integrity_check(&self, schema: &str, enable: bool) -> DbResult<usize> {
        let schema = if schema.is_empty() {
            self.options.default_schema.as_str()
        } else {
            schema
        };
        let tables = self.base_tables(schema).await?;
        for table in &tables {
            self.conn
                .statement(&self.ddl.integrity_check_statement(table, enable))
                .await?;
        }
        info!(schema = schema, enable = enable, tables = tables.len(), "Toggled constraint checks");
        Ok(tables.len())
    }

    async fn base_tables(&self, schema: &str) -> DbResult<Vec<String>> {
        let key = schema.to_lowercase();
        if let Some(tables) = self.base_tables.read().await.get(&key) {
            return Ok(tables.clone());
        }

        let tables: Vec<String> = self
            .get_table_names(schema)
            .await?
            .into_values()
            .map(|t| t.quoted_name)
            .collect();
        self.base_tables.write().await.insert(key, tables.clone());
        Ok(tables)
    }

    /// Drop columns from a table. Returns `false` when there was nothing to drop.
    pub async fn drop_columns<S: AsRef<str> + Sync>(&self, table: &str, columns: &[S]) -> DbResult<bool> {
        match self.ddl.drop_columns(table, columns) {
            Some(sql) => self.conn.statement(&sql).await,
            None => Ok(false),
        }
    }
}

/// Build a column from one row of the columns query.
fn column_from_row(row: &Row) -> Option<ColumnSchema> {
    let name = row.get_string("column_name")?;
    let db_type = row.get_string("data_type").unwrap_or_default();

    let column = ColumnSchema::new(name)
        .with_db_type(db_type.clone())
        .with_nullable(row.get_bool("is_nullable"))
        .with_limits(
            row.get_i64("numeric_precision").unwrap_or_default(),
            row.get_i64("numeric_scale").unwrap_or_default(),
            row.get_i64("character_maximum_length").unwrap_or_default(),
        )
        .with_auto_increment(row.get_bool("is_identity"));

    let mut column = extract_type(column, &db_type);
    column.fixed_length = extract_fixed_length(&db_type);
    column.supports_multibyte = extract_multibyte_support(&db_type);
    if let Some(raw) = row.get_string("column_default") {
        column = extract_default(column, &raw);
    }
    if let Some(function) = read_function_for(&db_type, &column.quoted_name) {
        column = column.with_db_function(function);
    }
    Some(column)
}

/// Join index membership back onto columns by name.
///
/// Unique flags only apply to single-column unique indexes.
fn apply_index_flags(columns: &mut [ColumnSchema], index_rows: &[Row]) {
    let mut index_sizes: HashMap<i64, usize> = HashMap::new();
    for row in index_rows {
        *index_sizes.entry(row.get_i64("index_id").unwrap_or_default()).or_default() += 1;
    }

    for row in index_rows {
        let Some(name) = row.get_string("column_name") else {
            continue;
        };
        let Some(column) = columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(&name)) else {
            continue;
        };
        column.is_index = true;
        if row.get_bool("is_primary_key") {
            column.is_primary_key = true;
            column.is_unique = false;
        } else if row.get_bool("is_unique")
            && !column.is_primary_key
            && index_sizes.get(&row.get_i64("index_id").unwrap_or_default()) == Some(&1)
        {
            column.is_unique = true;
        }
    }
}

/// Fold one-row-per-column constraint results into per-constraint records.
///
/// Rows sharing a lower-cased (schema, table, constraint) key accumulate their
/// `column_name` and `referenced_column_name` values in encounter order.
pub fn fold_constraint_rows(rows: &[Row]) -> BTreeMap<ConstraintKey, TableConstraint> {
    let mut constraints: BTreeMap<ConstraintKey, TableConstraint> = BTreeMap::new();

    for row in rows {
        let table_schema = row.get_string("table_schema").unwrap_or_default();
        let table_name = row.get_string("table_name").unwrap_or_default();
        let constraint_name = row.get_string("constraint_name").unwrap_or_default();
        let key = ConstraintKey::new(&table_schema, &table_name, &constraint_name);
        let column = row.get_string("column_name");
        let referenced_column = row.get_string("referenced_column_name");

        if let Some(existing) = constraints.get_mut(&key) {
            existing.column_name.extend(column);
            existing.referenced_column_name.extend(referenced_column);
            continue;
        }

        constraints.insert(
            key,
            TableConstraint {
                constraint_type: ConstraintType::parse(
                    &row.get_string("constraint_type").unwrap_or_default(),
                ),
                constraint_schema: row
                    .get_string("constraint_schema")
                    .unwrap_or_else(|| table_schema.clone()),
                constraint_name,
                table_schema,
                table_name,
                column_name: column.into_iter().collect(),
                referenced_table_schema: row.get_string("referenced_table_schema"),
                referenced_table_name: row.get_string("referenced_table_name"),
                referenced_column_name: referenced_column.into_iter().collect(),
                update_rule: row.get_string("update_rule").map(|r| ForeignKeyAction::parse(&r)),
                delete_rule: row.get_string("delete_rule").map(|r| ForeignKeyAction::parse(&r)),
            },
        );
    }

    constraints
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub const LIST_SCHEMAS: &str = r#"
        SELECT schema_name FROM INFORMATION_SCHEMA.SCHEMATA
        WHERE schema_name NOT IN (
            'INFORMATION_SCHEMA', 'sys', 'db_owner', 'db_accessadmin', 'db_securityadmin',
            'db_ddladmin', 'db_backupoperator', 'db_datareader', 'db_datawriter',
            'db_denydatareader', 'db_denydatawriter'
        )
        "#;

    pub const LIST_BASE_TABLES: &str = r#"
        SELECT TABLE_NAME, TABLE_SCHEMA FROM [INFORMATION_SCHEMA].[TABLES]
        WHERE TABLE_TYPE = 'BASE TABLE'"#;

    pub const LIST_VIEWS: &str = r#"
        SELECT TABLE_NAME, TABLE_SCHEMA FROM [INFORMATION_SCHEMA].[TABLES]
        WHERE TABLE_TYPE = 'VIEW'"#;

    pub const TABLE_SCHEMA_FILTER: &str = " AND TABLE_SCHEMA = @P1";

    /// @P1 table, @P2 schema, @P3 quoted table name
    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            col.column_name,
            col.numeric_precision,
            col.numeric_scale,
            col.character_maximum_length,
            col.is_nullable,
            idcol.is_identity,
            col.data_type,
            col.column_default
        FROM INFORMATION_SCHEMA.COLUMNS AS col
        LEFT JOIN sys.identity_columns AS idcol
            ON idcol.object_id = OBJECT_ID(@P3) AND idcol.name = col.column_name
        WHERE col.table_name = @P1 AND col.table_schema = @P2
        ORDER BY col.ordinal_position
        "#;

    /// @P1 quoted table name
    pub const DESCRIBE_INDEX_COLUMNS: &str = r#"
        SELECT
            c.name AS column_name,
            i.index_id,
            i.is_primary_key,
            i.is_unique
        FROM sys.indexes AS i
        JOIN sys.index_columns AS ic
            ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        JOIN sys.columns AS c
            ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE i.object_id = OBJECT_ID(@P1) AND ic.is_included_column = 0
        "#;

    pub const LIST_CONSTRAINTS: &str = r#"
        SELECT
            tc.constraint_type,
            tc.constraint_schema,
            tc.constraint_name,
            tc.table_schema,
            tc.table_name,
            kcu.column_name,
            kcu2.table_schema AS referenced_table_schema,
            kcu2.table_name AS referenced_table_name,
            kcu2.column_name AS referenced_column_name,
            rc.update_rule,
            rc.delete_rule
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON tc.constraint_schema = kcu.constraint_schema
            AND tc.constraint_name = kcu.constraint_name
            AND tc.table_name = kcu.table_name
        LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
            ON tc.constraint_schema = rc.constraint_schema
            AND tc.constraint_name = rc.constraint_name
        LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu2
            ON rc.unique_constraint_schema = kcu2.constraint_schema
            AND rc.unique_constraint_name = kcu2.constraint_name
            AND kcu.ordinal_position = kcu2.ordinal_position
        "#;

    /// @P1 routine type
    pub const LIST_ROUTINES: &str = r#"
        SELECT ROUTINE_NAME, ROUTINE_SCHEMA, DATA_TYPE FROM INFORMATION_SCHEMA.ROUTINES
        WHERE ROUTINE_TYPE = @P1"#;

    pub const ROUTINE_SCHEMA_FILTER: &str = " AND ROUTINE_SCHEMA = @P2";

    /// @P1 routine name, @P2 schema
    pub const DESCRIBE_PARAMETERS: &str = r#"
        SELECT
            p.ORDINAL_POSITION,
            p.PARAMETER_MODE,
            p.PARAMETER_NAME,
            p.DATA_TYPE,
            p.CHARACTER_MAXIMUM_LENGTH,
            p.NUMERIC_PRECISION,
            p.NUMERIC_SCALE
        FROM INFORMATION_SCHEMA.PARAMETERS AS p
        JOIN INFORMATION_SCHEMA.ROUTINES AS r ON r.SPECIFIC_NAME = p.SPECIFIC_NAME
        WHERE r.ROUTINE_NAME = @P1 AND r.ROUTINE_SCHEMA = @P2
        ORDER BY p.ORDINAL_POSITION
        "#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_column_from_row() {
        let col = column_from_row(&row(json!({
            "COLUMN_NAME": "title",
            "NUMERIC_PRECISION": null,
            "NUMERIC_SCALE": null,
            "CHARACTER_MAXIMUM_LENGTH": 120,
            "IS_NULLABLE": "YES",
            "is_identity": null,
            "DATA_TYPE": "nvarchar",
            "COLUMN_DEFAULT": "('untitled')"
        })))
        .unwrap();
        assert_eq!(col.size, Some(120));
        assert!(col.allow_null);
        assert!(col.supports_multibyte);
        assert!(!col.fixed_length);
        assert_eq!(col.simple_type, crate::models::SimpleType::String);
        assert_eq!(col.default_value, Some(crate::models::DefaultValue::literal("untitled")));
    }

    #[test]
    fn test_column_from_row_identity_and_function() {
        let col = column_from_row(&row(json!({
            "column_name": "guid",
            "character_maximum_length": null,
            "is_nullable": "NO",
            "is_identity": false,
            "data_type": "uniqueidentifier"
        })))
        .unwrap();
        assert!(!col.allow_null);
        assert_eq!(col.select_expression(), "(CONVERT(varchar(255), [guid]))");
    }

    #[test]
    fn test_apply_index_flags_composite_unique() {
        let mut columns = vec![
            ColumnSchema::new("id"),
            ColumnSchema::new("a"),
            ColumnSchema::new("b"),
            ColumnSchema::new("email"),
        ];
        let rows = vec![
            row(json!({"column_name": "id", "index_id": 1, "is_primary_key": true, "is_unique": true})),
            row(json!({"column_name": "a", "index_id": 2, "is_primary_key": false, "is_unique": true})),
            row(json!({"column_name": "b", "index_id": 2, "is_primary_key": false, "is_unique": true})),
            row(json!({"column_name": "EMAIL", "index_id": 3, "is_primary_key": false, "is_unique": 1})),
        ];
        apply_index_flags(&mut columns, &rows);
        assert!(columns[0].is_primary_key && !columns[0].is_unique);
        assert!(columns[1].is_index && !columns[1].is_unique);
        assert!(columns[2].is_index && !columns[2].is_unique);
        assert!(columns[3].is_unique);
    }

    #[test]
    fn test_fold_composite_key_keeps_order() {
        let rows = vec![
            row(json!({
                "constraint_type": "PRIMARY KEY", "table_schema": "dbo",
                "table_name": "Order_Items", "constraint_name": "PK_Items", "column_name": "order_id"
            })),
            row(json!({
                "constraint_type": "PRIMARY KEY", "table_schema": "DBO",
                "table_name": "order_items", "constraint_name": "pk_items", "column_name": "line_no"
            })),
        ];
        let folded = fold_constraint_rows(&rows);
        assert_eq!(folded.len(), 1);
        let pk = &folded[&ConstraintKey::new("dbo", "order_items", "pk_items")];
        assert_eq!(pk.column_name, vec!["order_id".to_string(), "line_no".to_string()]);
        assert!(pk.referenced_column_name.is_empty());
    }
}
