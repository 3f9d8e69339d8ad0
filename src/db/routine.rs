//! Stored procedure and function invocation.
//!
//! Two strategies render `EXEC` statements and binding plans depending on
//! whether the active driver can bind OUT / INOUT parameters:
//!
//! - [`BoundOutputInvoker`] (sqlsrv): `EXEC proc @a=:a, @b=:b`, every
//!   parameter bound, output parameters bound as output.
//! - [`DeclareSelectInvoker`] (dblib, odbc): output parameters become local
//!   variables declared before the call and selected back afterwards; only
//!   IN parameters are bound.
//!
//! The strategy is chosen once from the probed [`DriverFamily`].

use crate::db::connection::DriverFamily;
use crate::models::{
    ParamDirection, ParameterSchema, QueryParam, RoutineSchema, Row, RowExt, quote_ident,
};
use serde::Serialize;

/// One value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamBinding {
    /// `:name`
    pub placeholder: String,
    pub value: QueryParam,
    /// Bound for output; the driver writes the parameter back
    pub output: bool,
}

impl ParamBinding {
    fn input(param: &ParameterSchema, values: &Row) -> Self {
        Self {
            placeholder: placeholder(param),
            value: value_for(param, values),
            output: false,
        }
    }
}

/// A rendered routine call: statement text plus its binding plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineCall {
    pub statement: String,
    pub bindings: Vec<ParamBinding>,
}

/// Renders procedure calls for one driver profile.
pub trait RoutineInvoker: Send + Sync {
    /// Whether OUT / INOUT parameters are bound directly.
    fn output_binding(&self) -> bool;

    /// Render the `EXEC` statement for a procedure.
    fn procedure_statement(
        &self,
        routine: &RoutineSchema,
        params: &[ParameterSchema],
        values: &Row,
    ) -> String;

    /// Values to bind, in parameter order.
    fn procedure_bindings(&self, params: &[ParameterSchema], values: &Row) -> Vec<ParamBinding>;

    /// Statement and bindings for a procedure using its own parameter list.
    fn procedure_call(&self, routine: &RoutineSchema, values: &Row) -> RoutineCall {
        RoutineCall {
            statement: self.procedure_statement(routine, &routine.parameters, values),
            bindings: self.procedure_bindings(&routine.parameters, values),
        }
    }
}

/// Pick the invoker for a driver family.
pub fn invoker_for(family: DriverFamily) -> Box<dyn RoutineInvoker> {
    if family.supports_output_binding() {
        Box::new(BoundOutputInvoker)
    } else {
        Box::new(DeclareSelectInvoker)
    }
}

fn placeholder(param: &ParameterSchema) -> String {
    format!(":{}", param.name)
}

fn variable(param: &ParameterSchema) -> String {
    format!("@{}", param.name)
}

fn value_for(param: &ParameterSchema, values: &Row) -> QueryParam {
    values
        .value(&param.name)
        .cloned()
        .map(QueryParam::from)
        .unwrap_or(QueryParam::Null)
}

/// Invoker for drivers without output-parameter binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclareSelectInvoker;

impl DeclareSelectInvoker {
    fn declare(param: &ParameterSchema) -> String {
        let mut db_type = param.db_type.clone();
        if !param.simple_type.is_integer() {
            if let Some(clause) = param.length_clause() {
                db_type.push_str(&clause);
            }
        }
        format!("DECLARE {} {};", variable(param), db_type)
    }
}

impl RoutineInvoker for DeclareSelectInvoker {
    fn output_binding(&self) -> bool {
        false
    }

    fn procedure_statement(
        &self,
        routine: &RoutineSchema,
        params: &[ParameterSchema],
        values: &Row,
    ) -> String {
        let mut args = Vec::with_capacity(params.len());
        let mut prefix = String::new();
        let mut postfix = String::new();

        for param in params {
            match param.direction {
                ParamDirection::In => args.push(placeholder(param)),
                ParamDirection::InOut | ParamDirection::Out => {
                    let var = variable(param);
                    args.push(format!("{} OUTPUT", var));
                    prefix.push_str(&Self::declare(param));
                    // Some OUT parameters are reported as INOUT; seed only when the caller passed a value.
                    if param.direction == ParamDirection::InOut {
                        if let Some(value) = values.value(&param.name) {
                            let literal = QueryParam::from(value.clone()).to_sql_literal();
                            prefix.push_str(&format!("SET {} = {};", var, literal));
                        }
                    }
                    postfix.push_str(&format!("SELECT {} AS {};", var, quote_ident(&param.name)));
                }
            }
        }

        let call = if args.is_empty() {
            format!("EXEC {}", routine.quoted_name)
        } else {
            format!("EXEC {} {}", routine.quoted_name, args.join(", "))
        };
        format!("{} {}; {}", prefix, call, postfix).trim().to_string()
    }

    fn procedure_bindings(&self, params: &[ParameterSchema], values: &Row) -> Vec<ParamBinding> {
        params
            .iter()
            .filter(|p| p.direction == ParamDirection::In)
            .map(|p| ParamBinding::input(p, values))
            .collect()
    }
}

/// Invoker for drivers that bind output parameters natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundOutputInvoker;

impl RoutineInvoker for BoundOutputInvoker {
    fn output_binding(&self) -> bool {
        true
    }

    fn procedure_statement(
        &self,
        routine: &RoutineSchema,
        params: &[ParameterSchema],
        _values: &Row,
    ) -> String {
        let args = params
            .iter()
            .map(|p| format!("{}={}", variable(p), placeholder(p)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("EXEC {} {}", routine.quoted_name, args)
            .trim_end()
            .to_string()
    }

    fn procedure_bindings(&self, params: &[ParameterSchema], values: &Row) -> Vec<ParamBinding> {
        params
            .iter()
            .map(|p| ParamBinding {
                placeholder: placeholder(p),
                value: value_for(p, values),
                output: p.direction.is_output(),
            })
            .collect()
    }
}

/// Render a function call as a SELECT.
///
/// Unqualified names are prefixed with the default schema, which SQL Server
/// requires for scalar functions.
pub fn function_statement(
    routine: &RoutineSchema,
    params: &[ParameterSchema],
    default_schema: &str,
) -> String {
    let name = if routine.quoted_name.contains('.') {
        routine.quoted_name.clone()
    } else {
        format!("{}.{}", quote_ident(default_schema), routine.quoted_name)
    };
    let args = params.iter().map(placeholder).collect::<Vec<_>>().join(", ");
    let output = quote_ident("output");

    if routine.is_table_valued() {
        format!("SELECT * FROM {}({}) AS {}", name, args, output)
    } else {
        format!("SELECT {}({}) AS {}", name, args, output)
    }
}

/// Every function parameter is bound as input.
pub fn function_bindings(params: &[ParameterSchema], values: &Row) -> Vec<ParamBinding> {
    params.iter().map(|p| ParamBinding::input(p, values)).collect()
}
