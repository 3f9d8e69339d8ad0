//! Stored procedure and function models.

use crate::models::identifier::quote_qualified;
use crate::models::types::SimpleType;
use serde::{Deserialize, Serialize};

/// Direction of a routine parameter as reported by `PARAMETER_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamDirection {
    #[default]
    In,
    Out,
    #[serde(alias = "IN_OUT")]
    InOut,
}

impl ParamDirection {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "OUT" => Self::Out,
            "INOUT" | "IN_OUT" => Self::InOut,
            _ => Self::In,
        }
    }

    /// Whether the backend writes a value back through this parameter.
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

impl std::fmt::Display for ParamDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::InOut => write!(f, "INOUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Name without the leading `@`
    pub name: String,
    pub position: u32,
    #[serde(rename = "param_type", default)]
    pub direction: ParamDirection,
    #[serde(rename = "type")]
    pub simple_type: SimpleType,
    pub db_type: String,
    /// Declared character length; `-1` means `(max)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl ParameterSchema {
    /// Create a parameter. A leading `@` added by some drivers is stripped.
    pub fn new(
        name: &str,
        position: u32,
        direction: ParamDirection,
        db_type: impl Into<String>,
        simple_type: SimpleType,
    ) -> Self {
        Self {
            name: name.trim_start_matches('@').to_string(),
            position,
            direction,
            simple_type,
            db_type: db_type.into(),
            length: None,
            precision: None,
            scale: None,
        }
    }

    /// Set the declared character length.
    pub fn with_length(mut self, length: i32) -> Self {
        self.length = Some(length);
        self
    }

    /// Length clause for a variable declaration, e.g. `(50)` or `(max)`.
    pub fn length_clause(&self) -> Option<String> {
        match self.length? {
            -1 => Some("(max)".to_string()),
            n if n > 0 => Some(format!("({})", n)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl RoutineKind {
    /// Value of `INFORMATION_SCHEMA.ROUTINES.ROUTINE_TYPE`.
    pub fn catalog_type(&self) -> &'static str {
        match self {
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineSchema {
    pub kind: RoutineKind,
    #[serde(default)]
    pub schema_name: String,
    pub resource_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quoted_name: String,
    /// Abstract return type for functions; `None` for procedures and `void`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<SimpleType>,
    #[serde(default)]
    pub parameters: Vec<ParameterSchema>,
}

impl RoutineSchema {
    /// Create a routine. The display name defaults to the bare name.
    pub fn new(kind: RoutineKind, schema_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        let schema_name = schema_name.into();
        let resource_name = resource_name.into();
        Self {
            kind,
            quoted_name: quote_qualified(&schema_name, &resource_name),
            name: resource_name.clone(),
            schema_name,
            resource_name,
            return_type: None,
            parameters: Vec::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the return type.
    pub fn with_return_type(mut self, return_type: SimpleType) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, parameter: ParameterSchema) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Fill derived names missing from deserialized input and strip `@` from
    /// parameter names.
    pub fn normalized(mut self) -> Self {
        for param in &mut self.parameters {
            if let Some(name) = param.name.strip_prefix('@') {
                param.name = name.to_string();
            }
        }
        if self.name.is_empty() {
            self.name = self.resource_name.clone();
        }
        if self.quoted_name.is_empty() {
            self.quoted_name = quote_qualified(&self.schema_name, &self.resource_name);
        }
        self
    }

    pub fn is_table_valued(&self) -> bool {
        self.return_type == Some(SimpleType::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_strips_sigil() {
        let p = ParameterSchema::new("@total", 1, ParamDirection::Out, "int", SimpleType::Integer);
        assert_eq!(p.name, "total");
        assert!(p.direction.is_output());
    }

    #[test]
    fn test_length_clause() {
        let p = ParameterSchema::new("name", 1, ParamDirection::In, "nvarchar", SimpleType::String);
        assert_eq!(p.clone().with_length(50).length_clause().as_deref(), Some("(50)"));
        assert_eq!(p.clone().with_length(-1).length_clause().as_deref(), Some("(max)"));
        assert_eq!(p.with_length(0).length_clause(), None);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(ParamDirection::parse("INOUT"), ParamDirection::InOut);
        assert_eq!(ParamDirection::parse("out"), ParamDirection::Out);
        assert_eq!(ParamDirection::parse("IN"), ParamDirection::In);
        assert_eq!(ParamDirection::InOut.to_string(), "INOUT");
    }

    #[test]
    fn test_routine_names() {
        let r = RoutineSchema::new(RoutineKind::Function, "dbo", "calc");
        assert_eq!(r.quoted_name, "[dbo].[calc]");
        assert_eq!(RoutineKind::Procedure.catalog_type(), "PROCEDURE");

        let r = RoutineSchema::new(RoutineKind::Procedure, "", "cleanup");
        assert_eq!(r.quoted_name, "[cleanup]");
    }

    #[test]
    fn test_routine_deserialize_normalizes() {
        let r: RoutineSchema = serde_json::from_str(
            r#"{"kind":"procedure","schema_name":"dbo","resource_name":"get_user",
                "parameters":[{"name":"@id","position":1,"param_type":"IN","type":"integer","db_type":"int"}]}"#,
        )
        .unwrap();
        let r = r.normalized();
        assert_eq!(r.quoted_name, "[dbo].[get_user]");
        assert_eq!(r.name, "get_user");
        assert_eq!(r.parameters[0].direction, ParamDirection::In);
        assert_eq!(r.parameters[0].name, "id");
    }
}
