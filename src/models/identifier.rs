//! Bracket-style identifier quoting.

/// Quote a single identifier, doubling any embedded `]`.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Quote a column name unless it is already bracketed.
pub fn quote_column_name(name: &str) -> String {
    if name.starts_with('[') && name.ends_with(']') && name.len() >= 2 {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// Quote a possibly schema-qualified name (`schema.table` → `[schema].[table]`).
///
/// Parts that are already bracketed are kept as-is.
pub fn quote_table_name(name: &str) -> String {
    name.split('.')
        .map(quote_column_name)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a schema and object name pair. An empty schema yields the bare quoted name.
pub fn quote_qualified(schema: &str, name: &str) -> String {
    if schema.is_empty() {
        quote_ident(name)
    } else {
        format!("{}.{}", quote_ident(schema), quote_ident(name))
    }
}

/// Remove all bracket quoting from a name.
pub fn unquote(name: &str) -> String {
    name.replace(['[', ']'], "")
}

/// Compare two table or routine names, quoted or not, ignoring case.
pub fn compare_names(a: &str, b: &str) -> bool {
    unquote(a).to_lowercase() == unquote(b).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "[users]");
        assert_eq!(quote_ident("odd]name"), "[odd]]name]");
        assert_eq!(quote_column_name("[id]"), "[id]");
        assert_eq!(quote_column_name("id"), "[id]");
    }

    #[test]
    fn test_quote_table_name() {
        assert_eq!(quote_table_name("dbo.users"), "[dbo].[users]");
        assert_eq!(quote_table_name("[sales].orders"), "[sales].[orders]");
        assert_eq!(quote_qualified("", "users"), "[users]");
        assert_eq!(quote_qualified("hr", "staff"), "[hr].[staff]");
    }

    #[test]
    fn test_compare_names() {
        assert!(compare_names("[dbo].[Users]", "dbo.users"));
        assert!(compare_names("Orders", "[orders]"));
        assert!(!compare_names("orders", "order_items"));
    }
}
