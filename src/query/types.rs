use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alias every document is bound to in generated query text.
pub const ALIAS: &str = "c";

/// A parameterized query in the store's SQL dialect.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQuery {
    pub query_text: String,
    pub parameters: Vec<SqlParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

impl SqlQuery {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.push(SqlParameter {
            name: name.into(),
            value,
        });
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Render a document property reference, bracket-quoting names that are not
/// plain identifiers.
pub fn column_ref(column: &str) -> String {
    let mut chars = column.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{ALIAS}.{column}")
    } else {
        let escaped = column.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{ALIAS}[\"{escaped}\"]")
    }
}
