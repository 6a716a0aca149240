use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Arguments the execution engine passes to a field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldArgs {
    /// Client filter, `{ "<field>_<op>": value, "and": [...], "or": [...] }`.
    #[serde(rename = "where", default)]
    pub filter: Value,
    /// Client sort, `{ "<field>_ASC": priority, ... }`.
    #[serde(default)]
    pub sort: Value,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FieldArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = sort;
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The sub-fields the caller asked for, as a tree of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    fields: BTreeMap<String, Selection>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Selection::new());
        self
    }

    pub fn nested(mut self, name: impl Into<String>, selection: Selection) -> Self {
        self.fields.insert(name.into(), selection);
        self
    }

    pub fn child(&self, name: &str) -> Option<&Selection> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where in the result tree a field is being resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInfo {
    pub parent_type: String,
    pub field_name: String,
    pub selection: Selection,
}

impl FieldInfo {
    pub fn new(parent_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
            selection: Selection::new(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }
}
