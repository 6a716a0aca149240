//! Flat annotation records, as produced by the schema front end.
//!
//! These mirror the declarations one-to-one and carry no derived data. They
//! deserialize from TOML or JSON so annotation sets can live in files.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnnotation {
    pub typename: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub fields: Vec<FieldAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnnotation {
    pub fieldname: String,
    pub return_typename: String,
    #[serde(default)]
    pub return_many: bool,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub ours: Option<String>,
    #[serde(default)]
    pub theirs: Option<String>,
    /// Operator names, e.g. `["eq", "in"]`. Absent means "use the default".
    #[serde(default)]
    pub filter_ops: Option<Vec<String>>,
    #[serde(default)]
    pub filter_alias: Option<String>,
    #[serde(default)]
    pub sortable: Option<bool>,
    #[serde(default)]
    pub sort_alias: Option<String>,
    /// `"on"` or `"off"`.
    #[serde(default)]
    pub pagination: Option<String>,
}

/// A whole annotation set, the unit the CLI and config files work with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default)]
    pub types: Vec<TypeAnnotation>,
}

impl TypeAnnotation {
    pub fn new(typename: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            ..Default::default()
        }
    }

    pub fn located(mut self, database: impl Into<String>, container: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self.container = Some(container.into());
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn field(mut self, field: FieldAnnotation) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldAnnotation {
    pub fn new(fieldname: impl Into<String>, return_typename: impl Into<String>) -> Self {
        Self {
            fieldname: fieldname.into(),
            return_typename: return_typename.into(),
            ..Default::default()
        }
    }

    pub fn many(mut self) -> Self {
        self.return_many = true;
        self
    }

    pub fn located(mut self, database: impl Into<String>, container: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self.container = Some(container.into());
        self
    }

    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn ours(mut self, column: impl Into<String>) -> Self {
        self.ours = Some(column.into());
        self
    }

    pub fn theirs(mut self, column: impl Into<String>) -> Self {
        self.theirs = Some(column.into());
        self
    }

    pub fn filter_ops<I, S>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_ops = Some(ops.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter_alias(mut self, alias: impl Into<String>) -> Self {
        self.filter_alias = Some(alias.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn sort_alias(mut self, alias: impl Into<String>) -> Self {
        self.sort_alias = Some(alias.into());
        self
    }

    pub fn pagination(mut self, on: bool) -> Self {
        self.pagination = Some(if on { "on" } else { "off" }.to_string());
        self
    }
}
