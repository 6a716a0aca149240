//! Compiled meta schema types.
//!
//! The meta schema is the normalized, name-sorted description of every type
//! and field together with how each field's value is produced. It is built
//! once by [`compile`](super::compile) and never mutated afterwards.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::MetaError;

/// All compiled types, ordered by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetaSchema {
    pub types: Vec<MetaType>,
}

impl MetaSchema {
    pub fn find_type(&self, typename: &str) -> Option<&MetaType> {
        self.types
            .binary_search_by(|t| t.typename.as_str().cmp(typename))
            .ok()
            .map(|i| &self.types[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaType {
    pub typename: String,
    pub database: Option<String>,
    pub container: Option<String>,
    /// Declared elsewhere, only referenced here.
    pub external: bool,
    pub fields: Vec<MetaField>,
}

impl MetaType {
    /// A type can be fetched from the store only when both parts of its
    /// location are known.
    pub fn is_queryable(&self) -> bool {
        self.database.is_some() && self.container.is_some()
    }

    pub fn location(&self) -> Option<(&str, &str)> {
        match (&self.database, &self.container) {
            (Some(db), Some(container)) => Some((db.as_str(), container.as_str())),
            _ => None,
        }
    }

    pub fn find_field(&self, fieldname: &str) -> Option<&MetaField> {
        self.fields
            .binary_search_by(|f| f.fieldname.as_str().cmp(fieldname))
            .ok()
            .map(|i| &self.fields[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaField {
    pub fieldname: String,
    pub return_typename: String,
    pub return_many: bool,
    pub database: Option<String>,
    pub container: Option<String>,
    /// Local key column holding the related record id(s).
    pub ours: Option<String>,
    /// Foreign key column on the related type pointing back at us.
    pub theirs: Option<String>,
    pub filter_ops: Option<BTreeSet<FilterOp>>,
    pub filter_alias: Option<String>,
    pub sortable: Option<bool>,
    pub sort_alias: Option<String>,
    pub pagination: Option<bool>,
    pub kind: RelationKind,
}

impl MetaField {
    /// Column a client filter key for this field resolves to.
    pub fn filter_column(&self) -> &str {
        self.filter_alias
            .as_deref()
            .or(self.ours.as_deref())
            .unwrap_or(&self.fieldname)
    }

    /// Column a client sort key for this field resolves to.
    pub fn sort_column(&self) -> &str {
        self.sort_alias
            .as_deref()
            .or(self.ours.as_deref())
            .unwrap_or(&self.fieldname)
    }

    /// Whether the field holds data in the parent document itself.
    pub fn is_stored_locally(&self) -> bool {
        matches!(
            self.kind,
            RelationKind::Embedded | RelationKind::OneOurs | RelationKind::ManyOurs
        )
    }

    pub fn is_filterable(&self) -> bool {
        match &self.filter_ops {
            Some(ops) => !ops.is_empty(),
            None => self.is_stored_locally(),
        }
    }

    pub fn allows_op(&self, op: FilterOp) -> bool {
        match &self.filter_ops {
            Some(ops) => ops.contains(&op),
            None => self.is_stored_locally(),
        }
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable.unwrap_or_else(|| self.is_stored_locally())
    }

    pub fn is_paginated(&self) -> bool {
        self.pagination.unwrap_or(false)
    }
}

/// How a field's value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    ManyOurs,
    ManyTheirs,
    OneOurs,
    OneTheirs,
    ManyRoot,
    Embedded,
}

impl RelationKind {
    /// Classify a field from its annotation shape.
    pub fn classify(
        has_container: bool,
        has_ours: bool,
        has_theirs: bool,
        is_list: bool,
    ) -> Result<Self, MetaError> {
        match (has_ours, has_theirs, is_list, has_container) {
            (true, true, _, _) => Err(MetaError::OursAndTheirs),
            (true, false, true, _) => Ok(RelationKind::ManyOurs),
            (false, true, true, _) => Ok(RelationKind::ManyTheirs),
            (true, false, false, _) => Ok(RelationKind::OneOurs),
            (false, true, false, _) => Ok(RelationKind::OneTheirs),
            (false, false, true, true) => Ok(RelationKind::ManyRoot),
            (false, false, _, false) => Ok(RelationKind::Embedded),
            (false, false, false, true) => Err(MetaError::IllegalRelation {
                ours: has_ours,
                theirs: has_theirs,
                list: is_list,
                container: has_container,
            }),
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(
            self,
            RelationKind::ManyOurs | RelationKind::ManyTheirs | RelationKind::ManyRoot
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::ManyOurs => "many-ours",
            RelationKind::ManyTheirs => "many-theirs",
            RelationKind::OneOurs => "one-ours",
            RelationKind::OneTheirs => "one-theirs",
            RelationKind::ManyRoot => "many-root",
            RelationKind::Embedded => "embedded",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter operators. Every operator also has a case-insensitive form,
/// carried separately by [`Comparison`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    In,
    Nin,
    Contains,
    Ncontains,
    Defined,
}

impl FilterOp {
    pub const ALL: [FilterOp; 11] = [
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Eq,
        FilterOp::Neq,
        FilterOp::In,
        FilterOp::Nin,
        FilterOp::Contains,
        FilterOp::Ncontains,
        FilterOp::Defined,
    ];

    /// Plural operators accept array operands.
    pub fn is_plural(&self) -> bool {
        matches!(self, FilterOp::In | FilterOp::Nin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::In => "in",
            FilterOp::Nin => "nin",
            FilterOp::Contains => "contains",
            FilterOp::Ncontains => "ncontains",
            FilterOp::Defined => "defined",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// An operator together with its case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparison {
    pub op: FilterOp,
    pub lowercase: bool,
}

impl Comparison {
    pub const fn new(op: FilterOp) -> Self {
        Self {
            op,
            lowercase: false,
        }
    }

    pub const fn lowercase(op: FilterOp) -> Self {
        Self {
            op,
            lowercase: true,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lowercase {
            write!(f, "{}_lower", self.op)
        } else {
            write!(f, "{}", self.op)
        }
    }
}
