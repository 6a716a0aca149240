use std::fmt;

use crate::meta::{MetaField, MetaIndex, MetaType, RelationKind};

/// How a field's value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Query the field's own container with the caller's filter only.
    Root,
    /// Follow key(s) stored on the parent record.
    ByOurs,
    /// Find related records whose key column points at the parent id.
    ByTheirs,
    /// Read a value stored inside the parent document.
    Embedded,
    /// Read a scalar column of a stored record, fetching it when absent.
    Column,
}

impl Strategy {
    pub fn select(parent: &MetaType, field: &MetaField, index: &MetaIndex) -> Self {
        match field.kind {
            RelationKind::ManyRoot => Strategy::Root,
            RelationKind::ManyOurs | RelationKind::OneOurs => Strategy::ByOurs,
            RelationKind::ManyTheirs | RelationKind::OneTheirs => Strategy::ByTheirs,
            RelationKind::Embedded
                if parent.is_queryable() && index.meta_type(&field.return_typename).is_none() =>
            {
                Strategy::Column
            }
            RelationKind::Embedded => Strategy::Embedded,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Root => "root",
            Strategy::ByOurs => "ours",
            Strategy::ByTheirs => "theirs",
            Strategy::Embedded => "embedded",
            Strategy::Column => "column",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
