//! Constant-time lookup tables over a compiled [`MetaSchema`].
use std::collections::{BTreeSet, HashMap};

use super::errors::MetaError;
use super::types::{MetaField, MetaSchema, MetaType};

/// Position of a field inside the schema: (type index, field index).
type Slot = (usize, usize);

/// Read-only index over a meta schema.
///
/// Every table is keyed by `"<typename>.<name>"`. The `require_*` lookups
/// fail with a descriptive [`MetaError`]; the plain lookups return `None`.
#[derive(Debug, Clone)]
pub struct MetaIndex {
    schema: MetaSchema,
    types: HashMap<String, usize>,
    field: HashMap<String, Slot>,
    filter_field: HashMap<String, Slot>,
    sort_field: HashMap<String, Slot>,
    ours_field: HashMap<String, Slot>,
    theirs_field: HashMap<String, Slot>,
    filterable_types: BTreeSet<String>,
    sortable_types: BTreeSet<String>,
    pageable_types: BTreeSet<String>,
}

pub fn index_key(typename: &str, name: &str) -> String {
    format!("{typename}.{name}")
}

impl MetaIndex {
    pub fn new(schema: MetaSchema) -> Self {
        let mut index = MetaIndex {
            types: HashMap::with_capacity(schema.types.len()),
            field: HashMap::new(),
            filter_field: HashMap::new(),
            sort_field: HashMap::new(),
            ours_field: HashMap::new(),
            theirs_field: HashMap::new(),
            filterable_types: BTreeSet::new(),
            sortable_types: BTreeSet::new(),
            pageable_types: BTreeSet::new(),
            schema,
        };

        for (ti, meta_type) in index.schema.types.iter().enumerate() {
            index.types.insert(meta_type.typename.clone(), ti);
            for (fi, field) in meta_type.fields.iter().enumerate() {
                let slot = (ti, fi);
                let typename = meta_type.typename.as_str();
                index
                    .field
                    .insert(index_key(typename, &field.fieldname), slot);

                if field.is_filterable() {
                    index
                        .filter_field
                        .insert(index_key(typename, field.filter_column()), slot);
                    index.filterable_types.insert(typename.to_string());
                }
                if field.is_sortable() {
                    index
                        .sort_field
                        .insert(index_key(typename, field.sort_column()), slot);
                    index.sortable_types.insert(typename.to_string());
                }
                if let Some(ours) = &field.ours {
                    index.ours_field.insert(index_key(typename, ours), slot);
                }
                if let Some(theirs) = &field.theirs {
                    index.theirs_field.insert(index_key(typename, theirs), slot);
                }
                if field.is_paginated() {
                    index
                        .pageable_types
                        .insert(field.return_typename.clone());
                }
            }
        }

        index
    }

    pub fn schema(&self) -> &MetaSchema {
        &self.schema
    }

    fn at(&self, (ti, fi): Slot) -> (&MetaType, &MetaField) {
        let meta_type = &self.schema.types[ti];
        (meta_type, &meta_type.fields[fi])
    }

    pub fn meta_type(&self, typename: &str) -> Option<&MetaType> {
        self.types.get(typename).map(|&i| &self.schema.types[i])
    }

    pub fn require_type(&self, typename: &str) -> Result<&MetaType, MetaError> {
        self.meta_type(typename)
            .ok_or_else(|| MetaError::MissingType(typename.to_string()))
    }

    pub fn field(&self, typename: &str, fieldname: &str) -> Option<&MetaField> {
        self.lookup(&self.field, typename, fieldname)
    }

    pub fn require_field(&self, typename: &str, fieldname: &str) -> Result<&MetaField, MetaError> {
        self.field(typename, fieldname)
            .ok_or_else(|| MetaError::MissingField(index_key(typename, fieldname)))
    }

    /// Field a client filter key (`filterAlias ?? ours ?? fieldname`) refers to.
    pub fn filter_field(&self, typename: &str, key: &str) -> Option<&MetaField> {
        self.lookup(&self.filter_field, typename, key)
    }

    pub fn require_filter_field(&self, typename: &str, key: &str) -> Result<&MetaField, MetaError> {
        self.filter_field(typename, key)
            .ok_or_else(|| MetaError::MissingField(index_key(typename, key)))
    }

    /// Field a client sort key (`sortAlias ?? ours ?? fieldname`) refers to.
    pub fn sort_field(&self, typename: &str, key: &str) -> Option<&MetaField> {
        self.lookup(&self.sort_field, typename, key)
    }

    pub fn require_sort_field(&self, typename: &str, key: &str) -> Result<&MetaField, MetaError> {
        self.sort_field(typename, key)
            .ok_or_else(|| MetaError::MissingField(index_key(typename, key)))
    }

    /// Field whose local key column is `column`.
    pub fn ours_field(&self, typename: &str, column: &str) -> Option<&MetaField> {
        self.lookup(&self.ours_field, typename, column)
    }

    /// Field whose foreign key column is `column`.
    pub fn theirs_field(&self, typename: &str, column: &str) -> Option<&MetaField> {
        self.lookup(&self.theirs_field, typename, column)
    }

    fn lookup(&self, table: &HashMap<String, Slot>, typename: &str, name: &str) -> Option<&MetaField> {
        table
            .get(&index_key(typename, name))
            .map(|&slot| self.at(slot).1)
    }

    pub fn filterable_types(&self) -> &BTreeSet<String> {
        &self.filterable_types
    }

    pub fn sortable_types(&self) -> &BTreeSet<String> {
        &self.sortable_types
    }

    pub fn pageable_types(&self) -> &BTreeSet<String> {
        &self.pageable_types
    }

    /// Iterate every (type, field) pair in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&MetaType, &MetaField)> {
        self.schema
            .types
            .iter()
            .flat_map(|t| t.fields.iter().map(move |f| (t, f)))
    }
}
