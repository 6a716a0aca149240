use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::query::ID_COLUMN;

/// Whether a record came from a single-key fetch or a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DescriptorKind {
    Single,
    List,
}

/// Where a record lives, so missing columns can be fetched later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub kind: DescriptorKind,
    pub typename: String,
    pub database: String,
    pub container: String,
    pub id: String,
}

/// A document handed to field resolution.
///
/// `Described` records know their store location; `Materialized` ones
/// (root sources, embedded objects) only carry their payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Materialized(Value),
    Described {
        value: Value,
        source: SourceDescriptor,
    },
}

impl Record {
    /// Tag a store row with its location. Rows without a string `id` cannot
    /// be refetched and stay materialized.
    pub fn from_row(
        value: Value,
        kind: DescriptorKind,
        typename: &str,
        database: &str,
        container: &str,
    ) -> Self {
        match value.get(ID_COLUMN).and_then(Value::as_str) {
            Some(id) => {
                let source = SourceDescriptor {
                    kind,
                    typename: typename.to_string(),
                    database: database.to_string(),
                    container: container.to_string(),
                    id: id.to_string(),
                };
                Record::Described { value, source }
            }
            None => Record::Materialized(value),
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Record::Materialized(value) | Record::Described { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Record::Materialized(value) | Record::Described { value, .. } => value,
        }
    }

    pub fn source(&self) -> Option<&SourceDescriptor> {
        match self {
            Record::Materialized(_) => None,
            Record::Described { source, .. } => Some(source),
        }
    }

    /// A column present on the payload. `Some(Value::Null)` means the column
    /// is present and null; `None` means it was never loaded.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.value().get(column)
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Described { source, .. } => Some(source.id.as_str()),
            Record::Materialized(value) => value.get(ID_COLUMN).and_then(Value::as_str),
        }
    }

    /// Copy fetched columns into the payload, keeping existing ones.
    pub fn merge_columns(&mut self, fetched: &Value) {
        let value = match self {
            Record::Materialized(value) | Record::Described { value, .. } => value,
        };
        if let (Value::Object(target), Value::Object(source)) = (value, fetched) {
            for (key, column) in source {
                target.entry(key.clone()).or_insert_with(|| column.clone());
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}
