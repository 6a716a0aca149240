use std::collections::BTreeSet;

use crate::store::RequestContext;

/// Identifies which pending fetches may share one store query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub context: String,
    pub database: String,
    pub container: String,
    pub typename: String,
}

/// One caller's view of a fetch: which documents, which columns, and the
/// order the caller wants the results back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub typename: String,
    pub database: String,
    pub container: String,
    pub columns: Vec<String>,
    pub ids: Vec<String>,
}

impl LoadRequest {
    pub fn new(
        typename: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            typename: typename.into(),
            database: database.into(),
            container: container.into(),
            columns: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn batch_key(&self, context: &RequestContext) -> BatchKey {
        BatchKey {
            context: context.id.clone(),
            database: self.database.clone(),
            container: self.container.clone(),
            typename: self.typename.clone(),
        }
    }

    pub fn to_spec(&self) -> DataLoaderSpec {
        DataLoaderSpec {
            database: self.database.clone(),
            container: self.container.clone(),
            typename: self.typename.clone(),
            columns: self.columns.iter().cloned().collect(),
            ids: self.ids.iter().cloned().collect(),
        }
    }
}

/// A pending, possibly still growing, batch: the union of every merged
/// caller's columns and ids. Consumed once when its window fires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataLoaderSpec {
    pub database: String,
    pub container: String,
    pub typename: String,
    pub columns: BTreeSet<String>,
    pub ids: BTreeSet<String>,
}

impl DataLoaderSpec {
    /// A bucket at capacity takes no further merges.
    pub fn has_room(&self, batch_size: usize) -> bool {
        self.ids.len() < batch_size
    }

    pub fn merge(&mut self, other: DataLoaderSpec) {
        self.columns.extend(other.columns);
        self.ids.extend(other.ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_spec_dedups() {
        let request = LoadRequest::new("Dummy", "db", "Dummies")
            .columns(["name", "name"])
            .ids(["2", "1", "2"]);
        let spec = request.to_spec();
        assert_eq!(spec.ids.len(), 2);
        assert_eq!(spec.columns.len(), 1);
        assert_eq!(request.ids, vec!["2", "1", "2"]);
    }

    #[test]
    fn test_batch_key_includes_context() {
        let request = LoadRequest::new("Dummy", "db", "Dummies");
        let a = request.batch_key(&RequestContext::new("a"));
        let b = request.batch_key(&RequestContext::new("b"));
        assert_ne!(a, b);
        assert_eq!(a, request.batch_key(&RequestContext::new("a")));
    }

    #[test]
    fn test_merge_and_capacity() {
        let mut left = LoadRequest::new("Dummy", "db", "Dummies")
            .columns(["a"])
            .ids(["1", "2"])
            .to_spec();
        assert!(left.has_room(3));
        left.merge(
            LoadRequest::new("Dummy", "db", "Dummies")
                .columns(["b"])
                .ids(["2", "3"])
                .to_spec(),
        );
        assert_eq!(left.ids.len(), 3);
        assert_eq!(left.columns.len(), 2);
        assert!(!left.has_room(3));
    }
}
