use std::sync::Mutex;

use async_trait::async_trait;
use docql::meta::{FieldAnnotation, TypeAnnotation};
use docql::query::SqlQuery;
use docql::store::{RequestContext, Store, StoreError, StorePage};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct Call {
    pub container: String,
    pub sql: SqlQuery,
    pub limit: Option<usize>,
}

/// In-memory containers answering batch lookups and plain selects.
///
/// Batch lookups (`@ids`) return the matching documents; any other query
/// returns the container's documents unfiltered.
pub struct MemoryStore {
    containers: Vec<(String, Vec<Value>)>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_container(mut self, name: &str, documents: Vec<Value>) -> Self {
        self.containers.push((name.to_string(), documents));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(
        &self,
        _context: &RequestContext,
        database: &str,
        container: &str,
        sql: &SqlQuery,
        _cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<StorePage, StoreError> {
        self.calls.lock().unwrap().push(Call {
            container: container.to_string(),
            sql: sql.clone(),
            limit,
        });
        let documents = self
            .containers
            .iter()
            .find(|(name, _)| name == container)
            .map(|(_, docs)| docs.clone())
            .ok_or_else(|| StoreError::new(database, container, "no such container"))?;
        let items = match sql.parameter("@ids").and_then(Value::as_array) {
            Some(ids) => documents
                .into_iter()
                .filter(|doc| ids.contains(&doc["id"]))
                .collect(),
            None => documents,
        };
        Ok(StorePage::new(items))
    }
}

/// `Query.dummies` → `Dummy { id, name, related (one-ours), owner (one-theirs) }`.
pub fn dummy_annotations() -> Vec<TypeAnnotation> {
    vec![
        TypeAnnotation::new("Query").field(
            FieldAnnotation::new("dummies", "Dummy")
                .many()
                .located("db", "Dummies")
                .pagination(false),
        ),
        TypeAnnotation::new("Dummy")
            .field(FieldAnnotation::new("id", "ID"))
            .field(FieldAnnotation::new("name", "String"))
            .field(FieldAnnotation::new("related", "Dummy").ours("relatedId"))
            .field(FieldAnnotation::new("owner", "Owner").theirs("dummyId")),
        TypeAnnotation::new("Owner")
            .located("db", "Owners")
            .field(FieldAnnotation::new("dummyId", "String")),
    ]
}

pub fn dummies() -> Vec<Value> {
    vec![
        json!({"id": "1", "name": "Alice", "relatedId": "5"}),
        json!({"id": "2", "name": "Bob", "relatedId": "6"}),
        json!({"id": "5", "name": "Carol"}),
        json!({"id": "6", "name": "Dave"}),
    ]
}
