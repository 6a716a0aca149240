use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::query::SqlQuery;

/// Identifies one logical request. Passed through to the store on every
/// call and part of every batch key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub id: String,
    /// Opaque data for the store driver (credentials, session tokens...).
    #[serde(default)]
    pub data: Value,
}

impl RequestContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// One page of raw store results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePage {
    pub items: Vec<Value>,
    /// Continuation token; `None` once the result set is exhausted.
    pub next_cursor: Option<String>,
}

impl StorePage {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }
}

/// A failed store call. Cloneable so a single failure can be handed to
/// every caller waiting on the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store query on {database}/{container} failed: {message}")]
pub struct StoreError {
    pub database: String,
    pub container: String,
    pub message: String,
}

impl StoreError {
    pub fn new(
        database: impl Into<String>,
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
            message: message.into(),
        }
    }
}

/// The document store driver.
///
/// `cursor: None` starts from the beginning; re-submitting a returned
/// `next_cursor` resumes exactly where that page ended.
#[async_trait]
pub trait Store: Send + Sync {
    async fn query(
        &self,
        context: &RequestContext,
        database: &str,
        container: &str,
        sql: &SqlQuery,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<StorePage, StoreError>;
}

/// Run a query to exhaustion, following continuation cursors.
pub async fn query_all(
    store: &dyn Store,
    context: &RequestContext,
    database: &str,
    container: &str,
    sql: &SqlQuery,
    page_size: Option<usize>,
) -> Result<Vec<Value>, StoreError> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = store
            .query(context, database, container, sql, cursor.as_deref(), page_size)
            .await?;
        items.extend(page.items);
        match page.next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            Some(_) => {
                return Err(StoreError::new(
                    database,
                    container,
                    "store returned the same continuation cursor twice",
                ))
            }
            None => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_all_follows_cursors() {
        let store = RecordingStore::new(|call| {
            Ok(match call.cursor.as_deref() {
                None => StorePage::new(vec![json!({"id": "1"})]).with_next_cursor("a"),
                Some("a") => StorePage::new(vec![json!({"id": "2"})]).with_next_cursor("b"),
                _ => StorePage::new(vec![json!({"id": "3"})]),
            })
        });
        let ctx = RequestContext::new("req");
        let items = query_all(&store, &ctx, "db", "Things", &SqlQuery::new("SELECT c.id FROM c"), Some(10))
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(store.calls().len(), 3);
        assert_eq!(store.calls()[2].cursor.as_deref(), Some("b"));
        assert_eq!(store.calls()[0].limit, Some(10));
    }

    #[tokio::test]
    async fn test_query_all_rejects_repeating_cursor() {
        let store = RecordingStore::new(|_| Ok(StorePage::new(vec![]).with_next_cursor("same")));
        let ctx = RequestContext::new("req");
        let err = query_all(&store, &ctx, "db", "Things", &SqlQuery::new("SELECT c.id FROM c"), None)
            .await
            .unwrap_err();
        assert!(err.message.contains("same continuation cursor"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::new("db", "Things", "throttled");
        assert_eq!(err.to_string(), "store query on db/Things failed: throttled");
    }
}
