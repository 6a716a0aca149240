//! Lazily evaluated result pages.
//!
//! A [`Page`] holds two compiled queries sharing one filter: the windowed
//! select and its `COUNT`. Neither runs until one of the accessors that
//! needs it is awaited, and each runs at most once.
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::trace;

use super::record::{DescriptorKind, Record};
use super::traits::{RequestContext, Store, StoreError};
use crate::query::SqlQuery;

/// Everything a page needs to run its queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub typename: String,
    pub database: String,
    pub container: String,
    pub select: SqlQuery,
    pub count: SqlQuery,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug)]
struct Window {
    items: Vec<Record>,
    next_cursor: Option<String>,
}

pub struct Page {
    store: Arc<dyn Store>,
    context: RequestContext,
    request: PageRequest,
    window: OnceCell<Window>,
    total: OnceCell<u64>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("request", &self.request)
            .field("window_loaded", &self.window.initialized())
            .field("total_loaded", &self.total.initialized())
            .finish()
    }
}

impl Page {
    pub fn new(store: Arc<dyn Store>, context: RequestContext, request: PageRequest) -> Self {
        Self {
            store,
            context,
            request,
            window: OnceCell::new(),
            total: OnceCell::new(),
        }
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// The cursor this page started from. Known without any store call.
    pub fn cursor(&self) -> Option<&str> {
        self.request.cursor.as_deref()
    }

    pub async fn items(&self) -> Result<&[Record], StoreError> {
        Ok(&self.window().await?.items)
    }

    pub async fn next_cursor(&self) -> Result<Option<&str>, StoreError> {
        Ok(self.window().await?.next_cursor.as_deref())
    }

    pub async fn total(&self) -> Result<u64, StoreError> {
        self.total
            .get_or_try_init(|| async {
                let request = &self.request;
                trace!(query = %request.count.query_text, "page count");
                let page = self
                    .store
                    .query(
                        &self.context,
                        &request.database,
                        &request.container,
                        &request.count,
                        None,
                        None,
                    )
                    .await?;
                page.items
                    .first()
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        StoreError::new(
                            request.database.as_str(),
                            request.container.as_str(),
                            "count query did not return a number",
                        )
                    })
            })
            .await
            .copied()
    }

    async fn window(&self) -> Result<&Window, StoreError> {
        self.window
            .get_or_try_init(|| async {
                let request = &self.request;
                trace!(query = %request.select.query_text, cursor = ?request.cursor, "page window");
                let page = self
                    .store
                    .query(
                        &self.context,
                        &request.database,
                        &request.container,
                        &request.select,
                        request.cursor.as_deref(),
                        request.limit,
                    )
                    .await?;
                let items = page
                    .items
                    .into_iter()
                    .map(|row| {
                        Record::from_row(
                            row,
                            DescriptorKind::List,
                            &request.typename,
                            &request.database,
                            &request.container,
                        )
                    })
                    .collect();
                Ok(Window {
                    items,
                    next_cursor: page.next_cursor,
                })
            })
            .await
    }
}
