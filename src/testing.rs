//! Test doubles shared by the unit tests.
use std::sync::Mutex;

use async_trait::async_trait;

use crate::query::SqlQuery;
use crate::store::{RequestContext, Store, StoreError, StorePage};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoreCall {
    pub context: RequestContext,
    pub database: String,
    pub container: String,
    pub sql: SqlQuery,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

type Responder = dyn Fn(&StoreCall) -> Result<StorePage, StoreError> + Send + Sync;

/// A store that answers from a closure and records every call.
pub(crate) struct RecordingStore {
    responder: Box<Responder>,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new(
        responder: impl Fn(&StoreCall) -> Result<StorePage, StoreError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn query(
        &self,
        context: &RequestContext,
        database: &str,
        container: &str,
        sql: &SqlQuery,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<StorePage, StoreError> {
        let call = StoreCall {
            context: context.clone(),
            database: database.to_string(),
            container: container.to_string(),
            sql: sql.clone(),
            cursor: cursor.map(str::to_string),
            limit,
        };
        let result = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        result
    }
}
