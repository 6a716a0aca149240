use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::errors::LoaderError;
use super::spec::{BatchKey, DataLoaderSpec, LoadRequest};
use crate::config::LoaderConfig;
use crate::query::{column_ref, projection, SqlQuery, ALIAS, ID_COLUMN};
use crate::store::{query_all, RequestContext, Store};

type Reply = Result<Vec<Option<Value>>, LoaderError>;

struct Waiter {
    ids: Vec<String>,
    reply: oneshot::Sender<Reply>,
}

struct Bucket {
    key: BatchKey,
    context: RequestContext,
    spec: DataLoaderSpec,
    waiters: Vec<Waiter>,
}

#[derive(Default)]
struct Pending {
    buckets: Vec<Bucket>,
    timer_armed: bool,
}

/// Pending buckets plus the flag for the single debounce timer.
#[derive(Default)]
struct BatchCoordinator {
    pending: Mutex<Pending>,
}

impl BatchCoordinator {
    /// Add a request to a compatible bucket or open a new one. Returns the
    /// receiver for the caller's rows and whether the caller must arm the
    /// timer.
    fn enqueue(
        &self,
        context: &RequestContext,
        request: &LoadRequest,
        batch_size: usize,
    ) -> (oneshot::Receiver<Reply>, bool) {
        let (reply, receiver) = oneshot::channel();
        let waiter = Waiter {
            ids: request.ids.clone(),
            reply,
        };
        let key = request.batch_key(context);
        let spec = request.to_spec();

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        match pending
            .buckets
            .iter_mut()
            .find(|bucket| bucket.key == key && bucket.spec.has_room(batch_size))
        {
            Some(bucket) => {
                bucket.spec.merge(spec);
                bucket.waiters.push(waiter);
            }
            None => pending.buckets.push(Bucket {
                key,
                context: context.clone(),
                spec,
                waiters: vec![waiter],
            }),
        }
        let arm = !pending.timer_armed;
        pending.timer_armed = true;
        (receiver, arm)
    }

    /// Take every pending bucket. Requests arriving afterwards start a new
    /// window.
    fn drain(&self) -> Vec<Bucket> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.timer_armed = false;
        std::mem::take(&mut pending.buckets)
    }
}

struct LoaderInner {
    store: Arc<dyn Store>,
    config: LoaderConfig,
    coordinator: BatchCoordinator,
}

/// Coalesces concurrent column fetches into batched store queries.
///
/// Requests made within one batch window that share a [`BatchKey`] are
/// answered by a single `ARRAY_CONTAINS(@ids, c.id)` query. Cloning shares
/// the pending set and timer.
#[derive(Clone)]
pub struct DataLoader {
    inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl DataLoader {
    pub fn new(store: Arc<dyn Store>, config: LoaderConfig) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                store,
                config,
                coordinator: BatchCoordinator::default(),
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Fetch `request.columns` (plus `id`) for each of `request.ids`.
    ///
    /// The result has one entry per requested id, in request order; ids the
    /// store did not return come back as `None`.
    pub async fn load(&self, context: &RequestContext, request: LoadRequest) -> Reply {
        if request.ids.is_empty() {
            return Ok(Vec::new());
        }
        let spec = request.to_spec();
        let limit = self.inner.config.batch_size;
        if spec.ids.len() > limit {
            return Err(LoaderError::TooManyIds {
                requested: spec.ids.len(),
                limit,
            });
        }

        let (receiver, arm) = self.inner.coordinator.enqueue(context, &request, limit);
        if arm {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.batch_window()).await;
                inner.flush().await;
            });
        }
        receiver.await.unwrap_or(Err(LoaderError::Dropped))
    }

    /// Single-id convenience over [`DataLoader::load`].
    pub async fn load_one(
        &self,
        context: &RequestContext,
        request: LoadRequest,
    ) -> Result<Option<Value>, LoaderError> {
        Ok(self.load(context, request).await?.into_iter().next().flatten())
    }
}

impl LoaderInner {
    async fn flush(&self) {
        let buckets = self.coordinator.drain();
        if buckets.is_empty() {
            return;
        }
        debug!(
            buckets = buckets.len(),
            ids = buckets.iter().map(|b| b.spec.ids.len()).sum::<usize>(),
            "flushing batch window"
        );
        join_all(buckets.into_iter().map(|bucket| self.dispatch(bucket))).await;
    }

    async fn dispatch(&self, bucket: Bucket) {
        let Bucket {
            context,
            spec,
            waiters,
            ..
        } = bucket;
        let sql = batch_query(&spec);
        trace!(typename = %spec.typename, ids = spec.ids.len(), query = %sql.query_text, "batch query");

        let result = query_all(
            self.store.as_ref(),
            &context,
            &spec.database,
            &spec.container,
            &sql,
            Some(spec.ids.len()),
        )
        .await;

        match result {
            Ok(rows) => {
                let by_id: HashMap<&str, &Value> = rows
                    .iter()
                    .filter_map(|row| Some((row.get(ID_COLUMN)?.as_str()?, row)))
                    .collect();
                for waiter in waiters {
                    let values = waiter
                        .ids
                        .iter()
                        .map(|id| by_id.get(id.as_str()).map(|row| (*row).clone()))
                        .collect();
                    let _ = waiter.reply.send(Ok(values));
                }
            }
            Err(err) => {
                for waiter in waiters {
                    let _ = waiter.reply.send(Err(LoaderError::Store(err.clone())));
                }
            }
        }
    }
}

/// `SELECT c.id[, c.col...] FROM c WHERE ARRAY_CONTAINS(@ids, c.id)`
fn batch_query(spec: &DataLoaderSpec) -> SqlQuery {
    let columns: Vec<String> = spec.columns.iter().cloned().collect();
    let ids: Vec<&String> = spec.ids.iter().collect();
    SqlQuery::new(format!(
        "SELECT {} FROM {ALIAS} WHERE ARRAY_CONTAINS(@ids, {})",
        projection(&columns),
        column_ref(ID_COLUMN)
    ))
    .with_parameter("@ids", json!(ids))
}
