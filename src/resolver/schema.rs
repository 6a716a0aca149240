use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::args::{FieldArgs, FieldInfo};
use super::errors::ResolveError;
use super::resolve::{FieldResolver, Resolved};
use super::strategy::Strategy;
use crate::config::Config;
use crate::loader::DataLoader;
use crate::meta::{compile_with, index_key, MetaError, MetaIndex, TypeAnnotation};
use crate::store::{Record, RequestContext, Store};

/// Hook run on every failed resolution; may rewrite the error.
pub type ErrorMiddleware = dyn Fn(ResolveError, &FieldInfo) -> ResolveError + Send + Sync;

/// A compiled schema: the meta index plus one resolver per field.
pub struct DocumentSchema {
    index: MetaIndex,
    resolvers: HashMap<String, FieldResolver>,
    config: Config,
    middleware: Option<Arc<ErrorMiddleware>>,
}

impl std::fmt::Debug for DocumentSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSchema")
            .field("types", &self.index.schema().types.len())
            .field("resolvers", &self.resolvers.len())
            .field("config", &self.config)
            .field("middleware", &self.middleware.is_some())
            .finish()
    }
}

impl DocumentSchema {
    pub fn compile(annotations: &[TypeAnnotation], config: &Config) -> Result<Self, MetaError> {
        let schema = compile_with(annotations, &config.schema.compile_options())?;
        Ok(Self::new(MetaIndex::new(schema), config.clone()))
    }

    pub fn new(index: MetaIndex, config: Config) -> Self {
        let resolvers: HashMap<String, FieldResolver> = index
            .fields()
            .map(|(parent, field)| {
                let strategy = Strategy::select(parent, field, &index);
                (
                    index_key(&parent.typename, &field.fieldname),
                    FieldResolver::new(parent, field, strategy),
                )
            })
            .collect();
        debug!(resolvers = resolvers.len(), "built resolver table");
        Self {
            index,
            resolvers,
            config,
            middleware: None,
        }
    }

    pub fn with_error_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(ResolveError, &FieldInfo) -> ResolveError + Send + Sync + 'static,
    {
        self.middleware = Some(Arc::new(middleware));
        self
    }

    pub fn index(&self) -> &MetaIndex {
        &self.index
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self, typename: &str, fieldname: &str) -> Option<&FieldResolver> {
        self.resolvers.get(&index_key(typename, fieldname))
    }

    /// Start a request: one store handle, one context, one batching loader.
    pub fn scope(&self, store: Arc<dyn Store>, context: RequestContext) -> RequestScope<'_> {
        let loader = DataLoader::new(Arc::clone(&store), self.config.loader.clone());
        RequestScope {
            schema: self,
            store,
            context,
            loader,
        }
    }

    pub(crate) fn handle_error(&self, err: ResolveError, info: &FieldInfo) -> ResolveError {
        match &self.middleware {
            Some(middleware) => middleware(err, info),
            None => err,
        }
    }
}

/// Per-request state shared by every field resolved for that request.
pub struct RequestScope<'a> {
    schema: &'a DocumentSchema,
    store: Arc<dyn Store>,
    context: RequestContext,
    loader: DataLoader,
}

impl<'a> RequestScope<'a> {
    pub fn schema(&self) -> &'a DocumentSchema {
        self.schema
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    /// Resolve `info.parent_type`.`info.field_name` on `source`.
    pub async fn resolve(
        &self,
        source: &Record,
        args: &FieldArgs,
        info: &FieldInfo,
    ) -> Result<Resolved, ResolveError> {
        match self.schema.resolver(&info.parent_type, &info.field_name) {
            Some(resolver) => resolver.resolve(self, source, args, info).await,
            None => {
                let err = self
                    .schema
                    .index
                    .require_field(&info.parent_type, &info.field_name)
                    .err()
                    .unwrap_or_else(|| MetaError::MissingField(info.field_name.clone()));
                Err(self.schema.handle_error(err.into(), info))
            }
        }
    }
}
