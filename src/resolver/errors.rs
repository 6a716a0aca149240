use thiserror::Error;

use crate::loader::LoaderError;
use crate::meta::MetaError;
use crate::query::QueryError;
use crate::store::StoreError;

/// Errors raised while resolving one field. They abort that field only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("field `{typename}.{field}` has no database/container")]
    MissingLocation { typename: String, field: String },

    #[error("field `{typename}.{field}` needs column `{column}` on its parent record")]
    MissingKey {
        typename: String,
        field: String,
        column: String,
    },

    #[error("column `{column}` holds {value}, expected an id or a list of ids")]
    InvalidKey { column: String, value: String },

    #[error("field `{typename}.{field}` returns one record but the store returned {rows}")]
    Cardinality {
        typename: String,
        field: String,
        rows: usize,
    },

    #[error("{0}")]
    Message(String),

    #[error("{trace}: {source}")]
    Traced {
        trace: String,
        source: Box<ResolveError>,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Prefix with `during <strategy> at <Type>(<id>).<field>`.
    pub fn traced(self, strategy: &str, typename: &str, id: Option<&str>, field: &str) -> Self {
        ResolveError::Traced {
            trace: format!("during {strategy} at {typename}({}).{field}", id.unwrap_or("?")),
            source: Box::new(self),
        }
    }

    /// The innermost error below any trace frames.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Traced { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
