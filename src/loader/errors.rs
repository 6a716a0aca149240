use thiserror::Error;

use crate::store::StoreError;

/// Failures delivered to a loader caller. Cloneable because one failed
/// batch query is reported to every caller sharing the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("batch of {requested} ids exceeds the batch size of {limit}")]
    TooManyIds { requested: usize, limit: usize },

    #[error("batch was dropped before it resolved")]
    Dropped,

    #[error(transparent)]
    Store(#[from] StoreError),
}
