/// Request-coalescing column loader.
///
/// ```text
/// load(ctx, LoadRequest)      many concurrent callers
///       ↓
/// BatchCoordinator            pending buckets keyed by BatchKey
///       ↓  (batch window elapses)
/// one store query per bucket  ARRAY_CONTAINS(@ids, c.id)
///       ↓
/// per-caller demultiplexing   requested order, missing ids → None
/// ```
mod coordinator;
mod errors;
mod spec;

pub use coordinator::DataLoader;
pub use errors::LoaderError;
pub use spec::{BatchKey, DataLoaderSpec, LoadRequest};
