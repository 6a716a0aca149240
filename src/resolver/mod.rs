/// Field resolution.
///
/// ```text
/// MetaIndex
///       ↓
/// Strategy table          (strategy.rs)   one FieldResolver per field
///       ↓
/// RequestScope            (schema.rs)     store + context + DataLoader
///       ↓
/// FieldResolver::resolve  (resolve.rs)    Value | Record(s) | Page
/// ```
mod args;
mod errors;
mod resolve;
mod schema;
mod strategy;

pub use args::{FieldArgs, FieldInfo, Selection};
pub use errors::ResolveError;
pub use resolve::{selected_columns, FieldResolver, Resolved};
pub use schema::{DocumentSchema, ErrorMiddleware, RequestScope};
pub use strategy::Strategy;
