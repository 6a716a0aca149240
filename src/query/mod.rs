/// Predicate and sort compilation.
///
/// ```text
/// where / sort JSON
///       ↓
/// FilterTree + SortSpec   (filter.rs, sort.rs)
///       ↓
/// Parameter indexing      (params.rs)
///       ↓
/// Query text              (compiler.rs)
/// ```
mod compiler;
mod errors;
mod filter;
mod params;
mod sort;
mod types;

pub use compiler::{
    compile_count, compile_select, explain, projection, render_operator, transform_sort,
    transform_where, Explain, SelectSpec, ID_COLUMN,
};
pub use errors::QueryError;
pub use filter::{parse_key, parse_where, Condition, FilterNode, FilterTarget, FilterTree};
pub use params::Parameters;
pub use sort::{parse_sort, SortDirection, SortSpec};
pub use types::{column_ref, SqlParameter, SqlQuery, ALIAS};
