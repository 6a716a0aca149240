/// Meta schema: the compiled description of every type and field.
///
/// ```text
/// annotation records  (annotations.rs)
///       ↓
/// Meta Compiler       (compiler.rs)
///       ↓
/// MetaSchema          (types.rs)
///       ↓
/// MetaIndex           (index.rs)
/// ```
mod annotations;
mod compiler;
mod errors;
mod index;
mod types;

pub use annotations::{AnnotationSet, FieldAnnotation, TypeAnnotation};
pub use compiler::{compile, compile_with, CompileOptions};
pub use errors::MetaError;
pub use index::{index_key, MetaIndex};
pub use types::*;
