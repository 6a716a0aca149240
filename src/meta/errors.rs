use thiserror::Error;

/// Errors raised while compiling annotations into a meta schema or while
/// looking up compiled entries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaError {
    #[error("a field cannot declare both `ours` and `theirs`")]
    OursAndTheirs,

    #[error(
        "illegal relationship shape (ours={ours}, theirs={theirs}, list={list}, container={container})"
    )]
    IllegalRelation {
        ours: bool,
        theirs: bool,
        list: bool,
        container: bool,
    },

    #[error("duplicate type `{0}`")]
    DuplicateType(String),

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("relationship returns unknown type `{0}`")]
    UnknownReturnType(String),

    #[error("type `{typename}` is stored in both {first} and {second}")]
    ConflictingLocation {
        typename: String,
        first: String,
        second: String,
    },

    #[error("invalid pagination annotation `{0}` (expected `on` or `off`)")]
    InvalidPagination(String),

    #[error("unknown filter operator `{0}`")]
    UnknownFilterOp(String),

    #[error("no type `{0}` in meta schema")]
    MissingType(String),

    #[error("no field `{0}` in meta schema")]
    MissingField(String),

    #[error("{context}: {source}")]
    Within {
        context: String,
        #[source]
        source: Box<MetaError>,
    },
}

impl MetaError {
    /// Wrap this error with one more breadcrumb.
    pub fn within(self, context: impl Into<String>) -> Self {
        MetaError::Within {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every breadcrumb stripped.
    pub fn root_cause(&self) -> &MetaError {
        match self {
            MetaError::Within { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
