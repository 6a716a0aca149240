use thiserror::Error;

use crate::meta::{Comparison, MetaError};

/// Errors raised while turning `where`/`sort` input into query text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("unknown filter operator `{operator}` in `{key}`")]
    UnknownOperator { key: String, operator: String },

    #[error("malformed filter key `{0}` (expected `<field>_<op>`)")]
    MalformedKey(String),

    #[error("malformed sort key `{0}` (expected `<field>_ASC` or `<field>_DESC`)")]
    MalformedSortKey(String),

    #[error("invalid where input: {0}")]
    InvalidWhere(String),

    #[error("invalid sort input: {0}")]
    InvalidSort(String),

    #[error("`{key}` is not a filterable field of `{typename}`")]
    UnknownFilterField { typename: String, key: String },

    #[error("`{key}` is not a sortable field of `{typename}`")]
    UnknownSortField { typename: String, key: String },

    #[error("operator `{comparison}` is not allowed on `{typename}.{field}`")]
    OperatorNotAllowed {
        typename: String,
        field: String,
        comparison: Comparison,
    },

    #[error("invalid value for `{comparison}`: {reason}")]
    InvalidValue {
        comparison: Comparison,
        reason: String,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),
}
