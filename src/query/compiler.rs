/// Filter tree / sort list → store query compiler.
///
/// Filter keys and sort keys are resolved through the [`MetaIndex`] to their
/// storage columns; leaf values become `@pN` parameters.
use serde_json::Value;

use super::errors::QueryError;
use super::filter::{Condition, FilterNode, FilterTarget};
use super::params::Parameters;
use super::sort::{SortDirection, SortSpec};
use super::types::{column_ref, SqlQuery, ALIAS};
use crate::meta::{Comparison, FilterOp, MetaIndex};

/// Every document carries this column; it is always filterable and sortable.
pub const ID_COLUMN: &str = "id";

/// Inputs for a windowed select.
#[derive(Debug, Clone, Copy)]
pub struct SelectSpec<'a> {
    pub typename: &'a str,
    /// Columns to project in addition to `id`.
    pub columns: &'a [String],
    pub filter: &'a [FilterNode],
    pub sort: &'a [SortSpec],
}

/// Render a filter tree into a condition string, or `None` when empty.
///
/// Top-level entries are joined with `AND`; combinators render as
/// parenthesized `AND`/`OR` groups.
pub fn transform_where(
    index: &MetaIndex,
    typename: &str,
    tree: &[FilterNode],
    params: &Parameters,
) -> Result<Option<String>, QueryError> {
    if tree.is_empty() {
        return Ok(None);
    }
    let parts = tree
        .iter()
        .map(|node| render_node(index, typename, node, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(parts.join(" AND ")))
}

fn render_node(
    index: &MetaIndex,
    typename: &str,
    node: &FilterNode,
    params: &Parameters,
) -> Result<String, QueryError> {
    match node {
        FilterNode::Leaf(condition) => render_condition(index, typename, condition, params),
        FilterNode::And(children) => render_group(index, typename, children, params, "AND", "true"),
        FilterNode::Or(children) => render_group(index, typename, children, params, "OR", "false"),
    }
}

fn render_group(
    index: &MetaIndex,
    typename: &str,
    children: &[FilterNode],
    params: &Parameters,
    joiner: &str,
    identity: &str,
) -> Result<String, QueryError> {
    if children.is_empty() {
        return Ok(identity.to_string());
    }
    let parts = children
        .iter()
        .map(|child| render_node(index, typename, child, params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", parts.join(&format!(" {joiner} "))))
}

fn render_condition(
    index: &MetaIndex,
    typename: &str,
    condition: &Condition,
    params: &Parameters,
) -> Result<String, QueryError> {
    let column = resolve_filter_column(index, typename, condition)?;
    let param = params.name_of(&condition.value).ok_or_else(|| {
        QueryError::InvalidWhere(format!(
            "value for `{}` was not indexed",
            condition.target.name()
        ))
    })?;
    render_operator(
        condition.comparison,
        &column_ref(&column),
        param,
        &condition.value,
    )
}

fn resolve_filter_column(
    index: &MetaIndex,
    typename: &str,
    condition: &Condition,
) -> Result<String, QueryError> {
    let key = match &condition.target {
        FilterTarget::Column(column) => return Ok(column.clone()),
        FilterTarget::Key(key) => key,
    };
    if key == ID_COLUMN && index.filter_field(typename, key).is_none() {
        return Ok(ID_COLUMN.to_string());
    }
    let field = index
        .filter_field(typename, key)
        .ok_or_else(|| QueryError::UnknownFilterField {
            typename: typename.to_string(),
            key: key.clone(),
        })?;
    if !field.allows_op(condition.comparison.op) {
        return Err(QueryError::OperatorNotAllowed {
            typename: typename.to_string(),
            field: field.fieldname.clone(),
            comparison: condition.comparison,
        });
    }
    Ok(field.filter_column().to_string())
}

/// Render one operator application.
///
/// `in`/`nin` branch on which operand is the array: an array value tests
/// `ARRAY_CONTAINS(value, column)`, anything else tests
/// `ARRAY_CONTAINS(column, value)`.
pub fn render_operator(
    comparison: Comparison,
    lhs: &str,
    rhs: &str,
    value: &Value,
) -> Result<String, QueryError> {
    let lower = comparison.lowercase;
    let rendered = match comparison.op {
        FilterOp::Eq if lower => format!("STRINGEQUALS({lhs}, {rhs}, true)"),
        FilterOp::Eq => format!("{lhs} = {rhs}"),
        FilterOp::Neq if lower => format!("NOT STRINGEQUALS({lhs}, {rhs}, true)"),
        FilterOp::Neq => format!("{lhs} != {rhs}"),
        FilterOp::Lt | FilterOp::Lte | FilterOp::Gt | FilterOp::Gte => {
            let symbol = match comparison.op {
                FilterOp::Lt => "<",
                FilterOp::Lte => "<=",
                FilterOp::Gt => ">",
                _ => ">=",
            };
            if lower {
                format!("LOWER({lhs}) {symbol} LOWER({rhs})")
            } else {
                format!("{lhs} {symbol} {rhs}")
            }
        }
        FilterOp::In => render_membership(lhs, rhs, value, lower),
        FilterOp::Nin => format!("NOT {}", render_membership(lhs, rhs, value, lower)),
        FilterOp::Contains if lower => format!("CONTAINS({lhs}, {rhs}, true)"),
        FilterOp::Contains => format!("CONTAINS({lhs}, {rhs})"),
        FilterOp::Ncontains if lower => format!("NOT CONTAINS({lhs}, {rhs}, true)"),
        FilterOp::Ncontains => format!("NOT CONTAINS({lhs}, {rhs})"),
        FilterOp::Defined => {
            if !value.is_boolean() {
                return Err(QueryError::InvalidValue {
                    comparison,
                    reason: "expected a boolean".into(),
                });
            }
            format!("IS_DEFINED({lhs}) = {rhs}")
        }
    };
    Ok(rendered)
}

fn render_membership(column: &str, param: &str, value: &Value, lower: bool) -> String {
    let (array, element) = if value.is_array() {
        (param, column)
    } else {
        (column, param)
    };
    if lower {
        format!("EXISTS(SELECT VALUE v FROM v IN {array} WHERE STRINGEQUALS(v, {element}, true))")
    } else {
        format!("ARRAY_CONTAINS({array}, {element})")
    }
}

/// Render an `ORDER BY` list. `id ASC` is appended unless the caller
/// already sorts on `id`, so ties never make paging unstable.
pub fn transform_sort(
    index: &MetaIndex,
    typename: &str,
    specs: &[SortSpec],
) -> Result<String, QueryError> {
    let mut parts = Vec::with_capacity(specs.len() + 1);
    let mut has_id = false;
    for spec in specs {
        let column = if spec.field == ID_COLUMN && index.sort_field(typename, ID_COLUMN).is_none() {
            ID_COLUMN.to_string()
        } else {
            index
                .sort_field(typename, &spec.field)
                .ok_or_else(|| QueryError::UnknownSortField {
                    typename: typename.to_string(),
                    key: spec.field.clone(),
                })?
                .sort_column()
                .to_string()
        };
        has_id |= column == ID_COLUMN;
        let rendered = column_ref(&column);
        parts.push(match spec.direction {
            SortDirection::Asc => rendered,
            SortDirection::Desc => format!("{rendered} DESC"),
        });
    }
    if !has_id {
        parts.push(column_ref(ID_COLUMN));
    }
    Ok(parts.join(", "))
}

/// `SELECT c.id[, c.col...] FROM c [WHERE ...] ORDER BY ...`
pub fn compile_select(index: &MetaIndex, spec: SelectSpec<'_>) -> Result<SqlQuery, QueryError> {
    index.require_type(spec.typename)?;
    let params = Parameters::index_where(spec.filter);

    let mut query_text = format!("SELECT {} FROM {ALIAS}", projection(spec.columns));
    if let Some(condition) = transform_where(index, spec.typename, spec.filter, &params)? {
        query_text.push_str(" WHERE ");
        query_text.push_str(&condition);
    }
    query_text.push_str(" ORDER BY ");
    query_text.push_str(&transform_sort(index, spec.typename, spec.sort)?);

    Ok(SqlQuery {
        query_text,
        parameters: params.into_vec(),
    })
}

/// `SELECT VALUE COUNT(1) FROM c [WHERE ...]`, sharing the select's
/// parameter numbering for the same filter.
pub fn compile_count(
    index: &MetaIndex,
    typename: &str,
    filter: &[FilterNode],
) -> Result<SqlQuery, QueryError> {
    index.require_type(typename)?;
    let params = Parameters::index_where(filter);
    let mut query_text = format!("SELECT VALUE COUNT(1) FROM {ALIAS}");
    if let Some(condition) = transform_where(index, typename, filter, &params)? {
        query_text.push_str(" WHERE ");
        query_text.push_str(&condition);
    }
    Ok(SqlQuery {
        query_text,
        parameters: params.into_vec(),
    })
}

/// `c.id` followed by the requested columns, without duplicates.
pub fn projection(columns: &[String]) -> String {
    let mut seen: Vec<&str> = vec![ID_COLUMN];
    for column in columns {
        if !seen.contains(&column.as_str()) {
            seen.push(column);
        }
    }
    seen.into_iter()
        .map(column_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Both queries a paginated read needs, rendered from client input.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Explain {
    pub select: SqlQuery,
    pub count: SqlQuery,
}

/// Compile client `where`/`sort` JSON for a type without running anything.
pub fn explain(
    index: &MetaIndex,
    typename: &str,
    columns: &[String],
    where_input: &Value,
    sort_input: &Value,
) -> Result<Explain, QueryError> {
    let filter = super::filter::parse_where(where_input)?;
    let sort = super::sort::parse_sort(sort_input)?;
    let select = compile_select(
        index,
        SelectSpec {
            typename,
            columns,
            filter: &filter,
            sort: &sort,
        },
    )?;
    let count = compile_count(index, typename, &filter)?;
    Ok(Explain { select, count })
}
