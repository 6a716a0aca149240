//! Filter tree AST and the `where` input boundary.
//!
//! Client input arrives as a JSON object of the shape
//! `{ "<field>_<op>": value, "and": [...], "or": [...] }` and is turned into
//! a [`FilterTree`] once, here. Everything downstream walks the typed tree.
use serde_json::{Map, Value};

use super::errors::QueryError;
use crate::meta::{Comparison, FilterOp};

const LOWERCASE_SUFFIX: &str = "_lower";

/// An ordered sequence of filter entries, implicitly joined with `AND`.
pub type FilterTree = Vec<FilterNode>;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(Condition),
    And(FilterTree),
    Or(FilterTree),
}

/// A single `{op, field, value}` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub comparison: Comparison,
    pub target: FilterTarget,
    pub value: Value,
}

/// What the left-hand side of a condition names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTarget {
    /// A client filter key, resolved through the filter index.
    Key(String),
    /// A storage column used verbatim. Only built internally.
    Column(String),
}

impl FilterTarget {
    pub fn name(&self) -> &str {
        match self {
            FilterTarget::Key(name) | FilterTarget::Column(name) => name,
        }
    }
}

impl FilterNode {
    /// Leaf on a client filter key.
    pub fn key(key: impl Into<String>, comparison: Comparison, value: Value) -> Self {
        FilterNode::Leaf(Condition {
            comparison,
            target: FilterTarget::Key(key.into()),
            value,
        })
    }

    /// Leaf on a raw storage column.
    pub fn column(column: impl Into<String>, op: FilterOp, value: Value) -> Self {
        FilterNode::Leaf(Condition {
            comparison: Comparison::new(op),
            target: FilterTarget::Column(column.into()),
            value,
        })
    }

    /// Visit every leaf in depth-first, left-to-right order.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Condition)) {
        match self {
            FilterNode::Leaf(condition) => f(condition),
            FilterNode::And(children) | FilterNode::Or(children) => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
        }
    }
}

/// Parse client `where` input. `null` is an empty tree.
pub fn parse_where(input: &Value) -> Result<FilterTree, QueryError> {
    match input {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => parse_object(map),
        other => Err(QueryError::InvalidWhere(format!(
            "expected an object, got {}",
            type_name(other)
        ))),
    }
}

fn parse_object(map: &Map<String, Value>) -> Result<FilterTree, QueryError> {
    let mut tree = Vec::with_capacity(map.len());
    for (key, value) in map {
        match key.as_str() {
            "and" => {
                let mut children = Vec::new();
                for item in combinator_items(key, value)? {
                    children.extend(parse_where(item)?);
                }
                tree.push(FilterNode::And(children));
            }
            "or" => {
                let mut children = Vec::new();
                for item in combinator_items(key, value)? {
                    let mut nodes = parse_where(item)?;
                    if nodes.len() == 1 {
                        children.extend(nodes.pop());
                    } else {
                        children.push(FilterNode::And(nodes));
                    }
                }
                tree.push(FilterNode::Or(children));
            }
            _ => {
                let (field, comparison) = parse_key(key)?;
                tree.push(FilterNode::key(field, comparison, value.clone()));
            }
        }
    }
    Ok(tree)
}

fn combinator_items<'a>(key: &str, value: &'a Value) -> Result<&'a [Value], QueryError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(QueryError::InvalidWhere(format!(
            "`{key}` expects an array, got {}",
            type_name(other)
        ))),
    }
}

/// Split `"<field>_<op>"` / `"<field>_<op>_lower"` into its parts.
pub fn parse_key(key: &str) -> Result<(String, Comparison), QueryError> {
    let (rest, lowercase) = match key.strip_suffix(LOWERCASE_SUFFIX) {
        Some(rest) => (rest, true),
        None => (key, false),
    };
    let Some((field, operator)) = rest.rsplit_once('_') else {
        return Err(QueryError::MalformedKey(key.to_string()));
    };
    if field.is_empty() {
        return Err(QueryError::MalformedKey(key.to_string()));
    }
    let op = operator
        .parse::<FilterOp>()
        .map_err(|operator| QueryError::UnknownOperator {
            key: key.to_string(),
            operator,
        })?;
    let comparison = Comparison { op, lowercase };
    Ok((field.to_string(), comparison))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
