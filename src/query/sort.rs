use std::fmt;

use serde_json::Value;

use super::errors::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// One sort key. Order in a list is significant: the first entry is the
/// primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parse client `sort` input of the shape `{ "<field>_ASC": priority, ... }`.
///
/// Entries are ordered by ascending priority; equal priorities fall back to
/// key order so the result is deterministic.
pub fn parse_sort(input: &Value) -> Result<Vec<SortSpec>, QueryError> {
    let map = match input {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        _ => {
            return Err(QueryError::InvalidSort(
                "expected an object of `<field>_<ASC|DESC>: priority`".into(),
            ))
        }
    };

    let mut keyed = Vec::with_capacity(map.len());
    for (key, priority) in map {
        let priority = priority.as_f64().ok_or_else(|| {
            QueryError::InvalidSort(format!("priority for `{key}` must be a number"))
        })?;
        keyed.push((priority, key.as_str(), parse_sort_key(key)?));
    }
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    Ok(keyed.into_iter().map(|(_, _, spec)| spec).collect())
}

fn parse_sort_key(key: &str) -> Result<SortSpec, QueryError> {
    let (field, direction) = if let Some(field) = key.strip_suffix("_ASC") {
        (field, SortDirection::Asc)
    } else if let Some(field) = key.strip_suffix("_DESC") {
        (field, SortDirection::Desc)
    } else {
        return Err(QueryError::MalformedSortKey(key.to_string()));
    };
    if field.is_empty() {
        return Err(QueryError::MalformedSortKey(key.to_string()));
    }
    Ok(SortSpec {
        field: field.to_string(),
        direction,
    })
}
