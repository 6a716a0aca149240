use serde_json::Value;

use super::filter::FilterNode;
use super::types::SqlParameter;

/// Parameter slots for a filter tree.
///
/// Each distinct leaf value gets one `@pN` name; leaves carrying equal values
/// share a slot. Names are assigned in first-occurrence order starting at
/// `@p1`, so the same tree always yields the same parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<SqlParameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the tree (through every `and`/`or`) and assign leaf values.
    pub fn index_where(tree: &[FilterNode]) -> Self {
        let mut params = Self::new();
        for node in tree {
            node.for_each_leaf(&mut |condition| {
                params.slot(&condition.value);
            });
        }
        params
    }

    /// Name for `value`, allocating a new slot if it has not been seen.
    pub fn slot(&mut self, value: &Value) -> &str {
        let position = match self.entries.iter().position(|p| p.value == *value) {
            Some(position) => position,
            None => {
                let name = format!("@p{}", self.entries.len() + 1);
                self.entries.push(SqlParameter {
                    name,
                    value: value.clone(),
                });
                self.entries.len() - 1
            }
        };
        &self.entries[position].name
    }

    pub fn name_of(&self, value: &Value) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.value == *value)
            .map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[SqlParameter] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<SqlParameter> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::parse_where;
    use serde_json::json;

    #[test]
    fn test_shared_value_shares_slot() {
        let tree = parse_where(&json!({
            "name_eq": "Alice",
            "or": [{"nickname_eq": "Alice"}, {"alias_eq": "Alice"}],
        }))
        .unwrap();
        let params = Parameters::index_where(&tree);
        assert_eq!(params.len(), 1);
        assert_eq!(params.name_of(&json!("Alice")), Some("@p1"));
    }

    #[test]
    fn test_distinct_values_get_distinct_slots() {
        let tree = parse_where(&json!({
            "a_eq": "x",
            "b_eq": "y",
            "c_in": ["x", "y"],
        }))
        .unwrap();
        let params = Parameters::index_where(&tree);
        assert_eq!(params.len(), 3);
        assert_eq!(params.name_of(&json!("x")), Some("@p1"));
        assert_eq!(params.name_of(&json!("y")), Some("@p2"));
        assert_eq!(params.name_of(&json!(["x", "y"])), Some("@p3"));
    }

    #[test]
    fn test_deeply_equal_objects_share_slot() {
        let tree = parse_where(&json!({
            "a_eq": {"k": [1, 2]},
            "b_eq": {"k": [1, 2]},
            "c_eq": {"k": [2, 1]},
        }))
        .unwrap();
        let params = Parameters::index_where(&tree);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_number_and_string_are_different() {
        let mut params = Parameters::new();
        assert_eq!(params.slot(&json!(1)), "@p1");
        assert_eq!(params.slot(&json!("1")), "@p2");
        assert_eq!(params.slot(&json!(1)), "@p1");
        assert_eq!(params.into_vec().len(), 2);
    }
}
