//! Sort order, the three-state sort toggle, and in-memory sorting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_source::compare_field;
use crate::value::Value;

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    /// Parse `"ASC"` or `"DESC"`, ignoring case.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "ASC" => Some(SortOrder::Ascending),
            "DESC" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which field is sorted, and how.
///
/// Clicking the same column cycles unsorted, ascending, descending, and back
/// to unsorted. Clicking a different column always starts ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    column: Option<String>,
    order: Option<SortOrder>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sorted field, if any.
    pub fn sorted_column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn order(&self) -> Option<SortOrder> {
        self.order
    }

    pub fn is_sorted(&self) -> bool {
        self.order.is_some()
    }

    /// The order shown for `field`: `Some` only for the sorted field.
    pub fn order_for(&self, field: &str) -> Option<SortOrder> {
        match &self.column {
            Some(column) if column == field => self.order,
            _ => None,
        }
    }

    /// Advance the toggle for a click on `field` and return the new order.
    pub fn toggle(&mut self, field: &str) -> Option<SortOrder> {
        let next = match self.order_for(field) {
            None => Some(SortOrder::Ascending),
            Some(SortOrder::Ascending) => Some(SortOrder::Descending),
            Some(SortOrder::Descending) => None,
        };
        self.set(field, next);
        next
    }

    /// Set the state directly. `None` clears it.
    pub fn set(&mut self, field: &str, order: Option<SortOrder>) {
        match order {
            Some(order) => {
                self.column = Some(field.to_string());
                self.order = Some(order);
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.column = None;
        self.order = None;
    }
}

/// The stable permutation that sorts `values`.
///
/// Entry `i` of the result is the index of the value that belongs at
/// position `i`. Nulls sort below everything; equal values keep their
/// relative order in both directions.
pub fn sort_permutation(values: &[Value], order: SortOrder, case_sensitive: bool) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..values.len()).collect();
    permutation.sort_by(|&a, &b| compare_field(&values[a], &values[b], order, case_sensitive));
    permutation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycle() {
        let mut state = SortState::new();
        assert_eq!(state.toggle("name"), Some(SortOrder::Ascending));
        assert_eq!(state.toggle("name"), Some(SortOrder::Descending));
        assert_eq!(state.toggle("name"), None);
        assert!(!state.is_sorted());
        assert_eq!(state.sorted_column(), None);
        assert_eq!(state.toggle("name"), Some(SortOrder::Ascending));
    }

    #[test]
    fn test_other_column_starts_ascending() {
        let mut state = SortState::new();
        state.toggle("name");
        state.toggle("name");
        assert_eq!(state.toggle("age"), Some(SortOrder::Ascending));
        assert_eq!(state.order_for("name"), None);
        assert_eq!(state.order_for("age"), Some(SortOrder::Ascending));
    }

    #[test]
    fn test_permutation_case_insensitive() {
        let values: Vec<Value> = vec!["banana".into(), "Apple".into(), "cherry".into()];
        let perm = sort_permutation(&values, SortOrder::Ascending, false);
        assert_eq!(perm, vec![1, 0, 2]);

        let perm = sort_permutation(&values, SortOrder::Ascending, true);
        assert_eq!(perm, vec![1, 0, 2]);

        let values: Vec<Value> = vec!["b".into(), "B".into(), "a".into()];
        assert_eq!(sort_permutation(&values, SortOrder::Ascending, true), vec![1, 2, 0]);
    }

    #[test]
    fn test_permutation_nulls_and_stability() {
        let values = vec![Value::Int(2), Value::Null, Value::Int(1), Value::Int(2)];
        assert_eq!(sort_permutation(&values, SortOrder::Ascending, false), vec![1, 2, 0, 3]);
        assert_eq!(sort_permutation(&values, SortOrder::Descending, false), vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Descending));
        assert_eq!(SortOrder::parse(""), None);
        assert_eq!(SortOrder::Ascending.to_string(), "ASC");
    }
}
