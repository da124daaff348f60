//! Filter evaluation over a dataset
//!
//! Rows are identified by their index in the dataset, so two rows with
//! identical field values stay distinct through OR and NOT.
//!
//! Semantics:
//! - AND narrows sequentially: each child sees the previous child's output
//! - OR runs every child on the incoming set and unions by first appearance
//! - NOT keeps the incoming rows the child rejects, in incoming order
//! - A missing or wrongly-typed field never matches

use std::collections::HashSet;

use serde_json::Value;

use crate::dataset::Row;
use crate::query::{Connective, FilterNode};

/// Ordered set of row indices into a dataset
pub type RowSet = Vec<usize>;

/// Evaluates filter trees against rows
pub struct FilterEvaluator<'a> {
    rows: &'a [Row],
}

impl<'a> FilterEvaluator<'a> {
    /// Creates an evaluator over `rows`
    pub fn new(rows: &'a [Row]) -> Self {
        Self { rows }
    }

    /// Every row index, in dataset order
    pub fn all(&self) -> RowSet {
        (0..self.rows.len()).collect()
    }

    /// Applies `filter` to the whole dataset
    pub fn filter(&self, filter: &FilterNode) -> RowSet {
        self.evaluate(filter, self.all())
    }

    /// Applies `filter` to `input`, preserving input order
    pub fn evaluate(&self, filter: &FilterNode, input: RowSet) -> RowSet {
        match filter {
            FilterNode::Empty => input,
            FilterNode::Compare { .. } | FilterNode::Match { .. } => input
                .into_iter()
                .filter(|&i| Self::matches_leaf(&self.rows[i], filter))
                .collect(),
            FilterNode::Logic {
                op: Connective::And,
                children,
            } => children
                .iter()
                .fold(input, |acc, child| self.evaluate(child, acc)),
            FilterNode::Logic {
                op: Connective::Or,
                children,
            } => {
                let mut seen = HashSet::new();
                let mut out = RowSet::new();
                for child in children {
                    for i in self.evaluate(child, input.clone()) {
                        if seen.insert(i) {
                            out.push(i);
                        }
                    }
                }
                out
            }
            FilterNode::Negate(child) => {
                let rejected: HashSet<usize> =
                    self.evaluate(child, input.clone()).into_iter().collect();
                input.into_iter().filter(|i| !rejected.contains(i)).collect()
            }
        }
    }

    fn matches_leaf(row: &Row, leaf: &FilterNode) -> bool {
        match leaf {
            FilterNode::Compare { op, key, value } => match row.get(&key.as_column()) {
                Some(Value::Number(n)) => n.as_f64().is_some_and(|actual| op.holds(actual, *value)),
                _ => false,
            },
            FilterNode::Match { key, pattern } => match row.get(&key.as_column()) {
                Some(Value::String(s)) => pattern.matches(s),
                _ => false,
            },
            _ => false,
        }
    }
}
