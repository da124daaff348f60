//! Kind-aware pass
//!
//! Runs once the pinned dataset has been loaded and its kind is known.
//! Checks every field key against that kind's field universe:
//! - LT/GT/EQ and MAX/MIN/AVG/SUM need numeric fields
//! - IS needs a textual field
//! - COLUMNS, GROUP and COUNT accept either

use uuid::Uuid;

use crate::schema::{FieldKey, FieldType, Kind};

use super::ast::{Column, FilterNode, Query};
use super::errors::{QueryError, QueryResult};
use super::parser::ParsedQuery;

/// Per-call context of a query that passed both validation passes.
///
/// Owned by one engine invocation and dropped with it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// Identifier used to correlate log lines of one invocation
    pub query_id: Uuid,
    pub dataset_id: String,
    pub kind: Kind,
    pub query: Query,
}

/// Validates parsed queries against a dataset kind
pub struct QueryValidator;

impl QueryValidator {
    /// Checks every key of `parsed` against `kind`.
    ///
    /// # Errors
    ///
    /// InvalidKey if a field is missing from the kind or has the wrong type.
    pub fn validate(query_id: Uuid, parsed: ParsedQuery, kind: Kind) -> QueryResult<QueryContext> {
        let query = &parsed.query;

        for column in &query.columns {
            if let Column::Field(key) = column {
                require(kind, key, None)?;
            }
        }

        Self::validate_filter(&query.filter, kind)?;

        if let Some(t) = &query.transformations {
            for key in &t.group {
                require(kind, key, None)?;
            }
            for rule in &t.apply {
                let expected = rule.token.requires_numeric().then_some(FieldType::Numeric);
                require(kind, &rule.key, expected)?;
            }
        }

        Ok(QueryContext {
            query_id,
            dataset_id: parsed.dataset_id,
            kind,
            query: parsed.query,
        })
    }

    fn validate_filter(node: &FilterNode, kind: Kind) -> QueryResult<()> {
        match node {
            FilterNode::Empty => Ok(()),
            FilterNode::Compare { key, .. } => require(kind, key, Some(FieldType::Numeric)),
            FilterNode::Match { key, .. } => require(kind, key, Some(FieldType::Textual)),
            FilterNode::Logic { children, .. } => children
                .iter()
                .try_for_each(|child| Self::validate_filter(child, kind)),
            FilterNode::Negate(child) => Self::validate_filter(child, kind),
        }
    }
}

fn require(kind: Kind, key: &FieldKey, expected: Option<FieldType>) -> QueryResult<()> {
    let actual = kind.field_type(&key.field).ok_or_else(|| {
        QueryError::invalid_key(key.to_string(), format!("not a field of {}", kind))
    })?;

    match expected {
        Some(expected) if expected != actual => Err(QueryError::invalid_key(
            key.to_string(),
            format!("expected a {} field of {}", expected.type_name(), kind),
        )),
        _ => Ok(()),
    }
}
