//! Query Module
//!
//! Turns raw JSON query documents into checked queries.
//!
//! Validation is two-pass:
//! 1. `QueryParser`: kind-independent structure, key syntax, single dataset
//! 2. `QueryValidator`: field existence and type against the dataset's kind,
//!    producing the per-call `QueryContext`
//!
//! Principles:
//! - Reject early: no row is touched until both passes succeed
//! - Closed model: every accepted query is a `Query` value
//! - Deterministic: the same document always yields the same outcome

mod ast;
mod errors;
mod parser;
mod validator;

pub use ast::{
    ApplyRule, ApplyToken, Column, Comparator, Connective, Direction, FilterNode, OrderSpec,
    Pattern, Query, Transformations, WILDCARD,
};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use parser::{ParsedQuery, QueryParser};
pub use validator::{QueryContext, QueryValidator};
