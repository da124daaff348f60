//! Query document model
//!
//! The closed representation a raw JSON query is parsed into. Every
//! variant here is structurally valid; kind-dependent checks (does the
//! field exist, is it numeric) happen in the validator.

use std::fmt;

use crate::schema::FieldKey;

use super::errors::{QueryError, QueryResult};

/// Wildcard character in IS patterns
pub const WILDCARD: char = '*';

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Gt,
    Eq,
}

impl Comparator {
    /// Parses a filter operator name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LT" => Some(Comparator::Lt),
            "GT" => Some(Comparator::Gt),
            "EQ" => Some(Comparator::Eq),
            _ => None,
        }
    }

    /// Returns the operator name
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "LT",
            Comparator::Gt => "GT",
            Comparator::Eq => "EQ",
        }
    }

    /// Applies the operator as `actual <op> bound`
    pub fn holds(&self, actual: f64, bound: f64) -> bool {
        match self {
            Comparator::Lt => actual < bound,
            Comparator::Gt => actual > bound,
            Comparator::Eq => actual == bound,
        }
    }
}

/// Boolean connective over a list of filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Parses a filter operator name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AND" => Some(Connective::And),
            "OR" => Some(Connective::Or),
            _ => None,
        }
    }

    /// Returns the operator name
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// Parsed IS pattern.
///
/// Asterisks may appear only at the very start and/or very end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `abc`
    Exact(String),
    /// `abc*`
    Prefix(String),
    /// `*abc`
    Suffix(String),
    /// `*abc*`
    Contains(String),
}

impl Pattern {
    /// Parses a raw IS value
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let parts: Vec<&str> = raw.split(WILDCARD).collect();
        match parts.as_slice() {
            [exact] => Ok(Pattern::Exact(exact.to_string())),
            ["", suffix] => Ok(Pattern::Suffix(suffix.to_string())),
            [prefix, ""] => Ok(Pattern::Prefix(prefix.to_string())),
            ["", middle, ""] => Ok(Pattern::Contains(middle.to_string())),
            _ => Err(QueryError::invalid_filter_syntax(raw)),
        }
    }

    /// Tests a field value against the pattern
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Exact(s) => value == s,
            Pattern::Prefix(s) => value.starts_with(s.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
            Pattern::Contains(s) => value.contains(s.as_str()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{}", s),
            Pattern::Prefix(s) => write!(f, "{}{}", s, WILDCARD),
            Pattern::Suffix(s) => write!(f, "{}{}", WILDCARD, s),
            Pattern::Contains(s) => write!(f, "{}{}{}", WILDCARD, s, WILDCARD),
        }
    }
}

/// Boolean filter tree (the WHERE clause)
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// `{}`: matches every row
    Empty,
    /// `{"LT"|"GT"|"EQ": {key: number}}`
    Compare {
        op: Comparator,
        key: FieldKey,
        value: f64,
    },
    /// `{"IS": {key: pattern}}`
    Match { key: FieldKey, pattern: Pattern },
    /// `{"AND"|"OR": [filter, ...]}`, at least one child
    Logic {
        op: Connective,
        children: Vec<FilterNode>,
    },
    /// `{"NOT": filter}`
    Negate(Box<FilterNode>),
}

impl FilterNode {
    /// Create a comparison node
    pub fn compare(op: Comparator, key: FieldKey, value: f64) -> Self {
        FilterNode::Compare { op, key, value }
    }

    /// Create an IS node from a raw pattern
    pub fn is(key: FieldKey, pattern: &str) -> QueryResult<Self> {
        Ok(FilterNode::Match {
            key,
            pattern: Pattern::parse(pattern)?,
        })
    }

    /// Create an AND node
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Logic {
            op: Connective::And,
            children,
        }
    }

    /// Create an OR node
    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Logic {
            op: Connective::Or,
            children,
        }
    }

    /// Create a NOT node
    pub fn not(child: FilterNode) -> Self {
        FilterNode::Negate(Box::new(child))
    }

    /// Collects every field key in the tree, depth-first, left to right
    pub fn field_keys<'a>(&'a self, out: &mut Vec<&'a FieldKey>) {
        match self {
            FilterNode::Empty => {}
            FilterNode::Compare { key, .. } | FilterNode::Match { key, .. } => out.push(key),
            FilterNode::Logic { children, .. } => {
                for child in children {
                    child.field_keys(out);
                }
            }
            FilterNode::Negate(child) => child.field_keys(out),
        }
    }
}

/// One COLUMNS entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// A raw dataset field
    Field(FieldKey),
    /// An APPLY-produced column
    Apply(String),
}

impl Column {
    /// Key under which the column appears in result rows
    pub fn name(&self) -> String {
        match self {
            Column::Field(key) => key.as_column(),
            Column::Apply(name) => name.clone(),
        }
    }
}

/// Sort direction of an object-form ORDER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Parses `UP` / `DOWN`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

/// ORDER clause; keys are COLUMNS names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Bare key, ascending
    Key(String),
    /// `{dir, keys}`, direction shared by every key
    Keys { dir: Direction, keys: Vec<String> },
}

impl OrderSpec {
    /// Create an ascending single-key order
    pub fn key(name: impl Into<String>) -> Self {
        OrderSpec::Key(name.into())
    }

    /// Create a multi-key order
    pub fn keys(dir: Direction, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        OrderSpec::Keys {
            dir,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Sort keys in priority order
    pub fn sort_keys(&self) -> &[String] {
        match self {
            OrderSpec::Key(key) => std::slice::from_ref(key),
            OrderSpec::Keys { keys, .. } => keys,
        }
    }

    /// Effective direction
    pub fn direction(&self) -> Direction {
        match self {
            OrderSpec::Key(_) => Direction::Up,
            OrderSpec::Keys { dir, .. } => *dir,
        }
    }
}

/// Aggregation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    /// Parses a token name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Sum => "SUM",
            ApplyToken::Count => "COUNT",
        }
    }

    /// COUNT accepts any field; the rest need a numeric one
    pub fn requires_numeric(&self) -> bool {
        !matches!(self, ApplyToken::Count)
    }
}

/// `{name: {TOKEN: key}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub key: FieldKey,
}

impl ApplyRule {
    pub fn new(name: impl Into<String>, token: ApplyToken, key: FieldKey) -> Self {
        Self {
            name: name.into(),
            token,
            key,
        }
    }
}

/// TRANSFORMATIONS clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformations {
    /// Non-empty list of grouping keys
    pub group: Vec<FieldKey>,
    /// Aggregations, possibly empty
    pub apply: Vec<ApplyRule>,
}

/// A structurally valid query, not yet checked against a dataset kind
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: FilterNode,
    pub columns: Vec<Column>,
    pub order: Option<OrderSpec>,
    pub transformations: Option<Transformations>,
}
