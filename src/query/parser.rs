//! Structural pass over a raw query document
//!
//! Turns the JSON document into the closed `Query` model and pins the
//! single dataset the query may reference. Nothing here depends on the
//! dataset's kind, so this pass runs before the dataset is loaded.
//!
//! Check order:
//! 1. Top-level keys are exactly {WHERE, OPTIONS} or {WHERE, OPTIONS, TRANSFORMATIONS}
//! 2. WHERE is an object with at most one operator
//! 3. OPTIONS is an object holding COLUMNS and optionally ORDER
//! 4. COLUMNS entries are field keys or (with TRANSFORMATIONS) apply names
//! 5. ORDER keys are COLUMNS entries
//! 6. TRANSFORMATIONS is {GROUP, APPLY}; COLUMNS are covered by GROUP or APPLY
//! 7. Every field key shares one dataset id

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::schema::{FieldKey, Kind};

use super::ast::{
    ApplyRule, ApplyToken, Column, Comparator, Connective, Direction, FilterNode, OrderSpec,
    Pattern, Query, Transformations,
};
use super::errors::{QueryError, QueryResult};

pub const WHERE: &str = "WHERE";
pub const OPTIONS: &str = "OPTIONS";
pub const TRANSFORMATIONS: &str = "TRANSFORMATIONS";
pub const COLUMNS: &str = "COLUMNS";
pub const ORDER: &str = "ORDER";
pub const GROUP: &str = "GROUP";
pub const APPLY: &str = "APPLY";

/// Output of the structural pass
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// The one dataset every field key refers to
    pub dataset_id: String,
    /// Structurally valid query
    pub query: Query,
}

/// Parses raw query documents
pub struct QueryParser;

impl QueryParser {
    /// Parses and structurally validates a query document.
    ///
    /// # Errors
    ///
    /// - MalformedQuery on grammar violations
    /// - InvalidKey on ill-formed or unknown keys
    /// - InvalidFilterSyntax on bad IS wildcards
    /// - CrossDatasetReference if field keys name different datasets
    pub fn parse(document: &Value) -> QueryResult<ParsedQuery> {
        let root = document
            .as_object()
            .ok_or_else(|| QueryError::malformed("Query must be an object"))?;

        for key in root.keys() {
            if key != WHERE && key != OPTIONS && key != TRANSFORMATIONS {
                return Err(QueryError::malformed(format!(
                    "Unexpected top-level key '{}'",
                    key
                )));
            }
        }

        let where_clause = root
            .get(WHERE)
            .ok_or_else(|| QueryError::malformed("Missing WHERE"))?;
        let options = root
            .get(OPTIONS)
            .ok_or_else(|| QueryError::malformed("Missing OPTIONS"))?;
        let has_transformations = root.contains_key(TRANSFORMATIONS);

        let filter = Self::parse_where(where_clause)?;

        let options = as_object(options, OPTIONS)?;
        for key in options.keys() {
            if key != COLUMNS && key != ORDER {
                return Err(QueryError::malformed(format!(
                    "Unexpected key '{}' in OPTIONS",
                    key
                )));
            }
        }
        let columns = options
            .get(COLUMNS)
            .ok_or_else(|| QueryError::malformed("Missing COLUMNS in OPTIONS"))?;
        let columns = Self::parse_columns(columns, has_transformations)?;

        let order = match options.get(ORDER) {
            Some(order) => Some(Self::parse_order(order, &columns)?),
            None => None,
        };

        let transformations = match root.get(TRANSFORMATIONS) {
            Some(t) => Some(Self::parse_transformations(t, &columns)?),
            None => None,
        };

        let query = Query {
            filter,
            columns,
            order,
            transformations,
        };
        let dataset_id = Self::resolve_dataset(&query)?;

        Ok(ParsedQuery { dataset_id, query })
    }

    fn parse_where(value: &Value) -> QueryResult<FilterNode> {
        let clause = as_object(value, WHERE)?;
        if clause.len() > 1 {
            return Err(QueryError::malformed("WHERE must hold at most one filter"));
        }
        Self::parse_filter(value, true)
    }

    /// Parses one filter node. Only the top-level WHERE may be `{}`.
    fn parse_filter(value: &Value, top_level: bool) -> QueryResult<FilterNode> {
        let node = as_object(value, "filter")?;

        let (op, body) = match single_entry(node) {
            Some(entry) => entry,
            None if node.is_empty() && top_level => return Ok(FilterNode::Empty),
            None if node.is_empty() => {
                return Err(QueryError::malformed("Nested filter must not be empty"))
            }
            None => return Err(QueryError::malformed("Filter must hold exactly one operator")),
        };

        if let Some(comparator) = Comparator::from_name(op) {
            let (raw_key, literal) = single_pair(body, op)?;
            let key = parse_field_key(raw_key)?;
            let value = match literal {
                Value::Number(n) => n.as_f64().ok_or_else(|| {
                    QueryError::malformed(format!("Value in {} is out of range", op))
                })?,
                _ => {
                    return Err(QueryError::malformed(format!(
                        "Expect value in {} to be a number",
                        op
                    )))
                }
            };
            return Ok(FilterNode::compare(comparator, key, value));
        }

        if let Some(connective) = Connective::from_name(op) {
            let children = body.as_array().ok_or_else(|| {
                QueryError::malformed(format!("Expect {} to be an array of filters", op))
            })?;
            if children.is_empty() {
                return Err(QueryError::malformed(format!(
                    "Expect at least one filter in {}",
                    op
                )));
            }
            let children = children
                .iter()
                .map(|child| Self::parse_filter(child, false))
                .collect::<QueryResult<Vec<_>>>()?;
            return Ok(FilterNode::Logic {
                op: connective,
                children,
            });
        }

        match op.as_str() {
            "IS" => {
                let (raw_key, literal) = single_pair(body, op)?;
                let key = parse_field_key(raw_key)?;
                let raw = literal.as_str().ok_or_else(|| {
                    QueryError::malformed("Expect value in IS to be a string")
                })?;
                Ok(FilterNode::Match {
                    key,
                    pattern: Pattern::parse(raw)?,
                })
            }
            "NOT" => Ok(FilterNode::not(Self::parse_filter(body, false)?)),
            other => Err(QueryError::malformed(format!(
                "Invalid filter operator '{}'",
                other
            ))),
        }
    }

    fn parse_columns(value: &Value, has_transformations: bool) -> QueryResult<Vec<Column>> {
        let entries = value
            .as_array()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| QueryError::malformed("COLUMNS must be a non-empty array"))?;

        entries
            .iter()
            .map(|entry| {
                let raw = entry
                    .as_str()
                    .ok_or_else(|| QueryError::malformed("COLUMNS must be an array of strings"))?;
                if FieldKey::looks_like_key(raw) {
                    return parse_field_key(raw).map(Column::Field);
                }
                if !has_transformations {
                    return Err(QueryError::invalid_key(
                        raw,
                        "apply keys require TRANSFORMATIONS",
                    ));
                }
                validate_apply_name(raw)?;
                Ok(Column::Apply(raw.to_string()))
            })
            .collect()
    }

    fn parse_order(value: &Value, columns: &[Column]) -> QueryResult<OrderSpec> {
        let names: Vec<String> = columns.iter().map(Column::name).collect();
        let check = |key: &str| -> QueryResult<()> {
            if names.iter().any(|n| n == key) {
                Ok(())
            } else {
                Err(QueryError::malformed(format!(
                    "ORDER key '{}' must be in COLUMNS",
                    key
                )))
            }
        };

        match value {
            Value::String(key) => {
                check(key)?;
                Ok(OrderSpec::Key(key.clone()))
            }
            Value::Object(spec) => {
                for key in spec.keys() {
                    if key != "dir" && key != "keys" {
                        return Err(QueryError::malformed(format!(
                            "Unexpected key '{}' in ORDER",
                            key
                        )));
                    }
                }
                let dir = spec
                    .get("dir")
                    .ok_or_else(|| QueryError::malformed("ORDER missing 'dir'"))?;
                let dir = dir
                    .as_str()
                    .and_then(Direction::from_name)
                    .ok_or_else(|| QueryError::malformed("ORDER dir must be UP or DOWN"))?;

                let keys = spec
                    .get("keys")
                    .ok_or_else(|| QueryError::malformed("ORDER missing 'keys'"))?
                    .as_array()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| QueryError::malformed("ORDER keys must be a non-empty array"))?;

                let keys = keys
                    .iter()
                    .map(|k| {
                        let k = k
                            .as_str()
                            .ok_or_else(|| QueryError::malformed("ORDER keys must be strings"))?;
                        check(k)?;
                        Ok(k.to_string())
                    })
                    .collect::<QueryResult<Vec<_>>>()?;

                Ok(OrderSpec::Keys { dir, keys })
            }
            _ => Err(QueryError::malformed("ORDER must be a string or an object")),
        }
    }

    fn parse_transformations(value: &Value, columns: &[Column]) -> QueryResult<Transformations> {
        let clause = as_object(value, TRANSFORMATIONS)?;
        for key in clause.keys() {
            if key != GROUP && key != APPLY {
                return Err(QueryError::malformed(format!(
                    "Unexpected key '{}' in TRANSFORMATIONS",
                    key
                )));
            }
        }

        let group = clause
            .get(GROUP)
            .ok_or_else(|| QueryError::malformed("TRANSFORMATIONS missing GROUP"))?
            .as_array()
            .filter(|g| !g.is_empty())
            .ok_or_else(|| QueryError::malformed("GROUP must be a non-empty array"))?
            .iter()
            .map(|entry| {
                let raw = entry
                    .as_str()
                    .ok_or_else(|| QueryError::malformed("GROUP must be an array of strings"))?;
                parse_field_key(raw)
            })
            .collect::<QueryResult<Vec<_>>>()?;

        let rules = clause
            .get(APPLY)
            .ok_or_else(|| QueryError::malformed("TRANSFORMATIONS missing APPLY"))?
            .as_array()
            .ok_or_else(|| QueryError::malformed("APPLY must be an array"))?;

        let mut apply = Vec::with_capacity(rules.len());
        let mut names = HashSet::new();
        for rule in rules {
            let rule = Self::parse_apply_rule(rule)?;
            if !names.insert(rule.name.clone()) {
                return Err(QueryError::malformed(format!(
                    "Duplicate APPLY key '{}'",
                    rule.name
                )));
            }
            apply.push(rule);
        }

        for column in columns {
            match column {
                Column::Field(key) if !group.contains(key) => {
                    return Err(QueryError::malformed(format!(
                        "COLUMNS key '{}' must be in GROUP when TRANSFORMATIONS is present",
                        key
                    )));
                }
                Column::Apply(name) if !names.contains(name) => {
                    return Err(QueryError::invalid_key(name, "not declared in APPLY"));
                }
                _ => {}
            }
        }

        Ok(Transformations { group, apply })
    }

    fn parse_apply_rule(value: &Value) -> QueryResult<ApplyRule> {
        let rule = as_object(value, "APPLY rule")?;
        let (name, body) = single_entry(rule)
            .ok_or_else(|| QueryError::malformed("APPLY rule must hold exactly one key"))?;
        validate_apply_name(name)?;

        let body = as_object(body, "APPLY body")?;
        let (token, target) = single_entry(body)
            .ok_or_else(|| QueryError::malformed("APPLY body must hold exactly one token"))?;
        let token = ApplyToken::from_name(token).ok_or_else(|| {
            QueryError::malformed(format!("Invalid APPLY token '{}'", token))
        })?;
        let target = target
            .as_str()
            .ok_or_else(|| QueryError::malformed("APPLY target must be a string"))?;

        Ok(ApplyRule::new(name.clone(), token, parse_field_key(target)?))
    }

    /// Pins the dataset id: the first field key in COLUMNS, then WHERE,
    /// GROUP and APPLY, in that order. All others must agree.
    fn resolve_dataset(query: &Query) -> QueryResult<String> {
        let mut keys: Vec<&FieldKey> = query
            .columns
            .iter()
            .filter_map(|c| match c {
                Column::Field(key) => Some(key),
                Column::Apply(_) => None,
            })
            .collect();
        query.filter.field_keys(&mut keys);
        if let Some(t) = &query.transformations {
            keys.extend(t.group.iter());
            keys.extend(t.apply.iter().map(|r| &r.key));
        }

        let pinned = keys
            .first()
            .map(|k| k.dataset.clone())
            .ok_or_else(|| QueryError::malformed("Query does not reference any dataset"))?;

        if let Some(foreign) = keys.iter().find(|k| k.dataset != pinned) {
            return Err(QueryError::cross_dataset(&pinned, &foreign.dataset));
        }

        Ok(pinned)
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> QueryResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| QueryError::malformed(format!("{} must be an object", what)))
}

fn single_entry(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    if map.len() == 1 {
        map.iter().next()
    } else {
        None
    }
}

/// `{key: literal}` body of a comparison or IS node
fn single_pair<'a>(body: &'a Value, op: &str) -> QueryResult<(&'a String, &'a Value)> {
    let body = as_object(body, op)?;
    single_entry(body)
        .ok_or_else(|| QueryError::malformed(format!("{} must hold exactly one key", op)))
}

/// Syntax plus membership in some kind's field universe
fn parse_field_key(raw: &str) -> QueryResult<FieldKey> {
    let key = FieldKey::parse(raw)
        .ok_or_else(|| QueryError::invalid_key(raw, "expected <dataset>_<field>"))?;
    if !Kind::is_known_anywhere(&key.field) {
        return Err(QueryError::invalid_key(raw, "unknown field"));
    }
    Ok(key)
}

fn validate_apply_name(name: &str) -> QueryResult<()> {
    if name.is_empty() {
        return Err(QueryError::invalid_key(name, "apply key must not be empty"));
    }
    if FieldKey::looks_like_key(name) {
        return Err(QueryError::invalid_key(name, "apply key must not contain '_'"));
    }
    Ok(())
}
