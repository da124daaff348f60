//! GROUP / APPLY transformation
//!
//! Groups the filtered rows by their GROUP values and emits one row per
//! group holding only the GROUP columns and the APPLY columns.
//!
//! Rules:
//! - Groups appear in first-seen order
//! - GROUP values are copied from the first row of each group
//! - SUM and AVG accumulate in decimal and round to 2 places
//! - COUNT counts distinct values, not rows

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value};

use crate::dataset::Row;
use crate::query::{ApplyRule, ApplyToken, Transformations};

use super::filters::RowSet;

/// Decimal places kept by SUM and AVG
pub const AGGREGATE_SCALE: u32 = 2;

/// Applies a TRANSFORMATIONS clause
pub struct Transformer<'a> {
    spec: &'a Transformations,
    group_columns: Vec<String>,
}

impl<'a> Transformer<'a> {
    pub fn new(spec: &'a Transformations) -> Self {
        Self {
            spec,
            group_columns: spec.group.iter().map(|k| k.as_column()).collect(),
        }
    }

    /// Groups `selected` rows and aggregates each group
    pub fn transform(&self, rows: &[Row], selected: &RowSet) -> Vec<Row> {
        self.group(rows, selected)
            .into_iter()
            .map(|members| self.summarize(rows, &members))
            .collect()
    }

    /// Partitions row indices by GROUP values, in first-seen order
    fn group(&self, rows: &[Row], selected: &RowSet) -> Vec<RowSet> {
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<RowSet> = Vec::new();

        for &i in selected {
            let key: Vec<String> = self
                .group_columns
                .iter()
                .map(|column| rows[i].get(column).map(value_identity).unwrap_or_default())
                .collect();

            match index.get(&key) {
                Some(&slot) => groups[slot].push(i),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![i]);
                }
            }
        }

        groups
    }

    fn summarize(&self, rows: &[Row], members: &[usize]) -> Row {
        let mut out = Row::new();

        if let Some(&first) = members.first() {
            for column in &self.group_columns {
                let value = rows[first].get(column).cloned().unwrap_or(Value::Null);
                out.insert(column.clone(), value);
            }
        }

        for rule in &self.spec.apply {
            out.insert(rule.name.clone(), aggregate(rule, rows, members));
        }

        out
    }
}

/// Computes one APPLY rule over a group
fn aggregate(rule: &ApplyRule, rows: &[Row], members: &[usize]) -> Value {
    let column = rule.key.as_column();
    let values = members.iter().filter_map(|&i| rows[i].get(&column));

    match rule.token {
        ApplyToken::Max => extremum(values, |candidate, best| candidate > best),
        ApplyToken::Min => extremum(values, |candidate, best| candidate < best),
        ApplyToken::Sum => numeric_decimals(values)
            .and_then(|decimals| decimal_sum(&decimals))
            .map(decimal_value)
            .unwrap_or(Value::Null),
        ApplyToken::Avg => numeric_decimals(values)
            .filter(|decimals| !decimals.is_empty())
            .and_then(|decimals| {
                decimal_sum(&decimals)?.checked_div(Decimal::from(decimals.len()))
            })
            .map(decimal_value)
            .unwrap_or(Value::Null),
        ApplyToken::Count => {
            let distinct: HashSet<String> = values
                .filter(|v| !v.is_null())
                .map(value_identity)
                .collect();
            Value::from(distinct.len())
        }
    }
}

/// Keeps the original value of the first extremum encountered
fn extremum<'v>(values: impl Iterator<Item = &'v Value>, better: fn(f64, f64) -> bool) -> Value {
    let mut best: Option<(f64, &Value)> = None;
    for value in values {
        let Some(n) = value.as_f64() else { continue };
        match best {
            Some((current, _)) if !better(n, current) => {}
            _ => best = Some((n, value)),
        }
    }
    best.map(|(_, v)| v.clone()).unwrap_or(Value::Null)
}

/// Decimals of the numeric values; `None` if any number has no decimal form
fn numeric_decimals<'v>(values: impl Iterator<Item = &'v Value>) -> Option<Vec<Decimal>> {
    values.filter(|v| v.is_number()).map(to_decimal).collect()
}

fn decimal_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(*d))
}

/// Converts a JSON number to a decimal through its shortest textual form
fn to_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(n) = value else {
        return None;
    };
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| n.as_f64().and_then(Decimal::from_f64))
}

/// Rounds to [`AGGREGATE_SCALE`] places; whole numbers become integers
fn decimal_value(d: Decimal) -> Value {
    let rounded = d.round_dp_with_strategy(AGGREGATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.fract().is_zero() {
        if let Some(i) = rounded.to_i64() {
            return Value::from(i);
        }
    }
    rounded
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Identity shared by GROUP and COUNT.
///
/// Numerically equal values collapse regardless of form (`2015` and
/// `2015.0`); a string never equals a number.
fn value_identity(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => "n:0".to_string(),
            Some(f) => format!("n:{}", f.to_bits()),
            None => format!("n:{}", n),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKey;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    fn spec(group: &[&str], apply: Vec<ApplyRule>) -> Transformations {
        Transformations {
            group: group.iter().map(|f| FieldKey::new("s", *f)).collect(),
            apply,
        }
    }

    fn rule(name: &str, token: ApplyToken, field: &str) -> ApplyRule {
        ApplyRule::new(name, token, FieldKey::new("s", field))
    }

    fn run(spec: &Transformations, data: &[Row]) -> Vec<Value> {
        let all: RowSet = (0..data.len()).collect();
        Transformer::new(spec)
            .transform(data, &all)
            .into_iter()
            .map(Value::Object)
            .collect()
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let data = rows(vec![
            json!({"s_dept": "math", "s_avg": 70}),
            json!({"s_dept": "cpsc", "s_avg": 80}),
            json!({"s_dept": "math", "s_avg": 60}),
        ]);
        let out = run(&spec(&["dept"], vec![]), &data);
        assert_eq!(out, vec![json!({"s_dept": "math"}), json!({"s_dept": "cpsc"})]);
    }

    #[test]
    fn test_drops_ungrouped_columns() {
        let data = rows(vec![json!({"s_dept": "cpsc", "s_title": "intro", "s_avg": 1})]);
        let out = run(&spec(&["dept"], vec![rule("m", ApplyToken::Max, "avg")]), &data);
        assert_eq!(out, vec![json!({"s_dept": "cpsc", "m": 1})]);
    }

    #[test]
    fn test_avg_rounds_to_two_places() {
        let data = rows(vec![
            json!({"s_dept": "cpsc", "s_avg": 90.1}),
            json!({"s_dept": "cpsc", "s_avg": 80.2}),
            json!({"s_dept": "cpsc", "s_avg": 70.3}),
        ]);
        let out = run(&spec(&["dept"], vec![rule("a", ApplyToken::Avg, "avg")]), &data);
        assert_eq!(out, vec![json!({"s_dept": "cpsc", "a": 80.2})]);
    }

    #[test]
    fn test_sum_avoids_float_drift() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_avg": 0.1}),
            json!({"s_dept": "x", "s_avg": 0.2}),
        ]);
        let out = run(&spec(&["dept"], vec![rule("t", ApplyToken::Sum, "avg")]), &data);
        assert_eq!(out[0]["t"], json!(0.3));
    }

    #[test]
    fn test_whole_aggregates_are_integers() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_avg": 80}),
            json!({"s_dept": "x", "s_avg": 90}),
        ]);
        let out = run(
            &spec(
                &["dept"],
                vec![rule("a", ApplyToken::Avg, "avg"), rule("t", ApplyToken::Sum, "avg")],
            ),
            &data,
        );
        assert_eq!(out, vec![json!({"s_dept": "x", "a": 85, "t": 170})]);
    }

    #[test]
    fn test_max_min_keep_original_values() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_avg": 72.5}),
            json!({"s_dept": "x", "s_avg": 91.25}),
            json!({"s_dept": "x", "s_avg": 60}),
        ]);
        let out = run(
            &spec(
                &["dept"],
                vec![rule("hi", ApplyToken::Max, "avg"), rule("lo", ApplyToken::Min, "avg")],
            ),
            &data,
        );
        assert_eq!(out[0]["hi"], json!(91.25));
        assert_eq!(out[0]["lo"], json!(60));
    }

    #[test]
    fn test_count_is_distinct() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_instructor": "a"}),
            json!({"s_dept": "x", "s_instructor": "b"}),
            json!({"s_dept": "x", "s_instructor": "a"}),
        ]);
        let out = run(
            &spec(&["dept"], vec![rule("n", ApplyToken::Count, "instructor")]),
            &data,
        );
        assert_eq!(out[0]["n"], json!(2));
    }

    #[test]
    fn test_count_collapses_numeric_forms() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_year": 2015}),
            json!({"s_dept": "x", "s_year": 2015.0}),
        ]);
        let out = run(&spec(&["dept"], vec![rule("n", ApplyToken::Count, "year")]), &data);
        assert_eq!(out[0]["n"], json!(1));
    }

    #[test]
    fn test_multi_key_groups_do_not_collide() {
        let data = rows(vec![
            json!({"s_dept": "a_b", "s_id": "c"}),
            json!({"s_dept": "a", "s_id": "b_c"}),
        ]);
        let out = run(&spec(&["dept", "id"], vec![]), &data);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_mixed_number_forms_share_a_group() {
        let data = rows(vec![
            json!({"s_year": 2015, "s_avg": 70}),
            json!({"s_year": 2015.0, "s_avg": 80}),
            json!({"s_year": "2015", "s_avg": 90}),
        ]);
        let out = run(&spec(&["year"], vec![rule("n", ApplyToken::Count, "avg")]), &data);
        assert_eq!(
            out,
            vec![
                json!({"s_year": 2015, "n": 2}),
                json!({"s_year": "2015", "n": 1}),
            ]
        );
    }

    #[test]
    fn test_out_of_range_number_nulls_sum_and_avg() {
        let data = rows(vec![
            json!({"s_dept": "x", "s_avg": 1e300}),
            json!({"s_dept": "x", "s_avg": 10}),
        ]);
        let out = run(
            &spec(
                &["dept"],
                vec![rule("t", ApplyToken::Sum, "avg"), rule("a", ApplyToken::Avg, "avg")],
            ),
            &data,
        );
        assert_eq!(out[0]["t"], Value::Null);
        assert_eq!(out[0]["a"], Value::Null);
    }
}
