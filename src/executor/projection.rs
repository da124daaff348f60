//! COLUMNS projection

use crate::dataset::Row;

/// Keeps only `columns`, in COLUMNS order. Absent columns are omitted.
pub fn project(rows: Vec<Row>, columns: &[String]) -> Vec<Row> {
    rows.into_iter()
        .map(|mut row| {
            let mut out = Row::new();
            for column in columns {
                if let Some(value) = row.remove(column) {
                    out.insert(column.clone(), value);
                }
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_projection_follows_column_order() {
        let row = json!({"s_avg": 90, "s_dept": "cpsc", "s_title": "intro"})
            .as_object()
            .cloned()
            .unwrap();
        let out = project(vec![row], &["s_dept".to_string(), "s_avg".to_string()]);

        let keys: Vec<&String> = out[0].keys().collect();
        assert_eq!(keys, vec!["s_dept", "s_avg"]);
        assert_eq!(Value::Object(out[0].clone()), json!({"s_dept": "cpsc", "s_avg": 90}));
    }

    #[test]
    fn test_missing_column_omitted() {
        let row = json!({"s_dept": "cpsc"}).as_object().cloned().unwrap();
        let out = project(vec![row], &["s_dept".to_string(), "s_avg".to_string()]);
        assert_eq!(out[0].len(), 1);
    }
}
