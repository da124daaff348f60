//! Query engine
//!
//! Runs one query document end to end, in strict order:
//! 1. Structural parse; pin the dataset id
//! 2. Load the dataset from the store
//! 3. Kind-aware validation into a per-call `QueryContext`
//! 4. Evaluate WHERE
//! 5. Apply TRANSFORMATIONS (if present)
//! 6. Enforce the result cap
//! 7. Project COLUMNS
//! 8. Apply ORDER (if present)
//!
//! Any failure aborts the whole query; no partial result is returned.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::dataset::{Dataset, DatasetStore, Row};
use crate::observability::{
    log_event_with_fields, Event, MetricsRegistry, ObservationScope, Timer,
};
use crate::query::{QueryContext, QueryError, QueryParser, QueryResult, QueryValidator};

use super::filters::FilterEvaluator;
use super::projection::project;
use super::sorter::ResultSorter;
use super::transformer::Transformer;

/// Largest number of rows a query may produce
pub const MAX_RESULT_ROWS: usize = 5000;

/// Executes queries against a dataset store.
///
/// Holds no query state: every call builds its own `QueryContext`, so
/// one engine may serve concurrent callers.
pub struct QueryEngine<'a, S: DatasetStore> {
    store: &'a S,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, S: DatasetStore> QueryEngine<'a, S> {
    /// Creates an engine over `store`
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attaches a metrics registry updated by every call
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Executes a query given as JSON text.
    ///
    /// Text that is not JSON is a malformed query.
    pub fn execute_json(&self, text: &str) -> QueryResult<Vec<Row>> {
        self.observe(|query_id| {
            let document: Value = serde_json::from_str(text).map_err(|e| {
                QueryError::malformed(format!("Query is not valid JSON: {}", e))
            })?;
            self.run(query_id, &document)
        })
    }

    /// Executes a query document and returns the projected, ordered rows.
    ///
    /// This method is deterministic: same document + same data = same rows.
    pub fn execute(&self, document: &Value) -> QueryResult<Vec<Row>> {
        self.observe(|query_id| self.run(query_id, document))
    }

    /// Runs `body` inside the QUERY scope under a fresh query id
    fn observe<F>(&self, body: F) -> QueryResult<Vec<Row>>
    where
        F: FnOnce(Uuid) -> QueryResult<(String, Vec<Row>)>,
    {
        let query_id = Uuid::new_v4();
        let query_id_text = query_id.to_string();
        let timer = Timer::new();
        let scope =
            ObservationScope::with_fields("QUERY", &[("query_id", query_id_text.as_str())]);

        match body(query_id) {
            Ok((dataset_id, rows)) => {
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_executed();
                    metrics.add_rows_returned(rows.len() as u64);
                }
                let row_count = rows.len().to_string();
                let elapsed_ms = timer.elapsed_ms();
                scope.complete_with_fields(&[
                    ("dataset", dataset_id.as_str()),
                    ("rows", row_count.as_str()),
                    ("elapsed_ms", elapsed_ms.as_str()),
                ]);
                Ok(rows)
            }
            Err(err) => {
                if let Some(metrics) = self.metrics {
                    metrics.increment_queries_rejected();
                }
                scope.fail_with_fields(&[("code", err.code().code()), ("reason", err.message())]);
                Err(err)
            }
        }
    }

    fn run(&self, query_id: Uuid, document: &Value) -> QueryResult<(String, Vec<Row>)> {
        let parsed = QueryParser::parse(document)?;
        let dataset = self.load(&parsed.dataset_id)?;
        let context = QueryValidator::validate(query_id, parsed, dataset.kind)?;

        let query_id_text = context.query_id.to_string();
        log_event_with_fields(
            Event::QueryValidated,
            &[
                ("dataset", context.dataset_id.as_str()),
                ("kind", context.kind.as_str()),
                ("query_id", query_id_text.as_str()),
            ],
        );

        let rows = Self::evaluate(&context, &dataset)?;
        Ok((context.dataset_id, rows))
    }

    fn load(&self, id: &str) -> QueryResult<Arc<Dataset>> {
        match self.store.load(id) {
            Ok(dataset) => {
                if let Some(metrics) = self.metrics {
                    metrics.increment_datasets_loaded();
                }
                let row_count = dataset.rows.len().to_string();
                log_event_with_fields(
                    Event::DatasetLoaded,
                    &[("dataset", id), ("rows", row_count.as_str())],
                );
                Ok(dataset)
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::DatasetLoadFailed,
                    &[("dataset", id), ("reason", reason.as_str())],
                );
                Err(QueryError::dataset_not_found(id, reason))
            }
        }
    }

    /// Steps 4-8 over a loaded dataset
    fn evaluate(context: &QueryContext, dataset: &Dataset) -> QueryResult<Vec<Row>> {
        let query = &context.query;
        let selected = FilterEvaluator::new(&dataset.rows).filter(&query.filter);

        let rows: Vec<Row> = match &query.transformations {
            Some(t) => Transformer::new(t).transform(&dataset.rows, &selected),
            None => {
                enforce_cap(selected.len())?;
                selected.iter().map(|&i| dataset.rows[i].clone()).collect()
            }
        };
        enforce_cap(rows.len())?;

        let columns: Vec<String> = query.columns.iter().map(|c| c.name()).collect();
        let mut rows = project(rows, &columns);

        if let Some(order) = &query.order {
            ResultSorter::sort(&mut rows, order);
        }

        Ok(rows)
    }
}

fn enforce_cap(rows: usize) -> QueryResult<()> {
    if rows > MAX_RESULT_ROWS {
        return Err(QueryError::result_too_large(rows, MAX_RESULT_ROWS));
    }
    Ok(())
}
