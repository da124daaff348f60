//! Query Executor subsystem
//!
//! Consumes validated queries and produces deterministic results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Evaluate WHERE over row indices
//! 2. Group and aggregate (if TRANSFORMATIONS)
//! 3. Enforce the result cap
//! 4. Project COLUMNS
//! 5. Apply ORDER (stable)
//!
//! # Invariants
//!
//! - Same query + same data = same rows in the same order
//! - Rows are never mutated during evaluation
//! - No partial results on failure

mod engine;
mod filters;
mod projection;
mod sorter;
mod transformer;

pub use engine::{QueryEngine, MAX_RESULT_ROWS};
pub use filters::{FilterEvaluator, RowSet};
pub use projection::project;
pub use sorter::ResultSorter;
pub use transformer::{Transformer, AGGREGATE_SCALE};
