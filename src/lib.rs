//! insightdb - A strict, deterministic query engine over course-section
//! and room datasets
//!
//! A JSON query names one dataset through its field keys, filters rows
//! with a boolean WHERE tree, optionally groups and aggregates them, and
//! returns the requested COLUMNS in the requested ORDER.

pub mod cli;
pub mod dataset;
pub mod executor;
pub mod observability;
pub mod query;
pub mod schema;
