//! Schema registry for insightdb
//!
//! Fixed, per-kind lookup tables of numeric and textual field names,
//! plus the `<datasetId>_<fieldName>` key format that binds a column
//! to a dataset.
//!
//! # Design Principles
//!
//! - Pure lookup, no state
//! - Numeric and textual sets are disjoint within a kind
//! - Key syntax is checked separately from key meaning

mod key;
mod types;

pub use key::{FieldKey, KEY_SEPARATOR};
pub use types::{FieldType, Kind};
