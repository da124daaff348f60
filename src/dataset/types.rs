//! Dataset types shared by every store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{Kind, KEY_SEPARATOR};

use super::errors::{DatasetError, DatasetResult};

/// One row: field key -> number or string, in insertion order
pub type Row = Map<String, Value>;

/// An immutable, loaded dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Dataset identifier (the `<id>` of every field key)
    pub id: String,
    /// Kind fixing the valid field universe
    pub kind: Kind,
    /// Rows in load order
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Creates a dataset
    pub fn new(id: impl Into<String>, kind: Kind, rows: Vec<Row>) -> Self {
        Self {
            id: id.into(),
            kind,
            rows,
        }
    }

    /// Summary used by listings
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            id: self.id.clone(),
            kind: self.kind,
            num_rows: self.rows.len(),
        }
    }
}

/// Listing entry for a stored dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub kind: Kind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
}

/// Checks a dataset id: non-blank and free of the key separator.
pub fn validate_id(id: &str) -> DatasetResult<()> {
    if id.trim().is_empty() || id.contains(KEY_SEPARATOR) {
        return Err(DatasetError::InvalidId(id.to_string()));
    }
    Ok(())
}
