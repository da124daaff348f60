//! Field keys of the form `<datasetId>_<fieldName>`

use std::fmt;

/// Separator between dataset id and field name
pub const KEY_SEPARATOR: char = '_';

/// A column reference bound to a dataset.
///
/// Syntactically valid only; whether the field exists for a given
/// kind is checked by the query validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Dataset identifier (left of the separator)
    pub dataset: String,
    /// Field name (right of the separator)
    pub field: String,
}

impl FieldKey {
    /// Creates a key from its parts
    pub fn new(dataset: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            field: field.into(),
        }
    }

    /// Parses `<id>_<field>`; exactly one separator is allowed.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(KEY_SEPARATOR);
        let dataset = parts.next()?;
        let field = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(dataset, field))
    }

    /// Returns true if the string looks like a field key rather than an apply name
    pub fn looks_like_key(raw: &str) -> bool {
        raw.contains(KEY_SEPARATOR)
    }

    /// The key as it appears in rows
    pub fn as_column(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.dataset, KEY_SEPARATOR, self.field)
    }
}
