//! Query error types
//!
//! Error codes:
//! - INSIGHT_MALFORMED_QUERY (REJECT)
//! - INSIGHT_INVALID_KEY (REJECT)
//! - INSIGHT_CROSS_DATASET_REFERENCE (REJECT)
//! - INSIGHT_DATASET_NOT_FOUND (REJECT)
//! - INSIGHT_RESULT_TOO_LARGE (REJECT)
//! - INSIGHT_INVALID_FILTER_SYNTAX (REJECT)
//!
//! Every query failure is recoverable: the query is rejected as a whole
//! and no partial result is produced.

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Query error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorCode {
    /// Structural or grammar violation
    MalformedQuery,
    /// Ill-formed, unknown, or wrongly-typed field/apply key
    InvalidKey,
    /// More than one dataset id referenced
    CrossDatasetReference,
    /// Resolved dataset has no loadable backing data
    DatasetNotFound,
    /// More rows than the result cap after filter/transform
    ResultTooLarge,
    /// Malformed wildcard pattern in IS
    InvalidFilterSyntax,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::MalformedQuery => "INSIGHT_MALFORMED_QUERY",
            QueryErrorCode::InvalidKey => "INSIGHT_INVALID_KEY",
            QueryErrorCode::CrossDatasetReference => "INSIGHT_CROSS_DATASET_REFERENCE",
            QueryErrorCode::DatasetNotFound => "INSIGHT_DATASET_NOT_FOUND",
            QueryErrorCode::ResultTooLarge => "INSIGHT_RESULT_TOO_LARGE",
            QueryErrorCode::InvalidFilterSyntax => "INSIGHT_INVALID_FILTER_SYNTAX",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
    /// Offending key if applicable
    key: Option<String>,
}

impl QueryError {
    /// Create a malformed query error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::MalformedQuery,
            message: reason.into(),
            key: None,
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        let k = key.into();
        Self {
            code: QueryErrorCode::InvalidKey,
            message: format!("Invalid key '{}': {}", k, reason.into()),
            key: Some(k),
        }
    }

    /// Create a cross-dataset reference error
    pub fn cross_dataset(pinned: &str, found: &str) -> Self {
        Self {
            code: QueryErrorCode::CrossDatasetReference,
            message: format!(
                "Cannot query more than one dataset (query is bound to '{}', found '{}')",
                pinned, found
            ),
            key: Some(found.to_string()),
        }
    }

    /// Create a dataset not found error
    pub fn dataset_not_found(id: impl Into<String>, reason: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: QueryErrorCode::DatasetNotFound,
            message: format!("Dataset '{}' not found: {}", id, reason.into()),
            key: Some(id),
        }
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, limit: usize) -> Self {
        Self {
            code: QueryErrorCode::ResultTooLarge,
            message: format!("Result has {} rows, limit is {}", rows, limit),
            key: None,
        }
    }

    /// Create an invalid filter syntax error
    pub fn invalid_filter_syntax(pattern: impl Into<String>) -> Self {
        let p = pattern.into();
        Self {
            code: QueryErrorCode::InvalidFilterSyntax,
            message: format!("Invalid wildcard placement in '{}'", p),
            key: Some(p),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending key if applicable
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            QueryErrorCode::MalformedQuery,
            QueryErrorCode::InvalidKey,
            QueryErrorCode::CrossDatasetReference,
            QueryErrorCode::DatasetNotFound,
            QueryErrorCode::ResultTooLarge,
            QueryErrorCode::InvalidFilterSyntax,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().map(|c| c.code()).collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_cross_dataset_message() {
        let err = QueryError::cross_dataset("sections", "rooms");
        assert_eq!(err.code(), QueryErrorCode::CrossDatasetReference);
        assert!(err.message().contains("more than one dataset"));
        assert_eq!(err.key(), Some("rooms"));
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::invalid_key("sections_colour", "unknown field");
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("INSIGHT_INVALID_KEY"));
        assert!(display.contains("sections_colour"));
    }
}
