//! Observable lifecycle events
//!
//! Query execution itself is traced through `ObservationScope("QUERY")`,
//! which yields QUERY_BEGIN, QUERY_COMPLETE and QUERY_FAILED.

use std::fmt;

use super::logger::Severity;

/// Observable events outside the query scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Dataset read from its store
    DatasetLoaded,
    /// Dataset could not be read
    DatasetLoadFailed,
    /// Dataset listing produced
    DatasetsListed,
    /// Query passed both validation passes
    QueryValidated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatasetLoaded => "DATASET_LOADED",
            Event::DatasetLoadFailed => "DATASET_LOAD_FAILED",
            Event::DatasetsListed => "DATASETS_LISTED",
            Event::QueryValidated => "QUERY_VALIDATED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryValidated => Severity::Trace,
            Event::DatasetLoadFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
