//! Dataset kinds and their field universes
//!
//! Each kind fixes two disjoint sets of field names:
//! - numeric (mFields): comparable with LT/GT/EQ, aggregatable with MAX/MIN/AVG/SUM
//! - textual (sFields): matchable with IS
//!
//! The tables are fixed at compile time. There is no schema evolution.

use serde::{Deserialize, Serialize};
use std::fmt;

const COURSES_NUMERIC: &[&str] = &["avg", "pass", "fail", "audit", "year"];
const COURSES_TEXTUAL: &[&str] = &["dept", "id", "instructor", "title", "uuid"];

const ROOMS_NUMERIC: &[&str] = &["lat", "lon", "seats"];
const ROOMS_TEXTUAL: &[&str] = &[
    "fullname",
    "shortname",
    "number",
    "name",
    "address",
    "type",
    "furniture",
    "href",
];

/// Dataset category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Course sections
    Courses,
    /// Campus rooms
    Rooms,
}

impl Kind {
    /// All kinds, in declaration order
    pub const ALL: [Kind; 2] = [Kind::Courses, Kind::Rooms];

    /// Returns the serialized name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Courses => "courses",
            Kind::Rooms => "rooms",
        }
    }

    /// Numeric field names for this kind
    pub fn numeric_fields(&self) -> &'static [&'static str] {
        match self {
            Kind::Courses => COURSES_NUMERIC,
            Kind::Rooms => ROOMS_NUMERIC,
        }
    }

    /// Textual field names for this kind
    pub fn textual_fields(&self) -> &'static [&'static str] {
        match self {
            Kind::Courses => COURSES_TEXTUAL,
            Kind::Rooms => ROOMS_TEXTUAL,
        }
    }

    /// Returns the type of `field` under this kind, if the kind defines it
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        if self.numeric_fields().contains(&field) {
            Some(FieldType::Numeric)
        } else if self.textual_fields().contains(&field) {
            Some(FieldType::Textual)
        } else {
            None
        }
    }

    /// Returns true if `field` is numeric under this kind
    pub fn is_numeric(&self, field: &str) -> bool {
        self.field_type(field) == Some(FieldType::Numeric)
    }

    /// Returns true if `field` is textual under this kind
    pub fn is_textual(&self, field: &str) -> bool {
        self.field_type(field) == Some(FieldType::Textual)
    }

    /// Returns true if some kind defines `field`.
    ///
    /// Used before the dataset (and therefore its kind) is known.
    pub fn is_known_anywhere(field: &str) -> bool {
        Kind::ALL.iter().any(|k| k.field_type(field).is_some())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value class of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Number-valued (mField)
    Numeric,
    /// String-valued (sField)
    Textual,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::Textual => "textual",
        }
    }
}
