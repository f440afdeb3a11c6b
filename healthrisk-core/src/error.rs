//! Validation and comparison errors
//!
//! Every variant names the offending field so the boundary layer can map it
//! to a user-visible message without re-parsing anything.

use thiserror::Error;

/// Rejected assessment input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Categorical field outside its closed set of legal values
    #[error("invalid value {value:?} for field `{field}` (expected one of: {})", .expected.join(", "))]
    UnknownValue {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },

    /// Numeric field that must be strictly positive
    #[error("field `{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    /// Numeric field that is NaN or infinite
    #[error("field `{field}` must be a finite number")]
    NotFinite { field: &'static str },

    /// Integer field too large to represent
    #[error("field `{field}` is out of range (got {value}, maximum {max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: u32,
    },

    /// Field contradicting the value derived from other fields
    #[error("field `{field}` is {value:?} but the supplied measurements give {derived:?}")]
    Conflict {
        field: &'static str,
        value: &'static str,
        derived: &'static str,
    },

    /// Required field absent from the wire record
    #[error("missing required field `{field}`")]
    Missing { field: &'static str },
}

impl InputError {
    /// Name of the field that caused the rejection
    pub fn field(&self) -> &'static str {
        match self {
            InputError::UnknownValue { field, .. }
            | InputError::NonPositive { field, .. }
            | InputError::NotFinite { field }
            | InputError::OutOfRange { field, .. }
            | InputError::Conflict { field, .. }
            | InputError::Missing { field } => field,
        }
    }
}

/// Comparison between two results that cannot be compared
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("cannot compare a {current} assessment against a {previous} assessment")]
    DomainMismatch {
        current: &'static str,
        previous: &'static str,
    },
}
