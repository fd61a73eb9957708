//! Half-open integer interval used by range match strategies.

use serde::{Deserialize, Serialize};

use crate::errors::{join_field, FieldError, ValidationErrors};

/// `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: i64,
    pub end: i64,
}

impl MatchRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// A range is valid only when `start < end`; an empty interval can never match.
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        if self.start >= self.end {
            errors.push(FieldError::range(
                join_field(field, "end"),
                format!(
                    "range end ({}) must be greater than range start ({})",
                    self.end, self.start
                ),
            ));
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect_errors("", &mut errors);
        errors.into_result(())
    }

    /// `start <= value < end`
    pub fn contains(&self, value: i64) -> bool {
        self.start <= value && value < self.end
    }
}
