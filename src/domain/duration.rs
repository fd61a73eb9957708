//! Duration domain types
//!
//! A duration on the wire is a `(unit, value)` pair. Comparison and
//! arithmetic happen on the canonical form: a count of milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{FieldError, MeshError, Result, ValidationErrors};

/// Unit of a [`Duration`]. Closed set: `s` or `ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DurationUnit {
    Seconds,
    Milliseconds,
}

impl DurationUnit {
    /// Milliseconds per one unit
    pub fn millis_per_unit(self) -> i64 {
        match self {
            DurationUnit::Seconds => 1000,
            DurationUnit::Milliseconds => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Seconds => "s",
            DurationUnit::Milliseconds => "ms",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationUnit {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s" => Ok(DurationUnit::Seconds),
            "ms" => Ok(DurationUnit::Milliseconds),
            other => Err(MeshError::schema_field(
                format!("unknown duration unit '{}', expected one of: s, ms", other),
                "unit",
            )),
        }
    }
}

impl TryFrom<String> for DurationUnit {
    type Error = MeshError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DurationUnit> for String {
    fn from(unit: DurationUnit) -> Self {
        unit.as_str().to_string()
    }
}

/// A time quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub unit: DurationUnit,
    pub value: i64,
}

impl Duration {
    pub fn seconds(value: i64) -> Self {
        Self { unit: DurationUnit::Seconds, value }
    }

    pub fn millis(value: i64) -> Self {
        Self { unit: DurationUnit::Milliseconds, value }
    }

    /// Canonical millisecond count.
    ///
    /// Negative values are a schema error even though the wire schema
    /// already forbids them, because this can be called on values that
    /// never went through admission. Results beyond `i64::MAX` are a range
    /// error rather than a wrapped value.
    pub fn to_canonical(&self) -> Result<i64> {
        if self.value < 0 {
            return Err(MeshError::schema_field(
                format!("duration value must not be negative, got {}", self.value),
                "value",
            ));
        }

        self.value.checked_mul(self.unit.millis_per_unit()).ok_or_else(|| {
            MeshError::range_field(
                format!(
                    "duration {}{} exceeds the representable millisecond range",
                    self.value, self.unit
                ),
                "value",
            )
        })
    }

    /// Convert to a `std::time::Duration`
    pub fn to_std(&self) -> Result<std::time::Duration> {
        let millis = self.to_canonical()?;
        Ok(std::time::Duration::from_millis(millis as u64))
    }

    /// Collect every problem with this duration under `field`
    pub fn collect_errors(&self, field: &str, errors: &mut ValidationErrors) {
        if let Err(error) = self.to_canonical() {
            errors.push(FieldError::from_mesh(error, field));
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn canonical_seconds_and_millis() {
        assert_eq!(Duration::seconds(2).to_canonical().unwrap(), 2000);
        assert_eq!(Duration::millis(2).to_canonical().unwrap(), 2);
        assert_eq!(Duration::seconds(0).to_canonical().unwrap(), 0);
    }

    #[test]
    fn negative_value_is_schema_error() {
        let err = Duration::millis(-1).to_canonical().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SchemaError));
    }

    #[test]
    fn overflow_is_rejected_not_wrapped() {
        let err = Duration::seconds(i64::MAX).to_canonical().unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeError));

        let largest = i64::MAX / 1000;
        assert_eq!(Duration::seconds(largest).to_canonical().unwrap(), largest * 1000);
        assert!(Duration::seconds(largest + 1).to_canonical().is_err());
        assert_eq!(Duration::millis(i64::MAX).to_canonical().unwrap(), i64::MAX);
    }

    #[test]
    fn std_conversion() {
        assert_eq!(Duration::seconds(3).to_std().unwrap(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn unit_wire_format() {
        let parsed: Duration = serde_json::from_str(r#"{"unit":"ms","value":250}"#).unwrap();
        assert_eq!(parsed, Duration::millis(250));
        assert_eq!(
            serde_json::to_string(&Duration::seconds(5)).unwrap(),
            r#"{"unit":"s","value":5}"#
        );
    }

    #[test]
    fn unknown_unit_rejected_at_boundary() {
        let result: std::result::Result<Duration, _> =
            serde_json::from_str(r#"{"unit":"m","value":1}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("unknown duration unit 'm'"));
    }

    #[test]
    fn collect_errors_uses_field_path() {
        let mut errors = ValidationErrors::new();
        Duration::seconds(-5).collect_errors("idle", &mut errors);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.field, "idle.value");
        assert_eq!(error.kind, ErrorKind::SchemaError);
    }
}
