//! # Error Types
//!
//! Error types for the meshcore model layer using `thiserror`.
//!
//! Validators never stop at the first problem: every check pushes a
//! [`FieldError`] into a [`ValidationErrors`] report so a caller can surface
//! all of them in a single admission cycle.

use serde::Serialize;
use std::fmt;

/// Custom result type for meshcore operations
pub type Result<T> = std::result::Result<T, MeshError>;

/// Classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// A required field is missing or empty, or a value has the wrong shape
    SchemaError,
    /// A structurally valid object violates a semantic rule
    InvariantViolation,
    /// A numeric value is outside its declared bound
    RangeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SchemaError => write!(f, "schema_error"),
            ErrorKind::InvariantViolation => write!(f, "invariant_violation"),
            ErrorKind::RangeError => write!(f, "range_error"),
        }
    }
}

/// A single validation failure attached to a field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    /// Dotted path to the offending field, e.g. `objects[2].spec.exact`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(kind: ErrorKind, field: F, message: M) -> Self {
        Self { kind, field: field.into(), message: message.into() }
    }

    pub fn schema<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::new(ErrorKind::SchemaError, field, message)
    }

    pub fn invariant<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::new(ErrorKind::InvariantViolation, field, message)
    }

    pub fn range<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::new(ErrorKind::RangeError, field, message)
    }

    /// Convert a single-error [`MeshError`] into a field error under `parent`
    pub fn from_mesh(error: MeshError, parent: &str) -> Self {
        let (kind, message, field) = match error {
            MeshError::Schema { message, field } => (ErrorKind::SchemaError, message, field),
            MeshError::Invariant { message, field } => {
                (ErrorKind::InvariantViolation, message, field)
            }
            MeshError::Range { message, field } => (ErrorKind::RangeError, message, field),
            other => (ErrorKind::SchemaError, other.to_string(), None),
        };
        Self::new(kind, join_field(parent, field.as_deref().unwrap_or_default()), message)
    }

    /// Prepend a parent path to this error's field
    pub fn nested_under(mut self, parent: &str) -> Self {
        self.field = join_field(parent, &self.field);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} {}: {}", self.kind, self.field, self.message)
        }
    }
}

/// Join a parent field path with a child segment.
///
/// Index segments (`[0]`) attach without a separating dot.
pub fn join_field(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ if child.starts_with('[') => format!("{}{}", parent, child),
        _ => format!("{}.{}", parent, child),
    }
}

/// Ordered collection of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Kinds of every collected error, in order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Move every error from `other` into this report under `parent`
    pub fn merge_nested(&mut self, parent: &str, other: ValidationErrors) {
        self.errors.extend(other.errors.into_iter().map(|e| e.nested_under(parent)));
    }

    /// `Ok(value)` when nothing was collected, otherwise the report
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self { errors: vec![error] }
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{} validation error(s): {}", self.errors.len(), rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Main error type for meshcore
#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    /// A required field is missing/empty or a value has the wrong shape
    #[error("Schema error: {message}")]
    Schema { message: String, field: Option<String> },

    /// A semantic rule is violated by a structurally valid object
    #[error("Invariant violation: {message}")]
    Invariant { message: String, field: Option<String> },

    /// A numeric value is outside its declared bound
    #[error("Range error: {message}")]
    Range { message: String, field: Option<String> },

    /// Collected validation report
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        context: String,
    },
}

impl MeshError {
    /// Create a schema error
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema { message: message.into(), field: None }
    }

    /// Create a schema error with field information
    pub fn schema_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Schema { message: message.into(), field: Some(field.into()) }
    }

    /// Create an invariant violation
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::Invariant { message: message.into(), field: None }
    }

    /// Create a range error
    pub fn range<S: Into<String>>(message: S) -> Self {
        Self::Range { message: message.into(), field: None }
    }

    /// Create a range error with field information
    pub fn range_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Range { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Validation kind of a single-error variant
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            MeshError::Schema { .. } => Some(ErrorKind::SchemaError),
            MeshError::Invariant { .. } => Some(ErrorKind::InvariantViolation),
            MeshError::Range { .. } => Some(ErrorKind::RangeError),
            MeshError::Validation(errors) => {
                let mut kinds = errors.iter().map(|e| e.kind);
                let first = kinds.next()?;
                kinds.all(|kind| kind == first).then_some(first)
            }
            _ => None,
        }
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, MeshError::Io { .. })
    }

    /// Add context to an error
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        let context = context.into();
        match &mut self {
            MeshError::Io { context: ctx, .. } | MeshError::Serialization { context: ctx, .. } => {
                *ctx = format!("{}: {}", context, ctx);
            }
            MeshError::Config { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
            _ => {}
        }
        self
    }
}

impl From<FieldError> for MeshError {
    fn from(error: FieldError) -> Self {
        let field = if error.field.is_empty() { None } else { Some(error.field) };
        match error.kind {
            ErrorKind::SchemaError => Self::Schema { message: error.message, field },
            ErrorKind::InvariantViolation => Self::Invariant { message: error.message, field },
            ErrorKind::RangeError => Self::Range { message: error.message, field },
        }
    }
}

impl From<std::io::Error> for MeshError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(error: serde_json::Error) -> Self {
        let context = format!("JSON deserialization failed: {}", error);
        Self::Serialization { source: Box::new(error), context }
    }
}

impl From<serde_yaml::Error> for MeshError {
    fn from(error: serde_yaml::Error) -> Self {
        let context = format!("YAML deserialization failed: {}", error);
        Self::Serialization { source: Box::new(error), context }
    }
}

impl From<config::ConfigError> for MeshError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for MeshError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_field_paths() {
        assert_eq!(join_field("", "exact"), "exact");
        assert_eq!(join_field("spec", ""), "spec");
        assert_eq!(join_field("spec", "exact"), "spec.exact");
        assert_eq!(join_field("objects", "[2]"), "objects[2]");
    }

    #[test]
    fn validation_errors_collect_in_order() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.push(FieldError::schema("name", "must not be empty"));
        errors.push(FieldError::range("port", "must be between 1 and 65535"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.kinds(), vec![ErrorKind::SchemaError, ErrorKind::RangeError]);
        assert!(errors.has_kind(ErrorKind::RangeError));
        assert!(!errors.has_kind(ErrorKind::InvariantViolation));
    }

    #[test]
    fn merge_nested_prefixes_fields() {
        let mut inner = ValidationErrors::new();
        inner.push(FieldError::invariant("exact", "conflicts with regex"));

        let mut outer = ValidationErrors::new();
        outer.merge_nested("spec.path", inner);

        let first = outer.iter().next().unwrap();
        assert_eq!(first.field, "spec.path.exact");
    }

    #[test]
    fn display_formats() {
        let error = FieldError::schema("name", "must not be empty");
        assert_eq!(error.to_string(), "schema_error name: must not be empty");

        let errors: ValidationErrors = error.into();
        assert_eq!(
            errors.to_string(),
            "1 validation error(s): schema_error name: must not be empty"
        );
    }

    #[test]
    fn mesh_error_kinds() {
        assert_eq!(MeshError::schema("x").kind(), Some(ErrorKind::SchemaError));
        assert_eq!(MeshError::invariant("x").kind(), Some(ErrorKind::InvariantViolation));
        assert_eq!(MeshError::range("x").kind(), Some(ErrorKind::RangeError));
        assert_eq!(MeshError::config("x").kind(), None);
        assert!(!MeshError::schema("x").is_retryable());
    }

    #[test]
    fn field_error_converts_to_mesh_error() {
        let error: MeshError = FieldError::range("port", "too large").into();
        assert!(matches!(error, MeshError::Range { field: Some(ref f), .. } if f == "port"));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let mesh_error: MeshError = io_error.into();
        assert!(matches!(mesh_error, MeshError::Io { .. }));
        assert!(mesh_error.is_retryable());

        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let mesh_error: MeshError = json_error.into();
        assert!(matches!(mesh_error, MeshError::Serialization { .. }));
    }

    #[test]
    fn context_is_prepended() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = MeshError::from(io_error).with_context("reading model.yaml");
        assert_eq!(error.to_string(), "I/O error: reading model.yaml: I/O operation failed");
    }
}
