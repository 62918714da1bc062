//! Error types for schema construction and validation.
//!
//! Two families of errors live here:
//!
//! - [`SchemaError`] is raised while *building* a schema (an invalid regex,
//!   a definition that cannot be compiled into an object schema, a malformed
//!   identifier literal).
//! - [`ValidationError`] is raised while *validating* a value against a
//!   schema. Field-level failures are reported as a list of [`FieldError`]s,
//!   each carrying a dotted path, a human-readable message and a code such as
//!   `string.base` or `any.required`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Error raised while constructing or compiling a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A non-schema value was supplied where an object schema was expected.
    #[error("Object schema must be a valid object")]
    InvalidObjectSchema,

    /// A pattern rule could not be compiled.
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// An identifier literal was not 24 hexadecimal characters.
    #[error("invalid ObjectId `{0}`: expected 24 hexadecimal characters")]
    InvalidObjectId(String),
}

/// Validation error for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the failing value (empty for the root)
    pub path: String,
    /// Human-readable error message
    pub message: String,
    /// Error code identifying the failed rule, e.g. `number.min`
    pub code: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let error = Self {
            path: path.into(),
            message: message.into(),
            code: code.into(),
        };
        trace!(path = %error.path, code = %error.code, "Recorded validation failure");
        error
    }

    /// Create an `any.required` error
    pub fn required(path: impl Into<String>, label: &str) -> Self {
        Self::new(path, format!("\"{}\" is required", label), "any.required")
    }

    /// Create a `<kind>.base` error for a value of the wrong shape
    pub fn base(path: impl Into<String>, label: &str, kind: &str, expected: &str) -> Self {
        Self::new(
            path,
            format!("\"{}\" must be {}", label, expected),
            format!("{}.base", kind),
        )
    }

    /// Check whether this error was produced by the given rule code
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

/// Error raised by [`Schema::validate`](crate::Schema::validate) and
/// [`Schema::validate_async`](crate::Schema::validate_async).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more values failed their rules.
    #[error("{}", summarize(.0))]
    Invalid(Vec<FieldError>),

    /// The schema carries external rules and was validated synchronously.
    #[error("Schema with external rules must be validated asynchronously")]
    AsyncRequired,

    /// An external rule rejected the value.
    #[error("external rule failed for \"{path}\": {message}")]
    External { path: String, message: String },
}

impl ValidationError {
    /// Field-level errors, empty for non-field failures.
    pub fn details(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::AsyncRequired | Self::External { .. } => &[],
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "validation failed".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(". ")
}

/// Result type alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;
