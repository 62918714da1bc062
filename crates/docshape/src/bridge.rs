//! Validation bridge.
//!
//! Document stores call a field validator with a single value and expect a
//! yes/no answer, possibly asynchronously. [`wrap_validator`] adapts a
//! [`Schema`] to that shape: it validates synchronously first, falls back to
//! asynchronous validation when the synchronous pass fails, and reduces every
//! error and panic to `false`.
//!
//! Identifier fields accept either a value matching the original schema or a
//! native [`ObjectId`](docshape_schema::ObjectId).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use docshape_schema::{Native, Schema, ValidationOptions, Value};
use futures::FutureExt;
use tracing::{debug, warn};

/// The schema actually validated for a node.
fn candidate(schema: &Schema, identifier: bool) -> Schema {
    let schema = schema.clone();
    if identifier {
        Schema::alternatives([schema, Schema::object().instance(Native::ObjectId)])
    } else {
        schema
    }
}

/// Validate `value` against `schema`, never failing.
///
/// # Example
/// ```rust
/// use docshape::bridge::wrap_validator;
/// use docshape_schema::{Schema, ValidationOptions, Value};
///
/// let options = ValidationOptions::default();
/// let ok = futures::executor::block_on(wrap_validator(
///     &Schema::string(),
///     false,
///     &options,
///     &Value::from("hello"),
/// ));
/// assert!(ok);
/// ```
pub async fn wrap_validator(
    schema: &Schema,
    identifier: bool,
    options: &ValidationOptions,
    value: &Value,
) -> bool {
    let schema = candidate(schema, identifier);

    match panic::catch_unwind(AssertUnwindSafe(|| schema.validate(value, options))) {
        Ok(Ok(_)) => return true,
        Ok(Err(error)) => {
            debug!(kind = %schema.kind(), error = %error, "Synchronous validation failed, retrying asynchronously");
        }
        Err(_) => warn!(kind = %schema.kind(), "Synchronous validation panicked"),
    }

    match AssertUnwindSafe(schema.validate_async(value, options))
        .catch_unwind()
        .await
    {
        Ok(Ok(_)) => true,
        Ok(Err(error)) => {
            debug!(kind = %schema.kind(), error = %error, "Validation failed");
            false
        }
        Err(_) => {
            warn!(kind = %schema.kind(), "Asynchronous validation panicked");
            false
        }
    }
}

/// A field validator bound to a schema.
///
/// Cloning shares the schema.
#[derive(Clone)]
pub struct Validator {
    schema: Arc<Schema>,
    identifier: bool,
    options: ValidationOptions,
}

impl Validator {
    pub fn new(schema: Schema, identifier: bool, options: ValidationOptions) -> Self {
        Self {
            schema: Arc::new(schema),
            identifier,
            options,
        }
    }

    /// The schema values are checked against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether native identifiers are accepted too.
    pub fn is_identifier(&self) -> bool {
        self.identifier
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Check a value. Resolves to `false` on any failure.
    pub async fn validate(&self, value: &Value) -> bool {
        wrap_validator(&self.schema, self.identifier, &self.options, value).await
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("kind", &self.schema.kind())
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}
