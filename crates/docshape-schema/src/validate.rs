//! Validation engine.
//!
//! [`Schema::validate`] walks a value alongside its schema, coercing where
//! [`ValidationOptions::convert`] permits and recording a [`FieldError`] for
//! every violated rule. [`Schema::validate_async`] performs the same walk and
//! then awaits the external rules collected from every node that passed.
//!
//! # Example
//!
//! ```rust
//! use docshape_schema::{Schema, ValidationOptions, Value};
//!
//! let schema = Schema::number().integer().min(0.0);
//! let options = ValidationOptions::default();
//!
//! assert_eq!(schema.validate(&Value::from("42"), &options), Ok(Value::Number(42.0)));
//! assert!(schema.validate(&Value::from(-1), &options).is_err());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FieldError, ValidationError, ValidationResult};
use crate::schema::{External, Kind, Presence, Rule, Schema};
use crate::value::Value;

/// Options applied to a whole validation pass.
///
/// # Example
/// ```rust
/// use docshape_schema::ValidationOptions;
///
/// let strict = ValidationOptions::new().with_convert(false);
/// assert!(!strict.convert);
/// assert!(strict.abort_early);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Coerce values to the expected kind where possible (default: true)
    pub convert: bool,
    /// Accept undeclared object keys everywhere (default: false)
    pub allow_unknown: bool,
    /// Stop at the first failure (default: true)
    pub abort_early: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            convert: true,
            allow_unknown: false,
            abort_early: true,
        }
    }
}

impl ValidationOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable coercion.
    pub fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// Accept undeclared object keys.
    pub fn with_allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Stop at the first failure, or collect every failure.
    pub fn with_abort_early(mut self, abort: bool) -> Self {
        self.abort_early = abort;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sync,
    Async,
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

fn render(path: &[Segment]) -> String {
    path.iter()
        .map(|segment| match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn label(path: &[Segment]) -> String {
    match path.last() {
        Some(Segment::Key(key)) => key.clone(),
        Some(Segment::Index(index)) => format!("[{}]", index),
        None => "value".to_string(),
    }
}

fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

struct Pending {
    path: String,
    value: Value,
    rule: External,
}

/// State of one validation pass.
struct Walk<'a> {
    options: &'a ValidationOptions,
    mode: Mode,
    errors: Vec<FieldError>,
    pending: Vec<Pending>,
    needs_async: bool,
}

impl<'a> Walk<'a> {
    fn new(options: &'a ValidationOptions, mode: Mode) -> Self {
        Self {
            options,
            mode,
            errors: Vec::new(),
            pending: Vec::new(),
            needs_async: false,
        }
    }

    fn fork(&self) -> Self {
        Self::new(self.options, self.mode)
    }

    fn halted(&self) -> bool {
        self.options.abort_early && !self.errors.is_empty()
    }

    fn fail(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    fn check(
        &mut self,
        schema: &Schema,
        value: Option<&Value>,
        path: &mut Vec<Segment>,
    ) -> Option<Value> {
        let at = render(path);
        let name = label(path);

        let Some(value) = value.filter(|v| !schema.empties().contains(v)) else {
            if schema.presence() == Presence::Required {
                self.fail(FieldError::required(at, &name));
                return None;
            }
            return schema.default_value().map(|d| Value::from(d.resolve()));
        };

        if schema.presence() == Presence::Forbidden {
            self.fail(FieldError::new(
                at,
                format!("\"{}\" is not allowed", name),
                "any.unknown",
            ));
            return None;
        }

        if schema.allowed().contains(value) {
            return Some(value.clone());
        }
        if schema.flags().only {
            let choices = schema
                .allowed()
                .iter()
                .map(|v| v.to_json().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.fail(FieldError::new(
                at,
                format!("\"{}\" must be one of [{}]", name, choices),
                "any.only",
            ));
            return None;
        }

        let before = self.errors.len();
        let out = match schema.kind() {
            Kind::Any => Some(value.clone()),
            Kind::String => self.check_string(schema, value, &at, &name),
            Kind::Number => self.check_number(schema, value, &at, &name),
            Kind::Boolean => self.check_boolean(value, &at, &name),
            Kind::Date => self.check_date(value, &at, &name),
            Kind::Binary => self.check_binary(schema, value, &at, &name),
            Kind::Object => self.check_object(schema, value, path),
            Kind::Array => self.check_array(schema, value, path),
            Kind::Alternatives => self.check_alternatives(schema, value, path),
        };
        if self.errors.len() > before {
            return None;
        }

        if let Some(validated) = &out
            && !schema.externals().is_empty()
        {
            match self.mode {
                Mode::Sync => self.needs_async = true,
                Mode::Async => self.pending.extend(schema.externals().iter().map(|rule| {
                    Pending {
                        path: at.clone(),
                        value: validated.clone(),
                        rule: rule.clone(),
                    }
                })),
            }
        }
        out
    }

    fn check_string(
        &mut self,
        schema: &Schema,
        value: &Value,
        at: &str,
        name: &str,
    ) -> Option<Value> {
        let Value::String(raw) = value else {
            self.fail(FieldError::base(at, name, "string", "a string"));
            return None;
        };
        if raw.is_empty() {
            self.fail(FieldError::new(
                at,
                format!("\"{}\" is not allowed to be empty", name),
                "string.empty",
            ));
            return None;
        }

        let mut s = raw.clone();
        if self.options.convert {
            for rule in schema.rules() {
                match rule {
                    Rule::Lowercase => s = s.to_lowercase(),
                    Rule::Uppercase => s = s.to_uppercase(),
                    _ => {}
                }
            }
        }

        let length = s.chars().count();
        for rule in schema.rules() {
            match rule {
                Rule::Min(min) if (length as f64) < *min => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" length must be at least {} characters long", name, min),
                    "string.min",
                )),
                Rule::Max(max) if (length as f64) > *max => self.fail(FieldError::new(
                    at,
                    format!(
                        "\"{}\" length must be less than or equal to {} characters long",
                        name, max
                    ),
                    "string.max",
                )),
                Rule::Length(expected) if length != *expected => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" length must be {} characters long", name, expected),
                    "string.length",
                )),
                Rule::Pattern(regex) if !regex.is_match(&s) => self.fail(FieldError::new(
                    at,
                    format!(
                        "\"{}\" with value \"{}\" fails to match the required pattern: {}",
                        name, s, regex
                    ),
                    "string.pattern.base",
                )),
                Rule::Email if !is_email(&s) => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be a valid email", name),
                    "string.email",
                )),
                Rule::Lowercase if s != s.to_lowercase() => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must only contain lowercase characters", name),
                    "string.lowercase",
                )),
                Rule::Uppercase if s != s.to_uppercase() => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must only contain uppercase characters", name),
                    "string.uppercase",
                )),
                _ => {}
            }
            if self.halted() {
                return None;
            }
        }
        Some(Value::String(s))
    }

    fn check_number(
        &mut self,
        schema: &Schema,
        value: &Value,
        at: &str,
        name: &str,
    ) -> Option<Value> {
        let number = match value {
            Value::Number(n) => Some(*n),
            Value::String(s) if self.options.convert => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(n) = number else {
            self.fail(FieldError::base(at, name, "number", "a number"));
            return None;
        };
        if !n.is_finite() {
            self.fail(FieldError::new(
                at,
                format!("\"{}\" cannot be infinity", name),
                "number.infinity",
            ));
            return None;
        }

        for rule in schema.rules() {
            match rule {
                Rule::Min(min) if n < *min => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be greater than or equal to {}", name, min),
                    "number.min",
                )),
                Rule::Max(max) if n > *max => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be less than or equal to {}", name, max),
                    "number.max",
                )),
                Rule::Integer if n.fract() != 0.0 => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be an integer", name),
                    "number.integer",
                )),
                _ => {}
            }
            if self.halted() {
                return None;
            }
        }
        Some(Value::Number(n))
    }

    fn check_boolean(&mut self, value: &Value, at: &str, name: &str) -> Option<Value> {
        let flag = match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if self.options.convert => {
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        };
        match flag {
            Some(b) => Some(Value::Bool(b)),
            None => {
                self.fail(FieldError::base(at, name, "boolean", "a boolean"));
                None
            }
        }
    }

    fn check_date(&mut self, value: &Value, at: &str, name: &str) -> Option<Value> {
        let date = match value {
            Value::Date(d) => Some(*d),
            Value::Number(n) if self.options.convert => from_millis(*n),
            Value::String(s) if self.options.convert => DateTime::parse_from_rfc3339(s.trim())
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().and_then(from_millis)),
            _ => None,
        };
        match date {
            Some(d) => Some(Value::Date(d)),
            None => {
                self.fail(FieldError::base(at, name, "date", "a valid date"));
                None
            }
        }
    }

    fn check_binary(
        &mut self,
        schema: &Schema,
        value: &Value,
        at: &str,
        name: &str,
    ) -> Option<Value> {
        let bytes = match value {
            Value::Binary(bytes) => bytes.clone(),
            Value::String(s) if self.options.convert => s.as_bytes().to_vec(),
            _ => {
                self.fail(FieldError::base(at, name, "binary", "a buffer or a string"));
                return None;
            }
        };
        let size = bytes.len();
        for rule in schema.rules() {
            match rule {
                Rule::Min(min) if (size as f64) < *min => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be at least {} bytes", name, min),
                    "binary.min",
                )),
                Rule::Max(max) if (size as f64) > *max => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be less than or equal to {} bytes", name, max),
                    "binary.max",
                )),
                Rule::Length(expected) if size != *expected => self.fail(FieldError::new(
                    at,
                    format!("\"{}\" must be {} bytes", name, expected),
                    "binary.length",
                )),
                _ => {}
            }
            if self.halted() {
                return None;
            }
        }
        Some(Value::Binary(bytes))
    }

    fn check_object(
        &mut self,
        schema: &Schema,
        value: &Value,
        path: &mut Vec<Segment>,
    ) -> Option<Value> {
        let at = render(path);
        let name = label(path);

        let instance = schema.rules().iter().find_map(|rule| match rule {
            Rule::Instance(native) => Some(*native),
            _ => None,
        });
        if let Some(native) = instance {
            if native.matches(value) {
                return Some(value.clone());
            }
            self.fail(FieldError::new(
                at,
                format!("\"{}\" must be an instance of \"{}\"", name, native.name()),
                "object.instance",
            ));
            return None;
        }

        let Value::Object(map) = value else {
            self.fail(FieldError::base(at, &name, "object", "of type object"));
            return None;
        };
        let Some(keys) = schema.keys() else {
            return Some(value.clone());
        };

        let mut out = BTreeMap::new();
        for (key, child) in keys {
            path.push(Segment::Key(key.clone()));
            let validated = self.check(child, map.get(key), path);
            path.pop();
            if let Some(v) = validated {
                out.insert(key.clone(), v);
            }
            if self.halted() {
                return None;
            }
        }

        let open = schema.allows_unknown() || self.options.allow_unknown;
        for (key, v) in map {
            if keys.iter().any(|(declared, _)| declared == key) {
                continue;
            }
            if open {
                out.insert(key.clone(), v.clone());
                continue;
            }
            path.push(Segment::Key(key.clone()));
            self.fail(FieldError::new(
                render(path),
                format!("\"{}\" is not allowed", key),
                "object.unknown",
            ));
            path.pop();
            if self.halted() {
                return None;
            }
        }
        Some(Value::Object(out))
    }

    fn check_array(
        &mut self,
        schema: &Schema,
        value: &Value,
        path: &mut Vec<Segment>,
    ) -> Option<Value> {
        let at = render(path);
        let name = label(path);

        let elements = match value {
            Value::Array(elements) => elements.clone(),
            other if self.options.convert && schema.flags().single => vec![other.clone()],
            _ => {
                self.fail(FieldError::base(at, &name, "array", "an array"));
                return None;
            }
        };

        let mut out = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            path.push(Segment::Index(index));
            if schema.items().is_empty() {
                out.push(element.clone());
            } else {
                match self.first_match(schema.items(), element, path) {
                    Some(validated) => out.extend(validated),
                    None => self.fail(FieldError::new(
                        render(path),
                        format!("\"[{}]\" does not match any of the allowed types", index),
                        "array.includes",
                    )),
                }
            }
            path.pop();
            if self.halted() {
                return None;
            }
        }

        let size = elements.len();
        for rule in schema.rules() {
            match rule {
                Rule::Min(min) if (size as f64) < *min => self.fail(FieldError::new(
                    at.clone(),
                    format!("\"{}\" must contain at least {} items", name, min),
                    "array.min",
                )),
                Rule::Max(max) if (size as f64) > *max => self.fail(FieldError::new(
                    at.clone(),
                    format!("\"{}\" must contain less than or equal to {} items", name, max),
                    "array.max",
                )),
                Rule::Length(expected) if size != *expected => self.fail(FieldError::new(
                    at.clone(),
                    format!("\"{}\" must contain {} items", name, expected),
                    "array.length",
                )),
                _ => {}
            }
            if self.halted() {
                return None;
            }
        }
        Some(Value::Array(out))
    }

    fn check_alternatives(
        &mut self,
        schema: &Schema,
        value: &Value,
        path: &mut Vec<Segment>,
    ) -> Option<Value> {
        if schema.matches().is_empty() {
            return Some(value.clone());
        }
        match self.first_match(schema.matches(), value, path) {
            Some(validated) => validated,
            None => {
                self.fail(FieldError::new(
                    render(path),
                    format!(
                        "\"{}\" does not match any of the allowed types",
                        label(path)
                    ),
                    "alternatives.match",
                ));
                None
            }
        }
    }

    /// Try candidates in order, keeping the first that passes.
    ///
    /// Returns `None` when no candidate matched. A matching candidate may
    /// still produce no value (an empty value without a default).
    fn first_match(
        &mut self,
        candidates: &[Schema],
        value: &Value,
        path: &mut Vec<Segment>,
    ) -> Option<Option<Value>> {
        for (index, candidate) in candidates.iter().enumerate() {
            let mut attempt = self.fork();
            let validated = attempt.check(candidate, Some(value), path);
            if attempt.errors.is_empty() {
                trace!(candidate = index, kind = %candidate.kind(), "Candidate matched");
                self.needs_async |= attempt.needs_async;
                self.pending.extend(attempt.pending);
                return Some(validated);
            }
        }
        None
    }
}

fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

impl Schema {
    /// Validate a value synchronously, returning the coerced value.
    ///
    /// Fails with [`ValidationError::AsyncRequired`] when a node that passed
    /// carries external rules; use [`validate_async`](Self::validate_async)
    /// for such schemas.
    pub fn validate(&self, value: &Value, options: &ValidationOptions) -> ValidationResult<Value> {
        let mut walk = Walk::new(options, Mode::Sync);
        let out = walk.check(self, Some(value), &mut Vec::new());
        if !walk.errors.is_empty() {
            debug!(
                kind = %self.kind(),
                error_count = walk.errors.len(),
                "Validation failed"
            );
            return Err(ValidationError::Invalid(walk.errors));
        }
        if walk.needs_async {
            return Err(ValidationError::AsyncRequired);
        }
        Ok(out.unwrap_or(Value::Null))
    }

    /// Validate a value, then await external rules in the order their nodes
    /// were visited.
    pub async fn validate_async(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> ValidationResult<Value> {
        let (out, pending) = {
            let mut walk = Walk::new(options, Mode::Async);
            let out = walk.check(self, Some(value), &mut Vec::new());
            if !walk.errors.is_empty() {
                debug!(
                    kind = %self.kind(),
                    error_count = walk.errors.len(),
                    "Validation failed"
                );
                return Err(ValidationError::Invalid(walk.errors));
            }
            (out, walk.pending)
        };

        for Pending { path, value, rule } in pending {
            if let Err(message) = rule.run(value).await {
                debug!(path = %path, error = %message, "External rule failed");
                return Err(ValidationError::External { path, message });
            }
        }
        Ok(out.unwrap_or(Value::Null))
    }
}
