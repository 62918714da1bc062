//! Schema nodes and the fluent builder.
//!
//! A [`Schema`] describes the expected shape of a [`Value`]: its [`Kind`],
//! presence and default flags, free-form annotations attached with
//! [`Schema::meta`], the structural terms of composite kinds (object keys,
//! array items, alternative candidates) and a list of constraint rules.
//!
//! # Example
//!
//! ```rust
//! use docshape_schema::Schema;
//! use serde_json::json;
//!
//! let user = Schema::object()
//!     .with_key("name", Schema::string().required())
//!     .with_key("age", Schema::number().integer().min(0.0))
//!     .with_key(
//!         "merchant",
//!         Schema::string()
//!             .try_pattern("^[0-9a-fA-F]{24}$")
//!             .unwrap()
//!             .meta(json!({ "type": "ObjectId", "ref": "Merchant" })),
//!     );
//!
//! assert_eq!(user.keys().map(|keys| keys.len()), Some(3));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::value::Value;

/// Discriminant of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Any,
    String,
    Number,
    Boolean,
    Date,
    Binary,
    Object,
    Array,
    Alternatives,
}

impl Kind {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Object => "object",
            Self::Array => "array",
            Self::Alternatives => "alternatives",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence flag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Forbidden,
}

/// Default value attached to a schema node.
///
/// Either a literal or a factory invoked each time a default is needed.
/// Cloning shares the factory.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(serde_json::Value),
    Factory(Arc<dyn Fn() -> serde_json::Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default value.
    pub fn resolve(&self) -> serde_json::Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }

    pub fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Factory(_) => None,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Native value types an object schema can require instances of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Native {
    ObjectId,
}

impl Native {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::ObjectId => matches!(value, Value::ObjectId(_)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectId => "ObjectId",
        }
    }
}

/// Constraint rule.
///
/// `Min`, `Max` and `Length` apply to string length, numeric value or
/// array size depending on the kind of the owning schema.
#[derive(Debug, Clone)]
pub enum Rule {
    Min(f64),
    Max(f64),
    Length(usize),
    Integer,
    Pattern(Regex),
    Email,
    Lowercase,
    Uppercase,
    Instance(Native),
}

type ExternalFn = dyn Fn(Value) -> BoxFuture<'static, Result<(), String>> + Send + Sync;

/// Asynchronous rule run after all synchronous checks pass.
#[derive(Clone)]
pub struct External {
    pub(crate) check: Arc<ExternalFn>,
}

impl External {
    pub(crate) fn run(&self, value: Value) -> BoxFuture<'static, Result<(), String>> {
        (self.check)(value)
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("External(..)")
    }
}

/// Flags that modify how a node validates.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub presence: Presence,
    pub default: Option<DefaultValue>,
    /// Objects accept keys that were not declared.
    pub unknown: bool,
    /// Arrays accept a single non-array value.
    pub single: bool,
    /// Allow-list is exclusive.
    pub only: bool,
    pub description: Option<String>,
}

/// A schema-description node.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: Kind,
    flags: Flags,
    metas: Vec<serde_json::Value>,
    keys: Option<Vec<(String, Schema)>>,
    items: Vec<Schema>,
    matches: Vec<Schema>,
    rules: Vec<Rule>,
    allow: Vec<Value>,
    empties: Vec<Value>,
    externals: Vec<External>,
}

impl Schema {
    /// Synthesize a bare node of the given kind with no terms or flags.
    pub fn bare(kind: Kind) -> Self {
        Self {
            kind,
            flags: Flags::default(),
            metas: Vec::new(),
            keys: None,
            items: Vec::new(),
            matches: Vec::new(),
            rules: Vec::new(),
            allow: Vec::new(),
            empties: Vec::new(),
            externals: Vec::new(),
        }
    }

    pub fn any() -> Self {
        Self::bare(Kind::Any)
    }

    pub fn string() -> Self {
        Self::bare(Kind::String)
    }

    pub fn number() -> Self {
        Self::bare(Kind::Number)
    }

    pub fn boolean() -> Self {
        Self::bare(Kind::Boolean)
    }

    pub fn date() -> Self {
        Self::bare(Kind::Date)
    }

    pub fn binary() -> Self {
        Self::bare(Kind::Binary)
    }

    /// An object schema without declared keys. Any object passes until
    /// [`with_keys`](Self::with_keys) or [`with_key`](Self::with_key) declares
    /// some.
    pub fn object() -> Self {
        Self::bare(Kind::Object)
    }

    pub fn array() -> Self {
        Self::bare(Kind::Array)
    }

    /// An alternatives schema trying each candidate in order.
    pub fn alternatives(candidates: impl IntoIterator<Item = Schema>) -> Self {
        let mut schema = Self::bare(Kind::Alternatives);
        schema.matches = candidates.into_iter().collect();
        schema
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn presence(&self) -> Presence {
        self.flags.presence
    }

    pub fn is_required(&self) -> bool {
        self.flags.presence == Presence::Required
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.flags.default.as_ref()
    }

    /// Attached annotations in attachment order.
    pub fn metas(&self) -> &[serde_json::Value] {
        &self.metas
    }

    /// Declared object keys, `None` when no keys were declared.
    pub fn keys(&self) -> Option<&[(String, Schema)]> {
        self.keys.as_deref()
    }

    /// Whether the object accepts undeclared keys.
    pub fn allows_unknown(&self) -> bool {
        self.flags.unknown
    }

    pub fn items(&self) -> &[Schema] {
        &self.items
    }

    pub fn matches(&self) -> &[Schema] {
        &self.matches
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn allowed(&self) -> &[Value] {
        &self.allow
    }

    pub fn empties(&self) -> &[Value] {
        &self.empties
    }

    pub(crate) fn externals(&self) -> &[External] {
        &self.externals
    }

    /// Whether this node or any descendant carries external rules.
    pub fn has_externals(&self) -> bool {
        !self.externals.is_empty()
            || self
                .keys
                .iter()
                .flatten()
                .any(|(_, child)| child.has_externals())
            || self.items.iter().any(Schema::has_externals)
            || self.matches.iter().any(Schema::has_externals)
    }

    // =========================================================================
    // Flags
    // =========================================================================

    pub fn required(mut self) -> Self {
        self.flags.presence = Presence::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.flags.presence = Presence::Optional;
        self
    }

    pub fn forbidden(mut self) -> Self {
        self.flags.presence = Presence::Forbidden;
        self
    }

    /// Set a literal default value.
    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.flags.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Set a default produced on demand.
    pub fn with_default_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> serde_json::Value + Send + Sync + 'static,
    {
        self.flags.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Attach an annotation. Only JSON objects carry key/value metadata;
    /// other values are kept but ignored by consumers that read records.
    pub fn meta(mut self, annotation: impl Into<serde_json::Value>) -> Self {
        self.metas.push(annotation.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.flags.description = Some(description.into());
        self
    }

    /// Allow undeclared object keys.
    pub fn unknown(mut self, allow: bool) -> Self {
        self.flags.unknown = allow;
        self
    }

    /// Accept a single value where an array is expected.
    pub fn single(mut self) -> Self {
        self.flags.single = true;
        self
    }

    // =========================================================================
    // Terms
    // =========================================================================

    /// Declare object keys, appending to any already declared. A key declared
    /// twice keeps its position and takes the newer schema.
    pub fn with_keys<K>(mut self, keys: impl IntoIterator<Item = (K, Schema)>) -> Self
    where
        K: Into<String>,
    {
        let declared = self.keys.get_or_insert_with(Vec::new);
        for (name, schema) in keys {
            let name = name.into();
            match declared.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = schema,
                None => declared.push((name, schema)),
            }
        }
        self
    }

    pub fn with_key(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_keys([(name.into(), schema)])
    }

    /// Declare allowed array item schemas.
    pub fn with_items(mut self, items: impl IntoIterator<Item = Schema>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_item(self, item: Schema) -> Self {
        self.with_items([item])
    }

    /// Append alternative candidates.
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = Schema>) -> Self {
        self.matches.extend(candidates);
        self
    }

    // =========================================================================
    // Rules
    // =========================================================================

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn min(self, limit: f64) -> Self {
        self.rule(Rule::Min(limit))
    }

    pub fn max(self, limit: f64) -> Self {
        self.rule(Rule::Max(limit))
    }

    pub fn length(self, length: usize) -> Self {
        self.rule(Rule::Length(length))
    }

    pub fn integer(self) -> Self {
        self.rule(Rule::Integer)
    }

    pub fn pattern(self, pattern: Regex) -> Self {
        self.rule(Rule::Pattern(pattern))
    }

    /// Compile and attach a pattern rule.
    pub fn try_pattern(self, pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(self.pattern(regex))
    }

    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    pub fn lowercase(self) -> Self {
        self.rule(Rule::Lowercase)
    }

    pub fn uppercase(self) -> Self {
        self.rule(Rule::Uppercase)
    }

    /// Require values to be instances of a native type.
    pub fn instance(self, native: Native) -> Self {
        self.rule(Rule::Instance(native))
    }

    /// Add values that always pass.
    pub fn allow<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.allow.extend(values.into_iter().map(Into::into));
        self
    }

    /// Restrict the node to exactly the given values.
    pub fn valid<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.flags.only = true;
        self.allow(values)
    }

    /// Values treated as if absent.
    pub fn empty<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.empties.extend(values.into_iter().map(Into::into));
        self
    }

    /// Attach an asynchronous rule. Schemas carrying one must be validated
    /// with [`validate_async`](Self::validate_async).
    pub fn external<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.externals.push(External {
            check: Arc::new(move |value| Box::pin(check(value))),
        });
        self
    }
}
