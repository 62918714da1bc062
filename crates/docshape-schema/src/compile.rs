//! Compilation of loose definitions into schemas.
//!
//! Callers may hand over either a finished [`Schema`] or a plain mapping of
//! field names to definitions. [`SchemaDef::compile_object`] turns the latter
//! into an implicit object schema, so these two are equivalent:
//!
//! ```rust
//! use docshape_schema::{Schema, SchemaDef};
//!
//! let explicit = Schema::object().with_key("name", Schema::string());
//! let implicit = SchemaDef::from(vec![("name", Schema::string())])
//!     .compile_object()
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(explicit.keys().unwrap()[0].0, implicit.keys().unwrap()[0].0);
//! ```

use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::schema::Schema;
use crate::value::Value;

/// A schema, or something that can be compiled into one.
#[derive(Debug, Clone)]
pub enum SchemaDef {
    /// No definition was supplied.
    Missing,
    /// A finished schema.
    Schema(Schema),
    /// Field name to definition pairs forming an implicit object.
    Keys(Vec<(String, SchemaDef)>),
    /// A raw JSON literal.
    Literal(serde_json::Value),
}

impl SchemaDef {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Compile into an object schema unless already a schema.
    ///
    /// Returns `Ok(None)` for [`SchemaDef::Missing`]. A literal that is not a
    /// JSON object (or null) cannot describe an object and fails with
    /// [`SchemaError::InvalidObjectSchema`].
    pub fn compile_object(self) -> Result<Option<Schema>, SchemaError> {
        match self {
            Self::Missing => Ok(None),
            Self::Schema(schema) => Ok(Some(schema)),
            Self::Keys(keys) => Ok(Some(compile_keys(keys)?)),
            Self::Literal(serde_json::Value::Null) => {
                Ok(Some(Schema::object().with_keys(Vec::<(String, Schema)>::new())))
            }
            Self::Literal(serde_json::Value::Object(map)) => Ok(Some(compile_keys(
                map.into_iter()
                    .map(|(name, value)| (name, SchemaDef::Literal(value)))
                    .collect(),
            )?)),
            Self::Literal(_) => Err(SchemaError::InvalidObjectSchema),
        }
    }

    /// Compile a nested definition.
    ///
    /// Objects become object schemas, arrays become alternatives of their
    /// compiled elements and scalars become single-value schemas.
    pub fn compile(self) -> Result<Option<Schema>, SchemaError> {
        match self {
            Self::Literal(serde_json::Value::Array(values)) => {
                let candidates = values
                    .into_iter()
                    .map(|value| SchemaDef::Literal(value).compile())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Schema::alternatives(candidates.into_iter().flatten())))
            }
            Self::Literal(value @ serde_json::Value::Object(_)) => {
                SchemaDef::Literal(value).compile_object()
            }
            Self::Literal(value) => Ok(Some(Schema::any().valid([Value::from(value)]))),
            other => other.compile_object(),
        }
    }
}

fn compile_keys(keys: Vec<(String, SchemaDef)>) -> Result<Schema, SchemaError> {
    let mut compiled = Vec::with_capacity(keys.len());
    for (name, def) in keys {
        if let Some(schema) = def.compile()? {
            compiled.push((name, schema));
        }
    }
    Ok(Schema::object().with_keys(compiled))
}

impl From<Schema> for SchemaDef {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<&Schema> for SchemaDef {
    fn from(schema: &Schema) -> Self {
        Self::Schema(schema.clone())
    }
}

impl<T: Into<SchemaDef>> From<Option<T>> for SchemaDef {
    fn from(def: Option<T>) -> Self {
        def.map(Into::into).unwrap_or(Self::Missing)
    }
}

impl<K: Into<String>, V: Into<SchemaDef>> From<Vec<(K, V)>> for SchemaDef {
    fn from(keys: Vec<(K, V)>) -> Self {
        Self::Keys(
            keys.into_iter()
                .map(|(name, def)| (name.into(), def.into()))
                .collect(),
        )
    }
}

impl<V: Into<SchemaDef>> From<BTreeMap<String, V>> for SchemaDef {
    fn from(keys: BTreeMap<String, V>) -> Self {
        Self::Keys(keys.into_iter().map(|(name, def)| (name, def.into())).collect())
    }
}

impl From<serde_json::Value> for SchemaDef {
    fn from(value: serde_json::Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for SchemaDef {
    fn from(value: &str) -> Self {
        Self::Literal(serde_json::Value::String(value.to_string()))
    }
}
