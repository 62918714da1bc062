//! Converter configuration.
//!
//! [`ConverterConfig`] is captured once when a [`Converter`](crate::Converter)
//! is built and read by every conversion it performs. [`ConvertOptions`] is
//! passed per call.
//!
//! # Example
//! ```rust
//! use docshape::{ConverterConfig, SchemaOptions};
//! use docshape_schema::ValidationOptions;
//!
//! let config = ConverterConfig::new()
//!     .with_validation(ValidationOptions::new().with_convert(false))
//!     .with_subdocument(SchemaOptions::new().with("_id", false));
//!
//! assert_eq!(config.validation.map(|v| v.convert), Some(false));
//! ```

use docshape_schema::ValidationOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Options handed to the document model when it builds a sub-schema.
///
/// A flat record of option names to JSON values, such as `{"_id": false}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaOptions(Map<String, Json>);

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Json)> {
        self.0.iter()
    }

    /// Overlay `other` onto these options; its entries win on conflict.
    pub fn merge(&mut self, other: &SchemaOptions) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Overlay every entry of a JSON record; non-object values are ignored.
    pub fn merge_record(&mut self, record: &Json) {
        if let Some(map) = record.as_object() {
            for (key, value) in map {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Whether sub-documents built with these options get an implicit `_id`.
    pub fn id_enabled(&self) -> bool {
        self.get("_id").and_then(Json::as_bool).unwrap_or(true)
    }

    pub fn into_inner(self) -> Map<String, Json> {
        self.0
    }
}

impl From<Map<String, Json>> for SchemaOptions {
    fn from(map: Map<String, Json>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Json>> FromIterator<(K, V)> for SchemaOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Configuration shared by every conversion of one converter.
///
/// # Fields
///
/// * `validation` - Options used by every generated validator. When unset,
///   [`ValidationOptions::default()`] applies.
///
/// * `subdocument` - Options applied to every sub-schema built for an array
///   of objects. Annotations on the array itself override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Validation options for generated validators (default: none)
    pub validation: Option<ValidationOptions>,
    /// Global sub-document options (default: none)
    pub subdocument: Option<SchemaOptions>,
}

impl ConverterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation options used by generated validators.
    pub fn with_validation(mut self, options: ValidationOptions) -> Self {
        self.validation = Some(options);
        self
    }

    /// Set the global sub-document options.
    pub fn with_subdocument(mut self, options: SchemaOptions) -> Self {
        self.subdocument = Some(options);
        self
    }

    /// Validation options in effect.
    pub fn validation_options(&self) -> ValidationOptions {
        self.validation.unwrap_or_default()
    }
}

/// Per-call conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Name of the output key holding the field type (default: `"type"`)
    pub type_key: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            type_key: "type".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the field type key.
    ///
    /// # Example
    /// ```rust
    /// use docshape::ConvertOptions;
    ///
    /// let options = ConvertOptions::new().with_type_key("kind");
    /// assert_eq!(options.type_key, "kind");
    /// ```
    pub fn with_type_key(mut self, key: impl Into<String>) -> Self {
        self.type_key = key.into();
        self
    }
}
