//! The document model: field types, descriptors and sub-schemas.
//!
//! A conversion produces a [`Descriptor`] tree. Leaves are
//! [`FieldDescriptor`]s holding a [`FieldType`], the required marker, a
//! default, a [`Validator`] and any annotation pairs. Object nodes become a
//! name-keyed map of child descriptors.
//!
//! [`Descriptor::to_value`] renders the tree the way a document store's
//! schema definition reads, with the field type under the configured type key:
//!
//! ```json
//! { "name": { "type": "String", "required": true, "validate": "[validator]" } }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use docshape_schema::DefaultValue;
use serde_json::{Map, Value as Json, json};

use crate::bridge::Validator;
use crate::config::SchemaOptions;

/// Rendering of a validator in [`Descriptor::to_value`].
pub const VALIDATOR_MARKER: &str = "[validator]";
/// Rendering of a default factory in [`Descriptor::to_value`].
pub const FACTORY_MARKER: &str = "[factory]";

/// Type of a document field.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    /// Document identifier
    ObjectId,
    /// Any shape
    Mixed,
    /// Generic object
    Object,
    /// A type given verbatim by an annotation under the type key
    Declared(Json),
    /// An array, with its element type when known
    Array(Option<Box<Element>>),
}

impl FieldType {
    /// Array of a single element.
    pub fn array_of(element: Element) -> Self {
        Self::Array(Some(Box::new(element)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object)
    }

    /// Element of an array type.
    pub fn element(&self) -> Option<&Element> {
        match self {
            Self::Array(Some(element)) => Some(element),
            _ => None,
        }
    }

    /// Name of the path type the document store compiles this into.
    pub fn instance_name(&self) -> String {
        match self {
            Self::String => "String".to_string(),
            Self::Number => "Number".to_string(),
            Self::Date => "Date".to_string(),
            Self::Boolean => "Boolean".to_string(),
            Self::ObjectId => "ObjectId".to_string(),
            Self::Mixed | Self::Object => "Mixed".to_string(),
            Self::Declared(declared) => declared.as_str().unwrap_or("Mixed").to_string(),
            Self::Array(_) => "Array".to_string(),
        }
    }

    pub fn to_value(&self) -> Json {
        match self {
            Self::String => json!("String"),
            Self::Number => json!("Number"),
            Self::Date => json!("Date"),
            Self::Boolean => json!("Boolean"),
            Self::ObjectId => json!("ObjectId"),
            Self::Mixed => json!("Mixed"),
            Self::Object => json!("Object"),
            Self::Declared(declared) => declared.clone(),
            Self::Array(None) => json!([]),
            Self::Array(Some(element)) => json!([element.to_value()]),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instance_name())
    }
}

/// Element of an array field.
#[derive(Debug, Clone)]
pub enum Element {
    /// A bare type
    Type(FieldType),
    /// A full field descriptor
    Field(Descriptor),
    /// An embedded sub-document schema
    Schema(SubSchema),
}

impl Element {
    pub fn as_type(&self) -> Option<&FieldType> {
        match self {
            Self::Type(field_type) => Some(field_type),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Descriptor> {
        match self {
            Self::Field(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&SubSchema> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Json {
        match self {
            Self::Type(field_type) => field_type.to_value(),
            Self::Field(descriptor) => descriptor.to_value(),
            Self::Schema(schema) => schema.to_value(),
        }
    }
}

/// Descriptor of a single field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) field_type: Option<FieldType>,
    pub(crate) required: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) validate: Option<Validator>,
    pub(crate) extra: Map<String, Json>,
    pub(crate) type_key: String,
}

impl FieldDescriptor {
    pub(crate) fn new(type_key: impl Into<String>) -> Self {
        Self {
            field_type: None,
            required: false,
            default: None,
            validate: None,
            extra: Map::new(),
            type_key: type_key.into(),
        }
    }

    /// A descriptor holding only a field type.
    pub(crate) fn typed(type_key: impl Into<String>, field_type: FieldType) -> Self {
        let mut descriptor = Self::new(type_key);
        descriptor.field_type = Some(field_type);
        descriptor
    }

    pub fn field_type(&self) -> Option<&FieldType> {
        self.field_type.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validate.as_ref()
    }

    /// Annotation pair copied onto this field.
    pub fn extra(&self, key: &str) -> Option<&Json> {
        self.extra.get(key)
    }

    pub fn extras(&self) -> &Map<String, Json> {
        &self.extra
    }

    /// Output key the field type is rendered under.
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Render as a JSON record.
    ///
    /// The default is written first so annotation pairs of the same name
    /// replace it; `validate`, `required` and the type are written last.
    pub fn to_value(&self) -> Json {
        let mut out = Map::new();
        match &self.default {
            Some(DefaultValue::Literal(value)) => {
                out.insert("default".to_string(), value.clone());
            }
            Some(DefaultValue::Factory(_)) => {
                out.insert("default".to_string(), json!(FACTORY_MARKER));
            }
            None => {}
        }
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        if self.validate.is_some() {
            out.insert("validate".to_string(), json!(VALIDATOR_MARKER));
        }
        if self.required {
            out.insert("required".to_string(), json!(true));
        }
        if let Some(field_type) = &self.field_type {
            out.insert(self.type_key.clone(), field_type.to_value());
        }
        Json::Object(out)
    }
}

/// Output of a conversion.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A single field
    Field(FieldDescriptor),
    /// An object's fields by name
    Fields(BTreeMap<String, Descriptor>),
}

impl Descriptor {
    pub fn as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            Self::Field(field) => Some(field),
            Self::Fields(_) => None,
        }
    }

    pub fn as_fields(&self) -> Option<&BTreeMap<String, Descriptor>> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Field(_) => None,
        }
    }

    /// Field type of a single-field descriptor.
    pub fn field_type(&self) -> Option<&FieldType> {
        self.as_field().and_then(FieldDescriptor::field_type)
    }

    /// Look up a nested descriptor by dotted path.
    ///
    /// # Example
    /// ```rust
    /// use docshape::{Converter, StandardModel};
    /// use docshape_schema::Schema;
    ///
    /// let converter = Converter::builder().model(StandardModel).build().unwrap();
    /// let descriptor = converter
    ///     .convert(Schema::object().with_key(
    ///         "name",
    ///         Schema::object().with_key("first", Schema::string()),
    ///     ))
    ///     .unwrap();
    ///
    /// assert!(descriptor.get("name.first").is_some());
    /// assert!(descriptor.get("name.last").is_none());
    /// ```
    pub fn get(&self, path: &str) -> Option<&Descriptor> {
        path.split('.').try_fold(self, |node, segment| match node {
            Self::Fields(fields) => fields.get(segment),
            Self::Field(_) => None,
        })
    }

    pub fn to_value(&self) -> Json {
        match self {
            Self::Field(field) => field.to_value(),
            Self::Fields(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, descriptor)| (name.clone(), descriptor.to_value()))
                    .collect(),
            ),
        }
    }
}

/// A compiled path of a sub-schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPath {
    /// Path type name, e.g. `String` or `ObjectId`
    pub instance: String,
    pub required: bool,
    /// Whether a validator is attached
    pub validated: bool,
    /// Referenced model name, from a `ref` annotation
    pub reference: Option<String>,
}

impl SchemaPath {
    fn from_field(field: &FieldDescriptor) -> Self {
        Self {
            instance: field
                .field_type()
                .map(FieldType::instance_name)
                .unwrap_or_else(|| "Mixed".to_string()),
            required: field.is_required(),
            validated: field.validator().is_some(),
            reference: field.extra("ref").and_then(Json::as_str).map(str::to_string),
        }
    }

    fn implicit_id() -> Self {
        Self {
            instance: "ObjectId".to_string(),
            required: false,
            validated: false,
            reference: None,
        }
    }
}

/// An embedded document schema.
#[derive(Debug, Clone)]
pub struct SubSchema {
    definition: Descriptor,
    options: SchemaOptions,
}

impl SubSchema {
    pub fn new(definition: Descriptor, options: SchemaOptions) -> Self {
        Self {
            definition,
            options,
        }
    }

    pub fn definition(&self) -> &Descriptor {
        &self.definition
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Flattened dotted path to compiled path table.
    ///
    /// Nested objects contribute their leaves. An `_id` identifier path is
    /// added unless declared or disabled with the `_id: false` option. A
    /// definition that is a single field declares no named paths.
    pub fn paths(&self) -> BTreeMap<String, SchemaPath> {
        let mut paths = BTreeMap::new();
        if let Descriptor::Fields(fields) = &self.definition {
            collect_paths(fields, "", &mut paths);
        }
        if self.options.id_enabled() && !paths.contains_key("_id") {
            paths.insert("_id".to_string(), SchemaPath::implicit_id());
        }
        paths
    }

    pub fn path(&self, name: &str) -> Option<SchemaPath> {
        self.paths().remove(name)
    }

    pub fn to_value(&self) -> Json {
        json!({
            "schema": self.definition.to_value(),
            "options": Json::Object(self.options.clone().into_inner()),
        })
    }
}

fn collect_paths(
    fields: &BTreeMap<String, Descriptor>,
    prefix: &str,
    out: &mut BTreeMap<String, SchemaPath>,
) {
    for (name, descriptor) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match descriptor {
            Descriptor::Field(field) => {
                out.insert(path, SchemaPath::from_field(field));
            }
            Descriptor::Fields(nested) => collect_paths(nested, &path, out),
        }
    }
}

/// Handle to the document store's schema layer.
///
/// The converter asks the model to build embedded schemas for arrays of
/// objects.
pub trait DocumentModel: fmt::Debug + Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Build an embedded schema from a converted definition.
    fn sub_schema(&self, definition: Descriptor, options: SchemaOptions) -> SubSchema;
}

/// The stock document model.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardModel;

impl DocumentModel for StandardModel {
    fn name(&self) -> &str {
        "standard"
    }

    fn sub_schema(&self, definition: Descriptor, options: SchemaOptions) -> SubSchema {
        SubSchema::new(definition, options)
    }
}
