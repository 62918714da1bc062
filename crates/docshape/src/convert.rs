//! The converter.
//!
//! A [`Converter`] walks a schema tree and produces a [`Descriptor`] tree:
//!
//! - object nodes become a map of their converted fields, or a single
//!   `Mixed` field when they declare no keys or accept unknown ones;
//! - every other node becomes a [`FieldDescriptor`] with a type from
//!   [`resolve_type`](Converter::resolve_type), a validator, its default,
//!   the required marker and any annotation pairs.
//!
//! # Example
//! ```rust
//! use docshape::{Converter, FieldType, StandardModel};
//! use docshape_schema::Schema;
//! use serde_json::json;
//!
//! let converter = Converter::builder().model(StandardModel).build().unwrap();
//! let descriptor = converter
//!     .convert(Schema::object().with_key(
//!         "merchant",
//!         Schema::string().meta(json!({ "type": "ObjectId", "ref": "Merchant" })),
//!     ))
//!     .unwrap();
//!
//! let merchant = descriptor.get("merchant").and_then(|d| d.as_field()).unwrap();
//! assert!(matches!(merchant.field_type(), Some(FieldType::ObjectId)));
//! assert_eq!(merchant.extra("ref"), Some(&json!("Merchant")));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use docshape_schema::{Kind, Schema, SchemaDef, ValidationOptions, Value};
use tracing::{debug, instrument, trace};

use crate::bridge::{self, Validator};
use crate::config::{ConvertOptions, ConverterConfig, SchemaOptions};
use crate::error::{ConvertError, ConvertResult};
use crate::meta;
use crate::model::{Descriptor, DocumentModel, FieldDescriptor, FieldType};

/// Converts schemas into document model descriptors.
///
/// Holds the document model and the configuration every conversion reads.
/// Cloning shares the model.
#[derive(Debug, Clone)]
pub struct Converter {
    model: Arc<dyn DocumentModel>,
    config: ConverterConfig,
}

impl Converter {
    pub fn new(model: impl DocumentModel + 'static, config: ConverterConfig) -> Self {
        Self {
            model: Arc::new(model),
            config,
        }
    }

    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub fn model(&self) -> &dyn DocumentModel {
        self.model.as_ref()
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert with default options.
    pub fn convert(&self, def: impl Into<SchemaDef>) -> ConvertResult<Descriptor> {
        self.convert_with(def, &ConvertOptions::default())
    }

    /// Convert a schema or a plain definition.
    ///
    /// A definition that is not a schema is compiled as an implicit object
    /// first. Fails with [`ConvertError::EmptyInput`] when nothing was given
    /// and [`ConvertError::InputShape`] when the definition cannot describe an
    /// object.
    #[instrument(skip_all, fields(type_key = %options.type_key, model = self.model.name()))]
    pub fn convert_with(
        &self,
        def: impl Into<SchemaDef>,
        options: &ConvertOptions,
    ) -> ConvertResult<Descriptor> {
        let schema = def.into().compile_object()?.ok_or(ConvertError::EmptyInput)?;
        let descriptor = self.convert_schema(&schema, options)?;
        debug!(root = %schema.kind(), "Schema converted");
        Ok(descriptor)
    }

    /// Convert one node.
    pub fn convert_schema(
        &self,
        schema: &Schema,
        options: &ConvertOptions,
    ) -> ConvertResult<Descriptor> {
        if schema.kind() == Kind::Object {
            return self.convert_object(schema, options);
        }

        let type_key = options.type_key.as_str();
        let annotations = meta::scan(schema, type_key);
        let mut field = FieldDescriptor::new(type_key);
        field.default = schema.default_value().cloned();
        field.extra = annotations.extra;
        field.validate = Some(Validator::new(
            schema.clone(),
            annotations.identifier,
            self.config.validation_options(),
        ));
        field.required = schema.is_required();

        if let Some(field_type) = annotations.field_type {
            trace!(field_type = %field_type, "Field type taken from annotations");
            field.field_type = Some(field_type);
            return Ok(Descriptor::Field(field));
        }

        let field_type = self.resolve_type(schema, options)?;
        if field_type.is_array() {
            field.validate = None;
        }
        trace!(kind = %schema.kind(), field_type = %field_type, "Resolved field type");
        field.field_type = Some(field_type);
        Ok(Descriptor::Field(field))
    }

    fn convert_object(&self, schema: &Schema, options: &ConvertOptions) -> ConvertResult<Descriptor> {
        let keys = match schema.keys() {
            Some(keys) if !keys.is_empty() && !schema.allows_unknown() => keys,
            _ => {
                trace!("Open object, using Mixed");
                return Ok(Descriptor::Field(FieldDescriptor::typed(
                    options.type_key.as_str(),
                    FieldType::Mixed,
                )));
            }
        };

        let mut fields = BTreeMap::new();
        for (name, child) in keys {
            fields.insert(name.clone(), self.convert_schema(child, options)?);
        }
        Ok(Descriptor::Fields(fields))
    }

    /// Validate a value against a schema the way generated validators do.
    ///
    /// A schema annotated `type: "ObjectId"` in any record entry also accepts
    /// native identifiers, exactly as its converted field would. Resolves to
    /// `false` on any failure.
    pub async fn wrap_validator(&self, schema: &Schema, value: &Value) -> bool {
        let options = self.config.validation_options();
        let identifier = meta::scan(schema, meta::TYPE_ANNOTATION).identifier;
        bridge::wrap_validator(schema, identifier, &options, value).await
    }
}

/// Builder for [`Converter`].
///
/// # Example
/// ```rust
/// use docshape::{ConvertError, Converter, SchemaOptions, StandardModel};
///
/// let converter = Converter::builder()
///     .model(StandardModel)
///     .subdocument(SchemaOptions::new().with("_id", false))
///     .build()
///     .unwrap();
/// assert!(converter.config().subdocument.is_some());
///
/// assert_eq!(Converter::builder().build().unwrap_err(), ConvertError::MissingModel);
/// ```
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    model: Option<Arc<dyn DocumentModel>>,
    config: ConverterConfig,
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document model.
    pub fn model(mut self, model: impl DocumentModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Set a shared document model.
    pub fn shared_model(mut self, model: Arc<dyn DocumentModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validation(mut self, options: ValidationOptions) -> Self {
        self.config.validation = Some(options);
        self
    }

    pub fn subdocument(mut self, options: SchemaOptions) -> Self {
        self.config.subdocument = Some(options);
        self
    }

    pub fn build(self) -> ConvertResult<Converter> {
        let model = self.model.ok_or(ConvertError::MissingModel)?;
        debug!(
            model = model.name(),
            validation = self.config.validation.is_some(),
            subdocument = self.config.subdocument.is_some(),
            "Converter initialized"
        );
        Ok(Converter {
            model,
            config: self.config,
        })
    }
}

/// Build a converter from a document model and optional global options.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
///
/// use docshape::{ConvertError, StandardModel};
///
/// assert!(docshape::init(Some(Arc::new(StandardModel)), None, None).is_ok());
/// assert_eq!(
///     docshape::init(None, None, None).unwrap_err(),
///     ConvertError::MissingModel
/// );
/// ```
pub fn init(
    model: Option<Arc<dyn DocumentModel>>,
    validation: Option<ValidationOptions>,
    subdocument: Option<SchemaOptions>,
) -> ConvertResult<Converter> {
    let builder = ConverterBuilder::new().config(ConverterConfig {
        validation,
        subdocument,
    });
    match model {
        Some(model) => builder.shared_model(model).build(),
        None => builder.build(),
    }
}
