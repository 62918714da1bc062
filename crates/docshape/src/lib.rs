//! # docshape
//!
//! Convert declarative validation schemas into document model field
//! descriptors.
//!
//! Given a [`Schema`](docshape_schema::Schema) tree, a [`Converter`] decides
//! for every node which [`FieldType`] it becomes, whether it is required,
//! what default it carries and which validator guards it. Objects flatten into
//! maps of fields, arrays wrap their element and alternatives collapse to a
//! single type where one exists.
//!
//! ## Quick Start
//!
//! ```rust
//! use docshape::{Converter, FieldType, StandardModel};
//! use docshape_schema::Schema;
//!
//! let converter = Converter::builder().model(StandardModel).build().unwrap();
//! let descriptor = converter
//!     .convert(
//!         Schema::object()
//!             .with_key("name", Schema::string().required())
//!             .with_key("tags", Schema::array().with_item(Schema::string())),
//!     )
//!     .unwrap();
//!
//! let name = descriptor.get("name").and_then(|d| d.as_field()).unwrap();
//! assert!(matches!(name.field_type(), Some(FieldType::String)));
//! assert!(name.is_required());
//!
//! let tags = descriptor.get("tags").and_then(|d| d.field_type()).unwrap();
//! assert!(tags.is_array());
//! ```
//!
//! ## Modules
//!
//! - [`convert`]: the converter, its builder and [`init`]
//! - [`resolve`]: field type resolution for arrays and alternatives
//! - [`meta`]: annotation scanning and identifier detection
//! - [`bridge`]: schema validation adapted to a boolean field validator
//! - [`model`]: field types, descriptors and sub-schemas
//! - [`config`]: converter and per-call options
//! - [`error`]: conversion errors

pub mod bridge;
pub mod config;
pub mod convert;
pub mod error;
pub mod meta;
pub mod model;
pub mod resolve;

#[cfg(test)]
mod tests;

pub use bridge::{Validator, wrap_validator};
pub use config::{ConvertOptions, ConverterConfig, SchemaOptions};
pub use convert::{Converter, ConverterBuilder, init};
pub use error::{ConvertError, ConvertResult};
pub use model::{
    Descriptor, DocumentModel, Element, FieldDescriptor, FieldType, SchemaPath, StandardModel,
    SubSchema,
};
