//! # docshape-schema
//!
//! A declarative validation schema for document values.
//!
//! Schemas are built with a fluent API, carry free-form annotations that
//! downstream tools read (see the `docshape` crate, which turns them into
//! document-store field descriptors), and validate [`Value`]s either
//! synchronously or, when external rules are attached, asynchronously.
//!
//! ## Quick Start
//!
//! ```rust
//! use docshape_schema::{Schema, ValidationOptions, Value};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .with_key("name", Schema::string().required())
//!     .with_key("tags", Schema::array().with_item(Schema::string()));
//!
//! let value = Value::from(json!({ "name": "Kristy", "tags": ["a", "b"] }));
//! assert!(schema.validate(&value, &ValidationOptions::default()).is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: schema nodes and builder methods
//! - [`compile`]: compiling loose definitions into object schemas
//! - [`validate`]: the validation engine and its options
//! - [`value`]: document values and [`ObjectId`]
//! - [`error`]: schema and validation errors

pub mod compile;
pub mod error;
pub mod schema;
pub mod validate;
pub mod value;

#[cfg(test)]
mod tests;

pub use compile::SchemaDef;
pub use error::{FieldError, SchemaError, ValidationError, ValidationResult};
pub use schema::{DefaultValue, External, Flags, Kind, Native, Presence, Rule, Schema};
pub use validate::ValidationOptions;
pub use value::{ObjectId, Value};
