//! Metadata resolution.
//!
//! Annotations attached with [`Schema::meta`] are free-form JSON values. Only
//! JSON objects ("records") carry meaning here; strings and other scalars are
//! descriptions and are skipped. A record entry `type: "ObjectId"` marks the
//! field as a document identifier. Every other entry is copied onto the
//! generated descriptor.

use docshape_schema::Schema;
use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::config::SchemaOptions;
use crate::model::FieldType;

/// Annotation key naming a field type.
pub const TYPE_ANNOTATION: &str = "type";
/// Annotation value marking a document identifier.
pub const IDENTIFIER_TYPE: &str = "ObjectId";

/// Key/value annotation records of a node, in attachment order.
pub fn records(schema: &Schema) -> impl Iterator<Item = &Map<String, Json>> {
    schema.metas().iter().filter_map(Json::as_object)
}

/// A declared type only counts when it is set to something: `null`,
/// `false`, `0` and `""` leave the type to be resolved.
fn declared(value: &Json) -> Option<FieldType> {
    let set = match value {
        Json::Null => false,
        Json::Bool(flag) => *flag,
        Json::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    };
    set.then(|| FieldType::Declared(value.clone()))
}

fn is_identifier_entry(key: &str, value: &Json) -> bool {
    key == TYPE_ANNOTATION && value.as_str() == Some(IDENTIFIER_TYPE)
}

/// Whether a node is identifier-typed.
///
/// Only the first entry of the first non-empty record is inspected: the
/// node is identifier-typed exactly when that entry is `type: "ObjectId"`.
///
/// # Example
/// ```rust
/// use docshape::meta::is_object_id;
/// use docshape_schema::Schema;
/// use serde_json::json;
///
/// assert!(is_object_id(&Schema::string().meta(json!({ "type": "ObjectId", "ref": "User" }))));
/// assert!(!is_object_id(&Schema::string().meta(json!({ "ref": "User", "type": "ObjectId" }))));
/// assert!(!is_object_id(&Schema::string().meta("an identifier")));
/// ```
pub fn is_object_id(schema: &Schema) -> bool {
    records(schema)
        .find_map(|record| record.iter().next())
        .is_some_and(|(key, value)| is_identifier_entry(key, value))
}

/// What a node's annotations contribute to its descriptor.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    /// An identifier entry was found.
    pub identifier: bool,
    /// Field type set by the annotations; the last one wins.
    pub field_type: Option<FieldType>,
    /// Remaining entries, later records overriding earlier ones.
    pub extra: Map<String, Json>,
}

/// Scan every entry of every record.
///
/// `type: "ObjectId"` sets the identifier type. An entry whose key is
/// `type_key` supplies a declared type verbatim, or clears it when the value
/// is unset. Anything else is an extra.
pub fn scan(schema: &Schema, type_key: &str) -> Annotations {
    let mut found = Annotations::default();
    for record in records(schema) {
        for (key, value) in record {
            if is_identifier_entry(key, value) {
                found.identifier = true;
                found.field_type = Some(FieldType::ObjectId);
            } else if key == type_key {
                found.field_type = declared(value);
            } else {
                found.extra.insert(key.clone(), value.clone());
            }
        }
    }
    if found.identifier {
        trace!(kind = %schema.kind(), "Identifier annotation found");
    }
    found
}

/// Sub-schema options for an array node: `base` overlaid with every record
/// of the node in order.
pub fn schema_options(schema: &Schema, base: Option<&SchemaOptions>) -> SchemaOptions {
    let mut options = base.cloned().unwrap_or_default();
    for record in schema.metas() {
        options.merge_record(record);
    }
    options
}
