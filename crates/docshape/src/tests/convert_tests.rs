//! Tests for the converter.

use docshape_schema::{Kind, Schema, SchemaDef, SchemaError};
use proptest::prelude::*;
use serde_json::json;

use super::{converter, field};
use crate::{ConvertError, ConvertOptions, Descriptor, FieldType};

// =============================================================================
// Leaves
// =============================================================================

#[test]
fn test_convert_string() {
    let descriptor = converter().convert(Schema::string()).unwrap();
    let string = descriptor.as_field().unwrap();
    assert!(matches!(string.field_type(), Some(FieldType::String)));
    assert!(string.validator().is_some());
    assert_eq!(
        descriptor.to_value(),
        json!({ "validate": "[validator]", "type": "String" })
    );
}

#[test]
fn test_convert_any_is_mixed() {
    let descriptor = converter()
        .convert(Schema::object().with_key("other_info", Schema::any()))
        .unwrap();
    let other = field(&descriptor, "other_info");
    assert!(matches!(other.field_type(), Some(FieldType::Mixed)));
    assert!(other.validator().is_some());
}

#[test]
fn test_required_field() {
    let descriptor = converter()
        .convert(Schema::object().with_key("name", Schema::string().required()))
        .unwrap();
    assert_eq!(
        descriptor.to_value(),
        json!({ "name": { "validate": "[validator]", "required": true, "type": "String" } })
    );
}

#[test]
fn test_default_values() {
    let descriptor = converter()
        .convert(
            Schema::object()
                .with_key("name", Schema::string().with_default("Barry White"))
                .with_key("stamp", Schema::date().with_default_fn(|| json!("now"))),
        )
        .unwrap();
    let value = descriptor.to_value();
    assert_eq!(value["name"]["default"], json!("Barry White"));
    assert_eq!(value["stamp"]["default"], json!("[factory]"));

    let stamp = field(&descriptor, "stamp");
    assert_eq!(stamp.default_value().map(|d| d.resolve()), Some(json!("now")));
}

#[test]
fn test_annotations_copied_and_strings_skipped() {
    let descriptor = converter()
        .convert(
            Schema::object().with_key(
                "name",
                Schema::string()
                    .meta(json!({ "index": true }))
                    .meta(json!({ "bud": true }))
                    .meta("no no no"),
            ),
        )
        .unwrap();
    assert_eq!(
        descriptor.to_value(),
        json!({
            "name": { "index": true, "bud": true, "validate": "[validator]", "type": "String" }
        })
    );
}

#[test]
fn test_identifier_with_reference() {
    let descriptor = converter()
        .convert(
            Schema::object().with_key(
                "m_id",
                Schema::string()
                    .try_pattern("^[0-9a-fA-F]{24}$")
                    .unwrap()
                    .meta(json!({ "type": "ObjectId", "ref": "Merchant" })),
            ),
        )
        .unwrap();
    let id = field(&descriptor, "m_id");
    assert!(matches!(id.field_type(), Some(FieldType::ObjectId)));
    assert_eq!(id.extra("ref"), Some(&json!("Merchant")));
    assert!(id.validator().is_some_and(|v| v.is_identifier()));
}

#[test]
fn test_declared_type_skips_resolution() {
    let descriptor = converter()
        .convert(Schema::binary().meta(json!({ "type": "Buffer" })))
        .unwrap();
    let buffer = descriptor.as_field().unwrap();
    assert!(matches!(buffer.field_type(), Some(FieldType::Declared(t)) if t == "Buffer"));
    assert!(buffer.validator().is_some());
}

#[test]
fn test_unset_declared_type_falls_back_to_resolution() {
    let descriptor = converter()
        .convert(Schema::object().with_key("count", Schema::number().meta(json!({ "type": false }))))
        .unwrap();
    let count = field(&descriptor, "count");
    assert!(matches!(count.field_type(), Some(FieldType::Number)));
    assert!(count.validator().is_some());
}

#[test]
fn test_custom_type_key() {
    let options = ConvertOptions::new().with_type_key("kind");
    let descriptor = converter()
        .convert_with(
            Schema::object()
                .with_key("name", Schema::string().meta(json!({ "type": "Label" })))
                .with_key("owner", Schema::string().meta(json!({ "type": "ObjectId" })))
                .with_key("extra", Schema::object()),
            &options,
        )
        .unwrap();
    assert_eq!(
        descriptor.to_value(),
        json!({
            "name": { "type": "Label", "validate": "[validator]", "kind": "String" },
            "owner": { "validate": "[validator]", "kind": "ObjectId" },
            "extra": { "kind": "Mixed" }
        })
    );
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn test_open_objects_are_mixed() {
    let c = converter();
    for schema in [
        Schema::object(),
        Schema::object().with_keys(Vec::<(String, Schema)>::new()),
        Schema::object().with_key("a", Schema::string()).unknown(true),
    ] {
        let descriptor = c.convert(schema).unwrap();
        assert_eq!(descriptor.to_value(), json!({ "type": "Mixed" }));
    }
}

#[test]
fn test_nested_objects() {
    let descriptor = converter()
        .convert(
            Schema::object().with_key(
                "name",
                Schema::object()
                    .with_key("first", Schema::string())
                    .with_key("last", Schema::string())
                    .required()
                    .with_default(json!({ "first": "Barry" }))
                    .meta(json!({ "index": true })),
            ),
        )
        .unwrap();

    let name = descriptor.get("name").unwrap();
    let fields = name.as_fields().unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["first", "last"]);
    assert!(matches!(
        field(&descriptor, "name.first").field_type(),
        Some(FieldType::String)
    ));
    assert!(name.to_value().get("required").is_none());
}

#[test]
fn test_plain_definition_is_implicit_object() {
    let c = converter();
    let implicit = c.convert(vec![("name", Schema::string())]).unwrap();
    let explicit = c.convert(Schema::object().with_key("name", Schema::string())).unwrap();
    assert_eq!(implicit.to_value(), explicit.to_value());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_input() {
    let err = converter().convert(SchemaDef::Missing).unwrap_err();
    assert_eq!(err, ConvertError::EmptyInput);
    assert_eq!(err.to_string(), "Ensure the value you're trying to convert exists!");
    assert!(err.is_input_error());
}

#[test]
fn test_non_schema_input() {
    let err = converter().convert("hello!").unwrap_err();
    assert_eq!(err, ConvertError::InputShape(SchemaError::InvalidObjectSchema));
    assert_eq!(err.to_string(), "Object schema must be a valid object");
}

#[test]
fn test_unsupported_kind() {
    let err = converter()
        .convert(Schema::object().with_key("image", Schema::binary()))
        .unwrap_err();
    assert_eq!(err, ConvertError::UnsupportedType { kind: Kind::Binary });
    assert_eq!(err.to_string(), "Unsupported schema type: \"binary\"");
    assert!(!err.is_input_error());
}

// =============================================================================
// Properties
// =============================================================================

fn leaf_kind() -> impl Strategy<Value = (Kind, &'static str)> {
    prop::sample::select(vec![
        (Kind::String, "String"),
        (Kind::Number, "Number"),
        (Kind::Boolean, "Boolean"),
        (Kind::Date, "Date"),
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Leaf kinds map to their primitive type and always get a validator
    #[test]
    fn prop_leaf_kinds(
        (kind, name) in leaf_kind(),
        required in any::<bool>(),
    ) {
        let schema = if required { Schema::bare(kind).required() } else { Schema::bare(kind) };
        let descriptor = converter().convert(schema).unwrap();
        let leaf = descriptor.as_field().unwrap();
        prop_assert_eq!(leaf.field_type().map(FieldType::instance_name), Some(name.to_string()));
        prop_assert!(leaf.validator().is_some());
        prop_assert_eq!(leaf.is_required(), required);
    }

    /// Object fields never carry the required marker
    #[test]
    fn prop_objects_never_required(names in prop::collection::btree_set("[a-z]{1,8}", 1..5)) {
        let schema = names.iter().fold(Schema::object(), |schema, name| {
            schema.with_key(
                name.clone(),
                Schema::object().with_key("inner", Schema::string()).required(),
            )
        });
        let descriptor = converter().convert(schema).unwrap();
        for name in &names {
            let child = descriptor.get(name).unwrap();
            prop_assert!(matches!(child, Descriptor::Fields(_)));
            prop_assert!(child.to_value().get("required").is_none());
        }
    }
}
