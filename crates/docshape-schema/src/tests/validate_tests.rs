//! Tests for the validation engine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

use crate::{
    Native, ObjectId, Schema, ValidationError, ValidationOptions, Value,
};

fn options() -> ValidationOptions {
    ValidationOptions::default()
}

fn first_code(result: Result<Value, ValidationError>) -> String {
    result.unwrap_err().details()[0].code.clone()
}

// =============================================================================
// Scalars
// =============================================================================

#[test]
fn test_string_base() {
    let result = Schema::string().validate(&Value::from(5), &options());
    let err = result.unwrap_err();
    assert_eq!(err.details()[0].code, "string.base");
    assert_eq!(err.to_string(), "\"value\" must be a string");
}

#[test]
fn test_empty_string_rejected() {
    assert_eq!(
        first_code(Schema::string().validate(&Value::from(""), &options())),
        "string.empty"
    );
}

#[test]
fn test_lowercase_converts() {
    let schema = Schema::string().lowercase();
    assert_eq!(
        schema.validate(&Value::from("ABC"), &options()),
        Ok(Value::from("abc"))
    );
}

#[test]
fn test_lowercase_without_convert_fails() {
    let schema = Schema::string().lowercase();
    let strict = options().with_convert(false);
    assert_eq!(
        first_code(schema.validate(&Value::from("ABC"), &strict)),
        "string.lowercase"
    );
    assert!(schema.validate(&Value::from("abc"), &strict).is_ok());
}

#[test]
fn test_string_length_rules() {
    let schema = Schema::string().min(2.0).max(4.0);
    assert_eq!(first_code(schema.validate(&Value::from("a"), &options())), "string.min");
    assert_eq!(
        first_code(schema.validate(&Value::from("abcde"), &options())),
        "string.max"
    );
    assert!(schema.validate(&Value::from("abc"), &options()).is_ok());
}

#[test]
fn test_pattern_rule() {
    let schema = Schema::string().try_pattern("^[0-9a-fA-F]{24}$").unwrap();
    assert!(
        schema
            .validate(&Value::from("5a0b4f1e2c3d4e5f60718293"), &options())
            .is_ok()
    );
    assert_eq!(
        first_code(schema.validate(&Value::from("nope"), &options())),
        "string.pattern.base"
    );
}

#[test]
fn test_invalid_pattern() {
    assert!(Schema::string().try_pattern("(").is_err());
}

#[test]
fn test_email_rule() {
    let schema = Schema::string().email();
    assert!(schema.validate(&Value::from("a@b.co"), &options()).is_ok());
    for bad in ["a@b", "@b.co", "a b@c.d", "a@b@c.d"] {
        assert_eq!(
            first_code(schema.validate(&Value::from(bad), &options())),
            "string.email"
        );
    }
}

#[test]
fn test_number_from_string() {
    let schema = Schema::number();
    assert_eq!(schema.validate(&Value::from("42"), &options()), Ok(Value::Number(42.0)));
    assert_eq!(
        first_code(schema.validate(&Value::from("42"), &options().with_convert(false))),
        "number.base"
    );
}

#[test]
fn test_number_rules() {
    let schema = Schema::number().integer().min(0.0).max(10.0);
    assert_eq!(first_code(schema.validate(&Value::from(1.5), &options())), "number.integer");
    assert_eq!(first_code(schema.validate(&Value::from(-1), &options())), "number.min");
    assert_eq!(first_code(schema.validate(&Value::from(11), &options())), "number.max");
    assert_eq!(
        first_code(schema.validate(&Value::from(f64::INFINITY), &options())),
        "number.infinity"
    );
}

#[test]
fn test_boolean_from_string() {
    assert_eq!(
        Schema::boolean().validate(&Value::from("TRUE"), &options()),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        first_code(Schema::boolean().validate(&Value::from("yes"), &options())),
        "boolean.base"
    );
}

#[test]
fn test_date_conversions() {
    let expected = Value::Date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    let schema = Schema::date();
    assert_eq!(
        schema.validate(&Value::from("2020-01-01T00:00:00Z"), &options()),
        Ok(expected.clone())
    );
    assert_eq!(
        schema.validate(&Value::from(1_577_836_800_000i64), &options()),
        Ok(expected)
    );
    assert_eq!(
        first_code(schema.validate(&Value::from("not a date"), &options())),
        "date.base"
    );
}

#[test]
fn test_binary_from_string() {
    assert_eq!(
        Schema::binary().validate(&Value::from("ab"), &options()),
        Ok(Value::Binary(vec![b'a', b'b']))
    );
    assert_eq!(
        first_code(Schema::binary().validate(&Value::from(1), &options())),
        "binary.base"
    );
}

// =============================================================================
// Flags
// =============================================================================

#[test]
fn test_valid_restricts_values() {
    let schema = Schema::string().valid(["a", "b"]);
    assert!(schema.validate(&Value::from("a"), &options()).is_ok());
    let err = schema.validate(&Value::from("c"), &options()).unwrap_err();
    assert_eq!(err.details()[0].code, "any.only");
    assert_eq!(err.to_string(), "\"value\" must be one of [\"a\", \"b\"]");
}

#[test]
fn test_allow_bypasses_rules() {
    let schema = Schema::number().allow([Value::Null]);
    assert_eq!(schema.validate(&Value::Null, &options()), Ok(Value::Null));
}

#[test]
fn test_empty_values_take_default() {
    let schema = Schema::string().empty([""]).with_default("fallback");
    assert_eq!(
        schema.validate(&Value::from(""), &options()),
        Ok(Value::from("fallback"))
    );
}

#[test]
fn test_forbidden() {
    let schema = Schema::object().with_key("secret", Schema::any().forbidden());
    let result = schema.validate(&Value::from(json!({ "secret": 1 })), &options());
    assert_eq!(first_code(result), "any.unknown");
    assert!(schema.validate(&Value::from(json!({})), &options()).is_ok());
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn test_required_key() {
    let schema = Schema::object().with_key("name", Schema::string().required());
    let err = schema
        .validate(&Value::from(json!({})), &options())
        .unwrap_err();
    assert_eq!(err.details()[0].path, "name");
    assert_eq!(err.details()[0].code, "any.required");
    assert_eq!(err.to_string(), "\"name\" is required");
}

#[test]
fn test_defaults_fill_missing_keys() {
    let schema = Schema::object()
        .with_key("count", Schema::number().with_default(3))
        .with_key("stamp", Schema::string().with_default_fn(|| json!("generated")));
    let value = schema.validate(&Value::from(json!({})), &options()).unwrap();
    assert_eq!(value.to_json(), json!({ "count": 3.0, "stamp": "generated" }));
}

#[test]
fn test_unknown_keys() {
    let schema = Schema::object().with_key("a", Schema::string());
    let input = Value::from(json!({ "a": "x", "b": 1 }));

    let err = schema.validate(&input, &options()).unwrap_err();
    assert_eq!(err.details()[0].path, "b");
    assert_eq!(err.details()[0].code, "object.unknown");

    let open = schema.validate(&input, &options().with_allow_unknown(true)).unwrap();
    assert_eq!(open.get("b"), Some(&Value::Number(1.0)));

    let flagged = Schema::object().with_key("a", Schema::string()).unknown(true);
    assert!(flagged.validate(&input, &options()).is_ok());
}

#[test]
fn test_nested_paths() {
    let schema = Schema::object().with_key(
        "profile",
        Schema::object().with_key("age", Schema::number()),
    );
    let err = schema
        .validate(&Value::from(json!({ "profile": { "age": "old" } })), &options())
        .unwrap_err();
    assert_eq!(err.details()[0].path, "profile.age");
    assert_eq!(err.details()[0].message, "\"age\" must be a number");
}

#[test]
fn test_collect_all_errors() {
    let schema = Schema::object()
        .with_key("a", Schema::string().required())
        .with_key("b", Schema::string().required());
    let input = Value::from(json!({}));

    let first_only = schema.validate(&input, &options()).unwrap_err();
    assert_eq!(first_only.details().len(), 1);

    let all = schema
        .validate(&input, &options().with_abort_early(false))
        .unwrap_err();
    assert_eq!(all.details().len(), 2);
    assert_eq!(all.to_string(), "\"a\" is required. \"b\" is required");
}

#[test]
fn test_object_instance() {
    let schema = Schema::object().instance(Native::ObjectId);
    let id = Value::from(ObjectId::from_bytes([7; 12]));
    assert_eq!(schema.validate(&id, &options()), Ok(id.clone()));
    assert_eq!(
        first_code(schema.validate(&Value::from(json!({})), &options())),
        "object.instance"
    );
}

// =============================================================================
// Arrays and alternatives
// =============================================================================

#[test]
fn test_array_items() {
    let schema = Schema::array().with_item(Schema::number());
    assert_eq!(
        schema.validate(&Value::from(json!(["1", 2])), &options()),
        Ok(Value::from(json!([1.0, 2.0])))
    );
    let err = schema
        .validate(&Value::from(json!([1, "x"])), &options())
        .unwrap_err();
    assert_eq!(err.details()[0].path, "1");
    assert_eq!(err.details()[0].code, "array.includes");
}

#[test]
fn test_array_single() {
    let schema = Schema::array().with_item(Schema::string());
    assert_eq!(first_code(schema.validate(&Value::from("a"), &options())), "array.base");
    assert_eq!(
        schema.single().validate(&Value::from("a"), &options()),
        Ok(Value::from(json!(["a"])))
    );
}

#[test]
fn test_array_size_rules() {
    let schema = Schema::array().min(1.0).max(2.0);
    assert_eq!(first_code(schema.validate(&Value::from(json!([])), &options())), "array.min");
    assert_eq!(
        first_code(schema.validate(&Value::from(json!([1, 2, 3])), &options())),
        "array.max"
    );
}

#[test]
fn test_alternatives_first_match_wins() {
    let schema = Schema::alternatives([Schema::number(), Schema::string()]);
    assert_eq!(schema.validate(&Value::from("12"), &options()), Ok(Value::Number(12.0)));
    assert_eq!(schema.validate(&Value::from("abc"), &options()), Ok(Value::from("abc")));
    assert_eq!(
        first_code(schema.validate(&Value::from(true), &options())),
        "alternatives.match"
    );
}

#[test]
fn test_alternatives_accept_identifier_instances() {
    let schema = Schema::alternatives([
        Schema::string().try_pattern("^[0-9a-f]{24}$").unwrap(),
        Schema::object().instance(Native::ObjectId),
    ]);
    let id = ObjectId::from_bytes([1; 12]);
    assert!(schema.validate(&Value::from(id), &options()).is_ok());
    assert!(schema.validate(&Value::from(id.to_hex()), &options()).is_ok());
    assert!(schema.validate(&Value::from("zz"), &options()).is_err());
}

// =============================================================================
// External rules
// =============================================================================

fn with_lookup() -> Schema {
    Schema::object().with_key(
        "name",
        Schema::string().external(|value| async move {
            match value.as_str() {
                Some("taken") => Err("name is taken".to_string()),
                _ => Ok(()),
            }
        }),
    )
}

#[test]
fn test_external_requires_async() {
    let schema = with_lookup();
    assert!(schema.has_externals());
    assert_eq!(
        schema.validate(&Value::from(json!({ "name": "free" })), &options()),
        Err(ValidationError::AsyncRequired)
    );
}

#[tokio::test]
async fn test_external_runs_async() {
    let schema = with_lookup();
    let ok = schema
        .validate_async(&Value::from(json!({ "name": "free" })), &options())
        .await;
    assert!(ok.is_ok());

    let err = schema
        .validate_async(&Value::from(json!({ "name": "taken" })), &options())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::External {
            path: "name".to_string(),
            message: "name is taken".to_string(),
        }
    );
}

#[tokio::test]
async fn test_external_skipped_when_sync_rules_fail() {
    let schema = with_lookup();
    let err = schema
        .validate_async(&Value::from(json!({ "name": 3 })), &options())
        .await
        .unwrap_err();
    assert_eq!(err.details()[0].code, "string.base");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Lowercase conversion always yields the lowercased input
    #[test]
    fn prop_lowercase_conversion(input in "[A-Za-z]{1,20}") {
        let result = Schema::string().lowercase().validate(&Value::from(input.clone()), &options());
        prop_assert_eq!(result, Ok(Value::String(input.to_lowercase())));
    }

    /// Numeric strings convert to the number they spell
    #[test]
    fn prop_numeric_strings_convert(n in -1_000_000i64..1_000_000) {
        let result = Schema::number().integer().validate(&Value::from(n.to_string()), &options());
        prop_assert_eq!(result, Ok(Value::Number(n as f64)));
    }

    /// Values outside a bound are always rejected with the bound's code
    #[test]
    fn prop_number_min_rejects_below(limit in -1000.0f64..1000.0, gap in 0.001f64..1000.0) {
        let result = Schema::number().min(limit).validate(&Value::from(limit - gap), &options());
        prop_assert_eq!(first_code(result), "number.min");
    }
}
