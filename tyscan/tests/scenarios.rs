//! End-to-end scenarios exercising the parser against a caller-style
//! `ExpectedType` tree rather than against individual collaborators.

use charsrc::Reader;
use tyscan::{parse, DataProjection, Error, ExpectedType, FieldSpec, IntWidth, ParserOptions, ScalarKind, Value};

fn parse_str(input: &str, options: &ParserOptions, expected: &ExpectedType) -> Result<Value, Error> {
    let mut bytes = input.as_bytes();
    let mut reader = Reader::new(&mut bytes);
    parse(&mut reader, options, expected)
}

fn user_record() -> ExpectedType {
    ExpectedType::record(
        vec![
            FieldSpec::renamed("userId", "user-id", ExpectedType::scalar(ScalarKind::Int(IntWidth::I32)), true, false),
            FieldSpec::new("name", ExpectedType::scalar(ScalarKind::String), true, false),
        ],
        None,
    )
}

#[test]
fn strict_record_with_rename() {
    let options = ParserOptions::default();
    let value = parse_str(r#"{"user-id": 7, "name": "Ada"}"#, &options, &user_record()).unwrap();
    let Value::Map(map) = value else { panic!("expected a map") };
    assert_eq!(map.entries.get("userId"), Some(&Value::Int(7)));
    assert_eq!(map.entries.get("name"), Some(&Value::String("Ada".to_string())));
}

#[test]
fn duplicate_declared_field_keeps_first_definition() {
    let options = ParserOptions::default();
    let value = parse_str(
        r#"{"user-id": 7, "name": "Ada", "user-id": 9}"#,
        &options,
        &user_record(),
    )
    .unwrap();
    let Value::Map(map) = value else { panic!("expected a map") };
    assert_eq!(map.entries.get("userId"), Some(&Value::Int(7)));
}

fn string_map() -> ExpectedType {
    ExpectedType::Map {
        value: Box::new(ExpectedType::scalar(ScalarKind::String)),
    }
}

#[test]
fn duplicate_map_key_keeps_last_write() {
    let options = ParserOptions::default();
    let value = parse_str(r#"{"k": "first", "k": "second"}"#, &options, &string_map()).unwrap();
    let Value::Map(map) = value else { panic!("expected a map") };
    assert_eq!(map.entries.get("k"), Some(&Value::String("second".to_string())));
}

#[test]
fn projection_drops_undeclared_key() {
    let options = ParserOptions {
        allow_data_projection: DataProjection::Allow {
            absent_as_nilable_type: false,
            nil_as_optional_field: false,
        },
        ..ParserOptions::default()
    };
    let value = parse_str(r#"{"user-id":7,"name":"Ada","extra":true}"#, &options, &user_record()).unwrap();
    let Value::Map(map) = value else { panic!("expected a map") };
    assert_eq!(map.entries.len(), 2);
    assert!(!map.entries.contains_key("extra"));
}

#[test]
fn strict_rejects_undeclared_key() {
    let options = ParserOptions::default();
    let err = parse_str(r#"{"user-id":7,"name":"Ada","extra":true}"#, &options, &user_record()).unwrap_err();
    assert!(matches!(err, Error::UndefinedField { .. }));
}

fn int_or_string() -> ExpectedType {
    ExpectedType::Union {
        members: vec![
            ExpectedType::scalar(ScalarKind::Int(IntWidth::I32)),
            ExpectedType::scalar(ScalarKind::String),
        ],
    }
}

#[test]
fn union_fallback_picks_matching_member() {
    let options = ParserOptions::default();
    let et = int_or_string();
    assert_eq!(parse_str(r#""42""#, &options, &et).unwrap(), Value::String("42".to_string()));
    assert_eq!(parse_str("42", &options, &et).unwrap(), Value::Int(42));
}

fn pair_tuple() -> ExpectedType {
    ExpectedType::Tuple {
        elements: vec![
            ExpectedType::scalar(ScalarKind::Int(IntWidth::I32)),
            ExpectedType::scalar(ScalarKind::String),
        ],
        readonly: false,
    }
}

#[test]
fn closed_tuple_overflow_trimmed_when_projected() {
    let options = ParserOptions {
        allow_data_projection: DataProjection::project_with_defaults(),
        ..ParserOptions::default()
    };
    let value = parse_str(r#"[1,"a","b"]"#, &options, &pair_tuple()).unwrap();
    let Value::Array(arr) = value else { panic!("expected an array") };
    assert_eq!(arr.items, vec![Value::Int(1), Value::String("a".to_string())]);
}

#[test]
fn closed_tuple_overflow_fatal_when_strict() {
    let options = ParserOptions::default();
    let err = parse_str(r#"[1,"a","b"]"#, &options, &pair_tuple()).unwrap_err();
    assert!(matches!(err, Error::ArrayTooLong { declared_size: 2, .. }));
}

fn a_and_required_nilable_b() -> ExpectedType {
    ExpectedType::record(
        vec![
            FieldSpec::new("a", ExpectedType::scalar(ScalarKind::Int(IntWidth::I32)), true, false),
            FieldSpec::new("b", ExpectedType::scalar(ScalarKind::Int(IntWidth::I32)), true, true),
        ],
        None,
    )
}

#[test]
fn required_field_missing_without_projection() {
    let options = ParserOptions::default();
    let err = parse_str(r#"{"a":1}"#, &options, &a_and_required_nilable_b()).unwrap_err();
    assert!(matches!(err, Error::RequiredFieldMissing { ref field_name, .. } if field_name == "b"));
}

#[test]
fn required_nilable_field_missing_is_absent_as_nilable() {
    let options = ParserOptions {
        allow_data_projection: DataProjection::Allow {
            absent_as_nilable_type: true,
            nil_as_optional_field: false,
        },
        ..ParserOptions::default()
    };
    let value = parse_str(r#"{"a":1}"#, &options, &a_and_required_nilable_b()).unwrap();
    let Value::Map(map) = value else { panic!("expected a map") };
    assert_eq!(map.entries.get("a"), Some(&Value::Int(1)));
    assert_eq!(map.entries.get("b"), Some(&Value::Null));
}

#[test]
fn escape_handling_decodes_unicode_hex() {
    let options = ParserOptions::default();
    let et = ExpectedType::scalar(ScalarKind::String);
    let value = parse_str("\"a\\u00e9b\"", &options, &et).unwrap();
    assert_eq!(value, Value::String("aéb".to_string()));
}
