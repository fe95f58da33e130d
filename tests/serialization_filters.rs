//! Serialization Filter and Shaping Tests
//!
//! Output shaping options:
//! - include/exclude path filters, nested and wildcarded
//! - by_alias, exclude_unset, exclude_defaults, exclude_none
//! - warning mode vs strict warning mode, fallback conversion
//! - schema-less serialize_any mirrors the option surface

use std::sync::Arc;

use veritype::{
    compile, serialize_any, serialize_any_json, EngineConfig, FieldSchema, ModelSchema,
    PathFilter, Schema, SchemaSerializer, SchemaValidator, SerializeOptions, ValidateOptions,
    Value, ValueMap, WarningMode,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn engine(schema: Schema) -> (SchemaValidator, SchemaSerializer) {
    let compiled = compile(&schema, EngineConfig::default()).unwrap();
    (
        SchemaValidator::new(compiled.clone()),
        SchemaSerializer::new(compiled),
    )
}

fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect::<ValueMap>(),
    )
}

fn team_schema() -> Schema {
    let member = Schema::model(ModelSchema::new(
        "Member",
        vec![
            FieldSchema::new("name", Schema::str()),
            FieldSchema::new("password", Schema::str()),
        ],
    ));
    Schema::model(ModelSchema::new(
        "Team",
        vec![
            FieldSchema::new("title", Schema::str()),
            FieldSchema::new("members", Schema::list(member)),
        ],
    ))
}

fn validated_team() -> (SchemaValidator, SchemaSerializer, Value) {
    let (v, s) = engine(team_schema());
    let input = map(vec![
        ("title", Value::from("core")),
        (
            "members",
            Value::List(vec![
                map(vec![
                    ("name", Value::from("ada")),
                    ("password", Value::from("s3cret")),
                ]),
                map(vec![
                    ("name", Value::from("grace")),
                    ("password", Value::from("hunter2")),
                ]),
            ]),
        ),
    ]);
    let validated = v.validate_value(&input, &ValidateOptions::default()).unwrap();
    (v, s, validated)
}

fn as_json(bytes: Vec<u8>) -> serde_json::Value {
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Path Filters
// =============================================================================

/// An include filter keeps only the named fields.
#[test]
fn test_include_filter() {
    let (_, s, team) = validated_team();
    let options = SerializeOptions {
        include: Some(PathFilter::fields(["title"])),
        ..SerializeOptions::default()
    };
    let out = as_json(s.serialize_json(&team, &options).unwrap());
    assert_eq!(out, serde_json::json!({"title": "core"}));
}

/// A nested wildcard exclude strips one field from every list element.
#[test]
fn test_wildcard_exclude_strips_nested_field() {
    let (_, s, team) = validated_team();
    let options = SerializeOptions {
        exclude: Some(PathFilter::leaf().field(
            "members",
            PathFilter::leaf().wildcard(PathFilter::fields(["password"])),
        )),
        ..SerializeOptions::default()
    };
    let out = as_json(s.serialize_json(&team, &options).unwrap());
    assert_eq!(
        out,
        serde_json::json!({
            "title": "core",
            "members": [{"name": "ada"}, {"name": "grace"}]
        })
    );
}

/// An index-specific filter beats the wildcard for that index.
#[test]
fn test_index_filter_beats_wildcard() {
    let (_, s, team) = validated_team();
    let options = SerializeOptions {
        include: Some(PathFilter::leaf().field(
            "members",
            PathFilter::leaf()
                .index(0, PathFilter::fields(["name"]))
                .wildcard(PathFilter::fields(["password"])),
        )),
        ..SerializeOptions::default()
    };
    let out = as_json(s.serialize_json(&team, &options).unwrap());
    assert_eq!(
        out,
        serde_json::json!({
            "members": [{"name": "ada"}, {"password": "hunter2"}]
        })
    );
}

// =============================================================================
// Shaping Switches
// =============================================================================

/// exclude_none drops null-valued fields.
#[test]
fn test_exclude_none() {
    let (v, s) = engine(Schema::model(ModelSchema::new(
        "Doc",
        vec![
            FieldSchema::new("a", Schema::nullable(Schema::int())),
            FieldSchema::new("b", Schema::int()),
        ],
    )));
    let validated = v
        .validate_value(
            &map(vec![("a", Value::Null), ("b", Value::Int(1))]),
            &ValidateOptions::default(),
        )
        .unwrap();
    let options = SerializeOptions {
        exclude_none: true,
        ..SerializeOptions::default()
    };
    let out = as_json(s.serialize_json(&validated, &options).unwrap());
    assert_eq!(out, serde_json::json!({"b": 1}));
}

/// Rich leaves encode to their canonical text forms.
#[test]
fn test_rich_leaf_encoding() {
    let (v, s) = engine(Schema::tuple(vec![
        Schema::datetime(),
        Schema::bytes(),
        Schema::duration(),
    ]));
    let validated = v
        .validate_json(
            "[\"2024-05-01T12:00:00Z\", \"hi\", \"PT90S\"]",
            &ValidateOptions::default(),
        )
        .unwrap();
    let out = as_json(s.serialize_json(&validated, &SerializeOptions::default()).unwrap());
    assert_eq!(
        out,
        serde_json::json!(["2024-05-01T12:00:00+00:00", "aGk=", "PT1M30S"])
    );
}

// =============================================================================
// Warnings and Fallback
// =============================================================================

/// Default mode emits best-effort output for mismatches; strict warning
/// mode fails with every collected warning.
#[test]
fn test_warning_modes() {
    let (_, s) = engine(Schema::list(Schema::int()));
    let mixed = Value::List(vec![Value::Int(1), Value::from("x"), Value::Bool(true)]);

    let lenient = s.serialize_native(&mixed, &SerializeOptions::default()).unwrap();
    assert_eq!(
        lenient,
        Value::List(vec![Value::Int(1), Value::from("x"), Value::Bool(true)])
    );

    let strict = SerializeOptions {
        warnings: WarningMode::Error,
        ..SerializeOptions::default()
    };
    let err = s.serialize_native(&mixed, &strict).unwrap_err();
    assert_eq!(err.warnings().len(), 2);
    let locations: Vec<String> = err
        .warnings()
        .iter()
        .map(|w| w.location.to_string())
        .collect();
    assert!(locations.contains(&"[1]".to_string()));
    assert!(locations.contains(&"[2]".to_string()));
}

/// The fallback runs before any warning is recorded.
#[test]
fn test_fallback_preempts_warning() {
    let (_, s) = engine(Schema::list(Schema::int()));
    let options = SerializeOptions {
        warnings: WarningMode::Error,
        fallback: Some(Arc::new(|v: &Value| {
            v.as_str().map(|s| Value::Int(s.len() as i64))
        })),
        ..SerializeOptions::default()
    };
    let mixed = Value::List(vec![Value::Int(1), Value::from("four")]);
    let out = s.serialize_native(&mixed, &options).unwrap();
    assert_eq!(out, Value::List(vec![Value::Int(1), Value::Int(4)]));
}

// =============================================================================
// Schema-less Serialization
// =============================================================================

/// serialize_any converts models to maps and honors filters.
#[test]
fn test_serialize_any() {
    let (_, _, team) = validated_team();
    let options = SerializeOptions {
        exclude: Some(PathFilter::leaf().field(
            "members",
            PathFilter::leaf().wildcard(PathFilter::fields(["password"])),
        )),
        ..SerializeOptions::default()
    };
    let out = serialize_any(&team, &options).unwrap();
    let Value::Map(map) = out else { panic!("expected map") };
    let Some(Value::List(members)) = map.get_str("members") else {
        panic!("expected members list")
    };
    let Value::Map(first) = &members[0] else { panic!("expected member map") };
    assert!(first.get_str("password").is_none());
    assert!(first.get_str("name").is_some());
}

/// serialize_any_json encodes without a compiled schema.
#[test]
fn test_serialize_any_json() {
    let value = map(vec![("n", Value::Int(1)), ("ok", Value::Bool(true))]);
    let bytes = serialize_any_json(&value, &SerializeOptions::default()).unwrap();
    assert_eq!(
        as_json(bytes),
        serde_json::json!({"n": 1, "ok": true})
    );
}
