//! URL Node Engine Tests
//!
//! Locator nodes through validation and serialization:
//! - lax string coercion and strict native-only acceptance
//! - JSON input keeps the string affordance under strict
//! - multi-host authorities with per-host credentials
//! - parse failures surface as url_parsing records
//! - canonical (punycode) text on serialization

use veritype::{
    compile, EngineConfig, FieldSchema, HostPart, LocatorUrl, ModelSchema, MultiHostUrl, Schema,
    SchemaSerializer, SchemaValidator, SerializeOptions, ValidateOptions, Value, ValueMap,
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

fn strict() -> ValidateOptions {
    ValidateOptions {
        strict: Some(true),
        ..ValidateOptions::default()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Lax mode parses a string into a locator; strict mode requires the
/// native value.
#[test]
fn test_url_coercion_is_lax_only() {
    let (v, _) = engine(Schema::url());
    let input = Value::from("https://example.com/x?q=1");

    let out = v.validate_value(&input, &ValidateOptions::default()).unwrap();
    let Value::Url(url) = &out else { panic!("expected url") };
    assert_eq!(url.host(), "example.com");
    assert_eq!(url.query(), Some("q=1"));

    let report = v.validate_value(&input, &strict()).unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "url_type");

    let native = Value::Url(LocatorUrl::parse("https://example.com/").unwrap());
    assert!(v.is_valid(&native, &strict()));
}

/// JSON documents only carry strings, so strict JSON validation still
/// parses them.
#[test]
fn test_json_keeps_url_affordance_under_strict() {
    let (v, _) = engine(Schema::url());
    let out = v
        .validate_json("\"https://example.com/a\"", &strict())
        .unwrap();
    assert!(matches!(out, Value::Url(_)));
}

/// An unparsable string reports url_parsing, not a type mismatch.
#[test]
fn test_unparsable_string_reports_url_parsing() {
    let (v, _) = engine(Schema::url());
    let report = v
        .validate_value(&Value::from("not a locator"), &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "url_parsing");
}

/// Multi-host nodes keep every authority chunk with its own credentials.
#[test]
fn test_multi_host_validation() {
    let (v, _) = engine(Schema::multi_host_url());
    let out = v
        .validate_value(
            &Value::from("postgres://alice:pw@db1:5432,db2:5433/app"),
            &ValidateOptions::default(),
        )
        .unwrap();
    let Value::MultiHostUrl(url) = &out else { panic!("expected multi-host url") };
    assert_eq!(url.hosts().len(), 2);
    assert_eq!(url.hosts()[0].username(), Some("alice"));
    assert_eq!(url.hosts()[0].password(), Some("pw"));
    assert_eq!(url.hosts()[1].host(), "db2");
    assert_eq!(url.path(), Some("/app"));
}

/// A single-host locator widens to a multi-host node in lax mode.
#[test]
fn test_single_host_widens_in_lax() {
    let (v, _) = engine(Schema::multi_host_url());
    let single = Value::Url(LocatorUrl::parse("redis://cache:6379/0").unwrap());

    let out = v.validate_value(&single, &ValidateOptions::default()).unwrap();
    let Value::MultiHostUrl(url) = &out else { panic!("expected multi-host url") };
    assert_eq!(url.hosts().len(), 1);
    assert_eq!(url.hosts()[0].port(), Some(6379));

    let report = v.validate_value(&single, &strict()).unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "url_type");
}

/// A multi-host authority never narrows to a single-host node.
#[test]
fn test_multi_host_does_not_narrow() {
    let (v, _) = engine(Schema::url());
    let report = v
        .validate_value(
            &Value::from("mongodb://h1:27017,h2:27018/db"),
            &ValidateOptions::default(),
        )
        .unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "url_parsing");
}

/// Parse failures inside a model stay qualified by the field path.
#[test]
fn test_url_error_path_inside_model() {
    let (v, _) = engine(Schema::model(ModelSchema::new(
        "Service",
        vec![FieldSchema::new("endpoint", Schema::url())],
    )));
    let mut input = ValueMap::new();
    input.insert(Value::from("endpoint"), Value::from("::broken::"));
    let report = v
        .validate_value(&Value::Map(input), &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.records()[0].location().to_string(), "endpoint");
    assert_eq!(report.records()[0].kind().code(), "url_parsing");
}

// =============================================================================
// Serialization
// =============================================================================

/// Locators serialize to their canonical (punycoded, lowercased) text.
#[test]
fn test_serialized_text_is_canonical() {
    let (v, s) = engine(Schema::url());
    let out = v
        .validate_value(
            &Value::from("HTTPS://bücher.de/katalog"),
            &ValidateOptions::default(),
        )
        .unwrap();
    let bytes = s.serialize_json(&out, &SerializeOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "\"https://xn--bcher-kva.de/katalog\""
    );
}

/// Built multi-host locators round-trip through validate and serialize.
#[test]
fn test_built_multi_host_round_trip() {
    let built = MultiHostUrl::build(
        "mongodb",
        vec![
            HostPart::new("h1").unwrap().with_port(27017),
            HostPart::new("h2").unwrap().with_port(27018),
        ],
        Some("/db".into()),
        Some("replicaSet=rs0".into()),
        None,
    )
    .unwrap();

    let (v, s) = engine(Schema::multi_host_url());
    let validated = v
        .validate_value(&Value::MultiHostUrl(built.clone()), &strict())
        .unwrap();
    let bytes = s
        .serialize_json(&validated, &SerializeOptions::default())
        .unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        format!("\"{}\"", built)
    );
}
