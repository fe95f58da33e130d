//! Model Semantics Tests
//!
//! Named-field aggregate behavior:
//! - Alias lookup before logical name, gated by populate_by_name
//! - Defaults (value and factory, optionally validated)
//! - Extra-key policies: ignore, forbid, capture
//! - from_attributes reads opaque host objects
//! - Single-field assignment revalidation

use std::sync::Arc;

use veritype::{
    compile, EngineConfig, ExtraPolicy, FieldSchema, ModelSchema, OpaqueObject, OpaqueRef,
    Schema, SchemaValidator, ValidateOptions, Value, ValueMap,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn validator(schema: Schema) -> SchemaValidator {
    SchemaValidator::new(compile(&schema, EngineConfig::default()).unwrap())
}

fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect::<ValueMap>(),
    )
}

#[derive(Debug)]
struct Account {
    user_name: String,
    balance: i64,
}

impl OpaqueObject for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "user_name" => Some(Value::from(self.user_name.clone())),
            "balance" => Some(Value::Int(self.balance)),
            _ => None,
        }
    }

    fn attribute_names(&self) -> Vec<String> {
        vec!["user_name".to_string(), "balance".to_string()]
    }
}

// =============================================================================
// Aliases
// =============================================================================

/// The alias is looked up before the logical name.
#[test]
fn test_alias_lookup() {
    let schema = Schema::model(ModelSchema::new(
        "User",
        vec![FieldSchema::new("name", Schema::str()).with_alias("userName")],
    ));
    let v = validator(schema);
    let out = v
        .validate_value(
            &map(vec![("userName", Value::from("ada"))]),
            &ValidateOptions::default(),
        )
        .unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    // Output always carries the logical name.
    assert_eq!(model.get("name"), Some(&Value::from("ada")));
}

/// Without populate_by_name the logical name does not populate an aliased
/// field; with it, both keys work.
#[test]
fn test_populate_by_name_gate() {
    let field = || FieldSchema::new("name", Schema::str()).with_alias("userName");
    let strict_alias = validator(Schema::model(ModelSchema::new("User", vec![field()])));
    assert!(!strict_alias.is_valid(
        &map(vec![("name", Value::from("ada"))]),
        &ValidateOptions::default()
    ));

    let by_name = validator(Schema::model(
        ModelSchema::new("User", vec![field()]).with_populate_by_name(),
    ));
    assert!(by_name.is_valid(
        &map(vec![("name", Value::from("ada"))]),
        &ValidateOptions::default()
    ));
}

// =============================================================================
// Defaults
// =============================================================================

/// A factory default is invoked per call.
#[test]
fn test_factory_default() {
    let schema = Schema::model(ModelSchema::new(
        "Doc",
        vec![FieldSchema::new(
            "tags",
            Schema::with_default_factory(
                Schema::list(Schema::str()),
                Arc::new(|| Value::List(vec![])),
            ),
        )],
    ));
    let v = validator(schema);
    let out = v
        .validate_value(&map(vec![]), &ValidateOptions::default())
        .unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert_eq!(model.get("tags"), Some(&Value::List(vec![])));
    assert!(!model.is_set("tags"));
}

/// A validated default runs through the inner node: coercible defaults
/// come out coerced, invalid ones surface as field errors.
#[test]
fn test_validated_default() {
    let coercible = validator(Schema::model(ModelSchema::new(
        "Doc",
        vec![FieldSchema::new(
            "count",
            Schema::with_default(Schema::int(), Value::from("5")).validating_default(),
        )],
    )));
    let out = coercible
        .validate_value(&map(vec![]), &ValidateOptions::default())
        .unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert_eq!(model.get("count"), Some(&Value::Int(5)));

    let broken = validator(Schema::model(ModelSchema::new(
        "Doc",
        vec![FieldSchema::new(
            "count",
            Schema::with_default(Schema::int(), Value::from("not-an-int")).validating_default(),
        )],
    )));
    let report = broken
        .validate_value(&map(vec![]), &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.records()[0].location().to_string(), "count");
}

// =============================================================================
// Extra Policies
// =============================================================================

/// Forbid reports one error per unknown key.
#[test]
fn test_extra_forbid() {
    let schema = Schema::model(
        ModelSchema::new("User", vec![FieldSchema::new("name", Schema::str())])
            .with_extra(ExtraPolicy::Forbid),
    );
    let v = validator(schema);
    let input = map(vec![
        ("name", Value::from("ada")),
        ("x", Value::Int(1)),
        ("y", Value::Int(2)),
    ]);
    let report = v
        .validate_value(&input, &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.error_count(), 2);
    assert!(report
        .records()
        .iter()
        .all(|r| r.kind().code() == "extra_forbidden"));
}

/// Capture keeps unknown keys on the validated model.
#[test]
fn test_extra_capture() {
    let schema = Schema::model(
        ModelSchema::new("User", vec![FieldSchema::new("name", Schema::str())])
            .with_extra(ExtraPolicy::Capture),
    );
    let v = validator(schema);
    let input = map(vec![("name", Value::from("ada")), ("note", Value::from("hi"))]);
    let out = v.validate_value(&input, &ValidateOptions::default()).unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert_eq!(model.get("note"), Some(&Value::from("hi")));
}

/// Ignore drops unknown keys silently.
#[test]
fn test_extra_ignore_default() {
    let schema = Schema::model(ModelSchema::new(
        "User",
        vec![FieldSchema::new("name", Schema::str())],
    ));
    let v = validator(schema);
    let input = map(vec![("name", Value::from("ada")), ("junk", Value::Int(1))]);
    let out = v.validate_value(&input, &ValidateOptions::default()).unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert!(model.get("junk").is_none());
}

// =============================================================================
// Opaque Host Objects
// =============================================================================

/// from_attributes reads fields through the attribute seam.
#[test]
fn test_from_attributes() {
    let schema = Schema::model(ModelSchema::new(
        "Account",
        vec![
            FieldSchema::new("user_name", Schema::str()),
            FieldSchema::new("balance", Schema::int()),
        ],
    ));
    let v = validator(schema);
    let obj = Value::Opaque(OpaqueRef::new(Arc::new(Account {
        user_name: "ada".to_string(),
        balance: 100,
    })));

    // Off by default.
    assert!(!v.is_valid(&obj, &ValidateOptions::default()));

    let opts = ValidateOptions {
        from_attributes: Some(true),
        ..ValidateOptions::default()
    };
    let out = v.validate_value(&obj, &opts).unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert_eq!(model.get("balance"), Some(&Value::Int(100)));
}

// =============================================================================
// Field Assignment
// =============================================================================

/// Assignment revalidates one field and marks it explicitly set.
#[test]
fn test_assignment_marks_field_set() {
    let schema = Schema::model(ModelSchema::new(
        "Config",
        vec![
            FieldSchema::new("host", Schema::str()),
            FieldSchema::new("port", Schema::with_default(Schema::int(), Value::Int(5432))),
        ],
    ));
    let v = validator(schema);
    let out = v
        .validate_value(
            &map(vec![("host", Value::from("localhost"))]),
            &ValidateOptions::default(),
        )
        .unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    assert!(!model.is_set("port"));

    let updated = v
        .validate_field_assignment(&model, "port", &Value::from("9000"), &ValidateOptions::default())
        .unwrap();
    assert_eq!(updated.get("port"), Some(&Value::Int(9000)));
    assert!(updated.is_set("port"));

    // The original model is untouched.
    assert!(!model.is_set("port"));
}

/// Assigning to an undeclared field fails with a path-qualified report.
#[test]
fn test_assignment_unknown_field() {
    let schema = Schema::model(ModelSchema::new(
        "Config",
        vec![FieldSchema::new("host", Schema::str())],
    ));
    let v = validator(schema);
    let out = v
        .validate_value(
            &map(vec![("host", Value::from("localhost"))]),
            &ValidateOptions::default(),
        )
        .unwrap();
    let Value::Model(model) = out else { panic!("expected model") };
    let report = v
        .validate_field_assignment(&model, "nope", &Value::Int(1), &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.records()[0].location().to_string(), "nope");
}
