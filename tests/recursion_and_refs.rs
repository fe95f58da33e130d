//! Recursion and Reference Tests
//!
//! Named definitions, recursive schemas, and traversal bounds:
//! - Ref/Definitions compile to direct handles; arena stays proportional
//!   to distinct nodes
//! - Deep input trips the depth limit as a single record
//! - Cyclic opaque objects are caught by identity
//! - Schema cache hits return the identical Arc

use std::sync::Arc;

use veritype::{
    compile, EngineConfig, FieldSchema, ModelSchema, OpaqueObject, OpaqueRef, Schema,
    SchemaCache, SchemaValidator, ValidateOptions, Value, ValueMap,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn tree_schema() -> Schema {
    Schema::definitions(
        Schema::reference("node"),
        vec![(
            "node".to_string(),
            Schema::model(ModelSchema::new(
                "Node",
                vec![
                    FieldSchema::new("label", Schema::str()),
                    FieldSchema::new(
                        "children",
                        Schema::with_default(
                            Schema::list(Schema::reference("node")),
                            Value::List(vec![]),
                        ),
                    ),
                ],
            )),
        )],
    )
}

fn node(label: &str, children: Vec<Value>) -> Value {
    Value::Map(
        vec![
            (Value::from("label"), Value::from(label)),
            (Value::from("children"), Value::List(children)),
        ]
        .into_iter()
        .collect::<ValueMap>(),
    )
}

#[derive(Debug)]
struct Linked {
    next: std::sync::Mutex<Option<OpaqueRef>>,
}

impl OpaqueObject for Linked {
    fn type_name(&self) -> &str {
        "Linked"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "next" => self
                .next
                .lock()
                .unwrap()
                .clone()
                .map(Value::Opaque)
                .or(Some(Value::Null)),
            _ => None,
        }
    }

    fn attribute_names(&self) -> Vec<String> {
        vec!["next".to_string()]
    }
}

// =============================================================================
// Recursive Schemas
// =============================================================================

/// A self-referential schema validates nested input of any reasonable depth.
#[test]
fn test_recursive_schema_validates() {
    let v = SchemaValidator::new(compile(&tree_schema(), EngineConfig::default()).unwrap());
    let input = node(
        "root",
        vec![node("a", vec![node("leaf", vec![])]), node("b", vec![])],
    );
    let out = v.validate_value(&input, &ValidateOptions::default()).unwrap();
    let Value::Model(root) = out else { panic!("expected model") };
    assert_eq!(root.get("label"), Some(&Value::from("root")));
}

/// The compiled arena size depends on distinct nodes, not expansion depth.
#[test]
fn test_arena_is_finite_for_recursive_schema() {
    let compiled = compile(&tree_schema(), EngineConfig::default()).unwrap();
    assert!(compiled.node_count() < 16);
}

/// An unresolved reference is a build error, not a runtime failure.
#[test]
fn test_unknown_ref_fails_at_build() {
    let schema = Schema::definitions(Schema::reference("missing"), vec![]);
    assert!(compile(&schema, EngineConfig::default()).is_err());
}

/// A definition whose body is a reference to a later definition enforces
/// the target's semantics, forward declaration order notwithstanding.
#[test]
fn test_forward_reference_definition_enforces_target() {
    let schema = Schema::definitions(
        Schema::reference("a"),
        vec![
            ("a".to_string(), Schema::reference("b")),
            ("b".to_string(), Schema::int()),
        ],
    );
    let v = SchemaValidator::new(compile(&schema, EngineConfig::default()).unwrap());

    let report = v
        .validate_value(&Value::from("hello"), &ValidateOptions::strict())
        .unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "int_type");

    let out = v
        .validate_value(&Value::from("5"), &ValidateOptions::default())
        .unwrap();
    assert_eq!(out, Value::Int(5));
}

/// Sibling definition scopes are independent name spaces.
#[test]
fn test_sibling_scopes_do_not_collide() {
    let scoped = |inner: Schema| {
        Schema::definitions(
            Schema::reference("node"),
            vec![("node".to_string(), inner)],
        )
    };
    let schema = Schema::tuple(vec![scoped(Schema::int()), scoped(Schema::str())]);
    let v = SchemaValidator::new(compile(&schema, EngineConfig::default()).unwrap());
    let out = v
        .validate_value(
            &Value::Tuple(vec![Value::Int(1), Value::from("x")]),
            &ValidateOptions::default(),
        )
        .unwrap();
    assert_eq!(out, Value::Tuple(vec![Value::Int(1), Value::from("x")]));
}

// =============================================================================
// Depth and Cycle Bounds
// =============================================================================

/// Input deeper than the limit fails with exactly one recursion record.
#[test]
fn test_depth_limit_single_record() {
    let v = SchemaValidator::new(compile(&tree_schema(), EngineConfig::default()).unwrap());
    let mut deep = node("leaf", vec![]);
    for _ in 0..200 {
        deep = node("n", vec![deep]);
    }
    let report = v
        .validate_value(&deep, &ValidateOptions::default())
        .unwrap_err();
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.records()[0].kind().code(), "recursion_limit");
}

/// The per-call limit override takes effect.
#[test]
fn test_recursion_limit_override() {
    let v = SchemaValidator::new(compile(&tree_schema(), EngineConfig::default()).unwrap());
    let shallow = node("root", vec![node("child", vec![])]);
    let opts = ValidateOptions {
        recursion_limit: Some(2),
        ..ValidateOptions::default()
    };
    assert!(!v.is_valid(&shallow, &opts));
    assert!(v.is_valid(&shallow, &ValidateOptions::default()));
}

/// A cyclic opaque object is detected by identity, not by depth.
#[test]
fn test_cyclic_opaque_detected() {
    let schema = Schema::definitions(
        Schema::reference("linked"),
        vec![(
            "linked".to_string(),
            Schema::model(ModelSchema::new(
                "Linked",
                vec![FieldSchema::new(
                    "next",
                    Schema::nullable(Schema::reference("linked")),
                )],
            )),
        )],
    );
    let v = SchemaValidator::new(compile(&schema, EngineConfig::default()).unwrap());

    let a = Arc::new(Linked {
        next: std::sync::Mutex::new(None),
    });
    let a_ref = OpaqueRef::new(a.clone());
    // Tie the knot: a.next = a.
    *a.next.lock().unwrap() = Some(a_ref.clone());

    let opts = ValidateOptions {
        from_attributes: Some(true),
        ..ValidateOptions::default()
    };
    let report = v
        .validate_value(&Value::Opaque(a_ref), &opts)
        .unwrap_err();
    assert_eq!(report.records()[0].kind().code(), "recursion_limit");
}

// =============================================================================
// Schema Cache
// =============================================================================

/// A cache hit returns the identical Arc; different schemas miss.
#[test]
fn test_cache_identity() {
    let mut cache = SchemaCache::new();
    let first = cache
        .compile(&Schema::list(Schema::int()), EngineConfig::default())
        .unwrap();
    let second = cache
        .compile(&Schema::list(Schema::int()), EngineConfig::default())
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let other = cache
        .compile(&Schema::list(Schema::str()), EngineConfig::default())
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(cache.len(), 2);
}

/// Configuration participates in the cache key.
#[test]
fn test_cache_keyed_by_config() {
    let mut cache = SchemaCache::new();
    let lax = cache
        .compile(&Schema::int(), EngineConfig::default())
        .unwrap();
    let strict = cache
        .compile(
            &Schema::int(),
            EngineConfig {
                strict: true,
                ..EngineConfig::default()
            },
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&lax, &strict));
}
