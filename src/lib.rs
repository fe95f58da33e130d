//! veritype - A strict, deterministic schema validation and serialization engine
//!
//! A schema is described once with the constructors on [`Schema`], compiled
//! into an immutable node arena, and interpreted by two trees over the same
//! arena: a validator that coerces and checks input, and a serializer that
//! shapes validated output.
//!
//! ```
//! use veritype::{compile, EngineConfig, Schema, SchemaValidator, ValidateOptions, Value};
//!
//! let schema = Schema::list(Schema::int());
//! let compiled = compile(&schema, EngineConfig::default()).unwrap();
//! let validator = SchemaValidator::new(compiled);
//!
//! let input = Value::List(vec![Value::from("1"), Value::Int(2)]);
//! let out = validator.validate_value(&input, &ValidateOptions::default()).unwrap();
//! assert_eq!(out, Value::List(vec![Value::Int(1), Value::Int(2)]));
//! ```

use std::sync::Arc;

pub mod codec;
pub mod config;
pub mod errors;
pub mod schema;
pub mod serialize;
pub mod validate;
pub mod value;

pub use codec::{HostPart, LocatorUrl, MultiHostUrl, UrlParseError};
pub use config::EngineConfig;
pub use errors::{
    ErrorKind, ErrorRecord, Location, PathSeg, RenderOptions, SchemaBuildError,
    SerializationError, SerializationWarning, ValidationReport, WarningMode,
};
pub use schema::{
    CompiledSchema, DefaultSource, Discriminator, ExtraPolicy, FieldSchema, Hook, HookContext,
    HookError, HookResult, InnerFailure, InnerHandle, LenConstraints, ModelSchema, NodeId,
    NumConstraints, Schema, SchemaCache, StrConstraints, UnionMode,
};
pub use serialize::{
    serialize_any, serialize_any_json, FallbackFn, FilterKey, PathFilter, SchemaSerializer,
    SerializeOptions,
};
pub use validate::{SchemaValidator, ValidateOptions};
pub use value::{ModelValue, OpaqueObject, OpaqueRef, RawValue, Value, ValueMap};

/// Compiles a schema description under the given configuration.
///
/// The result is `Arc`-shared so validators and serializers built from it
/// reference one arena.
pub fn compile(
    schema: &Schema,
    config: EngineConfig,
) -> Result<Arc<CompiledSchema>, SchemaBuildError> {
    Ok(Arc::new(CompiledSchema::compile(schema, config)?))
}
