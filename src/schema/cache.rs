//! Caller-owned schema compilation cache.
//!
//! Keyed by a structural content hash of the description plus the build
//! configuration. Closures (hooks, default factories, tag selectors) hash
//! by identity, so two descriptions sharing the same closure instances and
//! structure compile once. The cache is explicit state passed by the
//! caller; compilation itself stays side-effect free.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

use crate::config::EngineConfig;
use crate::errors::SchemaBuildError;
use crate::value::Value;

use super::compiler::CompiledSchema;
use super::node::{DefaultSource, Schema};

/// Memoizes compiled schemas by description content.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<u64, Arc<CompiledSchema>>,
}

impl SchemaCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles through the cache; a hit returns the identical `Arc`.
    pub fn compile(
        &mut self,
        schema: &Schema,
        config: EngineConfig,
    ) -> Result<Arc<CompiledSchema>, SchemaBuildError> {
        let key = cache_key(schema, &config);
        if let Some(hit) = self.entries.get(&key) {
            trace!(key, "schema cache hit");
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(CompiledSchema::compile(schema, config)?);
        self.entries.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(schema: &Schema, config: &EngineConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.title.hash(&mut hasher);
    config.strict.hash(&mut hasher);
    config.from_attributes.hash(&mut hasher);
    config.recursion_limit.hash(&mut hasher);
    hash_schema(schema, &mut hasher);
    hasher.finish()
}

fn hash_schema(schema: &Schema, h: &mut DefaultHasher) {
    schema.kind_label().hash(h);
    match schema {
        Schema::Any | Schema::Null => {}
        Schema::Bool { strict }
        | Schema::DateTime { strict }
        | Schema::Date { strict }
        | Schema::Time { strict }
        | Schema::Duration { strict }
        | Schema::Uuid { strict }
        | Schema::Url { strict }
        | Schema::MultiHostUrl { strict } => strict.hash(h),
        Schema::Int {
            constraints,
            strict,
        } => {
            for bound in [
                &constraints.ge,
                &constraints.gt,
                &constraints.le,
                &constraints.lt,
                &constraints.multiple_of,
            ] {
                bound.hash(h);
            }
            strict.hash(h);
        }
        Schema::Float {
            constraints,
            strict,
        } => {
            for bound in [
                constraints.ge,
                constraints.gt,
                constraints.le,
                constraints.lt,
                constraints.multiple_of,
            ] {
                bound.map(f64::to_bits).hash(h);
            }
            strict.hash(h);
        }
        Schema::Str {
            constraints,
            strict,
        } => {
            constraints.min_length.hash(h);
            constraints.max_length.hash(h);
            constraints.pattern.hash(h);
            strict.hash(h);
        }
        Schema::Bytes {
            constraints,
            strict,
        } => {
            constraints.min_length.hash(h);
            constraints.max_length.hash(h);
            strict.hash(h);
        }
        Schema::Literal { expected } => {
            for value in expected {
                hash_value(value, h);
            }
        }
        Schema::List {
            item,
            constraints,
            strict,
        }
        | Schema::Set {
            item,
            constraints,
            strict,
        } => {
            hash_schema(item, h);
            constraints.min_length.hash(h);
            constraints.max_length.hash(h);
            strict.hash(h);
        }
        Schema::Tuple { items, strict } => {
            items.len().hash(h);
            for item in items {
                hash_schema(item, h);
            }
            strict.hash(h);
        }
        Schema::Map {
            key,
            value,
            constraints,
            allow_pairs,
            strict,
        } => {
            hash_schema(key, h);
            hash_schema(value, h);
            constraints.min_length.hash(h);
            constraints.max_length.hash(h);
            allow_pairs.hash(h);
            strict.hash(h);
        }
        Schema::Model(model) => {
            model.name.hash(h);
            model.extra.hash(h);
            model.populate_by_name.hash(h);
            model.strict.hash(h);
            model.fields.len().hash(h);
            for field in &model.fields {
                field.name.hash(h);
                field.alias.hash(h);
                field.serialization_alias.hash(h);
                hash_schema(&field.schema, h);
            }
        }
        Schema::Union { members, mode } => {
            (*mode as u8).hash(h);
            members.len().hash(h);
            for member in members {
                hash_schema(member, h);
            }
        }
        Schema::TaggedUnion {
            discriminator,
            branches,
        } => {
            discriminator.describe().hash(h);
            discriminator.identity().hash(h);
            branches.len().hash(h);
            for (tag, branch) in branches {
                tag.hash(h);
                hash_schema(branch, h);
            }
        }
        Schema::Nullable(inner) => hash_schema(inner, h),
        Schema::WithDefault {
            inner,
            default,
            validate_default,
        } => {
            hash_schema(inner, h);
            match default {
                DefaultSource::Value(value) => hash_value(value, h),
                DefaultSource::Factory(_) => default.identity().hash(h),
            }
            validate_default.hash(h);
        }
        Schema::Hook { inner, hook } => {
            hash_schema(inner, h);
            hook.identity().hash(h);
        }
        Schema::Json { inner } => {
            if let Some(inner) = inner {
                hash_schema(inner, h);
            }
        }
        Schema::Ref(name) => name.hash(h),
        Schema::Definitions { root, definitions } => {
            hash_schema(root, h);
            definitions.len().hash(h);
            for (name, def) in definitions {
                name.hash(h);
                hash_schema(def, h);
            }
        }
    }
}

fn hash_value(value: &Value, h: &mut DefaultHasher) {
    value.kind_name().hash(h);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(h),
        Value::Int(i) => i.hash(h),
        Value::Float(x) => x.to_bits().hash(h),
        Value::Str(s) => s.hash(h),
        Value::Bytes(b) => b.hash(h),
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
            items.len().hash(h);
            for item in items {
                hash_value(item, h);
            }
        }
        Value::Map(map) => {
            map.len().hash(h);
            for (k, v) in map.iter() {
                hash_value(k, h);
                hash_value(v, h);
            }
        }
        other => other.to_string().hash(h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, ModelSchema};

    #[test]
    fn test_cache_hit_returns_same_arc() {
        let mut cache = SchemaCache::new();
        let schema = Schema::model(ModelSchema::new(
            "User",
            vec![FieldSchema::new("name", Schema::str())],
        ));
        let a = cache.compile(&schema, EngineConfig::default()).unwrap();
        let b = cache.compile(&schema, EngineConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_schemas_miss() {
        let mut cache = SchemaCache::new();
        cache.compile(&Schema::int(), EngineConfig::default()).unwrap();
        cache.compile(&Schema::str(), EngineConfig::default()).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_config_participates_in_key() {
        let mut cache = SchemaCache::new();
        cache.compile(&Schema::int(), EngineConfig::default()).unwrap();
        cache
            .compile(
                &Schema::int(),
                EngineConfig {
                    strict: true,
                    ..EngineConfig::default()
                },
            )
            .unwrap();
        assert_eq!(cache.len(), 2);
    }
}
