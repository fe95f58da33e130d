//! Declarative schema descriptions.
//!
//! One tagged variant per node kind, each carrying its own constraints and
//! an optional node-local strict override. Descriptions are plain data
//! (plus shared closures for hooks, default factories, and tag selectors)
//! and are never mutated after compilation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

use super::hooks::Hook;

/// Numeric refinement bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumConstraints<T> {
    /// Inclusive lower bound.
    pub ge: Option<T>,
    /// Exclusive lower bound.
    pub gt: Option<T>,
    /// Inclusive upper bound.
    pub le: Option<T>,
    /// Exclusive upper bound.
    pub lt: Option<T>,
    /// Required divisor.
    pub multiple_of: Option<T>,
}

impl<T> NumConstraints<T> {
    /// True when no bound is declared.
    pub fn is_empty(&self) -> bool {
        self.ge.is_none()
            && self.gt.is_none()
            && self.le.is_none()
            && self.lt.is_none()
            && self.multiple_of.is_none()
    }
}

/// String refinement bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrConstraints {
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// Regex the whole string must match.
    pub pattern: Option<String>,
}

/// Collection length bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LenConstraints {
    /// Minimum number of items.
    pub min_length: Option<usize>,
    /// Maximum number of items.
    pub max_length: Option<usize>,
}

/// Where a default value comes from.
#[derive(Clone)]
pub enum DefaultSource {
    /// A fixed value, cloned on use.
    Value(Value),
    /// A factory invoked on each use.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultSource {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            DefaultSource::Value(v) => v.clone(),
            DefaultSource::Factory(f) => f(),
        }
    }

    pub(crate) fn identity(&self) -> u64 {
        match self {
            DefaultSource::Value(_) => 0,
            DefaultSource::Factory(f) => Arc::as_ptr(f) as *const () as u64,
        }
    }
}

impl fmt::Debug for DefaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSource::Value(v) => write!(f, "DefaultSource::Value({:?})", v),
            DefaultSource::Factory(_) => write!(f, "DefaultSource::Factory(..)"),
        }
    }
}

/// How a model treats input keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExtraPolicy {
    /// Drop unknown keys silently.
    #[default]
    Ignore,
    /// One `extra_forbidden` error per unknown key.
    Forbid,
    /// Keep unknown keys on the validated model.
    Capture,
}

/// One declared model field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Logical field name.
    pub name: String,
    /// The field's sub-schema; wrap with `Schema::with_default` to make the
    /// field optional.
    pub schema: Schema,
    /// Input key looked up before the logical name.
    pub alias: Option<String>,
    /// Output key used under `by_alias`, independent of the input alias.
    pub serialization_alias: Option<String>,
}

impl FieldSchema {
    /// A field validated against the given sub-schema.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            alias: None,
            serialization_alias: None,
        }
    }

    /// Sets the validation alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the serialization alias.
    pub fn with_serialization_alias(mut self, alias: impl Into<String>) -> Self {
        self.serialization_alias = Some(alias.into());
        self
    }
}

/// A model/struct node: named fields, aliasing, defaults, extra policy.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    /// Declared model name; doubles as the report title at the root.
    pub name: String,
    /// Declared fields, in order.
    pub fields: Vec<FieldSchema>,
    /// Unknown-key policy.
    pub extra: ExtraPolicy,
    /// Whether aliased fields may also be populated by their logical name.
    pub populate_by_name: bool,
    /// Node-local strict override.
    pub strict: Option<bool>,
}

impl ModelSchema {
    /// A model with the default policies.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
            extra: ExtraPolicy::default(),
            populate_by_name: false,
            strict: None,
        }
    }

    /// Sets the unknown-key policy.
    pub fn with_extra(mut self, extra: ExtraPolicy) -> Self {
        self.extra = extra;
        self
    }

    /// Allows aliased fields to be populated by logical name too.
    pub fn with_populate_by_name(mut self) -> Self {
        self.populate_by_name = true;
        self
    }
}

/// Union resolution discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnionMode {
    /// Try every member strictly first (exact match beats coercion), then
    /// laxly; declaration order breaks ties in both passes.
    #[default]
    Smart,
    /// Try members in order, accept the first success.
    LeftToRight,
}

/// How a tagged union extracts its tag from the input.
#[derive(Clone)]
pub enum Discriminator {
    /// Read a field of the input mapping/model.
    Field(String),
    /// Apply a selector function to the whole input.
    Selector(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>),
}

impl Discriminator {
    pub(crate) fn describe(&self) -> String {
        match self {
            Discriminator::Field(name) => name.clone(),
            Discriminator::Selector(_) => "<selector>".to_string(),
        }
    }

    pub(crate) fn identity(&self) -> u64 {
        match self {
            Discriminator::Field(_) => 0,
            Discriminator::Selector(f) => Arc::as_ptr(f) as *const () as u64,
        }
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Field(name) => write!(f, "Discriminator::Field({:?})", name),
            Discriminator::Selector(_) => write!(f, "Discriminator::Selector(..)"),
        }
    }
}

/// A declarative schema description.
///
/// Compiled once via [`crate::compile`] (or a [`super::SchemaCache`]) into
/// the executable validator/serializer trees.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Accept anything unchanged.
    Any,
    /// Accept only null.
    Null,
    /// Boolean.
    Bool { strict: Option<bool> },
    /// 64-bit signed integer.
    Int {
        constraints: NumConstraints<i64>,
        strict: Option<bool>,
    },
    /// 64-bit float.
    Float {
        constraints: NumConstraints<f64>,
        strict: Option<bool>,
    },
    /// UTF-8 string.
    Str {
        constraints: StrConstraints,
        strict: Option<bool>,
    },
    /// Byte string.
    Bytes {
        constraints: LenConstraints,
        strict: Option<bool>,
    },
    /// Timezone-aware timestamp.
    DateTime { strict: Option<bool> },
    /// Calendar date.
    Date { strict: Option<bool> },
    /// Wall-clock time.
    Time { strict: Option<bool> },
    /// Signed duration.
    Duration { strict: Option<bool> },
    /// UUID.
    Uuid { strict: Option<bool> },
    /// Single-host resource locator.
    Url { strict: Option<bool> },
    /// Multi-host resource locator.
    MultiHostUrl { strict: Option<bool> },
    /// One of a closed set of permitted values.
    Literal { expected: Vec<Value> },
    /// Homogeneous ordered sequence.
    List {
        item: Box<Schema>,
        constraints: LenConstraints,
        strict: Option<bool>,
    },
    /// Order-preserving unique sequence.
    Set {
        item: Box<Schema>,
        constraints: LenConstraints,
        strict: Option<bool>,
    },
    /// Fixed-arity positional sequence.
    Tuple {
        items: Vec<Schema>,
        strict: Option<bool>,
    },
    /// Mapping with typed keys and values.
    Map {
        key: Box<Schema>,
        value: Box<Schema>,
        constraints: LenConstraints,
        /// Accept a sequence of two-item sequences as entries.
        allow_pairs: bool,
        strict: Option<bool>,
    },
    /// Named-field aggregate.
    Model(ModelSchema),
    /// Untagged union.
    Union {
        members: Vec<Schema>,
        mode: UnionMode,
    },
    /// Discriminated union: the tag picks exactly one branch.
    TaggedUnion {
        discriminator: Discriminator,
        branches: Vec<(String, Schema)>,
    },
    /// Null or the inner schema.
    Nullable(Box<Schema>),
    /// Inner schema with a default for absent input.
    WithDefault {
        inner: Box<Schema>,
        default: DefaultSource,
        /// Run the default itself through the inner validator on use.
        validate_default: bool,
    },
    /// Inner schema wrapped by a user extension hook.
    Hook { inner: Box<Schema>, hook: Hook },
    /// Embedded JSON document, decoded then optionally validated.
    Json { inner: Option<Box<Schema>> },
    /// Named reference into the enclosing definitions.
    Ref(String),
    /// Scope introducing named definitions for `Ref` resolution.
    Definitions {
        root: Box<Schema>,
        definitions: Vec<(String, Schema)>,
    },
}

impl Schema {
    /// Accept anything unchanged.
    pub fn any() -> Self {
        Schema::Any
    }

    /// Accept only null.
    pub fn null() -> Self {
        Schema::Null
    }

    /// Boolean.
    pub fn bool() -> Self {
        Schema::Bool { strict: None }
    }

    /// Unconstrained integer.
    pub fn int() -> Self {
        Schema::Int {
            constraints: NumConstraints::default(),
            strict: None,
        }
    }

    /// Integer with bounds.
    pub fn int_with(constraints: NumConstraints<i64>) -> Self {
        Schema::Int {
            constraints,
            strict: None,
        }
    }

    /// Unconstrained float.
    pub fn float() -> Self {
        Schema::Float {
            constraints: NumConstraints::default(),
            strict: None,
        }
    }

    /// Float with bounds.
    pub fn float_with(constraints: NumConstraints<f64>) -> Self {
        Schema::Float {
            constraints,
            strict: None,
        }
    }

    /// Unconstrained string.
    pub fn str() -> Self {
        Schema::Str {
            constraints: StrConstraints::default(),
            strict: None,
        }
    }

    /// String with refinements.
    pub fn str_with(constraints: StrConstraints) -> Self {
        Schema::Str {
            constraints,
            strict: None,
        }
    }

    /// Byte string.
    pub fn bytes() -> Self {
        Schema::Bytes {
            constraints: LenConstraints::default(),
            strict: None,
        }
    }

    /// Timezone-aware timestamp.
    pub fn datetime() -> Self {
        Schema::DateTime { strict: None }
    }

    /// Calendar date.
    pub fn date() -> Self {
        Schema::Date { strict: None }
    }

    /// Wall-clock time.
    pub fn time() -> Self {
        Schema::Time { strict: None }
    }

    /// Signed duration.
    pub fn duration() -> Self {
        Schema::Duration { strict: None }
    }

    /// UUID.
    pub fn uuid() -> Self {
        Schema::Uuid { strict: None }
    }

    /// Single-host resource locator.
    pub fn url() -> Self {
        Schema::Url { strict: None }
    }

    /// Multi-host resource locator.
    pub fn multi_host_url() -> Self {
        Schema::MultiHostUrl { strict: None }
    }

    /// One of a closed set of permitted values.
    pub fn literal(expected: Vec<Value>) -> Self {
        Schema::Literal { expected }
    }

    /// Homogeneous list.
    pub fn list(item: Schema) -> Self {
        Schema::List {
            item: Box::new(item),
            constraints: LenConstraints::default(),
            strict: None,
        }
    }

    /// List with length bounds.
    pub fn list_with(item: Schema, constraints: LenConstraints) -> Self {
        Schema::List {
            item: Box::new(item),
            constraints,
            strict: None,
        }
    }

    /// Order-preserving unique sequence.
    pub fn set(item: Schema) -> Self {
        Schema::Set {
            item: Box::new(item),
            constraints: LenConstraints::default(),
            strict: None,
        }
    }

    /// Fixed-arity positional sequence.
    pub fn tuple(items: Vec<Schema>) -> Self {
        Schema::Tuple {
            items,
            strict: None,
        }
    }

    /// Mapping with typed keys and values.
    pub fn map(key: Schema, value: Schema) -> Self {
        Schema::Map {
            key: Box::new(key),
            value: Box::new(value),
            constraints: LenConstraints::default(),
            allow_pairs: false,
            strict: None,
        }
    }

    /// Mapping that also accepts a sequence of two-item sequences.
    pub fn map_allowing_pairs(key: Schema, value: Schema) -> Self {
        Schema::Map {
            key: Box::new(key),
            value: Box::new(value),
            constraints: LenConstraints::default(),
            allow_pairs: true,
            strict: None,
        }
    }

    /// Named-field aggregate.
    pub fn model(model: ModelSchema) -> Self {
        Schema::Model(model)
    }

    /// Smart-mode union.
    pub fn union(members: Vec<Schema>) -> Self {
        Schema::Union {
            members,
            mode: UnionMode::Smart,
        }
    }

    /// Left-to-right union.
    pub fn union_left_to_right(members: Vec<Schema>) -> Self {
        Schema::Union {
            members,
            mode: UnionMode::LeftToRight,
        }
    }

    /// Union discriminated by a tag field.
    pub fn tagged_union(
        discriminator_field: impl Into<String>,
        branches: Vec<(String, Schema)>,
    ) -> Self {
        Schema::TaggedUnion {
            discriminator: Discriminator::Field(discriminator_field.into()),
            branches,
        }
    }

    /// Union discriminated by a selector function.
    pub fn tagged_union_with_selector(
        selector: Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>,
        branches: Vec<(String, Schema)>,
    ) -> Self {
        Schema::TaggedUnion {
            discriminator: Discriminator::Selector(selector),
            branches,
        }
    }

    /// Null or the inner schema.
    pub fn nullable(inner: Schema) -> Self {
        Schema::Nullable(Box::new(inner))
    }

    /// Inner schema with a fixed default.
    pub fn with_default(inner: Schema, default: Value) -> Self {
        Schema::WithDefault {
            inner: Box::new(inner),
            default: DefaultSource::Value(default),
            validate_default: false,
        }
    }

    /// Inner schema with a default factory.
    pub fn with_default_factory(
        inner: Schema,
        factory: Arc<dyn Fn() -> Value + Send + Sync>,
    ) -> Self {
        Schema::WithDefault {
            inner: Box::new(inner),
            default: DefaultSource::Factory(factory),
            validate_default: false,
        }
    }

    /// Runs the configured default through the inner validator on use.
    pub fn validating_default(self) -> Self {
        match self {
            Schema::WithDefault {
                inner, default, ..
            } => Schema::WithDefault {
                inner,
                default,
                validate_default: true,
            },
            other => other,
        }
    }

    /// Wraps the inner schema with a user extension hook.
    pub fn hook(inner: Schema, hook: Hook) -> Self {
        Schema::Hook {
            inner: Box::new(inner),
            hook,
        }
    }

    /// Embedded JSON document.
    pub fn json(inner: Option<Schema>) -> Self {
        Schema::Json {
            inner: inner.map(Box::new),
        }
    }

    /// Named reference into the enclosing definitions.
    pub fn reference(name: impl Into<String>) -> Self {
        Schema::Ref(name.into())
    }

    /// Scope introducing named definitions.
    pub fn definitions(root: Schema, definitions: Vec<(String, Schema)>) -> Self {
        Schema::Definitions {
            root: Box::new(root),
            definitions,
        }
    }

    /// Embeds an unconditional strict/lax override on this node.
    pub fn with_strict(mut self, value: bool) -> Self {
        match &mut self {
            Schema::Bool { strict }
            | Schema::Int { strict, .. }
            | Schema::Float { strict, .. }
            | Schema::Str { strict, .. }
            | Schema::Bytes { strict, .. }
            | Schema::DateTime { strict }
            | Schema::Date { strict }
            | Schema::Time { strict }
            | Schema::Duration { strict }
            | Schema::Uuid { strict }
            | Schema::Url { strict }
            | Schema::MultiHostUrl { strict }
            | Schema::List { strict, .. }
            | Schema::Set { strict, .. }
            | Schema::Tuple { strict, .. }
            | Schema::Map { strict, .. } => *strict = Some(value),
            Schema::Model(model) => model.strict = Some(value),
            _ => {}
        }
        self
    }

    /// Short label used for report titles and union member naming.
    pub fn kind_label(&self) -> String {
        match self {
            Schema::Any => "any".into(),
            Schema::Null => "null".into(),
            Schema::Bool { .. } => "bool".into(),
            Schema::Int { .. } => "int".into(),
            Schema::Float { .. } => "float".into(),
            Schema::Str { .. } => "str".into(),
            Schema::Bytes { .. } => "bytes".into(),
            Schema::DateTime { .. } => "datetime".into(),
            Schema::Date { .. } => "date".into(),
            Schema::Time { .. } => "time".into(),
            Schema::Duration { .. } => "duration".into(),
            Schema::Uuid { .. } => "uuid".into(),
            Schema::Url { .. } => "url".into(),
            Schema::MultiHostUrl { .. } => "multi-host-url".into(),
            Schema::Literal { .. } => "literal".into(),
            Schema::List { .. } => "list".into(),
            Schema::Set { .. } => "set".into(),
            Schema::Tuple { .. } => "tuple".into(),
            Schema::Map { .. } => "map".into(),
            Schema::Model(model) => model.name.clone(),
            Schema::Union { .. } => "union".into(),
            Schema::TaggedUnion { .. } => "tagged-union".into(),
            Schema::Nullable(inner) => format!("nullable[{}]", inner.kind_label()),
            Schema::WithDefault { inner, .. } => inner.kind_label(),
            Schema::Hook { inner, .. } => inner.kind_label(),
            Schema::Json { .. } => "json".into(),
            Schema::Ref(name) => name.clone(),
            Schema::Definitions { root, .. } => root.kind_label(),
        }
    }
}
