//! The schema-driven serializer.
//!
//! A second interpreter over the same compiled arena the validator uses.
//! Serialization is best-effort: a value that does not match its node takes
//! the caller's fallback, then the inferred any-serializer with a collected
//! warning; only strict warning mode turns mismatches into a failure.

use std::sync::Arc;

use crate::errors::{PathSeg, SerializationError};
use crate::schema::{CField, CModel, CNode, CompiledSchema, Discriminator, NodeId};
use crate::value::{ModelValue, Value};

use super::any::{encode_json, ser_any, SerState};
use super::filter::{entry_filters, PathFilter};
use super::options::SerializeOptions;

/// Serializes validated values against one compiled schema.
///
/// Cheap to clone and safe to call concurrently.
#[derive(Clone)]
pub struct SchemaSerializer {
    schema: Arc<CompiledSchema>,
}

impl SchemaSerializer {
    /// A serializer over the given compiled schema.
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self { schema }
    }

    /// The compiled schema this serializer interprets.
    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Serializes to the native value representation: models become maps,
    /// leaves keep their typed form.
    pub fn serialize_native(
        &self,
        value: &Value,
        options: &SerializeOptions,
    ) -> Result<Value, SerializationError> {
        let mut state = SerState::new(options, self.schema.config().recursion_limit);
        let walker = Walker {
            schema: &self.schema,
        };
        let out = walker.ser(
            self.schema.root(),
            value,
            options.include.as_ref(),
            options.exclude.as_ref(),
            &mut state,
        );
        state.finish(out)
    }

    /// Serializes to encoded JSON bytes, optionally indented.
    pub fn serialize_json(
        &self,
        value: &Value,
        options: &SerializeOptions,
    ) -> Result<Vec<u8>, SerializationError> {
        let native = self.serialize_native(value, options)?;
        encode_json(&native, options.indent, options.round_trip).map(String::into_bytes)
    }
}

struct Walker<'s> {
    schema: &'s CompiledSchema,
}

impl Walker<'_> {
    fn node(&self, id: NodeId) -> &CNode {
        self.schema.node(id)
    }

    fn ser(
        &self,
        id: NodeId,
        value: &Value,
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Value {
        if state.guard.enter(None).is_err() {
            state.warn("recursion limit exceeded");
            return Value::Null;
        }
        let out = self.dispatch(id, value, include, exclude, state);
        state.guard.exit(None);
        out
    }

    fn dispatch(
        &self,
        id: NodeId,
        value: &Value,
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Value {
        match self.node(id) {
            CNode::Alias(target) => self.ser(*target, value, include, exclude, state),
            CNode::Any => ser_any(value, include, exclude, state),
            CNode::Null => self.expect(value, value.is_null(), "null", include, exclude, state),
            CNode::Bool { .. } => {
                self.expect(value, matches!(value, Value::Bool(_)), "bool", include, exclude, state)
            }
            CNode::Int { .. } => {
                self.expect(value, matches!(value, Value::Int(_)), "int", include, exclude, state)
            }
            CNode::Float { .. } => self.expect(
                value,
                matches!(value, Value::Float(_) | Value::Int(_)),
                "float",
                include,
                exclude,
                state,
            ),
            CNode::Str { .. } => {
                self.expect(value, matches!(value, Value::Str(_)), "str", include, exclude, state)
            }
            CNode::Bytes { .. } => self.expect(
                value,
                matches!(value, Value::Bytes(_)),
                "bytes",
                include,
                exclude,
                state,
            ),
            CNode::DateTime { .. } => self.expect(
                value,
                matches!(value, Value::DateTime(_)),
                "datetime",
                include,
                exclude,
                state,
            ),
            CNode::Date { .. } => {
                self.expect(value, matches!(value, Value::Date(_)), "date", include, exclude, state)
            }
            CNode::Time { .. } => {
                self.expect(value, matches!(value, Value::Time(_)), "time", include, exclude, state)
            }
            CNode::Duration { .. } => self.expect(
                value,
                matches!(value, Value::Duration(_)),
                "duration",
                include,
                exclude,
                state,
            ),
            CNode::Uuid { .. } => {
                self.expect(value, matches!(value, Value::Uuid(_)), "uuid", include, exclude, state)
            }
            CNode::Url { .. } => {
                self.expect(value, matches!(value, Value::Url(_)), "url", include, exclude, state)
            }
            CNode::MultiHostUrl { .. } => self.expect(
                value,
                matches!(value, Value::MultiHostUrl(_)),
                "multi-host url",
                include,
                exclude,
                state,
            ),
            CNode::Literal { .. } => ser_any(value, include, exclude, state),
            CNode::List { item, .. } => match value {
                Value::List(items) => {
                    Value::List(self.ser_sequence(*item, items, include, exclude, state))
                }
                other => self.mismatch(other, "list", include, exclude, state),
            },
            CNode::Set { item, .. } => match value {
                Value::Set(items) => {
                    Value::Set(self.ser_sequence(*item, items, include, exclude, state))
                }
                other => self.mismatch(other, "set", include, exclude, state),
            },
            CNode::Tuple { items, .. } => match value {
                Value::Tuple(elems) if elems.len() == items.len() => {
                    let mut out = Vec::with_capacity(elems.len());
                    for (i, (node, elem)) in items.iter().zip(elems).enumerate() {
                        let Some((inc, exc)) =
                            entry_filters(include, exclude, |f| f.for_index(i))
                        else {
                            continue;
                        };
                        state.path.push(PathSeg::Index(i));
                        out.push(self.ser(*node, elem, inc, exc, state));
                        state.path.pop();
                    }
                    Value::Tuple(out)
                }
                other => self.mismatch(other, "tuple", include, exclude, state),
            },
            CNode::Map { value: val_node, .. } => match value {
                Value::Map(map) => {
                    let mut out = crate::value::ValueMap::new();
                    for (key, val) in map.iter() {
                        let name = crate::value::json::json_key(key);
                        let Some((inc, exc)) =
                            entry_filters(include, exclude, |f| f.for_field(&name))
                        else {
                            continue;
                        };
                        if state.options.exclude_none && val.is_null() {
                            continue;
                        }
                        state.path.push(PathSeg::Key(name));
                        let serialized = self.ser(*val_node, val, inc, exc, state);
                        state.path.pop();
                        out.insert(key.clone(), serialized);
                    }
                    Value::Map(out)
                }
                other => self.mismatch(other, "map", include, exclude, state),
            },
            CNode::Model(model) => match value {
                Value::Model(instance) => {
                    self.ser_model(model, instance, include, exclude, state)
                }
                other => self.mismatch(other, &model.name, include, exclude, state),
            },
            CNode::Union { members, .. } => {
                // First member that serializes without a mismatch wins.
                for (_, node) in members {
                    let mark = state.warnings.len();
                    let out = self.ser(*node, value, include, exclude, state);
                    if state.warnings.len() == mark {
                        return out;
                    }
                    state.warnings.truncate(mark);
                }
                self.mismatch(value, "union", include, exclude, state)
            }
            CNode::TaggedUnion {
                discriminator,
                branches,
                ..
            } => {
                if let Some(tag) = serializer_tag(discriminator, value) {
                    if let Some((_, node)) = branches.iter().find(|(label, _)| *label == tag) {
                        return self.ser(*node, value, include, exclude, state);
                    }
                }
                self.mismatch(value, "tagged union", include, exclude, state)
            }
            CNode::Nullable { inner } => {
                if value.is_null() {
                    Value::Null
                } else {
                    self.ser(*inner, value, include, exclude, state)
                }
            }
            CNode::WithDefault { inner, .. } => self.ser(*inner, value, include, exclude, state),
            CNode::Hook { inner, .. } => self.ser(*inner, value, include, exclude, state),
            CNode::Json { inner } => match value {
                Value::Raw(raw) => {
                    if state.options.round_trip {
                        value.clone()
                    } else {
                        match inner {
                            Some(node) => self.ser(*node, &raw.value, include, exclude, state),
                            None => ser_any(&raw.value, include, exclude, state),
                        }
                    }
                }
                other => self.mismatch(other, "json", include, exclude, state),
            },
        }
    }

    /// Emits a matching value unchanged or routes through the mismatch path.
    fn expect(
        &self,
        value: &Value,
        matches: bool,
        expected: &str,
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Value {
        if matches {
            value.clone()
        } else {
            self.mismatch(value, expected, include, exclude, state)
        }
    }

    /// Fallback, then the inferred any-serializer with a warning.
    fn mismatch(
        &self,
        value: &Value,
        expected: &str,
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Value {
        if let Some(fallback) = &state.options.fallback {
            if let Some(converted) = fallback(value) {
                return ser_any(&converted, include, exclude, state);
            }
        }
        state.warn(format!(
            "expected `{}`, found {}",
            expected,
            value.kind_name()
        ));
        ser_any(value, include, exclude, state)
    }

    fn ser_sequence(
        &self,
        item: NodeId,
        items: &[Value],
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Vec<Value> {
        let mut out = Vec::with_capacity(items.len());
        for (i, elem) in items.iter().enumerate() {
            let Some((inc, exc)) = entry_filters(include, exclude, |f| f.for_index(i)) else {
                continue;
            };
            state.path.push(PathSeg::Index(i));
            out.push(self.ser(item, elem, inc, exc, state));
            state.path.pop();
        }
        out
    }

    fn ser_model(
        &self,
        model: &CModel,
        instance: &ModelValue,
        include: Option<&PathFilter>,
        exclude: Option<&PathFilter>,
        state: &mut SerState<'_>,
    ) -> Value {
        let mut out = crate::value::ValueMap::new();
        for field in &model.fields {
            let Some(value) = instance.get(&field.name) else {
                continue;
            };
            if state.options.exclude_unset && !instance.is_set(&field.name) {
                continue;
            }
            if state.options.exclude_none && value.is_null() {
                continue;
            }
            if state.options.exclude_defaults {
                if let Some(default) = self.field_default(field) {
                    if *value == default {
                        continue;
                    }
                }
            }
            let Some((inc, exc)) =
                entry_filters(include, exclude, |f| f.for_field(&field.name))
            else {
                continue;
            };
            state.path.push(PathSeg::Field(field.name.clone()));
            let serialized = self.ser(field.node, value, inc, exc, state);
            state.path.pop();
            out.insert(Value::Str(output_key(field, state)), serialized);
        }
        // Captured extras have no declared node; infer their strategy.
        for (name, value) in instance.iter() {
            let declared = model.fields.iter().any(|f| f.name == *name);
            if declared {
                continue;
            }
            if state.options.exclude_none && value.is_null() {
                continue;
            }
            let Some((inc, exc)) = entry_filters(include, exclude, |f| f.for_field(name))
            else {
                continue;
            };
            state.path.push(PathSeg::Field(name.clone()));
            let serialized = ser_any(value, inc, exc, state);
            state.path.pop();
            out.insert(Value::Str(name.clone()), serialized);
        }
        Value::Map(out)
    }

    /// The field's declared default value, when it has one.
    ///
    /// Hook wrappers and aliases are transparent, matching how validation
    /// resolves a field's default.
    fn field_default(&self, field: &CField) -> Option<Value> {
        let mut id = field.node;
        loop {
            match self.node(id) {
                CNode::WithDefault { default, .. } => return Some(default.produce()),
                CNode::Hook { inner, .. } => id = *inner,
                CNode::Alias(target) => id = *target,
                _ => return None,
            }
        }
    }
}

fn output_key(field: &CField, state: &SerState<'_>) -> String {
    if state.options.by_alias {
        field
            .serialization_alias
            .clone()
            .or_else(|| field.alias.clone())
            .unwrap_or_else(|| field.name.clone())
    } else {
        field.name.clone()
    }
}

fn serializer_tag(discriminator: &Discriminator, value: &Value) -> Option<String> {
    match discriminator {
        Discriminator::Field(name) => {
            let field = match value {
                Value::Map(map) => map.get_str(name),
                Value::Model(model) => model.get(name),
                _ => None,
            }?;
            field.as_str().map(str::to_string)
        }
        Discriminator::Selector(select) => select(value),
    }
}
