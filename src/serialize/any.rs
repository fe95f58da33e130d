//! Schema-less serialization: strategy inferred from the runtime value.
//!
//!`serialize_any` walks a value with no compiled schema, applying the same
//! option switches as the schema-driven path; the schema serializer also
//! lands here whenever a value does not match its node. JSON encoding is a
//! hand-rolled writer so a raw leaf can be re-emitted byte-for-byte under
//! `round_trip`, which a `serde_json::Value` tree cannot express.

use tracing::warn;

use crate::errors::{
    Location, PathSeg, SerializationError, SerializationWarning, WarningMode,
};
use crate::value::{json::json_key, Value};
use crate::validate::RecursionGuard;

use super::filter::{entry_filters, PathFilter};
use super::options::SerializeOptions;

/// Mutable state threaded through one serialization call.
pub(super) struct SerState<'o> {
    pub options: &'o SerializeOptions,
    pub warnings: Vec<SerializationWarning>,
    pub path: Vec<PathSeg>,
    pub guard: RecursionGuard,
}

impl<'o> SerState<'o> {
    pub fn new(options: &'o SerializeOptions, recursion_limit: usize) -> Self {
        Self {
            options,
            warnings: Vec::new(),
            path: Vec::new(),
            guard: RecursionGuard::new(recursion_limit),
        }
    }

    /// Records a mismatch at the current output location.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(SerializationWarning {
            location: Location::new(self.path.clone()),
            message: message.into(),
        });
    }

    /// Resolves collected warnings into the call outcome.
    pub fn finish(self, output: Value) -> Result<Value, SerializationError> {
        if self.warnings.is_empty() {
            return Ok(output);
        }
        match self.options.warnings {
            WarningMode::Warn => {
                for w in &self.warnings {
                    warn!(location = %w.location, message = w.message.as_str(), "serialization mismatch");
                }
                Ok(output)
            }
            WarningMode::Error => Err(SerializationError::Warnings(self.warnings)),
        }
    }
}

/// Serializes a value by inferring a strategy from its runtime shape.
pub(super) fn ser_any(
    value: &Value,
    include: Option<&PathFilter>,
    exclude: Option<&PathFilter>,
    state: &mut SerState<'_>,
) -> Value {
    let identity = match value {
        Value::Opaque(obj) => Some(obj.identity()),
        _ => None,
    };
    if state.guard.enter(identity).is_err() {
        state.warn("recursion limit exceeded");
        return Value::Null;
    }
    let out = ser_any_inner(value, include, exclude, state);
    state.guard.exit(identity);
    out
}

fn ser_any_inner(
    value: &Value,
    include: Option<&PathFilter>,
    exclude: Option<&PathFilter>,
    state: &mut SerState<'_>,
) -> Value {
    match value {
        Value::List(items) => Value::List(ser_sequence(items, include, exclude, state)),
        Value::Set(items) => Value::Set(ser_sequence(items, include, exclude, state)),
        Value::Tuple(items) => Value::Tuple(ser_sequence(items, include, exclude, state)),
        Value::Map(map) => {
            let mut out = crate::value::ValueMap::new();
            for (key, val) in map.iter() {
                let name = json_key(key);
                let Some((inc, exc)) =
                    entry_filters(include, exclude, |f| f.for_field(&name))
                else {
                    continue;
                };
                if state.options.exclude_none && val.is_null() {
                    continue;
                }
                state.path.push(PathSeg::Key(name));
                let serialized = ser_any(val, inc, exc, state);
                state.path.pop();
                out.insert(key.clone(), serialized);
            }
            Value::Map(out)
        }
        Value::Model(model) => {
            let mut out = crate::value::ValueMap::new();
            for (name, val) in model.iter() {
                if state.options.exclude_unset && !model.is_set(name) {
                    continue;
                }
                if state.options.exclude_none && val.is_null() {
                    continue;
                }
                let Some((inc, exc)) =
                    entry_filters(include, exclude, |f| f.for_field(name))
                else {
                    continue;
                };
                state.path.push(PathSeg::Field(name.clone()));
                let serialized = ser_any(val, inc, exc, state);
                state.path.pop();
                out.insert(Value::Str(name.clone()), serialized);
            }
            Value::Map(out)
        }
        Value::Raw(raw) => {
            if state.options.round_trip {
                value.clone()
            } else {
                ser_any(&raw.value, include, exclude, state)
            }
        }
        Value::Opaque(obj) => {
            if let Some(fallback) = &state.options.fallback {
                if let Some(converted) = fallback(value) {
                    return ser_any(&converted, include, exclude, state);
                }
            }
            state.warn(format!("cannot serialize host object `{}`", obj.type_name()));
            Value::Null
        }
        scalar => scalar.clone(),
    }
}

fn ser_sequence(
    items: &[Value],
    include: Option<&PathFilter>,
    exclude: Option<&PathFilter>,
    state: &mut SerState<'_>,
) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some((inc, exc)) = entry_filters(include, exclude, |f| f.for_index(i)) else {
            continue;
        };
        state.path.push(PathSeg::Index(i));
        out.push(ser_any(item, inc, exc, state));
        state.path.pop();
    }
    out
}

/// Writes a serialized value as JSON text.
pub(super) fn encode_json(
    value: &Value,
    indent: Option<usize>,
    round_trip: bool,
) -> Result<String, SerializationError> {
    let mut out = String::new();
    write_json(value, &mut out, indent, 0, round_trip)?;
    Ok(out)
}

fn write_json(
    value: &Value,
    out: &mut String,
    indent: Option<usize>,
    level: usize,
    round_trip: bool,
) -> Result<(), SerializationError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(x) => {
            let number = serde_json::Number::from_f64(*x).ok_or_else(|| {
                SerializationError::Encode(format!("non-finite float `{}`", x))
            })?;
            out.push_str(&number.to_string());
        }
        Value::Str(s) => push_escaped(s, out)?,
        Value::Bytes(b) => {
            use base64::Engine as _;
            let encoded = base64::engine::general_purpose::STANDARD.encode(b);
            push_escaped(&encoded, out)?;
        }
        Value::DateTime(dt) => push_escaped(&dt.to_rfc3339(), out)?,
        Value::Date(d) => push_escaped(&d.to_string(), out)?,
        Value::Time(t) => push_escaped(&t.to_string(), out)?,
        Value::Duration(d) => {
            push_escaped(&crate::value::duration_to_iso8601(d), out)?
        }
        Value::Uuid(u) => push_escaped(&u.to_string(), out)?,
        Value::Url(u) => push_escaped(&u.to_string(), out)?,
        Value::MultiHostUrl(u) => push_escaped(&u.to_string(), out)?,
        Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_newline(out, indent, level + 1);
                write_json(item, out, indent, level + 1, round_trip)?;
            }
            if !items.is_empty() {
                push_newline(out, indent, level);
            }
            out.push(']');
        }
        Value::Map(map) => {
            out.push('{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_newline(out, indent, level + 1);
                push_escaped(&json_key(key), out)?;
                out.push(':');
                if indent.is_some() {
                    out.push(' ');
                }
                write_json(val, out, indent, level + 1, round_trip)?;
            }
            if !map.is_empty() {
                push_newline(out, indent, level);
            }
            out.push('}');
        }
        Value::Model(model) => {
            out.push('{');
            for (i, (name, val)) in model.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_newline(out, indent, level + 1);
                push_escaped(name, out)?;
                out.push(':');
                if indent.is_some() {
                    out.push(' ');
                }
                write_json(val, out, indent, level + 1, round_trip)?;
            }
            if !model.is_empty() {
                push_newline(out, indent, level);
            }
            out.push('}');
        }
        Value::Raw(raw) => {
            if round_trip {
                out.push_str(&raw.raw);
            } else {
                write_json(&raw.value, out, indent, level, round_trip)?;
            }
        }
        Value::Opaque(obj) => {
            return Err(SerializationError::Encode(format!(
                "cannot encode host object `{}`",
                obj.type_name()
            )))
        }
    }
    Ok(())
}

fn push_escaped(text: &str, out: &mut String) -> Result<(), SerializationError> {
    let escaped = serde_json::to_string(text)
        .map_err(|e| SerializationError::Encode(e.to_string()))?;
    out.push_str(&escaped);
    Ok(())
}

fn push_newline(out: &mut String, indent: Option<usize>, level: usize) {
    if let Some(n) = indent {
        out.push('\n');
        out.push_str(&" ".repeat(n * level));
    }
}

/// Serializes a value with no compiled schema, inferring a strategy from
/// its runtime shape.
pub fn serialize_any(
    value: &Value,
    options: &SerializeOptions,
) -> Result<Value, SerializationError> {
    let limit = crate::config::EngineConfig::default().recursion_limit;
    let mut state = SerState::new(options, limit);
    let out = ser_any(
        value,
        options.include.as_ref(),
        options.exclude.as_ref(),
        &mut state,
    );
    state.finish(out)
}

/// Schema-less counterpart of `SchemaSerializer::serialize_json`.
pub fn serialize_any_json(
    value: &Value,
    options: &SerializeOptions,
) -> Result<Vec<u8>, SerializationError> {
    let native = serialize_any(value, options)?;
    encode_json(&native, options.indent, options.round_trip).map(String::into_bytes)
}
