//! The closed runtime value type and its container helpers.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::codec::{LocatorUrl, MultiHostUrl};

use super::opaque::OpaqueRef;

/// A runtime datum flowing through validation and serialization.
///
/// Raw input and validated output share this one representation; the
/// interpreter is exhaustive over it by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence marker.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// Timezone-aware timestamp.
    DateTime(DateTime<FixedOffset>),
    /// Calendar date.
    Date(NaiveDate),
    /// Wall-clock time.
    Time(NaiveTime),
    /// Signed duration.
    Duration(TimeDelta),
    /// UUID.
    Uuid(Uuid),
    /// Single-host resource locator.
    Url(LocatorUrl),
    /// Multi-host resource locator.
    MultiHostUrl(MultiHostUrl),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Order-preserving unique sequence.
    Set(Vec<Value>),
    /// Fixed-arity positional sequence.
    Tuple(Vec<Value>),
    /// Insertion-ordered mapping.
    Map(ValueMap),
    /// Validated model aggregate with its explicitly-set field set.
    Model(ModelValue),
    /// Decoded embedded document that remembers its original text.
    Raw(RawValue),
    /// Host object behind the `OpaqueObject` seam.
    Opaque(OpaqueRef),
}

impl Value {
    /// Returns the value kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Uuid(_) => "uuid",
            Value::Url(_) => "url",
            Value::MultiHostUrl(_) => "multi-host url",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Model(_) => "model",
            Value::Raw(_) => "raw",
            Value::Opaque(_) => "object",
        }
    }

    /// True for the absence marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the string payload if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the map payload if this is a map.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// A short single-line rendering for error echoes.
    pub fn echo(&self) -> String {
        let rendered = self.to_string();
        if rendered.len() > 60 {
            // Truncate on a char boundary, not a byte offset.
            let cut = rendered
                .char_indices()
                .take_while(|(i, _)| *i <= 57)
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            format!("{}...", &rendered[..cut])
        } else {
            rendered
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Duration(d) => write!(f, "{}", super::json::duration_to_iso8601(d)),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Url(u) => write!(f, "{}", u),
            Value::MultiHostUrl(u) => write!(f, "{}", u),
            Value::List(items) | Value::Tuple(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Model(model) => {
                write!(f, "{}(", model.name())?;
                for (i, (k, v)) in model.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, ")")
            }
            Value::Raw(raw) => write!(f, "{}", raw.raw),
            Value::Opaque(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// An insertion-ordered mapping with arbitrary value keys.
///
/// Lookup is linear; the engine iterates far more often than it probes, and
/// model validation builds its own keyed index over input maps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a pair, replacing an existing entry with an equal key.
    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Looks up a value by key equality.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a value by string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(k, v)| match k {
            Value::Str(s) if s == key => Some(v),
            _ => None,
        })
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.entries.iter()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A validated model aggregate.
///
/// Tracks which fields were explicitly present in the input, as opposed to
/// filled from defaults, so serialization can honor `exclude_unset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelValue {
    name: String,
    fields: Vec<(String, Value)>,
    fields_set: BTreeSet<String>,
}

impl ModelValue {
    /// Creates an empty model value with the given model name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            fields_set: BTreeSet::new(),
        }
    }

    /// The model's declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Sets a field, optionally marking it explicitly set.
    pub fn set(&mut self, name: impl Into<String>, value: Value, explicitly_set: bool) {
        let name = name.into();
        if explicitly_set {
            self.fields_set.insert(name.clone());
        }
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// True when the field was explicitly present in the validated input.
    pub fn is_set(&self, name: &str) -> bool {
        self.fields_set.contains(name)
    }

    /// The explicitly-set field names.
    pub fn fields_set(&self) -> &BTreeSet<String> {
        &self.fields_set
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the model has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A decoded value that remembers the exact text it was decoded from.
///
/// Round-trip serialization re-emits `raw` byte-for-byte instead of
/// re-encoding `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    /// Original encoded text.
    pub raw: String,
    /// Decoded value tree.
    pub value: Box<Value>,
}

impl RawValue {
    /// Pairs a decoded value with its original text.
    pub fn new(raw: impl Into<String>, value: Value) -> Self {
        Self {
            raw: raw.into(),
            value: Box::new(value),
        }
    }
}
