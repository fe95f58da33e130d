//! Conversions between the engine value type and `serde_json::Value`.
//!
//! `from_json` is the entry point for the encoded validation path;
//! `to_json` is a generic display-oriented rendering. The serializer applies
//! its own, schema-directed conversion and only falls back to `to_json` for
//! foreign values.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::TimeDelta;

use super::value::Value;

impl Value {
    /// Converts a parsed JSON value into an engine value.
    ///
    /// Numbers become `Int` when they fit in `i64`, `Float` otherwise.
    /// Object keys are always strings.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as generic JSON.
    ///
    /// Scalar leaves take their canonical textual forms (RFC 3339 for
    /// timestamps, base64 for bytes); mapping keys are stringified.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::Time(t) => serde_json::Value::String(t.to_string()),
            Value::Duration(d) => serde_json::Value::String(duration_to_iso8601(d)),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Url(u) => serde_json::Value::String(u.to_string()),
            Value::MultiHostUrl(u) => serde_json::Value::String(u.to_string()),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map.iter() {
                    out.insert(json_key(k), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Model(model) => {
                let mut out = serde_json::Map::new();
                for (k, v) in model.iter() {
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Raw(raw) => raw.value.to_json(),
            Value::Opaque(obj) => {
                let mut out = serde_json::Map::new();
                for name in obj.attribute_names() {
                    if let Some(attr) = obj.get_attribute(&name) {
                        out.insert(name, attr.to_json());
                    }
                }
                serde_json::Value::Object(out)
            }
        }
    }
}

/// Stringifies a mapping key for JSON output.
pub(crate) fn json_key(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a duration in ISO 8601 form, e.g. `PT1H30M5.5S` or `-P2D`.
pub fn duration_to_iso8601(delta: &TimeDelta) -> String {
    let negative = *delta < TimeDelta::zero();
    let abs = if negative { -*delta } else { *delta };

    let total_seconds = abs.num_seconds();
    let nanos = abs.subsec_nanos().unsigned_abs();
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('P');
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if nanos > 0 {
            let frac = format!("{:09}", nanos);
            out.push_str(&format!("{}.{}S", seconds, frac.trim_end_matches('0')));
        } else if seconds > 0 || (days == 0 && hours == 0 && minutes == 0) {
            out.push_str(&format!("{}S", seconds));
        }
    }
    out
}

/// Parses the subset of ISO 8601 durations the serializer emits, plus bare
/// second counts (`"90"`, `"1.5"`).
pub(crate) fn duration_from_str(input: &str) -> Option<TimeDelta> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Bare number of seconds.
    if let Ok(secs) = trimmed.parse::<f64>() {
        return timedelta_from_seconds_f64(secs);
    }

    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('P')?;

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut total = TimeDelta::zero();
    for (part, units) in [
        (date_part, &[('W', 604_800.0), ('D', 86_400.0)][..]),
        (
            time_part,
            &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)][..],
        ),
    ] {
        let mut number = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
            } else {
                let scale = units.iter().find(|(u, _)| *u == ch)?.1;
                let amount: f64 = number.parse().ok()?;
                total = total.checked_add(&timedelta_from_seconds_f64(amount * scale)?)?;
                number.clear();
            }
        }
        if !number.is_empty() {
            return None;
        }
    }

    Some(if negative { -total } else { total })
}

fn timedelta_from_seconds_f64(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as i64;
    TimeDelta::try_seconds(whole)?.checked_add(&TimeDelta::nanoseconds(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(&json!(5)), Value::Int(5));
        assert_eq!(Value::from_json(&json!(2.5)), Value::Float(2.5));
    }

    #[test]
    fn test_from_json_nested() {
        let value = Value::from_json(&json!({"a": [1, "x"]}));
        let map = value.as_map().unwrap();
        assert_eq!(
            map.get_str("a"),
            Some(&Value::List(vec![Value::Int(1), Value::from("x")]))
        );
    }

    #[test]
    fn test_to_json_round_trips_plain_data() {
        let original = json!({"name": "a", "tags": [1, 2], "ok": true, "none": null});
        assert_eq!(Value::from_json(&original).to_json(), original);
    }

    #[test]
    fn test_duration_iso8601_rendering() {
        assert_eq!(duration_to_iso8601(&TimeDelta::seconds(90)), "PT1M30S");
        assert_eq!(
            duration_to_iso8601(&TimeDelta::seconds(86_400 * 2)),
            "P2D"
        );
        assert_eq!(duration_to_iso8601(&TimeDelta::zero()), "PT0S");
        assert_eq!(duration_to_iso8601(&-TimeDelta::seconds(5)), "-PT5S");
        assert_eq!(
            duration_to_iso8601(&TimeDelta::milliseconds(1_500)),
            "PT1.5S"
        );
    }

    #[test]
    fn test_duration_parse_round_trip() {
        for delta in [
            TimeDelta::seconds(90),
            TimeDelta::seconds(86_400 * 2 + 3_600),
            -TimeDelta::seconds(5),
            TimeDelta::milliseconds(1_500),
        ] {
            let rendered = duration_to_iso8601(&delta);
            assert_eq!(duration_from_str(&rendered), Some(delta), "{}", rendered);
        }
    }

    #[test]
    fn test_duration_parse_bare_seconds() {
        assert_eq!(duration_from_str("90"), Some(TimeDelta::seconds(90)));
        assert_eq!(
            duration_from_str("1.5"),
            Some(TimeDelta::milliseconds(1_500))
        );
        assert_eq!(duration_from_str("bogus"), None);
    }
}
