//! Scalar validation: strict matching and the lax coercion tables.
//!
//! Each function attempts the exact type first; coercions run only when the
//! effective mode is lax, except for the encoding-aware ones available to
//! JSON input regardless of mode (there is no other way to spell a
//! datetime, uuid, or url in JSON). Lossy conversions never succeed
//! silently.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::codec::{LocatorUrl, MultiHostUrl};
use crate::errors::{ErrorKind, ValError};
use crate::schema::{CStrConstraints, LenConstraints, NumConstraints};
use crate::value::Value;

use super::options::InputSource;

/// String-ish coercions are allowed when lax, and for JSON input always.
fn text_coercion(strict: bool, source: InputSource) -> bool {
    !strict || source == InputSource::Json
}

pub(crate) fn validate_null(input: &Value) -> Result<Value, ValError> {
    match input {
        Value::Null => Ok(Value::Null),
        other => Err(ValError::new(ErrorKind::NoneRequired, other)),
    }
}

pub(crate) fn validate_bool(input: &Value, strict: bool) -> Result<Value, ValError> {
    match input {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Str(s) if !strict => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(ValError::new(ErrorKind::BoolParsing, input)),
        },
        Value::Int(0) if !strict => Ok(Value::Bool(false)),
        Value::Int(1) if !strict => Ok(Value::Bool(true)),
        Value::Int(_) if !strict => Err(ValError::new(ErrorKind::BoolParsing, input)),
        other => Err(ValError::new(ErrorKind::BoolType, other)),
    }
}

pub(crate) fn validate_int(
    input: &Value,
    con: &NumConstraints<i64>,
    strict: bool,
) -> Result<Value, ValError> {
    let parsed = match input {
        Value::Int(i) => *i,
        Value::Bool(b) if !strict => i64::from(*b),
        Value::Float(x) if !strict => float_to_int(*x, input)?,
        Value::Str(s) if !strict => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(i) => i,
                Err(_) => match trimmed.parse::<f64>() {
                    Ok(x) => float_to_int(x, input)?,
                    Err(_) => return Err(ValError::new(ErrorKind::IntParsing, input)),
                },
            }
        }
        other => return Err(ValError::new(ErrorKind::IntType, other)),
    };
    check_int_bounds(parsed, con, input)?;
    Ok(Value::Int(parsed))
}

fn float_to_int(x: f64, input: &Value) -> Result<i64, ValError> {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(ValError::new(ErrorKind::IntFromFloat, input))
    }
}

fn check_int_bounds(
    value: i64,
    con: &NumConstraints<i64>,
    input: &Value,
) -> Result<(), ValError> {
    if let Some(ge) = con.ge {
        if value < ge {
            return Err(ValError::new(
                ErrorKind::GreaterThanEqual { ge: ge.to_string() },
                input,
            ));
        }
    }
    if let Some(gt) = con.gt {
        if value <= gt {
            return Err(ValError::new(
                ErrorKind::GreaterThan { gt: gt.to_string() },
                input,
            ));
        }
    }
    if let Some(le) = con.le {
        if value > le {
            return Err(ValError::new(
                ErrorKind::LessThanEqual { le: le.to_string() },
                input,
            ));
        }
    }
    if let Some(lt) = con.lt {
        if value >= lt {
            return Err(ValError::new(
                ErrorKind::LessThan { lt: lt.to_string() },
                input,
            ));
        }
    }
    if let Some(m) = con.multiple_of {
        if m != 0 && value % m != 0 {
            return Err(ValError::new(
                ErrorKind::MultipleOf {
                    multiple_of: m.to_string(),
                },
                input,
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_float(
    input: &Value,
    con: &NumConstraints<f64>,
    strict: bool,
) -> Result<Value, ValError> {
    let parsed = match input {
        Value::Float(x) => *x,
        // Ints are accepted as floats even in strict mode.
        Value::Int(i) => *i as f64,
        Value::Bool(b) if !strict => f64::from(u8::from(*b)),
        Value::Str(s) if !strict => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValError::new(ErrorKind::FloatParsing, input))?,
        other => return Err(ValError::new(ErrorKind::FloatType, other)),
    };
    check_float_bounds(parsed, con, input)?;
    Ok(Value::Float(parsed))
}

fn check_float_bounds(
    value: f64,
    con: &NumConstraints<f64>,
    input: &Value,
) -> Result<(), ValError> {
    if let Some(ge) = con.ge {
        if !(value >= ge) {
            return Err(ValError::new(
                ErrorKind::GreaterThanEqual { ge: ge.to_string() },
                input,
            ));
        }
    }
    if let Some(gt) = con.gt {
        if !(value > gt) {
            return Err(ValError::new(
                ErrorKind::GreaterThan { gt: gt.to_string() },
                input,
            ));
        }
    }
    if let Some(le) = con.le {
        if !(value <= le) {
            return Err(ValError::new(
                ErrorKind::LessThanEqual { le: le.to_string() },
                input,
            ));
        }
    }
    if let Some(lt) = con.lt {
        if !(value < lt) {
            return Err(ValError::new(
                ErrorKind::LessThan { lt: lt.to_string() },
                input,
            ));
        }
    }
    if let Some(m) = con.multiple_of {
        if m != 0.0 && (value % m).abs() > 1e-9 && (m - (value % m).abs()).abs() > 1e-9 {
            return Err(ValError::new(
                ErrorKind::MultipleOf {
                    multiple_of: m.to_string(),
                },
                input,
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_str(
    input: &Value,
    con: &CStrConstraints,
    strict: bool,
) -> Result<Value, ValError> {
    let parsed = match input {
        Value::Str(s) => s.clone(),
        // Numbers never stringify; only UTF-8 bytes coerce in lax mode.
        Value::Bytes(b) if !strict => String::from_utf8(b.clone())
            .map_err(|_| ValError::new(ErrorKind::StringType, input))?,
        other => return Err(ValError::new(ErrorKind::StringType, other)),
    };
    let chars = parsed.chars().count();
    if let Some(min) = con.min_length {
        if chars < min {
            return Err(ValError::new(
                ErrorKind::StringTooShort { min_length: min },
                input,
            ));
        }
    }
    if let Some(max) = con.max_length {
        if chars > max {
            return Err(ValError::new(
                ErrorKind::StringTooLong { max_length: max },
                input,
            ));
        }
    }
    if let Some((source, regex)) = &con.pattern {
        if !regex.is_match(&parsed) {
            return Err(ValError::new(
                ErrorKind::StringPatternMismatch {
                    pattern: source.clone(),
                },
                input,
            ));
        }
    }
    Ok(Value::Str(parsed))
}

pub(crate) fn validate_bytes(
    input: &Value,
    con: &LenConstraints,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    let parsed = match input {
        Value::Bytes(b) => b.clone(),
        Value::Str(s) if text_coercion(strict, source) => s.clone().into_bytes(),
        other => return Err(ValError::new(ErrorKind::BytesType, other)),
    };
    if let Some(min) = con.min_length {
        if parsed.len() < min {
            return Err(ValError::new(
                ErrorKind::TooShort {
                    min_length: min,
                    actual: parsed.len(),
                },
                input,
            ));
        }
    }
    if let Some(max) = con.max_length {
        if parsed.len() > max {
            return Err(ValError::new(
                ErrorKind::TooLong {
                    max_length: max,
                    actual: parsed.len(),
                },
                input,
            ));
        }
    }
    Ok(Value::Bytes(parsed))
}

pub(crate) fn validate_datetime(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::Str(s) if text_coercion(strict, source) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .map_err(|error| ValError::new(ErrorKind::DatetimeParsing { error }, input)),
        Value::Int(secs) if !strict => epoch_datetime(*secs as f64, input),
        Value::Float(secs) if !strict => epoch_datetime(*secs, input),
        Value::Date(d) if !strict => Ok(Value::DateTime(midnight_utc(*d))),
        other => Err(ValError::new(ErrorKind::DatetimeType, other)),
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }
    Err("input is not a valid ISO 8601 datetime".to_string())
}

fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .fixed_offset()
}

fn epoch_datetime(secs: f64, input: &Value) -> Result<Value, ValError> {
    if !secs.is_finite() {
        return Err(ValError::new(
            ErrorKind::DatetimeParsing {
                error: "timestamp out of range".into(),
            },
            input,
        ));
    }
    // Floor the seconds so a negative timestamp keeps a positive
    // subsecond component.
    let mut whole = secs.floor() as i64;
    let mut nanos = ((secs - secs.floor()) * 1e9).round() as i64;
    if nanos >= 1_000_000_000 {
        whole += 1;
        nanos = 0;
    }
    DateTime::from_timestamp(whole, nanos as u32)
        .map(|dt| Value::DateTime(dt.fixed_offset()))
        .ok_or_else(|| {
            ValError::new(
                ErrorKind::DatetimeParsing {
                    error: "timestamp out of range".into(),
                },
                input,
            )
        })
}

pub(crate) fn validate_date(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::Str(s) if text_coercion(strict, source) => {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| ValError::new(ErrorKind::DateParsing { error: e.to_string() }, input))
        }
        Value::DateTime(dt) if !strict => {
            let naive = dt.naive_utc();
            if naive.time() == NaiveTime::default() {
                Ok(Value::Date(naive.date()))
            } else {
                Err(ValError::new(
                    ErrorKind::DateParsing {
                        error: "datetime has a non-midnight time component".into(),
                    },
                    input,
                ))
            }
        }
        other => Err(ValError::new(ErrorKind::DateType, other)),
    }
}

pub(crate) fn validate_time(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::Time(t) => Ok(Value::Time(*t)),
        Value::Str(s) if text_coercion(strict, source) => {
            let trimmed = s.trim();
            NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                .map(Value::Time)
                .map_err(|e| ValError::new(ErrorKind::TimeParsing { error: e.to_string() }, input))
        }
        other => Err(ValError::new(ErrorKind::TimeType, other)),
    }
}

pub(crate) fn validate_duration(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::Duration(d) => Ok(Value::Duration(*d)),
        Value::Str(s) if text_coercion(strict, source) => {
            crate::value::json::duration_from_str(s)
                .map(Value::Duration)
                .ok_or_else(|| ValError::new(ErrorKind::DurationParsing, input))
        }
        Value::Int(secs) if !strict => TimeDelta::try_seconds(*secs)
            .map(Value::Duration)
            .ok_or_else(|| ValError::new(ErrorKind::DurationParsing, input)),
        Value::Float(secs) if !strict => {
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9).round() as i64;
            TimeDelta::try_seconds(whole)
                .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
                .map(Value::Duration)
                .ok_or_else(|| ValError::new(ErrorKind::DurationParsing, input))
        }
        other => Err(ValError::new(ErrorKind::DurationType, other)),
    }
}

pub(crate) fn validate_uuid(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::Uuid(u) => Ok(Value::Uuid(*u)),
        Value::Str(s) if text_coercion(strict, source) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| ValError::new(ErrorKind::UuidParsing { error: e.to_string() }, input)),
        other => Err(ValError::new(ErrorKind::UuidType, other)),
    }
}

pub(crate) fn validate_url(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::Url(u) => Ok(Value::Url(u.clone())),
        Value::Str(s) if text_coercion(strict, source) => LocatorUrl::parse(s.trim())
            .map(Value::Url)
            .map_err(|e| ValError::new(ErrorKind::UrlParsing { error: e.to_string() }, input)),
        other => Err(ValError::new(ErrorKind::UrlType, other)),
    }
}

pub(crate) fn validate_multi_host_url(
    input: &Value,
    strict: bool,
    source: InputSource,
) -> Result<Value, ValError> {
    match input {
        Value::MultiHostUrl(u) => Ok(Value::MultiHostUrl(u.clone())),
        Value::Url(u) if !strict => MultiHostUrl::parse(&u.to_string())
            .map(Value::MultiHostUrl)
            .map_err(|e| ValError::new(ErrorKind::UrlParsing { error: e.to_string() }, input)),
        Value::Str(s) if text_coercion(strict, source) => MultiHostUrl::parse(s.trim())
            .map(Value::MultiHostUrl)
            .map_err(|e| ValError::new(ErrorKind::UrlParsing { error: e.to_string() }, input)),
        other => Err(ValError::new(ErrorKind::UrlType, other)),
    }
}

pub(crate) fn validate_literal(
    input: &Value,
    expected: &[Value],
    description: &str,
) -> Result<Value, ValError> {
    if expected.iter().any(|e| e == input) {
        Ok(input.clone())
    } else {
        Err(ValError::new(
            ErrorKind::LiteralError {
                expected: description.to_string(),
            },
            input,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_int_bounds() -> NumConstraints<i64> {
        NumConstraints::default()
    }

    #[test]
    fn test_bool_lax_coercions() {
        for text in ["true", "Yes", " ON ", "1"] {
            assert_eq!(
                validate_bool(&Value::from(text), false).unwrap(),
                Value::Bool(true),
                "{}",
                text
            );
        }
        assert_eq!(
            validate_bool(&Value::Int(0), false).unwrap(),
            Value::Bool(false)
        );
        assert!(validate_bool(&Value::from("maybe"), false).is_err());
    }

    #[test]
    fn test_bool_strict_rejects_string() {
        assert!(validate_bool(&Value::from("true"), true).is_err());
    }

    #[test]
    fn test_int_lax_from_string_and_float() {
        assert_eq!(
            validate_int(&Value::from(" 42 "), &no_int_bounds(), false).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            validate_int(&Value::Float(7.0), &no_int_bounds(), false).unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_int_lossy_float_rejected() {
        let err = validate_int(&Value::Float(7.5), &no_int_bounds(), false).unwrap_err();
        let lines = err.into_lines();
        assert_eq!(lines[0].kind.code(), "int_from_float");
    }

    #[test]
    fn test_int_bounds_order() {
        let con = NumConstraints {
            ge: Some(10),
            ..NumConstraints::default()
        };
        let err = validate_int(&Value::Int(5), &con, true).unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "greater_than_equal");
    }

    #[test]
    fn test_float_accepts_int_in_strict() {
        assert_eq!(
            validate_float(&Value::Int(3), &NumConstraints::default(), true).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_str_pattern() {
        let con = CStrConstraints {
            min_length: None,
            max_length: None,
            pattern: Some((
                "^[a-z]+$".to_string(),
                regex::Regex::new("^[a-z]+$").unwrap(),
            )),
        };
        assert!(validate_str(&Value::from("abc"), &con, true).is_ok());
        let err = validate_str(&Value::from("Abc"), &con, true).unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "string_pattern_mismatch");
    }

    #[test]
    fn test_str_never_accepts_numbers() {
        let con = CStrConstraints {
            min_length: None,
            max_length: None,
            pattern: None,
        };
        let err = validate_str(&Value::Int(7), &con, false).unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "string_type");
        let err = validate_str(&Value::Float(1.5), &con, false).unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "string_type");
        // UTF-8 bytes remain a lax coercion.
        assert_eq!(
            validate_str(&Value::Bytes(b"ok".to_vec()), &con, false).unwrap(),
            Value::from("ok")
        );
    }

    #[test]
    fn test_epoch_negative_fraction_keeps_subseconds() {
        let out = validate_datetime(&Value::Float(-1.5), false, InputSource::Native).unwrap();
        let Value::DateTime(dt) = out else { panic!("expected datetime") };
        assert_eq!(dt.timestamp_millis(), -1500);

        let out = validate_datetime(&Value::Float(1.5), false, InputSource::Native).unwrap();
        let Value::DateTime(dt) = out else { panic!("expected datetime") };
        assert_eq!(dt.timestamp_millis(), 1500);

        let err =
            validate_datetime(&Value::Float(f64::NAN), false, InputSource::Native).unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "datetime_parsing");
    }

    #[test]
    fn test_datetime_from_json_string_under_strict() {
        let out = validate_datetime(
            &Value::from("2024-01-02T03:04:05Z"),
            true,
            InputSource::Json,
        )
        .unwrap();
        assert!(matches!(out, Value::DateTime(_)));
        // Native strict input keeps exact matching.
        assert!(validate_datetime(
            &Value::from("2024-01-02T03:04:05Z"),
            true,
            InputSource::Native
        )
        .is_err());
    }

    #[test]
    fn test_uuid_parsing() {
        let out = validate_uuid(
            &Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            false,
            InputSource::Native,
        )
        .unwrap();
        assert!(matches!(out, Value::Uuid(_)));
        assert!(validate_uuid(&Value::from("not-a-uuid"), false, InputSource::Native).is_err());
    }

    #[test]
    fn test_literal() {
        let expected = [Value::from("a"), Value::Int(1)];
        assert!(validate_literal(&Value::Int(1), &expected, "'a' or 1").is_ok());
        let err = validate_literal(&Value::Int(2), &expected, "'a' or 1").unwrap_err();
        assert_eq!(err.into_lines()[0].kind.code(), "literal_error");
    }
}
