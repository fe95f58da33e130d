//! The closed enumeration of violation kinds.
//!
//! Every kind carries a stable snake_case wire code and renders a
//! human-readable message from its own context. Adding a kind is a
//! compile-time-checked, localized change.

use std::fmt;

/// One kind of validation violation.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Input should be null.
    NoneRequired,
    /// Input should be a boolean.
    BoolType,
    /// Input could not be interpreted as a boolean.
    BoolParsing,
    /// Input should be an integer.
    IntType,
    /// Input string could not be parsed as an integer.
    IntParsing,
    /// Float input had a non-zero fractional part.
    IntFromFloat,
    /// Input should be a number.
    FloatType,
    /// Input string could not be parsed as a number.
    FloatParsing,
    /// Input should be a string.
    StringType,
    /// String shorter than the declared minimum.
    StringTooShort { min_length: usize },
    /// String longer than the declared maximum.
    StringTooLong { max_length: usize },
    /// String did not match the declared pattern.
    StringPatternMismatch { pattern: String },
    /// Input should be a byte string.
    BytesType,
    /// Input should be a datetime.
    DatetimeType,
    /// Datetime string could not be parsed.
    DatetimeParsing { error: String },
    /// Input should be a date.
    DateType,
    /// Date string could not be parsed.
    DateParsing { error: String },
    /// Input should be a time.
    TimeType,
    /// Time string could not be parsed.
    TimeParsing { error: String },
    /// Input should be a duration.
    DurationType,
    /// Duration string could not be parsed.
    DurationParsing,
    /// Input should be a UUID.
    UuidType,
    /// UUID string could not be parsed.
    UuidParsing { error: String },
    /// Input should be a URL.
    UrlType,
    /// URL string could not be parsed.
    UrlParsing { error: String },
    /// Input matched none of the permitted literal values.
    LiteralError { expected: String },
    /// Input should be a list.
    ListType,
    /// Input should be a set-like sequence.
    SetType,
    /// Input should be a tuple.
    TupleType,
    /// Tuple had the wrong number of items.
    TupleLength { expected: usize, actual: usize },
    /// Input should be a mapping.
    MapType,
    /// Input should be a model instance or mapping.
    ModelType { model: String },
    /// Required field absent from input.
    Missing,
    /// Unknown field present and the model forbids extras.
    ExtraForbidden,
    /// Collection shorter than the declared minimum.
    TooShort { min_length: usize, actual: usize },
    /// Collection longer than the declared maximum.
    TooLong { max_length: usize, actual: usize },
    /// Number not greater than the declared bound.
    GreaterThan { gt: String },
    /// Number below the declared bound.
    GreaterThanEqual { ge: String },
    /// Number not less than the declared bound.
    LessThan { lt: String },
    /// Number above the declared bound.
    LessThanEqual { le: String },
    /// Number not a multiple of the declared divisor.
    MultipleOf { multiple_of: String },
    /// No member of an untagged union accepted the input.
    UnionMemberFailed { member: String },
    /// Discriminator tag matched no declared branch.
    UnionTagInvalid {
        discriminator: String,
        tag: String,
        expected_tags: String,
    },
    /// Discriminator tag absent from input.
    UnionTagNotFound { discriminator: String },
    /// Traversal exceeded the configured recursion limit.
    RecursionLimit,
    /// Embedded document was not valid JSON.
    JsonInvalid { error: String },
    /// Input should be a JSON string or byte string.
    JsonType,
    /// Value omitted where a value is required.
    OmittedValue,
    /// Application-level violation signaled by a user hook.
    Custom { tag: String, message: String },
}

impl ErrorKind {
    /// Stable wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NoneRequired => "none_required",
            ErrorKind::BoolType => "bool_type",
            ErrorKind::BoolParsing => "bool_parsing",
            ErrorKind::IntType => "int_type",
            ErrorKind::IntParsing => "int_parsing",
            ErrorKind::IntFromFloat => "int_from_float",
            ErrorKind::FloatType => "float_type",
            ErrorKind::FloatParsing => "float_parsing",
            ErrorKind::StringType => "string_type",
            ErrorKind::StringTooShort { .. } => "string_too_short",
            ErrorKind::StringTooLong { .. } => "string_too_long",
            ErrorKind::StringPatternMismatch { .. } => "string_pattern_mismatch",
            ErrorKind::BytesType => "bytes_type",
            ErrorKind::DatetimeType => "datetime_type",
            ErrorKind::DatetimeParsing { .. } => "datetime_parsing",
            ErrorKind::DateType => "date_type",
            ErrorKind::DateParsing { .. } => "date_parsing",
            ErrorKind::TimeType => "time_type",
            ErrorKind::TimeParsing { .. } => "time_parsing",
            ErrorKind::DurationType => "duration_type",
            ErrorKind::DurationParsing => "duration_parsing",
            ErrorKind::UuidType => "uuid_type",
            ErrorKind::UuidParsing { .. } => "uuid_parsing",
            ErrorKind::UrlType => "url_type",
            ErrorKind::UrlParsing { .. } => "url_parsing",
            ErrorKind::LiteralError { .. } => "literal_error",
            ErrorKind::ListType => "list_type",
            ErrorKind::SetType => "set_type",
            ErrorKind::TupleType => "tuple_type",
            ErrorKind::TupleLength { .. } => "tuple_length_mismatch",
            ErrorKind::MapType => "map_type",
            ErrorKind::ModelType { .. } => "model_type",
            ErrorKind::Missing => "missing",
            ErrorKind::ExtraForbidden => "extra_forbidden",
            ErrorKind::TooShort { .. } => "too_short",
            ErrorKind::TooLong { .. } => "too_long",
            ErrorKind::GreaterThan { .. } => "greater_than",
            ErrorKind::GreaterThanEqual { .. } => "greater_than_equal",
            ErrorKind::LessThan { .. } => "less_than",
            ErrorKind::LessThanEqual { .. } => "less_than_equal",
            ErrorKind::MultipleOf { .. } => "multiple_of",
            ErrorKind::UnionMemberFailed { .. } => "union_member_failed",
            ErrorKind::UnionTagInvalid { .. } => "union_tag_invalid",
            ErrorKind::UnionTagNotFound { .. } => "union_tag_not_found",
            ErrorKind::RecursionLimit => "recursion_limit",
            ErrorKind::JsonInvalid { .. } => "json_invalid",
            ErrorKind::JsonType => "json_type",
            ErrorKind::OmittedValue => "omitted_value",
            ErrorKind::Custom { .. } => "custom",
        }
    }

    /// Wire code, honoring custom tags.
    pub fn tag(&self) -> &str {
        match self {
            ErrorKind::Custom { tag, .. } => tag,
            _ => self.code(),
        }
    }

    /// Renders the message context as a JSON object, if the kind has one.
    pub fn context(&self) -> Option<serde_json::Value> {
        use serde_json::json;
        match self {
            ErrorKind::StringTooShort { min_length } => Some(json!({ "min_length": min_length })),
            ErrorKind::StringTooLong { max_length } => Some(json!({ "max_length": max_length })),
            ErrorKind::StringPatternMismatch { pattern } => Some(json!({ "pattern": pattern })),
            ErrorKind::DatetimeParsing { error }
            | ErrorKind::DateParsing { error }
            | ErrorKind::TimeParsing { error }
            | ErrorKind::UuidParsing { error }
            | ErrorKind::UrlParsing { error }
            | ErrorKind::JsonInvalid { error } => Some(json!({ "error": error })),
            ErrorKind::LiteralError { expected } => Some(json!({ "expected": expected })),
            ErrorKind::TupleLength { expected, actual } => {
                Some(json!({ "expected": expected, "actual": actual }))
            }
            ErrorKind::ModelType { model } => Some(json!({ "model": model })),
            ErrorKind::TooShort { min_length, actual } => {
                Some(json!({ "min_length": min_length, "actual": actual }))
            }
            ErrorKind::TooLong { max_length, actual } => {
                Some(json!({ "max_length": max_length, "actual": actual }))
            }
            ErrorKind::GreaterThan { gt } => Some(json!({ "gt": gt })),
            ErrorKind::GreaterThanEqual { ge } => Some(json!({ "ge": ge })),
            ErrorKind::LessThan { lt } => Some(json!({ "lt": lt })),
            ErrorKind::LessThanEqual { le } => Some(json!({ "le": le })),
            ErrorKind::MultipleOf { multiple_of } => {
                Some(json!({ "multiple_of": multiple_of }))
            }
            ErrorKind::UnionMemberFailed { member } => Some(json!({ "member": member })),
            ErrorKind::UnionTagInvalid {
                discriminator,
                tag,
                expected_tags,
            } => Some(json!({
                "discriminator": discriminator,
                "tag": tag,
                "expected_tags": expected_tags,
            })),
            ErrorKind::UnionTagNotFound { discriminator } => {
                Some(json!({ "discriminator": discriminator }))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NoneRequired => write!(f, "Input should be null"),
            ErrorKind::BoolType => write!(f, "Input should be a valid boolean"),
            ErrorKind::BoolParsing => {
                write!(f, "Input should be a valid boolean, unable to interpret input")
            }
            ErrorKind::IntType => write!(f, "Input should be a valid integer"),
            ErrorKind::IntParsing => {
                write!(f, "Input should be a valid integer, unable to parse string")
            }
            ErrorKind::IntFromFloat => write!(
                f,
                "Input should be a valid integer, got a number with a fractional part"
            ),
            ErrorKind::FloatType => write!(f, "Input should be a valid number"),
            ErrorKind::FloatParsing => {
                write!(f, "Input should be a valid number, unable to parse string")
            }
            ErrorKind::StringType => write!(f, "Input should be a valid string"),
            ErrorKind::StringTooShort { min_length } => {
                write!(f, "String should have at least {} characters", min_length)
            }
            ErrorKind::StringTooLong { max_length } => {
                write!(f, "String should have at most {} characters", max_length)
            }
            ErrorKind::StringPatternMismatch { pattern } => {
                write!(f, "String should match pattern '{}'", pattern)
            }
            ErrorKind::BytesType => write!(f, "Input should be a valid byte string"),
            ErrorKind::DatetimeType => write!(f, "Input should be a valid datetime"),
            ErrorKind::DatetimeParsing { error } => {
                write!(f, "Input should be a valid datetime, {}", error)
            }
            ErrorKind::DateType => write!(f, "Input should be a valid date"),
            ErrorKind::DateParsing { error } => {
                write!(f, "Input should be a valid date, {}", error)
            }
            ErrorKind::TimeType => write!(f, "Input should be a valid time"),
            ErrorKind::TimeParsing { error } => {
                write!(f, "Input should be a valid time, {}", error)
            }
            ErrorKind::DurationType => write!(f, "Input should be a valid duration"),
            ErrorKind::DurationParsing => {
                write!(f, "Input should be a valid duration, unable to parse string")
            }
            ErrorKind::UuidType => write!(f, "Input should be a valid UUID"),
            ErrorKind::UuidParsing { error } => {
                write!(f, "Input should be a valid UUID, {}", error)
            }
            ErrorKind::UrlType => write!(f, "Input should be a valid URL"),
            ErrorKind::UrlParsing { error } => {
                write!(f, "Input should be a valid URL, {}", error)
            }
            ErrorKind::LiteralError { expected } => {
                write!(f, "Input should be {}", expected)
            }
            ErrorKind::ListType => write!(f, "Input should be a valid list"),
            ErrorKind::SetType => write!(f, "Input should be a valid set"),
            ErrorKind::TupleType => write!(f, "Input should be a valid tuple"),
            ErrorKind::TupleLength { expected, actual } => write!(
                f,
                "Tuple should have {} items, got {}",
                expected, actual
            ),
            ErrorKind::MapType => write!(f, "Input should be a valid mapping"),
            ErrorKind::ModelType { model } => write!(
                f,
                "Input should be a valid instance of {} or a mapping",
                model
            ),
            ErrorKind::Missing => write!(f, "Field required"),
            ErrorKind::ExtraForbidden => write!(f, "Extra inputs are not permitted"),
            ErrorKind::TooShort { min_length, actual } => write!(
                f,
                "Collection should have at least {} items, got {}",
                min_length, actual
            ),
            ErrorKind::TooLong { max_length, actual } => write!(
                f,
                "Collection should have at most {} items, got {}",
                max_length, actual
            ),
            ErrorKind::GreaterThan { gt } => write!(f, "Input should be greater than {}", gt),
            ErrorKind::GreaterThanEqual { ge } => {
                write!(f, "Input should be greater than or equal to {}", ge)
            }
            ErrorKind::LessThan { lt } => write!(f, "Input should be less than {}", lt),
            ErrorKind::LessThanEqual { le } => {
                write!(f, "Input should be less than or equal to {}", le)
            }
            ErrorKind::MultipleOf { multiple_of } => {
                write!(f, "Input should be a multiple of {}", multiple_of)
            }
            ErrorKind::UnionMemberFailed { member } => {
                write!(f, "Input did not match union member '{}'", member)
            }
            ErrorKind::UnionTagInvalid {
                discriminator,
                tag,
                expected_tags,
            } => write!(
                f,
                "Input tag '{}' found using '{}' does not match any of the expected tags: {}",
                tag, discriminator, expected_tags
            ),
            ErrorKind::UnionTagNotFound { discriminator } => write!(
                f,
                "Unable to extract tag using discriminator '{}'",
                discriminator
            ),
            ErrorKind::RecursionLimit => {
                write!(f, "Recursion limit exceeded while traversing the value")
            }
            ErrorKind::JsonInvalid { error } => write!(f, "Invalid JSON: {}", error),
            ErrorKind::JsonType => write!(f, "JSON input should be a string or byte string"),
            ErrorKind::OmittedValue => {
                write!(f, "Value was omitted where a value is required")
            }
            ErrorKind::Custom { message, .. } => write!(f, "{}", message),
        }
    }
}
