//! Scalar values and their conversions
//!
//! [`Value`] is the lossless intermediate representation used between the host's
//! property values and the wire. Each variant has exactly one canonical text form
//! (its `Display`), which is also the XML Schema lexical form except for `hexBinary`:
//!
//! * decimals are validated text and never pass through a binary float,
//! * numbers use the shortest text that parses back to the same `f64`, with `INF`,
//!   `-INF` and `NaN` for the special values,
//! * date-times are RFC 3339 with every fractional digit kept; a missing offset means UTC,
//! * binary is standard base64.

use crate::error::ValueConversionError;
use crate::schema::PrimitiveKind;
use crate::types::ScalarType;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Decimal number kept as canonical text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (bool, &str, &str) {
        let (negative, digits) = match self.0.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.0.as_str()),
        };
        match digits.split_once('.') {
            Some((integral, fraction)) => (negative, integral, fraction),
            None => (negative, digits, ""),
        }
    }

    /// No non-zero digit after the decimal point
    pub fn is_integral(&self) -> bool {
        self.parts().2.chars().all(|c| c == '0')
    }

    /// The integral value, if it is integral and fits in an `i128`
    pub fn to_i128(&self) -> Option<i128> {
        if !self.is_integral() {
            return None;
        }
        let (negative, integral, _) = self.parts();
        let magnitude: i128 = integral.parse().ok()?;
        Some(if negative { -magnitude } else { magnitude })
    }
}

impl FromStr for Decimal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (integral, fraction) = match unsigned.split_once('.') {
            Some((integral, fraction)) => (integral, Some(fraction)),
            None => (unsigned, None),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(integral) || !fraction.map(all_digits).unwrap_or(true) {
            return Err(format!("'{}' is not a decimal number", s));
        }
        if integral.is_empty() && fraction.map(str::is_empty).unwrap_or(true) {
            return Err(format!("'{}' is not a decimal number", s));
        }

        let integral = integral.trim_start_matches('0');
        let integral = if integral.is_empty() { "0" } else { integral };
        let mut canonical = String::with_capacity(s.len() + 1);
        canonical.push_str(integral);
        if let Some(fraction) = fraction.filter(|f| !f.is_empty()) {
            canonical.push('.');
            canonical.push_str(fraction);
        }

        let is_zero = canonical.chars().all(|c| c == '0' || c == '.');
        if negative && !is_zero {
            canonical.insert(0, '-');
        }
        Ok(Decimal(canonical))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(value.to_string())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Number(f64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Decimal(_) => "decimal",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Guid(_) => "guid",
            Value::Binary(_) => "binary",
        }
    }

    /// Parse the canonical text form of a kind
    pub fn parse(kind: PrimitiveKind, text: &str) -> Result<Value, ValueConversionError> {
        let fail = |reason: String| ValueConversionError::new("", kind.to_string(), reason);
        let trimmed = text.trim();

        let value = match kind {
            PrimitiveKind::String | PrimitiveKind::Memo => Value::Text(text.to_string()),
            PrimitiveKind::Integer => Value::Integer(
                trimmed
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|e| fail(format!("'{}': {}", trimmed, e)))?,
            ),
            PrimitiveKind::Number => Value::Number(parse_double(trimmed).map_err(fail)?),
            PrimitiveKind::Decimal => Value::Decimal(trimmed.parse().map_err(fail)?),
            PrimitiveKind::Boolean => Value::Boolean(parse_boolean(trimmed).map_err(fail)?),
            PrimitiveKind::DateTime => Value::DateTime(parse_datetime(trimmed).map_err(fail)?),
            PrimitiveKind::Date => Value::Date(
                NaiveDate::parse_from_str(strip_zone(trimmed, 10), "%Y-%m-%d")
                    .map_err(|e| fail(format!("'{}': {}", trimmed, e)))?,
            ),
            PrimitiveKind::Time => Value::Time(
                NaiveTime::parse_from_str(strip_zone(trimmed, 8), "%H:%M:%S%.f")
                    .map_err(|e| fail(format!("'{}': {}", trimmed, e)))?,
            ),
            PrimitiveKind::Guid => Value::Guid(
                Uuid::parse_str(trimmed).map_err(|e| fail(format!("'{}': {}", trimmed, e)))?,
            ),
            PrimitiveKind::Binary => Value::Binary(
                BASE64
                    .decode(trimmed)
                    .map_err(|e| fail(format!("invalid base64: {}", e)))?,
            ),
        };
        Ok(value)
    }

    /// Convert to the representation of a declared kind
    ///
    /// Text is accepted for every kind and parsed; numeric values widen where no digit
    /// can be lost; every scalar can become text.
    pub fn coerce(self, kind: PrimitiveKind) -> Result<Value, ValueConversionError> {
        let mismatch = |value: &Value| {
            ValueConversionError::new(
                "",
                kind.to_string(),
                format!("a {} value is not accepted", value.variant_name()),
            )
        };

        match (self, kind) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Text(text), PrimitiveKind::String | PrimitiveKind::Memo) => {
                Ok(Value::Text(text))
            }
            (Value::Text(text), kind) => Value::parse(kind, &text),
            (value, PrimitiveKind::String | PrimitiveKind::Memo) => {
                Ok(Value::Text(value.to_string()))
            }
            (Value::Integer(i), PrimitiveKind::Integer) => Ok(Value::Integer(i)),
            (Value::Integer(i), PrimitiveKind::Decimal) => Ok(Value::Decimal(i.into())),
            (Value::Integer(i), PrimitiveKind::Number) => Ok(Value::Number(i as f64)),
            (Value::Number(n), PrimitiveKind::Number) => Ok(Value::Number(n)),
            (Value::Number(n), PrimitiveKind::Decimal) if n.is_finite() => {
                Value::parse(PrimitiveKind::Decimal, &format_double(n))
            }
            (Value::Decimal(d), PrimitiveKind::Decimal) => Ok(Value::Decimal(d)),
            (Value::Decimal(d), PrimitiveKind::Integer) => d
                .to_i128()
                .and_then(|i| i64::try_from(i).ok())
                .map(Value::Integer)
                .ok_or_else(|| {
                    ValueConversionError::new(
                        "",
                        kind.to_string(),
                        format!("{} is not a 64-bit integer", d),
                    )
                }),
            (Value::Boolean(b), PrimitiveKind::Boolean) => Ok(Value::Boolean(b)),
            (Value::DateTime(dt), PrimitiveKind::DateTime) => Ok(Value::DateTime(dt)),
            (Value::Date(d), PrimitiveKind::Date) => Ok(Value::Date(d)),
            (Value::Time(t), PrimitiveKind::Time) => Ok(Value::Time(t)),
            (Value::Guid(g), PrimitiveKind::Guid) => Ok(Value::Guid(g)),
            (Value::Binary(b), PrimitiveKind::Binary) => Ok(Value::Binary(b)),
            (value, _) => Err(mismatch(&value)),
        }
    }

    /// Convert to a value the native scalar can carry, checking its range
    pub fn to_native(self, scalar: ScalarType) -> Result<Value, ValueConversionError> {
        let value = self.coerce(scalar.primitive()).map_err(|mut e| {
            e.target = scalar.name().to_string();
            e
        })?;
        let out_of_range = |shown: &dyn fmt::Display| {
            ValueConversionError::new(
                "",
                scalar.name(),
                format!("{} is out of range for {}", shown, scalar.name()),
            )
        };

        match (&value, scalar) {
            (Value::Integer(i), _) => {
                let (min, max): (i64, i64) = match scalar {
                    ScalarType::Byte => (i8::MIN.into(), i8::MAX.into()),
                    ScalarType::UnsignedByte => (0, u8::MAX.into()),
                    ScalarType::Short => (i16::MIN.into(), i16::MAX.into()),
                    ScalarType::UnsignedShort => (0, u16::MAX.into()),
                    ScalarType::Int => (i32::MIN.into(), i32::MAX.into()),
                    ScalarType::UnsignedInt => (0, u32::MAX.into()),
                    _ => (i64::MIN, i64::MAX),
                };
                if *i < min || *i > max {
                    return Err(out_of_range(i));
                }
            }
            (Value::Decimal(d), ScalarType::UnsignedLong) => {
                let fits = d
                    .to_i128()
                    .map(|i| (0..=i128::from(u64::MAX)).contains(&i))
                    .unwrap_or(false);
                if !fits {
                    return Err(out_of_range(d));
                }
            }
            (Value::Decimal(d), ScalarType::Integer) if !d.is_integral() => {
                return Err(out_of_range(d));
            }
            (Value::Number(n), ScalarType::Float) => {
                return Ok(Value::Number(f64::from(*n as f32)));
            }
            _ => {}
        }
        Ok(value)
    }

    /// XML Schema lexical form for a native scalar
    pub fn to_lexical(&self, scalar: ScalarType) -> String {
        match (self, scalar) {
            (Value::Binary(bytes), ScalarType::HexBinary) => hex::encode_upper(bytes),
            (value, _) => value.to_string(),
        }
    }

    /// Read the XML Schema lexical form of a native scalar
    pub fn from_lexical(scalar: ScalarType, text: &str) -> Result<Value, ValueConversionError> {
        match scalar {
            ScalarType::HexBinary => hex::decode(text.trim())
                .map(Value::Binary)
                .map_err(|e| ValueConversionError::new("", scalar.name(), e.to_string())),
            _ => Value::parse(scalar.primitive(), text).map_err(|mut e| {
                e.target = scalar.name().to_string();
                e
            }),
        }
    }
}

fn parse_double(text: &str) -> Result<f64, String> {
    match text {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => text
            .parse::<f64>()
            .map_err(|e| format!("'{}': {}", text, e)),
    }
}

fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "INF".to_string()
    } else if n == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format!("{}", n)
    }
}

fn parse_boolean(text: &str) -> Result<bool, String> {
    if text == "1" || text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text == "0" || text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{}' is not a boolean", text))
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| format!("'{}': {}", text, e))
}

/// Drop a trailing time zone from an XML Schema date or time
fn strip_zone(text: &str, body_len: usize) -> &str {
    if let Some(stripped) = text.strip_suffix('Z') {
        return stripped;
    }
    // `+hh:mm` or `-hh:mm` after the date or time itself
    let Some(split) = text.len().checked_sub(6).filter(|split| *split >= body_len) else {
        return text;
    };
    match text.as_bytes()[split] {
        b'+' | b'-' if text.as_bytes()[split + 3] == b':' => &text[..split],
        _ => text,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => f.write_str(&format_double(*n)),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Guid(g) => write!(f, "{}", g.hyphenated()),
            Value::Binary(bytes) => f.write_str(&BASE64.encode(bytes)),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Guid(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// Serde support: JSON natives where they exist, canonical text otherwise
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(text) => serializer.serialize_str(text),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Integer(i)),
            Err(_) => Ok(Value::Decimal(Decimal(v.to_string()))),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }
}
