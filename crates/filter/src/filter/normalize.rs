//! Value normalizers shared by the filters.
//!
//! Every normalizer is fail-soft: it returns an error describing the bad
//! input and the caller decides which sub-clause to drop.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::InvalidFilterValue;
use crate::metadata::FieldType;
use crate::query::ParameterValue;

/// A client-supplied number, integral when it fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parse a numeric string; see [`is_numeric`].
    pub fn parse(raw: &str) -> Option<Self> {
        if !is_numeric(raw) {
            return None;
        }
        let trimmed = raw.trim_matches(is_numeric_whitespace);
        if is_integer_literal(trimmed)
            && let Ok(int) = trimmed.parse::<i64>()
        {
            return Some(Number::Int(int));
        }
        trimmed.parse::<f64>().ok().map(Number::Float)
    }

    /// Numbers are taken as-is; strings go through [`Number::parse`].
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Number::Int)
                .or_else(|| n.as_f64().map(Number::Float)),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Integers compare exactly; any float in the pair compares as `f64`.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// A validated number together with the literal it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericInput {
    pub number: Number,
    pub literal: String,
}

impl NumericInput {
    pub fn from_json(value: &Value) -> Option<Self> {
        let number = Number::from_json(value)?;
        let literal = match value {
            Value::String(s) => s.trim_matches(is_numeric_whitespace).to_string(),
            other => other.to_string(),
        };
        Some(Self { number, literal })
    }

    /// Bind for a column of type `ty`: decimals as the literal text,
    /// floats as floats, everything else as integers when integral.
    pub fn coerce(&self, ty: Option<&FieldType>) -> ParameterValue {
        match ty {
            Some(FieldType::Decimal) => ParameterValue::Text(self.literal.clone()),
            Some(FieldType::Float) => ParameterValue::Float(self.number.as_f64()),
            _ => self.number.into(),
        }
    }
}

impl From<Number> for ParameterValue {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => ParameterValue::Int(i),
            Number::Float(f) => ParameterValue::Float(f),
        }
    }
}

fn is_numeric_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Locale-independent numeric string test.
///
/// Accepts optional surrounding whitespace, an optional sign, digits with an
/// optional fractional part (at least one digit overall) and an optional
/// exponent. Hexadecimal, `inf` and `nan` are rejected.
pub fn is_numeric(raw: &str) -> bool {
    let s = raw.trim_matches(is_numeric_whitespace);
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < len && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < len && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < len && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == len
}

/// Normalize a numeric filter value: a scalar or a non-empty list whose
/// elements are all numeric. Any bad element rejects the whole value.
pub fn normalize_numeric_values(
    value: &Value,
    property: &str,
) -> Result<Vec<NumericInput>, InvalidFilterValue> {
    let invalid = || InvalidFilterValue::InvalidNumeric {
        property: property.to_string(),
    };

    match value {
        Value::Array(items) if items.is_empty() => Err(InvalidFilterValue::MissingValue {
            property: property.to_string(),
        }),
        Value::Array(items) => items
            .iter()
            .map(|item| NumericInput::from_json(item).ok_or_else(invalid))
            .collect(),
        scalar => NumericInput::from_json(scalar)
            .map(|n| vec![n])
            .ok_or_else(invalid),
    }
}

/// Normalize the value of a single-bound range operator (`gt`, `lte`, ...).
pub fn normalize_range_value(value: &Value, operator: &str) -> Result<Number, InvalidFilterValue> {
    Number::from_json(value).ok_or_else(|| InvalidFilterValue::ExpectedNumber {
        operator: operator.to_string(),
    })
}

/// Normalize a `"<min>..<max>"` between-expression.
///
/// Exactly two non-empty numeric parts with `min <= max`; anything else is
/// rejected, never reordered.
pub fn normalize_between(value: &Value, operator: &str) -> Result<(Number, Number), InvalidFilterValue> {
    let format_error = || InvalidFilterValue::RangeFormat {
        operator: operator.to_string(),
    };

    let raw = value.as_str().ok_or_else(format_error)?;
    let parts: Vec<&str> = raw.split("..").collect();
    let [low, high] = parts.as_slice() else {
        return Err(format_error());
    };
    if low.is_empty() || high.is_empty() {
        return Err(format_error());
    }

    let (Some(low), Some(high)) = (Number::parse(low), Number::parse(high)) else {
        return Err(InvalidFilterValue::RangeValues {
            operator: operator.to_string(),
        });
    };

    if low.compare(high) == Some(Ordering::Greater) {
        return Err(InvalidFilterValue::RangeOrder {
            operator: operator.to_string(),
        });
    }

    Ok((low, high))
}

/// A calendar-valid date and/or time parsed from filter input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Time(NaiveTime),
}

impl From<DateValue> for ParameterValue {
    fn from(value: DateValue) -> Self {
        match value {
            DateValue::Date(d) => ParameterValue::Date(d),
            DateValue::DateTime(dt) => ParameterValue::DateTime(dt),
            DateValue::DateTimeTz(dt) => ParameterValue::DateTimeTz(dt),
            DateValue::Time(t) => ParameterValue::Time(t),
        }
    }
}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Parse a date, date-time (with or without offset) or time.
///
/// Parsing is calendar-aware: `2023-02-30` is rejected.
pub fn parse_date(raw: &str) -> Option<DateValue> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(DateValue::DateTimeTz(dt));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(DateValue::DateTime(dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(DateValue::Date(d));
    }
    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, format) {
            return Some(DateValue::Time(t));
        }
    }

    None
}

/// A date operator value must be a string.
pub fn normalize_date_value<'v>(
    value: &'v Value,
    operator: &str,
) -> Result<&'v str, InvalidFilterValue> {
    value
        .as_str()
        .ok_or_else(|| InvalidFilterValue::ExpectedString {
            operator: operator.to_string(),
        })
}
