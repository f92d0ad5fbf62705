// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Field value type system.
//!
//! Provides the engine-side representation of one attribute value together
//! with the engine field types a table column can declare. Every PDS4 data
//! type decodes into one of these variants; setting a value on a feature
//! coerces it to the column's declared [`FieldType`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Engine type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Integer64,
    /// Double precision floating point
    Real,
    /// UTF-8 text
    String,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Date and time of day
    DateTime,
}

impl FieldType {
    /// Name used in sidecar descriptions.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::Integer => "Integer",
            FieldType::Integer64 => "Integer64",
            FieldType::Real => "Real",
            FieldType::String => "String",
            FieldType::Date => "Date",
            FieldType::Time => "Time",
            FieldType::DateTime => "DateTime",
        }
    }

    /// Check if this type holds numbers.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Integer64 | FieldType::Real
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refinement of a [`FieldType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldSubType {
    /// No refinement
    #[default]
    None,
    /// Integer column holding 0/1
    Boolean,
    /// Integer column holding 16-bit values
    Int16,
    /// Real column holding single precision values
    Float32,
}

impl FieldSubType {
    /// Name used in sidecar descriptions, `None` for the default subtype.
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            FieldSubType::None => None,
            FieldSubType::Boolean => Some("Boolean"),
            FieldSubType::Int16 => Some("Int16"),
            FieldSubType::Float32 => Some("Float32"),
        }
    }
}

/// One attribute value.
///
/// `Null` is the "field not set" state: it is what an empty ASCII slot or a
/// missing-constant token decodes to, and what an unset field encodes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum FieldValue {
    /// Field not set
    #[default]
    Null,
    /// 32-bit integer (also booleans as 0/1)
    Integer(i32),
    /// 64-bit integer
    Integer64(i64),
    /// Double precision real
    Real(f64),
    /// Text
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time, always interpreted as UTC
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get a short name for the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Integer(_) => "integer",
            FieldValue::Integer64(_) => "integer64",
            FieldValue::Real(_) => "real",
            FieldValue::String(_) => "string",
            FieldValue::Date(_) => "date",
            FieldValue::Time(_) => "time",
            FieldValue::DateTime(_) => "datetime",
        }
    }

    /// Try to convert this value to i64.
    ///
    /// Reals are truncated toward zero; text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(i64::from(*v)),
            FieldValue::Integer64(v) => Some(*v),
            FieldValue::Real(v) if v.is_finite() => Some(*v as i64),
            FieldValue::String(s) => parse_integer_text(s),
            _ => None,
        }
    }

    /// Try to convert this value to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(f64::from(*v)),
            FieldValue::Integer64(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the text if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Integer(v) => Some(*v != 0),
            FieldValue::Integer64(v) => Some(*v != 0),
            FieldValue::Real(v) => Some(*v != 0.0),
            FieldValue::String(s) => Some(parse_boolean_text(s)),
            _ => None,
        }
    }

    /// Format the value as text, `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(v) => Some(v.to_string()),
            FieldValue::Integer64(v) => Some(v.to_string()),
            FieldValue::Real(v) => Some(v.to_string()),
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Some(t.format("%H:%M:%S%.3f").to_string()),
            FieldValue::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        }
    }

    /// Convert this value to the representation of a column type.
    ///
    /// Values that cannot be represented (unparseable text, out of range
    /// temporal conversions) become `Null`. Integers are clamped into the
    /// 32-bit range for `Integer` columns.
    pub fn coerce(&self, field_type: FieldType, subtype: FieldSubType) -> FieldValue {
        if self.is_null() {
            return FieldValue::Null;
        }
        match field_type {
            FieldType::Integer => {
                if subtype == FieldSubType::Boolean {
                    return self
                        .as_bool()
                        .map_or(FieldValue::Null, |b| FieldValue::Integer(i32::from(b)));
                }
                self.as_i64().map_or(FieldValue::Null, |v| {
                    FieldValue::Integer(v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
                })
            }
            FieldType::Integer64 => self.as_i64().map_or(FieldValue::Null, FieldValue::Integer64),
            FieldType::Real => self.as_f64().map_or(FieldValue::Null, FieldValue::Real),
            FieldType::String => self.to_text().map_or(FieldValue::Null, FieldValue::String),
            FieldType::Date => match self {
                FieldValue::Date(d) => FieldValue::Date(*d),
                FieldValue::DateTime(dt) => FieldValue::Date(dt.date()),
                FieldValue::String(s) => parse_date(s).map_or(FieldValue::Null, FieldValue::Date),
                _ => FieldValue::Null,
            },
            FieldType::Time => match self {
                FieldValue::Time(t) => FieldValue::Time(*t),
                FieldValue::DateTime(dt) => FieldValue::Time(dt.time()),
                FieldValue::String(s) => parse_time(s).map_or(FieldValue::Null, FieldValue::Time),
                _ => FieldValue::Null,
            },
            FieldType::DateTime => match self {
                FieldValue::DateTime(dt) => FieldValue::DateTime(*dt),
                FieldValue::Date(d) => FieldValue::DateTime(d.and_time(NaiveTime::MIN)),
                FieldValue::String(s) => {
                    parse_date_time(s).map_or(FieldValue::Null, FieldValue::DateTime)
                }
                _ => FieldValue::Null,
            },
        }
    }

    /// Compare two values of compatible kinds.
    ///
    /// Numbers compare numerically across integer and real variants; text
    /// and temporal values compare within their own kind.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Time(a), FieldValue::Time(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(_) | FieldValue::Integer64(_), FieldValue::Integer(_) | FieldValue::Integer64(_)) => {
                self.as_i64().zip(other.as_i64()).map(|(a, b)| a.cmp(&b))
            }
            (a, b) if a.is_number() && b.is_number() => {
                a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
            }
            _ => None,
        }
    }

    fn is_number(&self) -> bool {
        matches!(
            self,
            FieldValue::Integer(_) | FieldValue::Integer64(_) | FieldValue::Real(_)
        )
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("(null)"),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer64(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Integer(i32::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Parse an ASCII boolean token: "t", "true" and "1" (any case) are true.
pub fn parse_boolean_text(s: &str) -> bool {
    let s = s.trim();
    s == "1" || s.eq_ignore_ascii_case("t") || s.eq_ignore_ascii_case("true")
}

/// Parse a decimal integer, accepting a leading '+'.
pub fn parse_integer_text(s: &str) -> Option<i64> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}

/// Parse `YYYY-MM-DD`, also accepting a full date-time.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_time(s).map(|dt| dt.date()))
}

/// Parse `HH:MM[:SS[.fff]]` with an optional `Z` suffix.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(s, "%H:%M").ok())
}

/// Parse an ISO-like date-time with an optional `Z` suffix.
///
/// Accepts `T` or a space as separator, optional seconds and fraction, and
/// a bare date (midnight).
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
